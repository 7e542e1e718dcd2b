//! Конкретный словарь состояний
//!
//! Открытый набор: всё что реализует ActorState подключается в машину.
//! Здесь — базовые режимы survival-horror актора: idle/moving/aiming
//! для игрока, grab/knockback для врагов, attacking/reloading/dead
//! для обоих.

use bevy::prelude::*;

use super::state::{ActorState, StateCommon, StateContext, StateDuration, StateId, StateSpec};
use crate::components::MovementCommand;
use crate::input::{InputAction, InputAxis};

/// Теги для runtime-lookup состояний (death, knockback триггерятся
/// внешними системами, не соседними состояниями)
pub const TAG_DEAD: &str = "dead";
pub const TAG_KNOCKBACK: &str = "knockback";

const MOVE_DEADZONE: f32 = 0.01;

// ----------------------------------------------------------------------

/// Покой: ждём input, останавливаем движение
pub struct IdleState {
    common: StateCommon,
    moving: StateId,
    aiming: Option<StateId>,
}

impl IdleState {
    pub fn new(spec: StateSpec, moving: StateId, aiming: Option<StateId>) -> Self {
        Self {
            common: StateCommon::new(spec),
            moving,
            aiming,
        }
    }
}

impl ActorState for IdleState {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        *ctx.movement = MovementCommand::Idle;
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);
        if !self.common.transition_finished() {
            return;
        }

        if let Some(aiming) = self.aiming {
            if ctx.input.is_held(InputAction::Aim) {
                ctx.set_state(aiming);
                return;
            }
        }
        if ctx.input.axis(InputAxis::Move).length_squared() > MOVE_DEADZONE {
            ctx.set_state(self.moving);
        }
    }
}

// ----------------------------------------------------------------------

/// Движение по аналоговой оси
pub struct MovingState {
    common: StateCommon,
    idle: StateId,
    aiming: Option<StateId>,
}

impl MovingState {
    pub fn new(spec: StateSpec, idle: StateId, aiming: Option<StateId>) -> Self {
        Self {
            common: StateCommon::new(spec),
            idle,
            aiming,
        }
    }
}

impl ActorState for MovingState {
    fn name(&self) -> &'static str {
        "Moving"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);

        if let Some(aiming) = self.aiming {
            if ctx.input.is_held(InputAction::Aim) {
                ctx.set_state(aiming);
                return;
            }
        }

        let axis = ctx.input.axis(InputAxis::Move);
        if axis.length_squared() <= MOVE_DEADZONE {
            ctx.set_state(self.idle);
            return;
        }

        let direction = Vec3::new(axis.x, 0.0, axis.y).normalize_or_zero();
        *ctx.movement = MovementCommand::Move { direction };
    }

    fn state_exit(&mut self, ctx: &mut StateContext, into: StateId) {
        *ctx.movement = MovementCommand::Idle;
        self.common.exit(ctx);
        let _ = into;
    }
}

// ----------------------------------------------------------------------

/// Атака: на входе запускает attack-компонент, time-boxed
pub struct AttackingState {
    common: StateCommon,
    duration: StateDuration,
    attack: Entity,
    after: StateId,
}

impl AttackingState {
    pub fn new(spec: StateSpec, duration: f32, attack: Entity, after: StateId) -> Self {
        Self {
            common: StateCommon::new(spec),
            duration: StateDuration::new(duration),
            attack,
            after,
        }
    }
}

impl ActorState for AttackingState {
    fn name(&self) -> &'static str {
        "Attacking"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        self.duration.reset();
        *ctx.movement = MovementCommand::Stop;
        ctx.trigger_attack(self.attack);
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);
        if self.duration.tick(ctx.delta) {
            ctx.set_state(self.after);
        }
    }
}

// ----------------------------------------------------------------------

/// Прицеливание: удержание Aim, выстрел по Attack, reload по Reload
pub struct AimingState {
    common: StateCommon,
    attack_state: StateId,
    motion_state: StateId,
    reload_state: Option<StateId>,
    pub allow_manual_reload: bool,
}

impl AimingState {
    pub fn new(
        spec: StateSpec,
        attack_state: StateId,
        motion_state: StateId,
        reload_state: Option<StateId>,
    ) -> Self {
        Self {
            common: StateCommon::new(spec),
            attack_state,
            motion_state,
            reload_state,
            allow_manual_reload: true,
        }
    }
}

impl ActorState for AimingState {
    fn name(&self) -> &'static str {
        "Aiming"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        // Прицеливание сковывает ноги
        *ctx.movement = MovementCommand::Stop;
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);
        if !self.common.transition_finished() {
            return;
        }

        if ctx.input.is_down(InputAction::Attack) {
            ctx.set_state(self.attack_state);
            return;
        }
        if let Some(reload) = self.reload_state {
            if self.allow_manual_reload && ctx.input.is_down(InputAction::Reload) {
                ctx.set_state(reload);
                return;
            }
        }
        if !ctx.input.is_held(InputAction::Aim) {
            ctx.set_state(self.motion_state);
        }
    }
}

// ----------------------------------------------------------------------

/// Перезарядка: time-boxed, без триггера атаки
pub struct ReloadingState {
    common: StateCommon,
    duration: StateDuration,
    after: StateId,
}

impl ReloadingState {
    pub fn new(spec: StateSpec, duration: f32, after: StateId) -> Self {
        Self {
            common: StateCommon::new(spec),
            duration: StateDuration::new(duration),
            after,
        }
    }
}

impl ActorState for ReloadingState {
    fn name(&self) -> &'static str {
        "Reloading"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        self.duration.reset();
        *ctx.movement = MovementCommand::Stop;
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);
        if self.duration.tick(ctx.delta) {
            ctx.set_state(self.after);
        }
    }
}

// ----------------------------------------------------------------------

/// Захват (враг держит жертву): на входе запускает overlap-атаку,
/// по истечении duration отпускает
pub struct GrabState {
    common: StateCommon,
    duration: StateDuration,
    attack: Entity,
    after: StateId,
}

impl GrabState {
    pub fn new(spec: StateSpec, duration: f32, attack: Entity, after: StateId) -> Self {
        Self {
            common: StateCommon::new(spec),
            duration: StateDuration::new(duration),
            attack,
            after,
        }
    }
}

impl ActorState for GrabState {
    fn name(&self) -> &'static str {
        "Grab"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        self.duration.reset();
        *ctx.movement = MovementCommand::Stop;
        ctx.trigger_attack(self.attack);
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common.update(ctx);
        if self.duration.tick(ctx.delta) {
            ctx.set_state(self.after);
        }
    }
}

// ----------------------------------------------------------------------

/// Отброс: импульс с затуханием в physics tick, выход по порогу скорости
pub struct KnockbackState {
    common: StateCommon,
    force: f32,
    /// Затухание за physics tick, 0..1
    drag: f32,
    exit_state: StateId,
    impulse_dir: Vec3,
    velocity: Vec3,
}

const KNOCKBACK_STOP_SPEED: f32 = 0.1;

impl KnockbackState {
    pub fn new(spec: StateSpec, force: f32, drag: f32, exit_state: StateId) -> Self {
        Self {
            common: StateCommon::new(spec),
            force,
            drag,
            exit_state,
            impulse_dir: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }

    /// Направление отброса; ставится внешней системой (downcast по тегу)
    /// до set_state
    pub fn set_impulse_dir(&mut self, dir: Vec3) {
        self.impulse_dir = dir.normalize_or_zero();
    }
}

impl ActorState for KnockbackState {
    fn name(&self) -> &'static str {
        "Knockback"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        self.velocity = self.impulse_dir * self.force;
    }

    fn state_fixed_update(&mut self, ctx: &mut StateContext) {
        self.velocity *= 1.0 - self.drag;
        *ctx.movement = MovementCommand::Impulse {
            velocity: self.velocity,
        };

        if self.velocity.length() < KNOCKBACK_STOP_SPEED {
            ctx.set_state(self.exit_state);
        }
    }

    fn state_exit(&mut self, ctx: &mut StateContext, into: StateId) {
        self.velocity = Vec3::ZERO;
        *ctx.movement = MovementCommand::Idle;
        self.common.exit(ctx);
        let _ = into;
    }
}

// ----------------------------------------------------------------------

/// Смерть: one-way, переходов наружу нет (только reset машины)
pub struct DeadState {
    common: StateCommon,
}

impl DeadState {
    pub fn new(spec: StateSpec) -> Self {
        Self {
            common: StateCommon::new(spec),
        }
    }
}

impl ActorState for DeadState {
    fn name(&self) -> &'static str {
        "Dead"
    }

    fn common(&self) -> &StateCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StateCommon {
        &mut self.common
    }

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common.enter(ctx, from);
        *ctx.movement = MovementCommand::Stop;
    }
}
