//! Actor state primitives
//!
//! Состояние — один behavioral mode актора (idle, attack, grab, dead...).
//! Контракт трёхфазный: state_enter / state_update + state_fixed_update /
//! state_exit. Вместо цепочки наследования (как ActorStateWithDuration в
//! движковых тулкитах) — композиция: StateCommon для анимационной базы,
//! StateDuration для time-boxed состояний.

use std::any::Any;

use bevy::prelude::*;

use crate::animation::{AnimHandle, AnimationCrossFade};
use crate::components::MovementCommand;
use crate::input::InputSnapshot;
use crate::scheduler::DeferredActions;

/// Stable index состояния внутри одной машины.
///
/// Wiring между состояниями делается на этапе сборки (StateMachineBuilder),
/// без runtime-поиска по типам.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// Per-predecessor override анимационного перехода:
/// входя из `from`, играем `animation` вместо дефолтной.
#[derive(Debug, Clone)]
pub struct TransitionOverride {
    pub from: StateId,
    pub animation: AnimHandle,
    pub blend_time: f32,
}

/// Exit-анимация: проигрывается при выходе из состояния, и пока она идёт
/// (duration + extra_wait) следующее состояние не активируется.
#[derive(Debug, Clone)]
pub struct ExitAnimation {
    pub animation: AnimHandle,
    pub blend_time: f32,
    pub duration: f32,
    pub extra_wait: f32,
}

/// Декларативная часть состояния: анимации, теги, exit-поведение.
#[derive(Debug, Clone, Default)]
pub struct StateSpec {
    /// Дефолтный animation state (None = вход без cross-fade)
    pub animation: Option<AnimHandle>,
    pub animation_blend_time: f32,
    /// Overrides по предшественнику; первый совпавший выигрывает
    /// (порядок объявления)
    pub transitions: Vec<TransitionOverride>,
    pub exit_animation: Option<ExitAnimation>,
    /// Вход в это состояние игнорирует exit-анимацию предыдущего
    pub skip_previous_exit_animation: bool,
    /// Теги для lookup по имени (неуникальные между состояниями)
    pub tags: Vec<&'static str>,
}

pub const DEFAULT_BLEND_TIME: f32 = 0.25;

impl StateSpec {
    pub fn new() -> Self {
        Self {
            animation: None,
            animation_blend_time: DEFAULT_BLEND_TIME,
            transitions: Vec::new(),
            exit_animation: None,
            skip_previous_exit_animation: false,
            tags: Vec::new(),
        }
    }

    pub fn with_animation(mut self, animation: AnimHandle) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_blend_time(mut self, blend_time: f32) -> Self {
        self.animation_blend_time = blend_time;
        self
    }

    pub fn with_transition(mut self, from: StateId, animation: AnimHandle, blend_time: f32) -> Self {
        self.transitions.push(TransitionOverride {
            from,
            animation,
            blend_time,
        });
        self
    }

    pub fn with_exit_animation(mut self, exit: ExitAnimation) -> Self {
        self.exit_animation = Some(exit);
        self
    }

    pub fn skip_previous_exit(mut self) -> Self {
        self.skip_previous_exit_animation = true;
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    /// Есть ли exit-анимация которую нужно ждать (duration > 0)
    pub fn has_exit_animation(&self) -> bool {
        self.exit_animation
            .as_ref()
            .map(|e| e.duration > 0.0)
            .unwrap_or(false)
    }

    /// Полное время ожидания перед активацией следующего состояния
    pub fn exit_wait(&self) -> f32 {
        self.exit_animation
            .as_ref()
            .map(|e| e.duration + e.extra_wait)
            .unwrap_or(0.0)
    }
}

/// Per-tick view машины, передаётся в хуки состояний.
///
/// Запросы перехода из хуков идут сюда (set_state), контроллер забирает
/// их после вызова — это и даёт one-tick deferral для запросов из
/// state_enter.
pub struct StateContext<'a> {
    pub actor: Entity,
    /// Scaled delta текущего logic tick
    pub delta: f32,
    pub input: &'a InputSnapshot,
    pub movement: &'a mut MovementCommand,
    pub deferred: &'a mut DeferredActions,
    animations: &'a mut Vec<AnimationCrossFade>,
    attack_triggers: &'a mut Vec<Entity>,
    requested: Option<StateId>,
}

impl<'a> StateContext<'a> {
    pub fn new(
        actor: Entity,
        delta: f32,
        input: &'a InputSnapshot,
        movement: &'a mut MovementCommand,
        deferred: &'a mut DeferredActions,
        animations: &'a mut Vec<AnimationCrossFade>,
        attack_triggers: &'a mut Vec<Entity>,
    ) -> Self {
        Self {
            actor,
            delta,
            input,
            movement,
            deferred,
            animations,
            attack_triggers,
            requested: None,
        }
    }

    /// Запрос перехода; последующий вызов перезаписывает предыдущий
    /// (last write wins)
    pub fn set_state(&mut self, state: StateId) {
        self.requested = Some(state);
    }

    /// Fire-and-forget cross-fade команда для engine layer
    pub fn cross_fade(&mut self, state: AnimHandle, blend_time: f32) {
        self.animations.push(AnimationCrossFade {
            actor: self.actor,
            state,
            blend_time,
        });
    }

    /// Запустить attack-компонент (entity атаки, см. combat)
    pub fn trigger_attack(&mut self, attack: Entity) {
        self.attack_triggers.push(attack);
    }

    pub(crate) fn take_request(&mut self) -> Option<StateId> {
        self.requested.take()
    }
}

/// База состояния: выбор анимации на входе, blend-таймер, exit-анимация.
///
/// Конкретные состояния держат StateCommon полем и зовут его из своих
/// хуков (аналог вызова base.StateEnter и т.п.).
#[derive(Debug, Clone)]
pub struct StateCommon {
    spec: StateSpec,
    transition_time: f32,
}

impl StateCommon {
    pub fn new(spec: StateSpec) -> Self {
        Self {
            spec,
            transition_time: 0.0,
        }
    }

    pub fn spec(&self) -> &StateSpec {
        &self.spec
    }

    /// Блендинг входной анимации завершён
    pub fn transition_finished(&self) -> bool {
        self.transition_time <= 0.0
    }

    /// Выбор входной анимации: сначала exact match предшественника в
    /// overrides (первый выигрывает), иначе дефолтная, иначе ничего.
    pub fn enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        let mut selected = None;
        if let Some(from) = from {
            for t in &self.spec.transitions {
                if t.from == from {
                    selected = Some((t.animation, t.blend_time));
                    break;
                }
            }
        }

        if selected.is_none() {
            selected = self
                .spec
                .animation
                .map(|a| (a, self.spec.animation_blend_time));
        }

        if let Some((animation, blend_time)) = selected {
            ctx.cross_fade(animation, blend_time);
            self.transition_time = blend_time;
        }
    }

    pub fn update(&mut self, ctx: &StateContext) {
        if self.transition_time > 0.0 {
            self.transition_time -= ctx.delta;
        }
    }

    pub fn exit(&mut self, ctx: &mut StateContext) {
        if let Some(exit) = &self.spec.exit_animation {
            if exit.duration > 0.0 {
                ctx.cross_fade(exit.animation, exit.blend_time);
            }
        }
    }
}

/// Контракт состояния. Дефолтные тела делегируют в StateCommon, так что
/// тривиальное состояние реализует только common()/common_mut()/name().
///
/// Any в supertrait'ах — для downcast'а через машину (настройка состояния
/// найденного по тегу, например impulse для knockback).
pub trait ActorState: Any + Send + Sync {
    fn name(&self) -> &'static str;

    fn common(&self) -> &StateCommon;

    fn common_mut(&mut self) -> &mut StateCommon;

    fn state_enter(&mut self, ctx: &mut StateContext, from: Option<StateId>) {
        self.common_mut().enter(ctx, from);
    }

    fn state_update(&mut self, ctx: &mut StateContext) {
        self.common_mut().update(ctx);
    }

    fn state_fixed_update(&mut self, _ctx: &mut StateContext) {}

    fn state_exit(&mut self, ctx: &mut StateContext, _into: StateId) {
        self.common_mut().exit(ctx);
    }
}

/// Time-box helper для состояний с фиксированной длительностью
/// (attack, reload, grab). fire ровно один раз за активацию.
#[derive(Debug, Clone)]
pub struct StateDuration {
    pub duration: f32,
    elapsed: f32,
    finished: bool,
}

impl StateDuration {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Вызывается из state_enter
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.finished = false;
    }

    /// true ровно один раз — когда elapsed переваливает за duration
    pub fn tick(&mut self, delta: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed > self.duration && !self.finished {
            self.finished = true;
            return true;
        }
        false
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_duration_fires_once() {
        let mut duration = StateDuration::new(1.0);

        assert!(!duration.tick(0.5));
        assert!(!duration.tick(0.5)); // ровно 1.0 — ещё не перевалили
        assert!(duration.tick(0.1));
        assert!(!duration.tick(10.0)); // уже finished

        duration.reset();
        assert!(!duration.tick(0.5));
        assert!(duration.tick(0.6));
    }

    #[test]
    fn test_spec_exit_wait() {
        let spec = StateSpec::new();
        assert!(!spec.has_exit_animation());
        assert_eq!(spec.exit_wait(), 0.0);

        let spec = StateSpec::new().with_exit_animation(ExitAnimation {
            animation: AnimHandle::from_name("Exit"),
            blend_time: 0.1,
            duration: 0.4,
            extra_wait: 0.2,
        });
        assert!(spec.has_exit_animation());
        assert!((spec.exit_wait() - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_exit_animation_zero_duration_not_waited() {
        let spec = StateSpec::new().with_exit_animation(ExitAnimation {
            animation: AnimHandle::from_name("Exit"),
            blend_time: 0.1,
            duration: 0.0,
            extra_wait: 0.0,
        });
        assert!(!spec.has_exit_animation());
    }
}
