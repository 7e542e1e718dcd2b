//! HOLLOWGATE Simulation Core
//!
//! ECS-симуляция survival horror gameplay на Bevy 0.16 (headless).
//! Engine-agnostic: физика, рендер и анимации живут на стороне host
//! engine, симуляция общается с ним командами/событиями
//! (MovementCommand, AnimationCrossFade, Pre/PostDamage).
//!
//! Подсистемы:
//! - actor: per-actor state machine (FSM с exit-анимациями)
//! - combat: damageables + attack pipeline (melee/overlap/shot)
//! - scheduler: отложенные continuations (замена coroutine'ам)
//! - time: счётная пауза + scaled/unscaled часы
//! - save: serde snapshot'ы (health, текущее состояние)

use bevy::prelude::*;

// Публичные модули
pub mod actor;
pub mod animation;
pub mod combat;
pub mod components;
pub mod input;
pub mod logger;
pub mod save;
pub mod scheduler;
pub mod time;

// Re-export базовых типов для удобства
pub use actor::{
    ActorPlugin, ActorSet, ActorState, ActorStateMachine, StateCommon, StateContext,
    StateDuration, StateId, StateMachineBuilder, StateSpec,
};
pub use animation::{AnimHandle, AnimationCrossFade};
pub use combat::{
    AttackEnded, AttackImpact, AttackInfo, AttackNotStarted, AttackOwner, AttackStarted,
    AttackTriggered, AttackType, CategoryMask, CombatPlugin, CombatSet, Damageable,
    DamageableCollider, DamageableKind, EntityDied, HitBox, KnockbackEffect, KnockbackRequested,
    MaxDistanceFilter, MeleeAttack, OverlapAttack, PostDamage, PreDamage, ShellKicked, ShotAttack,
    VictimFilter,
};
pub use components::{Actor, DamageOutcome, Health, MovementCommand};
pub use input::{InputAction, InputAxis, InputFrame, InputSnapshot};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, ConsoleLogger, LogLevel, LogPrinter,
};
pub use save::{capture_actor, restore_actor, ActorSaveData, Savable};
pub use scheduler::{ClockKind, DeferredAction, DeferredActions};
pub use time::{
    request_pause, request_resume, ClockPlugin, ClockSet, GameClock, GamePaused, GameUnpaused,
    PauseController,
};

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Порядок SystemSet'ов в FixedUpdate: часы → машины состояний → combat.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<InputSnapshot>()
            .configure_sets(FixedUpdate, (ClockSet, ActorSet, CombatSet).chain())
            .add_plugins((ClockPlugin, ActorPlugin, CombatPlugin))
            .add_systems(
                FixedUpdate,
                input::flush_input_on_unpause
                    .after(time::update_game_clock)
                    .in_set(ClockSet),
            );
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app() -> App {
    init_logger();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin);
    app
}
