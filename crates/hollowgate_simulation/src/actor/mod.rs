//! Actor state machine (per-actor FSM)
//!
//! Контроллер владеет фиксированным набором состояний; переходы
//! арбитрируются контроллером (last-write-wins запросы, exit-анимации,
//! one-tick deferral). Словарь состояний открыт: любой тип с ActorState
//! подключается через StateMachineBuilder.

use bevy::prelude::*;

pub mod controller;
pub mod state;
pub mod states;
pub mod systems;


pub use controller::{ActorStateMachine, StateMachineBuilder};
pub use state::{
    ActorState, ExitAnimation, StateCommon, StateContext, StateDuration, StateId, StateSpec,
    TransitionOverride, DEFAULT_BLEND_TIME,
};
pub use states::{
    AimingState, AttackingState, DeadState, GrabState, IdleState, KnockbackState, MovingState,
    ReloadingState, TAG_DEAD, TAG_KNOCKBACK,
};

use crate::animation::AnimationCrossFade;
use crate::scheduler::{tick_deferred_actions, DeferredStateRequest};

/// Actor Plugin
///
/// Порядок выполнения (FixedUpdate, chained):
/// 1. tick_deferred_actions — continuations (могут родить запросы/атаки)
/// 2. apply_deferred_state_requests / knockback / death — внешние запросы
/// 3. drive_state_machines — logic tick
/// 4. drive_state_machines_fixed — physics tick
pub struct ActorPlugin;

impl Plugin for ActorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationCrossFade>()
            .add_event::<DeferredStateRequest>();

        app.add_systems(
            FixedUpdate,
            (
                tick_deferred_actions,
                systems::apply_deferred_state_requests,
                systems::handle_knockback_requests,
                systems::enter_dead_state_on_death,
                systems::drive_state_machines,
                systems::drive_state_machines_fixed,
            )
                .chain()
                .in_set(ActorSet),
        );
    }
}

/// SystemSet машин состояний (после часов, до combat)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorSet;
