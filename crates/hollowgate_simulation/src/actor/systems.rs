//! Driver-системы state machine
//!
//! Logic tick и physics tick обслуживаются отдельными системами; обе
//! замирают на паузе. Внешние запросы переходов (смерть, knockback,
//! отложенные continuations) конвертируются в set_state до drive.

use bevy::prelude::*;

use super::controller::ActorStateMachine;
use super::state::StateContext;
use super::states::{KnockbackState, TAG_DEAD, TAG_KNOCKBACK};
use crate::animation::AnimationCrossFade;
use crate::combat::{AttackTriggered, EntityDied, KnockbackRequested};
use crate::components::MovementCommand;
use crate::input::InputSnapshot;
use crate::scheduler::{DeferredActions, DeferredStateRequest};
use crate::time::GameClock;

/// Собирает StateContext, гоняет хук, сливает буферы в события
fn run_machine_hook(
    entity: Entity,
    delta: f32,
    input: &InputSnapshot,
    movement: &mut MovementCommand,
    deferred: &mut DeferredActions,
    crossfades: &mut EventWriter<AnimationCrossFade>,
    triggers: &mut EventWriter<AttackTriggered>,
    hook: impl FnOnce(&mut StateContext),
) {
    let mut animations = Vec::new();
    let mut attack_triggers = Vec::new();
    let mut ctx = StateContext::new(
        entity,
        delta,
        input,
        movement,
        deferred,
        &mut animations,
        &mut attack_triggers,
    );
    hook(&mut ctx);
    drop(ctx);

    for event in animations {
        crossfades.write(event);
    }
    for attack in attack_triggers {
        triggers.write(AttackTriggered { attack });
    }
}

/// Система: logic tick всех машин (обслуживание запросов, state_update)
pub fn drive_state_machines(
    clock: Res<GameClock>,
    input: Res<InputSnapshot>,
    mut machines: Query<(
        Entity,
        &mut ActorStateMachine,
        &mut MovementCommand,
        &mut DeferredActions,
    )>,
    mut crossfades: EventWriter<AnimationCrossFade>,
    mut triggers: EventWriter<AttackTriggered>,
) {
    if clock.paused {
        return;
    }

    for (entity, mut machine, mut movement, mut deferred) in machines.iter_mut() {
        run_machine_hook(
            entity,
            clock.delta,
            &input,
            &mut movement,
            &mut deferred,
            &mut crossfades,
            &mut triggers,
            |ctx| machine.update(ctx),
        );
    }
}

/// Система: physics tick всех машин (state_fixed_update)
pub fn drive_state_machines_fixed(
    clock: Res<GameClock>,
    input: Res<InputSnapshot>,
    mut machines: Query<(
        Entity,
        &mut ActorStateMachine,
        &mut MovementCommand,
        &mut DeferredActions,
    )>,
    mut crossfades: EventWriter<AnimationCrossFade>,
    mut triggers: EventWriter<AttackTriggered>,
) {
    if clock.paused {
        return;
    }

    for (entity, mut machine, mut movement, mut deferred) in machines.iter_mut() {
        run_machine_hook(
            entity,
            clock.delta,
            &input,
            &mut movement,
            &mut deferred,
            &mut crossfades,
            &mut triggers,
            |ctx| machine.fixed_update(ctx),
        );
    }
}

/// Система: сработавшие RequestState continuations → set_state
pub fn apply_deferred_state_requests(
    mut requests: EventReader<DeferredStateRequest>,
    mut machines: Query<&mut ActorStateMachine>,
) {
    for request in requests.read() {
        let Ok(mut machine) = machines.get_mut(request.actor) else {
            crate::log_warning(&format!(
                "DeferredStateRequest: actor {:?} has no state machine",
                request.actor
            ));
            continue;
        };
        machine.set_state(request.state);
    }
}

/// Система: KnockbackRequested → состояние с тегом "knockback"
///
/// Актор без knockback-состояния — не ошибка (например boss immune),
/// просто логируем.
pub fn handle_knockback_requests(
    mut requests: EventReader<KnockbackRequested>,
    mut machines: Query<&mut ActorStateMachine>,
) {
    for request in requests.read() {
        let Ok(mut machine) = machines.get_mut(request.actor) else {
            continue;
        };
        let Some(id) = machine.try_find_with_tag(TAG_KNOCKBACK) else {
            crate::log(&format!(
                "Actor {:?} has no '{}' state, knockback ignored",
                request.actor, TAG_KNOCKBACK
            ));
            continue;
        };

        if let Some(knockback) = machine.state_as_mut::<KnockbackState>(id) {
            knockback.set_impulse_dir(request.direction);
        }
        machine.set_state(id);
    }
}

/// Система: EntityDied → состояние с тегом "dead"
pub fn enter_dead_state_on_death(
    mut deaths: EventReader<EntityDied>,
    mut machines: Query<&mut ActorStateMachine>,
) {
    for death in deaths.read() {
        let Ok(mut machine) = machines.get_mut(death.entity) else {
            continue;
        };
        let Some(id) = machine.try_find_with_tag(TAG_DEAD) else {
            crate::log_warning(&format!(
                "Actor {:?} died but has no '{}' state",
                death.entity, TAG_DEAD
            ));
            continue;
        };
        machine.set_state(id);
    }
}
