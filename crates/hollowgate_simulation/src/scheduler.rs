//! Deferred continuations (per-actor timer arena)
//!
//! Замена engine-coroutine'ам: отложенное действие — запись с ключом
//! (state-владелец + purpose), временем и payload'ом. Записи с владельцем
//! отменяются когда состояние-владелец выходит; scaled записи замирают
//! на паузе, unscaled продолжают идти (§ concurrency model).

use bevy::prelude::*;

use crate::actor::StateId;
use crate::combat::{AttackTriggered, ShellKicked};
use crate::time::GameClock;

/// По каким часам измеряется задержка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Game time: замирает на паузе
    Scaled,
    /// Wall time: идёт и на паузе
    Unscaled,
}

/// Payload отложенного действия; dispatch в события в tick_deferred_actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Запустить attack-компонент
    TriggerAttack(Entity),
    /// Визуальный sub-action выстрела (выброс гильзы)
    ShellKick(Entity),
    /// Запросить переход state machine актора
    RequestState(StateId),
}

#[derive(Debug, Clone)]
struct DeferredEntry {
    /// Состояние-владелец: отменяется при его выходе (None = переживает выход)
    owner: Option<StateId>,
    purpose: &'static str,
    remaining: f32,
    clock: ClockKind,
    action: DeferredAction,
}

/// Арена отложенных действий одного актора
#[derive(Component, Debug, Default)]
pub struct DeferredActions {
    entries: Vec<DeferredEntry>,
}

impl DeferredActions {
    /// Планирует действие; запись с тем же purpose перезаписывается
    pub fn schedule(
        &mut self,
        owner: Option<StateId>,
        purpose: &'static str,
        delay: f32,
        clock: ClockKind,
        action: DeferredAction,
    ) {
        self.entries.retain(|e| e.purpose != purpose);
        self.entries.push(DeferredEntry {
            owner,
            purpose,
            remaining: delay,
            clock,
            action,
        });
    }

    pub fn cancel(&mut self, purpose: &'static str) {
        self.entries.retain(|e| e.purpose != purpose);
    }

    /// Отмена всех записей принадлежащих состоянию (вызывается контроллером
    /// перед state_exit, чтобы exit мог запланировать своё)
    pub fn cancel_for_state(&mut self, state: StateId) {
        self.entries.retain(|e| e.owner != Some(state));
    }

    pub fn is_scheduled(&self, purpose: &'static str) -> bool {
        self.entries.iter().any(|e| e.purpose == purpose)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Продвигает таймеры и возвращает сработавшие payload'ы
    /// (в порядке планирования)
    pub fn tick(&mut self, scaled_delta: f32, unscaled_delta: f32) -> Vec<DeferredAction> {
        let mut fired = Vec::new();
        self.entries.retain_mut(|entry| {
            entry.remaining -= match entry.clock {
                ClockKind::Scaled => scaled_delta,
                ClockKind::Unscaled => unscaled_delta,
            };
            if entry.remaining <= 0.0 {
                fired.push(entry.action);
                false
            } else {
                true
            }
        });
        fired
    }
}

/// Event: отложенный запрос перехода (RequestState payload)
#[derive(Event, Debug, Clone)]
pub struct DeferredStateRequest {
    pub actor: Entity,
    pub state: StateId,
}

/// Система: tick всех арен + dispatch сработавших действий в события
pub fn tick_deferred_actions(
    clock: Res<GameClock>,
    mut holders: Query<(Entity, &mut DeferredActions)>,
    mut attack_triggers: EventWriter<AttackTriggered>,
    mut shell_kicks: EventWriter<ShellKicked>,
    mut state_requests: EventWriter<DeferredStateRequest>,
) {
    for (entity, mut deferred) in holders.iter_mut() {
        if deferred.is_empty() {
            continue;
        }
        for action in deferred.tick(clock.delta, clock.unscaled_delta) {
            match action {
                DeferredAction::TriggerAttack(attack) => {
                    attack_triggers.write(AttackTriggered { attack });
                }
                DeferredAction::ShellKick(attack) => {
                    shell_kicks.write(ShellKicked { attack });
                }
                DeferredAction::RequestState(state) => {
                    state_requests.write(DeferredStateRequest {
                        actor: entity,
                        state,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACK: Entity = Entity::PLACEHOLDER;

    #[test]
    fn test_scaled_frozen_while_paused() {
        let mut deferred = DeferredActions::default();
        deferred.schedule(None, "a", 0.2, ClockKind::Scaled, DeferredAction::TriggerAttack(ATTACK));
        deferred.schedule(None, "b", 0.2, ClockKind::Unscaled, DeferredAction::ShellKick(ATTACK));

        // Пауза: scaled delta = 0, unscaled идёт
        let fired = deferred.tick(0.0, 0.3);
        assert_eq!(fired, vec![DeferredAction::ShellKick(ATTACK)]);
        assert!(deferred.is_scheduled("a"));

        // Сняли паузу
        let fired = deferred.tick(0.3, 0.3);
        assert_eq!(fired, vec![DeferredAction::TriggerAttack(ATTACK)]);
        assert!(deferred.is_empty());
    }

    #[test]
    fn test_same_purpose_replaces() {
        let mut deferred = DeferredActions::default();
        deferred.schedule(None, "kick", 0.1, ClockKind::Scaled, DeferredAction::ShellKick(ATTACK));
        deferred.schedule(None, "kick", 5.0, ClockKind::Scaled, DeferredAction::ShellKick(ATTACK));
        assert_eq!(deferred.len(), 1);

        // Старая запись (0.1) заменена — на 0.2 ничего не fire
        assert!(deferred.tick(0.2, 0.2).is_empty());
    }

    #[test]
    fn test_cancel_for_state() {
        let mut deferred = DeferredActions::default();
        let owner = StateId(3);
        deferred.schedule(Some(owner), "x", 1.0, ClockKind::Scaled, DeferredAction::RequestState(StateId(0)));
        deferred.schedule(None, "y", 1.0, ClockKind::Scaled, DeferredAction::RequestState(StateId(1)));

        deferred.cancel_for_state(owner);
        assert!(!deferred.is_scheduled("x"));
        assert!(deferred.is_scheduled("y"));
    }
}
