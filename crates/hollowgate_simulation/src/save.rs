//! Save contract
//!
//! Snapshot'ы — plain data (serde), отвязанные от рантайм-структур.
//! Для state machine сохраняется только идентификатор текущего
//! состояния: restore выставляет ЗАПРОС, вход произойдёт обычным
//! протоколом на следующем logic tick'е (enter-хуки не дёргаются
//! в вакууме без контекста). Exit-delay через save не переживает.

use serde::{Deserialize, Serialize};

use crate::actor::{ActorStateMachine, StateId};
use crate::components::Health;

/// Компонент умеющий сворачиваться в save-данные и разворачиваться
/// обратно. Restore обязан быть идемпотентным.
pub trait Savable {
    type SaveData;

    fn capture(&self) -> Self::SaveData;
    fn restore(&mut self, data: &Self::SaveData);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSaveData {
    pub current: f32,
    pub max: f32,
    pub dead: bool,
}

impl Savable for Health {
    type SaveData = HealthSaveData;

    fn capture(&self) -> HealthSaveData {
        HealthSaveData {
            current: self.current(),
            max: self.max(),
            dead: self.is_dead(),
        }
    }

    fn restore(&mut self, data: &HealthSaveData) {
        self.restore(data.current, data.max, data.dead);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineSaveData {
    /// Индекс текущего состояния; None — машина ещё не стартовала
    pub current: Option<usize>,
}

impl Savable for ActorStateMachine {
    type SaveData = StateMachineSaveData;

    fn capture(&self) -> StateMachineSaveData {
        StateMachineSaveData {
            current: self.current().map(|id| id.0),
        }
    }

    fn restore(&mut self, data: &StateMachineSaveData) {
        let Some(index) = data.current else {
            return;
        };
        if index >= self.state_count() {
            // Save от другой конфигурации актора: не паникуем на load
            crate::log_warning(&format!(
                "Saved state index {} out of range ({} states), keeping initial",
                index,
                self.state_count()
            ));
            return;
        }
        self.set_state(StateId(index));
    }
}

/// Snapshot одного актора
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSaveData {
    pub health: HealthSaveData,
    pub state_machine: StateMachineSaveData,
}

pub fn capture_actor(health: &Health, machine: &ActorStateMachine) -> ActorSaveData {
    ActorSaveData {
        health: health.capture(),
        state_machine: machine.capture(),
    }
}

pub fn restore_actor(health: &mut Health, machine: &mut ActorStateMachine, data: &ActorSaveData) {
    Savable::restore(health, &data.health);
    machine.restore(&data.state_machine);
}
