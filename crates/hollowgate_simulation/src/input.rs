//! Per-tick input snapshot
//!
//! Host engine опрашивает устройства и заполняет snapshot не чаще
//! одного раза за logic tick. Состояния читают только snapshot —
//! прямого доступа к устройствам у симуляции нет.

use bevy::prelude::*;

pub const ACTION_COUNT: usize = 5;

/// Дискретные действия (buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Attack = 0,
    Aim = 1,
    Reload = 2,
    Run = 3,
    Interact = 4,
}

/// Аналоговые оси
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    Move,
    Look,
}

/// Сырое состояние кнопок за один tick (заполняется host'ом)
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    pub pressed: [bool; ACTION_COUNT],
    pub move_axis: Vec2,
    pub look_axis: Vec2,
}

/// Снимок ввода: down/up edges вычисляются против предыдущего tick'а.
///
/// flush() гасит edges (например после unpause, чтобы кнопка которой
/// закрывали меню не провоцировала атаку).
#[derive(Resource, Debug, Clone, Default)]
pub struct InputSnapshot {
    held: [bool; ACTION_COUNT],
    down: [bool; ACTION_COUNT],
    up: [bool; ACTION_COUNT],
    move_axis: Vec2,
    look_axis: Vec2,
}

impl InputSnapshot {
    /// Принимает сырой frame от host'а; вызывается ровно один раз за tick
    pub fn begin_tick(&mut self, frame: &InputFrame) {
        for i in 0..ACTION_COUNT {
            let was = self.held[i];
            let now = frame.pressed[i];
            self.down[i] = now && !was;
            self.up[i] = !now && was;
            self.held[i] = now;
        }
        self.move_axis = frame.move_axis;
        self.look_axis = frame.look_axis;
    }

    /// Нажата на этом tick'е (edge)
    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action as usize]
    }

    /// Отпущена на этом tick'е (edge)
    pub fn is_up(&self, action: InputAction) -> bool {
        self.up[action as usize]
    }

    /// Удерживается
    pub fn is_held(&self, action: InputAction) -> bool {
        self.held[action as usize]
    }

    pub fn axis(&self, axis: InputAxis) -> Vec2 {
        match axis {
            InputAxis::Move => self.move_axis,
            InputAxis::Look => self.look_axis,
        }
    }

    /// Гасит down/up edges; held и оси не трогаем
    pub fn flush(&mut self) {
        self.down = [false; ACTION_COUNT];
        self.up = [false; ACTION_COUNT];
    }
}

/// Система: после снятия паузы гасим edges — кнопка которой закрывали
/// меню не должна провоцировать атаку
pub fn flush_input_on_unpause(
    mut unpaused: EventReader<crate::time::GameUnpaused>,
    mut input: ResMut<InputSnapshot>,
) {
    if unpaused.read().next().is_some() {
        input.flush();
    }
}
