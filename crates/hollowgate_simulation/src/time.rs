//! Simulation clock + pause
//!
//! GameClock разделяет scaled/unscaled время: пока игра на паузе
//! scaled delta == 0 (state machine и атаки замирают), unscaled delta
//! продолжает идти (для continuations в реальном времени, см. scheduler).

use bevy::prelude::*;

/// Событие: игра поставлена на паузу (fire только на переходе 0 → 1)
#[derive(Event, Debug, Clone, Default)]
pub struct GamePaused;

/// Событие: игра снята с паузы (fire только на переходе 1 → 0)
#[derive(Event, Debug, Clone, Default)]
pub struct GameUnpaused;

/// Счётная пауза: каждый Pause() должен быть сбалансирован Resume().
///
/// Несбалансированный Resume() — invariant violation (debug assert).
#[derive(Resource, Debug, Default)]
pub struct PauseController {
    pause_count: i32,
}

impl PauseController {
    pub fn is_paused(&self) -> bool {
        self.pause_count > 0
    }

    /// Возвращает true если этот вызов включил паузу (переход 0 → 1)
    pub fn pause(&mut self) -> bool {
        self.pause_count += 1;
        self.pause_count == 1
    }

    /// Возвращает true если этот вызов снял паузу (переход 1 → 0)
    pub fn resume(&mut self) -> bool {
        self.pause_count -= 1;
        debug_assert!(self.pause_count >= 0, "PauseController: pause count went below 0");
        self.pause_count <= 0 && self.pause_count + 1 > 0
    }
}

/// Часы симуляции, обновляются раз в FixedUpdate до всех остальных систем
#[derive(Resource, Debug, Clone, Copy)]
pub struct GameClock {
    /// Scaled delta (0 на паузе)
    pub delta: f32,
    /// Unscaled delta (идёт всегда)
    pub unscaled_delta: f32,
    pub time_scale: f32,
    pub paused: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            delta: 0.0,
            unscaled_delta: 0.0,
            time_scale: 1.0,
            paused: false,
        }
    }
}

/// Система: refresh GameClock из Time<Fixed> + PauseController
pub fn update_game_clock(
    time: Res<Time<Fixed>>,
    pause: Res<PauseController>,
    mut clock: ResMut<GameClock>,
) {
    let raw = time.delta_secs();
    clock.paused = pause.is_paused();
    clock.unscaled_delta = raw;
    clock.delta = if clock.paused { 0.0 } else { raw * clock.time_scale };
}

/// Публичный API для host'а: пауза/снятие с эмиссией edge-событий
pub fn request_pause(
    pause: &mut PauseController,
    paused_events: &mut EventWriter<GamePaused>,
) {
    if pause.pause() {
        paused_events.write(GamePaused);
        crate::log("Game paused");
    }
}

pub fn request_resume(
    pause: &mut PauseController,
    unpaused_events: &mut EventWriter<GameUnpaused>,
) {
    if pause.resume() {
        unpaused_events.write(GameUnpaused);
        crate::log("Game unpaused");
    }
}

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PauseController>()
            .init_resource::<GameClock>()
            .add_event::<GamePaused>()
            .add_event::<GameUnpaused>()
            .add_systems(FixedUpdate, update_game_clock.in_set(ClockSet));
    }
}

/// SystemSet: обновление часов — всё остальное планируется после
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockSet;
