//! Базовые ECS компоненты симуляции
//!
//! - Actor требует Health автоматически (Required Components, Bevy 0.16)
//! - Health с монотонным death-флагом (умерший актор не "воскресает")

use bevy::prelude::*;

/// Актор (игрок, враг) — базовый компонент для живых существ
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, MovementCommand)]
pub struct Actor {
    /// Stable ID фракции (friendly-fire проверки)
    pub faction_id: u64,
}

/// Результат применения урона к Health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Урон не применён (actor мертв или amount <= 0)
    Ignored,
    /// Урон применён, actor жив
    Damaged,
    /// Урон применён и добил актора (death-флаг взведён этим вызовом)
    Died,
}

/// Здоровье актора
///
/// Инварианты:
/// - 0.0 ≤ current ≤ max
/// - dead взводится ровно один раз и никогда не сбрасывается уроном
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    current: f32,
    max: f32,
    dead: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        assert!(max > 0.0, "Health max must be positive, got {}", max);
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Нормализованное здоровье в [0, 1]
    pub fn normalized(&self) -> f32 {
        self.current / self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Применяет урон. Clamp к нулю; переход через ноль взводит death-флаг
    /// ровно один раз. Урон по мертвому и amount <= 0 — no-op.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.dead = true;
            DamageOutcome::Died
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Лечение clamp'ится к max. Мертвого не воскрешает.
    pub fn heal(&mut self, amount: f32) {
        if self.dead || amount <= 0.0 {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    /// Полный restore для загрузки из save-данных (см. save.rs).
    /// Единственный путь которым dead-флаг может быть перезаписан.
    pub(crate) fn restore(&mut self, current: f32, max: f32, dead: bool) {
        assert!(max > 0.0, "Health max must be positive, got {}", max);
        self.max = max;
        self.current = current.clamp(0.0, max);
        self.dead = dead;
    }
}

/// Movement Command — команды движения для engine layer
///
/// Состояния пишут команды, engine-сторона читает и исполняет
/// через свой character controller (Command/Event architecture).
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum MovementCommand {
    /// Стоять на месте
    Idle,
    /// Двигаться в направлении (unit vector, world space)
    Move { direction: Vec3 },
    /// Физический импульс (knockback); затухает на стороне состояния
    Impulse { velocity: Vec3 },
    /// Остановиться немедленно
    Stop,
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}
