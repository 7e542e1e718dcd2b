//! Attack impact table
//!
//! AttackType описывает что атака делает каждой категории damageable:
//! урон + упорядоченные filters/effects. Таблица строится один раз при
//! загрузке контента и после этого неизменна (Arc); hot reload — замена
//! Arc на стороне host'а.

use std::collections::HashMap;
use std::sync::Arc;

use super::attack::{AttackInfo, CombatQueue};
use super::damageable::{DamageableKind, KnockbackRequested};

/// Гейт попадания: все filters должны пропустить, первый отказавший
/// обрывает pipeline (silent, не ошибка)
pub trait AttackFilter: Send + Sync {
    fn passes(&self, info: &AttackInfo) -> bool;
}

/// Side-effect до/после урона; пишет в CombatQueue, не видит
/// обновлённый Health
pub trait AttackEffect: Send + Sync {
    fn apply(&self, info: &AttackInfo, queue: &mut CombatQueue);
}

/// Что атака делает одной группе категорий
pub struct AttackImpact {
    pub damage: f32,
    pub kinds: Vec<DamageableKind>,
    pub filters: Vec<Box<dyn AttackFilter>>,
    pub pre_damage_effects: Vec<Box<dyn AttackEffect>>,
    pub post_damage_effects: Vec<Box<dyn AttackEffect>>,
}

impl AttackImpact {
    pub fn new(damage: f32, kinds: Vec<DamageableKind>) -> Self {
        Self {
            damage,
            kinds,
            filters: Vec::new(),
            pre_damage_effects: Vec::new(),
            post_damage_effects: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl AttackFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn with_pre_effect(mut self, effect: impl AttackEffect + 'static) -> Self {
        self.pre_damage_effects.push(Box::new(effect));
        self
    }

    pub fn with_post_effect(mut self, effect: impl AttackEffect + 'static) -> Self {
        self.post_damage_effects.push(Box::new(effect));
        self
    }
}

/// Таблица category → impact. Дубликат категории — ошибка контента
/// (fail fast при сборке).
pub struct AttackType {
    name: String,
    impacts: Vec<AttackImpact>,
    by_kind: HashMap<DamageableKind, usize>,
}

impl AttackType {
    pub fn new(name: impl Into<String>, impacts: Vec<AttackImpact>) -> Arc<Self> {
        let name = name.into();
        let mut by_kind = HashMap::new();
        for (index, impact) in impacts.iter().enumerate() {
            for kind in &impact.kinds {
                let previous = by_kind.insert(*kind, index);
                assert!(
                    previous.is_none(),
                    "AttackType '{}' has a duplicated damageable entry for {:?}",
                    name,
                    kind
                );
            }
        }
        Arc::new(Self {
            name,
            impacts,
            by_kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Отсутствие записи — атака не действует на категорию (no-op)
    pub fn impact_for(&self, kind: DamageableKind) -> Option<&AttackImpact> {
        self.by_kind.get(&kind).map(|&index| &self.impacts[index])
    }
}

// ----------------------------------------------------------------------
// Stock filters / effects

/// Пропускает только конкретную жертву (например захваченного актора —
/// grab-атака не должна задевать остальных в hitbox'е)
pub struct VictimFilter {
    pub victim: bevy::prelude::Entity,
}

impl AttackFilter for VictimFilter {
    fn passes(&self, info: &AttackInfo) -> bool {
        info.victim == self.victim
    }
}

/// Отсекает попадания дальше заданной дистанции (например нож с
/// общим impact table, но коротким реальным охватом)
pub struct MaxDistanceFilter {
    pub max_distance: f32,
}

impl AttackFilter for MaxDistanceFilter {
    fn passes(&self, info: &AttackInfo) -> bool {
        info.distance <= self.max_distance
    }
}

/// Отбрасывает жертву по направлению удара
pub struct KnockbackEffect;

impl AttackEffect for KnockbackEffect {
    fn apply(&self, info: &AttackInfo, queue: &mut CombatQueue) {
        queue.knockbacks.push(KnockbackRequested {
            actor: info.victim,
            direction: info.impact_dir,
        });
    }
}

/// Диагностический effect (контентные хуки вроде звука/декали живут
/// на стороне engine, здесь только лог)
pub struct LogEffect {
    pub message: &'static str,
}

impl AttackEffect for LogEffect {
    fn apply(&self, info: &AttackInfo, _queue: &mut CombatQueue) {
        crate::log(&format!("{} (victim {:?})", self.message, info.victim));
    }
}
