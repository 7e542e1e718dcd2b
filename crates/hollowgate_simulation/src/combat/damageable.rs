//! Damageable — hittable поверхность актора
//!
//! Принадлежит ровно одному актору-владельцу (health holder) и одной
//! категории. Владелец задаётся явно при спавне, без parent-поиска.

use bevy::prelude::*;

/// Категория damageable-поверхности; определяет какой AttackImpact
/// применится (content-defined, открытый набор id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct DamageableKind(pub u16);

/// Битовая маска слоёв для spatial-фильтрации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const ALL: Self = Self(u32::MAX);

    pub fn matches(&self, layer_bits: u32) -> bool {
        self.0 & layer_bits != 0
    }
}

pub const DEFAULT_LAYER: u32 = 1;

/// Hittable поверхность: категория + актор-владелец (держатель Health)
#[derive(Component, Debug, Clone, Reflect)]
pub struct Damageable {
    pub kind: DamageableKind,
    /// Актор которому принадлежит поверхность (его Health страдает)
    pub owner: Entity,
    pub layer_bits: u32,
}

impl Damageable {
    pub fn new(kind: DamageableKind, owner: Entity) -> Self {
        Self {
            kind,
            owner,
            layer_bits: DEFAULT_LAYER,
        }
    }

    pub fn with_layer(mut self, layer_bits: u32) -> Self {
        self.layer_bits = layer_bits;
        self
    }
}

/// Сфера-коллайдер для headless spatial queries
#[derive(Component, Debug, Clone, Copy, Reflect)]
pub struct DamageableCollider {
    pub radius: f32,
}

impl Default for DamageableCollider {
    fn default() -> Self {
        Self { radius: 0.5 }
    }
}

/// Event: сейчас будет применён урон (до мутации Health)
#[derive(Event, Debug, Clone)]
pub struct PreDamage {
    pub damageable: Entity,
    pub victim: Entity,
    pub impact_point: Vec3,
    pub impact_dir: Vec3,
}

/// Event: урон применён (после мутации Health)
#[derive(Event, Debug, Clone)]
pub struct PostDamage {
    pub damageable: Entity,
    pub victim: Entity,
    pub amount: f32,
    pub impact_point: Vec3,
    pub impact_dir: Vec3,
}

/// Event: актор умер (death-флаг взведён этим уроном)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Event: запрос отброса жертвы (KnockbackEffect → state machine)
#[derive(Event, Debug, Clone)]
pub struct KnockbackRequested {
    pub actor: Entity,
    pub direction: Vec3,
}
