//! Combat: damageables, attack types, attack resolution
//!
//! Атака — отдельная entity (AttackOwner + компонент вида атаки),
//! запускается событием AttackTriggered и применяет урон через единый
//! pipeline process_attack. Исходы рассылаются событиями
//! (Pre/PostDamage, EntityDied, KnockbackRequested).

use bevy::prelude::*;

pub mod attack;
pub mod attack_type;
pub mod damageable;
pub mod hitbox;
pub mod melee;
pub mod overlap;
pub mod shot;

pub use attack::{
    process_attack, AttackEnded, AttackInfo, AttackNotStarted, AttackOwner, AttackStarted,
    AttackTriggered, CombatQueue, ShellKicked,
};
pub use attack_type::{
    AttackEffect, AttackFilter, AttackImpact, AttackType, KnockbackEffect, LogEffect,
    MaxDistanceFilter, VictimFilter,
};
pub use damageable::{
    CategoryMask, Damageable, DamageableCollider, DamageableKind, EntityDied, KnockbackRequested,
    PostDamage, PreDamage, DEFAULT_LAYER,
};
pub use hitbox::{sphere_cast, HitBox, SpatialHit, MAX_HITS};
pub use melee::MeleeAttack;
pub use overlap::OverlapAttack;
pub use shot::ShotAttack;

/// Combat Plugin
///
/// Порядок выполнения (FixedUpdate, chained):
/// 1. запуск атак по AttackTriggered (melee/overlap окна, выстрелы)
/// 2. тик активных окон (melee, overlap)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttackTriggered>()
            .add_event::<AttackNotStarted>()
            .add_event::<AttackStarted>()
            .add_event::<AttackEnded>()
            .add_event::<ShellKicked>()
            .add_event::<PreDamage>()
            .add_event::<PostDamage>()
            .add_event::<EntityDied>()
            .add_event::<KnockbackRequested>();

        app.add_systems(
            FixedUpdate,
            (
                melee::start_melee_attacks,
                overlap::start_overlap_attacks,
                shot::resolve_shot_attacks,
                melee::tick_melee_attacks,
                overlap::tick_overlap_attacks,
            )
                .chain()
                .in_set(CombatSet),
        );
    }
}

/// SystemSet combat-систем (после машин состояний)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombatSet;
