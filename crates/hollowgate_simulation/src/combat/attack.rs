//! Attack resolution pipeline
//!
//! process_attack — единый путь применения одного попадания:
//! lookup impact → filters → pre-effects → урон (с нотификациями)
//! → post-effects. Урон никогда не применяется к мёртвому (idempotent
//! death); нулевой/отрицательный урон не рождает нотификаций.

use bevy::prelude::*;

use super::attack_type::AttackType;
use super::damageable::{DamageableKind, EntityDied, KnockbackRequested, PostDamage, PreDamage};
use crate::components::{DamageOutcome, Health};

/// Эфемерное описание одного попадания; конструируется на hit,
/// потребляется синхронно, не хранится
#[derive(Debug, Clone, Copy)]
pub struct AttackInfo {
    /// Attack-компонент (entity атаки)
    pub attack: Entity,
    /// Актор-владелец атаки
    pub attacker: Entity,
    /// Damageable-поверхность в которую попали
    pub damageable: Entity,
    /// Актор-владелец поверхности (его Health страдает)
    pub victim: Entity,
    pub kind: DamageableKind,
    pub impact_point: Vec3,
    pub impact_dir: Vec3,
    /// Дистанция от атакующего до цели на момент попадания
    pub distance: f32,
}

impl AttackInfo {
    #[cfg(test)]
    pub(crate) fn test_stub() -> Self {
        Self {
            attack: Entity::PLACEHOLDER,
            attacker: Entity::PLACEHOLDER,
            damageable: Entity::PLACEHOLDER,
            victim: Entity::PLACEHOLDER,
            kind: DamageableKind(0),
            impact_point: Vec3::ZERO,
            impact_dir: Vec3::Z,
            distance: 0.0,
        }
    }
}

/// Связь attack-entity → актор-владелец (явная, вместо parent-поиска)
#[derive(Component, Debug, Clone, Copy, Reflect)]
pub struct AttackOwner {
    pub actor: Entity,
}

/// Event: запустить attack-компонент (из состояния или continuation)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackTriggered {
    pub attack: Entity,
}

/// Event: атака не смогла начаться (пустой магазин и т.п.) —
/// engine-сторона играет no-ammo фидбек
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackNotStarted {
    pub attack: Entity,
}

/// Event: overlap-атака активировалась
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackStarted {
    pub attack: Entity,
}

/// Event: overlap-атака деактивировалась
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackEnded {
    pub attack: Entity,
}

/// Event: отложенный выброс гильзы (визуальный sub-action выстрела)
#[derive(Event, Debug, Clone, Copy)]
pub struct ShellKicked {
    pub attack: Entity,
}

/// Буфер исходящих нотификаций одного прогона pipeline;
/// сливается в события вызывающей системой
#[derive(Default)]
pub struct CombatQueue {
    pub pre_damage: Vec<PreDamage>,
    pub post_damage: Vec<PostDamage>,
    pub deaths: Vec<EntityDied>,
    pub knockbacks: Vec<KnockbackRequested>,
}

impl CombatQueue {
    pub fn flush(
        &mut self,
        pre: &mut EventWriter<PreDamage>,
        post: &mut EventWriter<PostDamage>,
        deaths: &mut EventWriter<EntityDied>,
        knockbacks: &mut EventWriter<KnockbackRequested>,
    ) {
        for event in self.pre_damage.drain(..) {
            pre.write(event);
        }
        for event in self.post_damage.drain(..) {
            post.write(event);
        }
        for event in self.deaths.drain(..) {
            deaths.write(event);
        }
        for event in self.knockbacks.drain(..) {
            knockbacks.write(event);
        }
    }
}

/// Применяет одно попадание.
///
/// Порядок жёсткий:
/// 1. lookup impact по категории (нет записи — no-op);
/// 2. все filters, short-circuit на первом отказе (no-op);
/// 3. pre-damage effects в порядке объявления;
/// 4. урон, только если жертва жива И damage > 0: PreDamage →
///    мутация Health → PostDamage; смерть рождает EntityDied ровно
///    один раз;
/// 5. post-damage effects в порядке объявления.
pub fn process_attack(
    attack_type: &AttackType,
    info: &AttackInfo,
    health: &mut Health,
    queue: &mut CombatQueue,
) {
    let Some(impact) = attack_type.impact_for(info.kind) else {
        return;
    };

    for filter in &impact.filters {
        if !filter.passes(info) {
            return;
        }
    }

    for effect in &impact.pre_damage_effects {
        effect.apply(info, queue);
    }

    if !health.is_dead() && impact.damage > 0.0 {
        queue.pre_damage.push(PreDamage {
            damageable: info.damageable,
            victim: info.victim,
            impact_point: info.impact_point,
            impact_dir: info.impact_dir,
        });

        let outcome = health.take_damage(impact.damage);

        queue.post_damage.push(PostDamage {
            damageable: info.damageable,
            victim: info.victim,
            amount: impact.damage,
            impact_point: info.impact_point,
            impact_dir: info.impact_dir,
        });

        if outcome == DamageOutcome::Died {
            crate::log(&format!(
                "Actor {:?} killed by {:?} ({})",
                info.victim,
                info.attacker,
                attack_type.name()
            ));
            queue.deaths.push(EntityDied {
                entity: info.victim,
                killer: Some(info.attacker),
            });
        }
    }

    for effect in &impact.post_damage_effects {
        effect.apply(info, queue);
    }
}
