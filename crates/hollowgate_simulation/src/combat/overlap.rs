//! Overlap attack
//!
//! Зона непрерывного урона: бьёт всё в hitbox'е сразу при активации и
//! затем повторно каждые damage_rate секунд, пока активна.
//! duration == 0 — одиночный импульс, > 0 — ограниченное окно,
//! < 0 — до внешнего stop (яд, огонь, удержание в захвате).

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use super::attack::{
    process_attack, AttackEnded, AttackInfo, AttackOwner, AttackStarted, AttackTriggered,
    CombatQueue,
};
use super::attack_type::AttackType;
use super::damageable::{
    Damageable, DamageableCollider, EntityDied, KnockbackRequested, PostDamage, PreDamage,
};
use super::hitbox::HitBox;
use crate::components::Health;
use crate::time::GameClock;

#[derive(Component)]
pub struct OverlapAttack {
    pub attack_type: Arc<AttackType>,
    /// Интервал повторного урона по одной цели; <= 0 — один раз
    /// за активацию
    pub damage_rate: f32,
    /// 0 — одиночный импульс, > 0 — окно, < 0 — до stop()
    pub duration: f32,
    elapsed: f32,
    active: bool,
    /// target → elapsed последнего попадания
    last_hit: HashMap<Entity, f32>,
}

impl OverlapAttack {
    pub fn new(attack_type: Arc<AttackType>, damage_rate: f32, duration: f32) -> Self {
        Self {
            attack_type,
            damage_rate,
            duration,
            elapsed: 0.0,
            active: false,
            last_hit: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
        self.last_hit.clear();
    }

    /// Внешняя деактивация (для duration < 0, например конец захвата)
    pub fn stop(&mut self) {
        self.active = false;
    }
}

/// Система: AttackTriggered → активация зоны
pub fn start_overlap_attacks(
    mut triggers: EventReader<AttackTriggered>,
    mut attacks: Query<&mut OverlapAttack>,
    mut started: EventWriter<AttackStarted>,
) {
    for trigger in triggers.read() {
        let Ok(mut attack) = attacks.get_mut(trigger.attack) else {
            continue;
        };
        attack.activate();
        started.write(AttackStarted {
            attack: trigger.attack,
        });
    }
}

/// Система: тик активных зон
pub fn tick_overlap_attacks(
    clock: Res<GameClock>,
    mut attacks: Query<(Entity, &mut OverlapAttack, &AttackOwner, &HitBox)>,
    owners: Query<&Transform>,
    damageables: Query<(Entity, &Damageable, &DamageableCollider, &Transform)>,
    mut healths: Query<&mut Health>,
    mut ended: EventWriter<AttackEnded>,
    mut pre: EventWriter<PreDamage>,
    mut post: EventWriter<PostDamage>,
    mut deaths: EventWriter<EntityDied>,
    mut knockbacks: EventWriter<KnockbackRequested>,
) {
    if clock.paused {
        return;
    }

    let mut queue = CombatQueue::default();

    for (attack_entity, mut attack, owner, hitbox) in attacks.iter_mut() {
        if !attack.active {
            continue;
        }

        let Ok(owner_transform) = owners.get(owner.actor) else {
            continue;
        };
        let origin = owner_transform.translation;

        let candidates = damageables
            .iter()
            .map(|(entity, dmg, collider, transform)| {
                (entity, transform.translation, collider.radius, dmg.layer_bits)
            });

        for hit in hitbox.overlapping(origin, candidates) {
            let Ok((_, dmg, _, target_transform)) = damageables.get(hit.target) else {
                continue;
            };
            if dmg.owner == owner.actor {
                continue;
            }

            let due = match attack.last_hit.get(&hit.target) {
                // Первый контакт цели бьёт немедленно
                None => true,
                Some(&last) => {
                    attack.damage_rate > 0.0 && attack.elapsed - last >= attack.damage_rate
                }
            };
            if !due {
                continue;
            }
            let elapsed = attack.elapsed;
            attack.last_hit.insert(hit.target, elapsed);

            let target_pos = target_transform.translation;
            let info = AttackInfo {
                attack: attack_entity,
                attacker: owner.actor,
                damageable: hit.target,
                victim: dmg.owner,
                kind: dmg.kind,
                impact_point: (origin + target_pos) * 0.5,
                impact_dir: (target_pos - origin).normalize_or_zero(),
                distance: origin.distance(target_pos),
            };

            if let Ok(mut health) = healths.get_mut(dmg.owner) {
                process_attack(&attack.attack_type, &info, &mut health, &mut queue);
            }
        }

        attack.elapsed += clock.delta;

        // duration == 0: импульс закончился сразу после первого прохода
        let expired = attack.duration == 0.0
            || (attack.duration > 0.0 && attack.elapsed >= attack.duration);
        if expired {
            attack.active = false;
            ended.write(AttackEnded {
                attack: attack_entity,
            });
        }
    }

    queue.flush(&mut pre, &mut post, &mut deaths, &mut knockbacks);
}
