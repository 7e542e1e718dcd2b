//! Melee attack
//!
//! Активационное окно: hitbox открыт hit_duration секунд, каждая цель
//! страдает не больше одного раза за активацию. Запуск — событием
//! AttackTriggered (из AttackingState или grab-continuation).

use std::collections::HashSet;
use std::sync::Arc;

use bevy::prelude::*;

use super::attack::{process_attack, AttackInfo, AttackOwner, AttackTriggered, CombatQueue};
use super::attack_type::AttackType;
use super::damageable::{
    Damageable, DamageableCollider, EntityDied, KnockbackRequested, PostDamage, PreDamage,
};
use super::hitbox::HitBox;
use crate::components::Health;
use crate::time::GameClock;

/// Melee-атака; живёт на отдельной attack-entity вместе с AttackOwner
/// и HitBox
#[derive(Component)]
pub struct MeleeAttack {
    pub attack_type: Arc<AttackType>,
    /// Длительность активного окна hitbox'а (сек)
    pub hit_duration: f32,
    time: f32,
    active: bool,
    already_hit: HashSet<Entity>,
}

impl MeleeAttack {
    pub fn new(attack_type: Arc<AttackType>, hit_duration: f32) -> Self {
        Self {
            attack_type,
            hit_duration,
            time: 0.0,
            active: false,
            already_hit: HashSet::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) {
        self.time = 0.0;
        self.active = true;
        self.already_hit.clear();
    }
}

/// Система: AttackTriggered → активация окна
pub fn start_melee_attacks(
    mut triggers: EventReader<AttackTriggered>,
    mut attacks: Query<&mut MeleeAttack>,
) {
    for trigger in triggers.read() {
        let Ok(mut attack) = attacks.get_mut(trigger.attack) else {
            continue;
        };
        attack.activate();
        crate::log(&format!("Melee attack {:?} window opened", trigger.attack));
    }
}

/// Система: тик активных окон — попадания, затем время
///
/// Попадания обрабатываются ДО продвижения времени: окно длиной в один
/// тик всё равно успевает ударить.
pub fn tick_melee_attacks(
    clock: Res<GameClock>,
    mut attacks: Query<(Entity, &mut MeleeAttack, &AttackOwner, &HitBox)>,
    owners: Query<&Transform>,
    damageables: Query<(Entity, &Damageable, &DamageableCollider, &Transform)>,
    mut healths: Query<&mut Health>,
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
            // Своя поверхность и повторы за активацию — skip
            if dmg.owner == owner.actor || attack.already_hit.contains(&hit.target) {
                continue;
            }
            attack.already_hit.insert(hit.target);

            let target_pos = target_transform.translation;
            let impact_dir = (target_pos - origin).normalize_or_zero();
            let info = AttackInfo {
                attack: attack_entity,
                attacker: owner.actor,
                damageable: hit.target,
                victim: dmg.owner,
                kind: dmg.kind,
                // Точка контакта аппроксимируется серединой
                impact_point: (origin + target_pos) * 0.5,
                impact_dir,
                distance: origin.distance(target_pos),
            };

            if let Ok(mut health) = healths.get_mut(dmg.owner) {
                process_attack(&attack.attack_type, &info, &mut health, &mut queue);
            }
        }

        attack.time += clock.delta;
        if attack.time >= attack.hit_duration {
            attack.active = false;
        }
    }

    queue.flush(&mut pre, &mut post, &mut deaths, &mut knockbacks);
}
