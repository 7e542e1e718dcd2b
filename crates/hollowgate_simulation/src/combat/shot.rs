//! Shot attack (hitscan)
//!
//! Sphere cast вдоль взгляда владельца, цели сортируются по дистанции,
//! пуля пробивает не больше penetration значимых целей. Патроны —
//! опциональный счётчик: None — бесконечные (NPC), Some(0) — осечка
//! (AttackNotStarted). Выброс гильзы откладывается через continuation.

use std::sync::Arc;

use bevy::prelude::*;

use super::attack::{
    process_attack, AttackInfo, AttackNotStarted, AttackOwner, AttackTriggered, CombatQueue,
};
use super::attack_type::AttackType;
use super::damageable::{
    CategoryMask, Damageable, DamageableCollider, DamageableKind, EntityDied, KnockbackRequested,
    PostDamage, PreDamage,
};
use super::hitbox::{sphere_cast, SpatialHit};
use crate::components::Health;
use crate::scheduler::{ClockKind, DeferredAction, DeferredActions};
use crate::time::GameClock;

#[derive(Component)]
pub struct ShotAttack {
    pub attack_type: Arc<AttackType>,
    pub cast_radius: f32,
    pub max_range: f32,
    /// Смещение старта луча вперёд от центра владельца (чтобы не
    /// цеплять собственный коллайдер)
    pub forward_offset: f32,
    /// Сколько значимых целей пробивает одна пуля (минимум 1)
    pub penetration: usize,
    pub mask: CategoryMask,
    /// None — бесконечный боезапас
    pub rounds: Option<u32>,
    /// Задержка выброса гильзы после выстрела; <= 0 — без гильзы
    pub shell_kick_delay: f32,
}

impl ShotAttack {
    pub fn new(attack_type: Arc<AttackType>, max_range: f32) -> Self {
        Self {
            attack_type,
            cast_radius: 0.1,
            max_range,
            forward_offset: 0.5,
            penetration: 1,
            mask: CategoryMask::ALL,
            rounds: None,
            shell_kick_delay: 0.0,
        }
    }

    pub fn with_penetration(mut self, penetration: usize) -> Self {
        self.penetration = penetration.max(1);
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn with_shell_kick(mut self, delay: f32) -> Self {
        self.shell_kick_delay = delay;
        self
    }
}

struct SortedHit {
    hit: SpatialHit,
    victim: Entity,
    kind: DamageableKind,
}

/// Система: AttackTriggered → мгновенное разрешение выстрела
pub fn resolve_shot_attacks(
    clock: Res<GameClock>,
    mut triggers: EventReader<AttackTriggered>,
    mut attacks: Query<(&mut ShotAttack, &AttackOwner)>,
    mut owners: Query<(&Transform, &mut DeferredActions)>,
    damageables: Query<(Entity, &Damageable, &DamageableCollider, &Transform)>,
    mut healths: Query<&mut Health>,
    mut not_started: EventWriter<AttackNotStarted>,
    mut pre: EventWriter<PreDamage>,
    mut post: EventWriter<PostDamage>,
    mut deaths: EventWriter<EntityDied>,
    mut knockbacks: EventWriter<KnockbackRequested>,
) {
    if clock.paused {
        return;
    }

    let mut queue = CombatQueue::default();

    for trigger in triggers.read() {
        let Ok((mut shot, owner)) = attacks.get_mut(trigger.attack) else {
            continue;
        };

        if let Some(rounds) = shot.rounds {
            if rounds == 0 {
                not_started.write(AttackNotStarted {
                    attack: trigger.attack,
                });
                continue;
            }
            shot.rounds = Some(rounds - 1);
        }

        let Ok((owner_transform, mut deferred)) = owners.get_mut(owner.actor) else {
            continue;
        };
        let forward = *owner_transform.forward();
        let origin = owner_transform.translation + forward * shot.forward_offset;

        let candidates = damageables
            .iter()
            .map(|(entity, dmg, collider, transform)| {
                (entity, transform.translation, collider.radius, dmg.layer_bits)
            });
        let hits = sphere_cast(
            origin,
            forward,
            shot.cast_radius,
            shot.max_range,
            shot.mask,
            candidates,
        );

        // Сортировка вставкой по дистанции; пробитие считает только
        // цели для которых атака реально что-то делает
        let mut sorted: Vec<SortedHit> = Vec::new();
        for hit in hits {
            let Ok((_, dmg, _, _)) = damageables.get(hit.target) else {
                continue;
            };
            if dmg.owner == owner.actor {
                continue;
            }
            let meaningful = shot
                .attack_type
                .impact_for(dmg.kind)
                .is_some_and(|impact| impact.damage > 0.0);
            if !meaningful {
                continue;
            }

            let entry = SortedHit {
                hit,
                victim: dmg.owner,
                kind: dmg.kind,
            };
            let position = sorted
                .iter()
                .position(|existing| entry.hit.distance < existing.hit.distance);
            match position {
                Some(index) => sorted.insert(index, entry),
                None => sorted.push(entry),
            }
        }

        for entry in sorted.into_iter().take(shot.penetration) {
            let info = AttackInfo {
                attack: trigger.attack,
                attacker: owner.actor,
                damageable: entry.hit.target,
                victim: entry.victim,
                kind: entry.kind,
                impact_point: entry.hit.point,
                impact_dir: -entry.hit.normal,
                distance: entry.hit.distance,
            };
            if let Ok(mut health) = healths.get_mut(entry.victim) {
                process_attack(&shot.attack_type, &info, &mut health, &mut queue);
            }
        }

        if shot.shell_kick_delay > 0.0 {
            deferred.schedule(
                None,
                "shell_kick",
                shot.shell_kick_delay,
                ClockKind::Scaled,
                DeferredAction::ShellKick(trigger.attack),
            );
        }

        crate::log(&format!(
            "Shot attack {:?} fired (rounds left: {:?})",
            trigger.attack, shot.rounds
        ));
    }

    queue.flush(&mut pre, &mut post, &mut deaths, &mut knockbacks);
}
