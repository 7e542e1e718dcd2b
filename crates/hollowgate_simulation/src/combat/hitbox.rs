//! Headless spatial queries
//!
//! Аналитическая геометрия вместо полноценной физики: damageable'ы
//! аппроксимируются сферами (DamageableCollider), melee hitbox — AABB,
//! выстрел — sphere cast вдоль луча. Достаточно для детерминированных
//! симуляций и тестов; настоящий broad-phase живёт на стороне engine.

use bevy::prelude::*;

use super::damageable::CategoryMask;

/// Верхняя граница кандидатов одного запроса
pub const MAX_HITS: usize = 10;

/// Результат spatial query по одному damageable
#[derive(Debug, Clone, Copy)]
pub struct SpatialHit {
    pub target: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Melee hitbox: AABB в локальных координатах владельца
#[derive(Component, Debug, Clone, Copy, Reflect)]
pub struct HitBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub mask: CategoryMask,
}

impl HitBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            mask: CategoryMask::ALL,
        }
    }

    pub fn with_mask(mut self, mask: CategoryMask) -> Self {
        self.mask = mask;
        self
    }

    /// Все сферы-кандидаты пересекающие box (clamp ближайшей точки
    /// AABB к центру сферы). candidates: (entity, центр, радиус, слои).
    pub fn overlapping(
        &self,
        origin: Vec3,
        candidates: impl Iterator<Item = (Entity, Vec3, f32, u32)>,
    ) -> Vec<SpatialHit> {
        let box_center = origin + self.center;
        let min = box_center - self.half_extents;
        let max = box_center + self.half_extents;

        let mut hits = Vec::new();
        for (entity, center, radius, layer_bits) in candidates {
            if hits.len() >= MAX_HITS {
                break;
            }
            if !self.mask.matches(layer_bits) {
                continue;
            }
            let closest = center.clamp(min, max);
            let offset = center - closest;
            if offset.length_squared() > radius * radius {
                continue;
            }
            let normal = if offset.length_squared() > 1e-6 {
                offset.normalize()
            } else {
                Vec3::Y
            };
            hits.push(SpatialHit {
                target: entity,
                point: closest,
                normal,
                distance: box_center.distance(center),
            });
        }
        hits
    }
}

/// Sphere cast: сфера радиуса radius летит из origin вдоль dir
/// (нормализованного) на max_range. Кандидаты позади origin отсекаются;
/// касание в момент старта даёт t = 0.
pub fn sphere_cast(
    origin: Vec3,
    dir: Vec3,
    radius: f32,
    max_range: f32,
    mask: CategoryMask,
    candidates: impl Iterator<Item = (Entity, Vec3, f32, u32)>,
) -> Vec<SpatialHit> {
    let mut hits = Vec::new();
    for (entity, center, target_radius, layer_bits) in candidates {
        if hits.len() >= MAX_HITS {
            break;
        }
        if !mask.matches(layer_bits) {
            continue;
        }

        // Ray vs sphere с объединённым радиусом
        let combined = radius + target_radius;
        let to_center = center - origin;
        let proj = to_center.dot(dir);
        let perp_sq = to_center.length_squared() - proj * proj;
        if perp_sq > combined * combined {
            continue;
        }
        let half_chord = (combined * combined - perp_sq).sqrt();
        let t = (proj - half_chord).max(0.0);
        if proj + half_chord < 0.0 || t > max_range {
            continue;
        }

        let point = origin + dir * t;
        let normal = if (point - center).length_squared() > 1e-6 {
            (point - center).normalize()
        } else {
            -dir
        };
        hits.push(SpatialHit {
            target: entity,
            point,
            normal,
            distance: t,
        });
    }
    hits
}
