//! Animation command surface (ECS → engine, fire-and-forget)
//!
//! Симуляция не проигрывает анимации сама: состояния пишут
//! AnimationCrossFade события, engine-сторона исполняет их на своем
//! animation graph. Callback'ов нет.

use bevy::prelude::*;

/// Opaque handle состояния аниматора (FNV-1a от имени, аналог
/// Animator.StringToHash — стабилен между запусками)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct AnimHandle(pub u32);

impl AnimHandle {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x01000193);
            i += 1;
        }
        Self(hash)
    }
}

/// Event: cross-fade текущего animation state актора
#[derive(Event, Debug, Clone)]
pub struct AnimationCrossFade {
    pub actor: Entity,
    pub state: AnimHandle,
    /// Длительность блендинга (секунды)
    pub blend_time: f32,
}
