//! Damage information

use horde_core::PlayerId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// Bone name that counts as a headshot
pub const HEAD_BONE: &str = "head";

/// How the damage was delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DamageKind {
    /// Single hit on a specific bone
    Point {
        /// Bone that was hit, if known
        bone: Option<String>,
    },
    /// Area damage (explosions)
    Radial,
}

impl Default for DamageKind {
    fn default() -> Self {
        Self::Point { bone: None }
    }
}

/// Information about a damage instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Damage amount
    pub amount: f32,
    /// Delivery kind
    pub kind: DamageKind,
    /// Player responsible for the damage
    pub instigator: Option<PlayerId>,
    /// World position where damage was applied
    pub hit_point: Option<Vec3>,
}

impl DamageInfo {
    /// Point damage with no bone information
    pub fn point(amount: f32) -> Self {
        Self {
            amount,
            kind: DamageKind::default(),
            instigator: None,
            hit_point: None,
        }
    }

    /// Radial (explosive) damage
    pub fn radial(amount: f32) -> Self {
        Self {
            amount,
            kind: DamageKind::Radial,
            instigator: None,
            hit_point: None,
        }
    }

    /// Set the instigating player
    pub fn with_instigator(mut self, player: PlayerId) -> Self {
        self.instigator = Some(player);
        self
    }

    /// Set the bone that was hit
    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.kind = DamageKind::Point {
            bone: Some(bone.into()),
        };
        self
    }

    /// Set the hit point
    pub fn with_hit_point(mut self, point: Vec3) -> Self {
        self.hit_point = Some(point);
        self
    }

    pub fn is_radial(&self) -> bool {
        matches!(self.kind, DamageKind::Radial)
    }

    pub fn is_headshot(&self) -> bool {
        matches!(&self.kind, DamageKind::Point { bone: Some(bone) } if bone.eq_ignore_ascii_case(HEAD_BONE))
    }
}

impl Default for DamageInfo {
    fn default() -> Self {
        Self::point(0.0)
    }
}
