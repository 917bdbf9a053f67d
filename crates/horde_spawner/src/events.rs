//! Spawner notifications

use crate::system::SpawnerId;
use crate::volume::SpawnerState;
use horde_ai::AgentId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// Something a spawn volume did this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnerEvent {
    /// Volume moved between states
    StateChanged {
        spawner: SpawnerId,
        from: SpawnerState,
        to: SpawnerState,
    },
    /// A zombie was created by the volume
    ZombieSpawned {
        spawner: SpawnerId,
        agent: AgentId,
        location: Vec3,
    },
    /// Kill quota reached
    Exhausted { spawner: SpawnerId },
    /// Volume came back from exhaustion
    Reactivated { spawner: SpawnerId },
}

impl SpawnerEvent {
    /// Volume the event belongs to
    pub fn spawner(&self) -> SpawnerId {
        match self {
            Self::StateChanged { spawner, .. }
            | Self::ZombieSpawned { spawner, .. }
            | Self::Exhausted { spawner }
            | Self::Reactivated { spawner } => *spawner,
        }
    }
}
