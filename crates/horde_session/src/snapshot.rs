//! Observer snapshots
//!
//! A read-only projection of session state built after each tick for
//! replication to clients.

use crate::session::GameSession;
use horde_ai::{AIState, AgentId};
use horde_combat::FireMode;
use horde_core::PlayerId;
use horde_math::Vec3;
use horde_quest::QuestProgress;
use horde_spawner::SpawnerState;
use serde::{Deserialize, Serialize};

/// Replicated view of one zombie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub enemy_type: String,
    pub state: AIState,
    pub location: Vec3,
    pub health: f32,
    pub walk_speed: f32,
    pub staggered: bool,
}

/// Replicated spawner state and counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerSnapshot {
    pub name: String,
    pub state: SpawnerState,
    pub alive: usize,
    pub kills: u32,
}

/// Replicated player state, score and weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub location: Vec3,
    pub health: f32,
    pub alive: bool,
    pub points: i64,
    pub money: i64,
    pub ammo: Option<u32>,
    pub fire_mode: Option<FireMode>,
}

/// Everything an observer needs to mirror one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub time: f64,
    pub agents: Vec<AgentSnapshot>,
    pub spawners: Vec<SpawnerSnapshot>,
    pub quests: Vec<QuestProgress>,
    pub completed_quests: Vec<String>,
    pub failed_quests: Vec<String>,
    pub players: Vec<PlayerSnapshot>,
}

impl SessionSnapshot {
    /// Copy the authoritative session state into a snapshot
    pub fn project(session: &GameSession) -> Self {
        let agents = session
            .ai()
            .agents()
            .filter(|(_, agent)| !agent.is_dead())
            .map(|(id, agent)| AgentSnapshot {
                id,
                enemy_type: agent.enemy_type.clone(),
                state: agent.state(),
                location: agent.location,
                health: agent.health().current,
                walk_speed: agent.current_walk_speed(),
                staggered: agent.is_staggered(),
            })
            .collect();

        let spawners = session
            .spawners()
            .volumes()
            .map(|(_, volume)| SpawnerSnapshot {
                name: volume.name.clone(),
                state: volume.state(),
                alive: volume.current_alive(),
                kills: volume.total_kills(),
            })
            .collect();

        let players = session
            .players()
            .iter()
            .map(|player| {
                let account = session.ledger().account(player.id);
                PlayerSnapshot {
                    id: player.id,
                    location: player.location,
                    health: player.health.current,
                    alive: player.is_alive(),
                    points: account.points,
                    money: account.money,
                    ammo: player.weapon.as_ref().map(|w| w.loaded_ammo()),
                    fire_mode: player.weapon.as_ref().map(|w| w.fire_mode()),
                }
            })
            .collect();

        Self {
            tick: session.tick_count(),
            time: session.now(),
            agents,
            spawners,
            quests: session.quests().progress_snapshot(),
            completed_quests: session.quests().completed_quest_ids().to_vec(),
            failed_quests: session.quests().failed_quest_ids().to_vec(),
            players,
        }
    }

    /// Serialise for transport
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let points: i64 = self.players.iter().map(|p| p.points).sum();
        format!(
            "tick {} t={:.1}s zombies={} active_quests={} completed_quests={} points={}",
            self.tick,
            self.time,
            self.agents.len(),
            self.quests.len(),
            self.completed_quests.len(),
            points
        )
    }
}
