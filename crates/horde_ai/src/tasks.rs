//! Latent tasks
//!
//! Multi-tick behaviors stored on the agent as explicit progress data and
//! advanced once per tick by the director. Starting a new task replaces
//! whatever was running.

use horde_core::PlayerId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// Outcome of a task tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

/// Where a melee swing is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackPhase {
    /// Wind-up still running
    WindingUp,
    /// Wind-up just elapsed, evaluate the hit probe now
    Strike,
    /// Probe already resolved, hand back to Chase
    Recover,
}

/// Melee attack: wind-up, probe, recover
#[derive(Debug, Clone, PartialEq)]
pub struct AttackTask {
    pub target: PlayerId,
    pub windup_duration: f32,
    pub windup_elapsed: f32,
    pub executed: bool,
}

impl AttackTask {
    pub fn new(target: PlayerId, windup_duration: f32) -> Self {
        Self {
            target,
            windup_duration,
            windup_elapsed: 0.0,
            executed: false,
        }
    }

    /// Accumulate wind-up time and report what to do this tick
    pub fn advance(&mut self, delta: f32) -> AttackPhase {
        if self.executed {
            return AttackPhase::Recover;
        }
        self.windup_elapsed += delta;
        if self.windup_elapsed >= self.windup_duration {
            self.executed = true;
            AttackPhase::Strike
        } else {
            AttackPhase::WindingUp
        }
    }
}

/// Walk to the last known enemy location and look around
#[derive(Debug, Clone, PartialEq)]
pub struct InvestigateTask {
    pub target: Vec3,
    pub reached: bool,
    pub elapsed: f32,
    pub duration: f32,
}

impl InvestigateTask {
    pub fn new(target: Vec3, duration: f32) -> Self {
        Self {
            target,
            reached: false,
            elapsed: 0.0,
            duration,
        }
    }

    /// Accumulate look-around time. Returns true once the linger is over.
    pub fn linger(&mut self, delta: f32) -> bool {
        if !self.reached {
            return false;
        }
        self.elapsed += delta;
        self.elapsed >= self.duration
    }
}

/// The task an agent is currently running
#[derive(Debug, Clone, PartialEq)]
pub enum AgentTask {
    Attack(AttackTask),
    Investigate(InvestigateTask),
}

impl AgentTask {
    pub fn is_attack(&self) -> bool {
        matches!(self, AgentTask::Attack(_))
    }

    pub fn is_investigate(&self) -> bool {
        matches!(self, AgentTask::Investigate(_))
    }
}
