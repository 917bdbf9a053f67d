//! Per-session zombie director
//!
//! Owns every agent and its pending timers, and drives them once per world
//! tick against a read-only snapshot of the players.

use crate::agent::{AgentId, ZombieAgent};
use crate::config::ZombieConfig;
use crate::navigation::{random_reachable_point, step_towards, MoveStep};
use crate::perception::{has_line_of_sight, sense_players};
use crate::state_machine::AIState;
use crate::tasks::{AgentTask, AttackPhase, AttackTask, InvestigateTask, TaskStatus};
use horde_combat::DamageInfo;
use horde_core::services::find_player;
use horde_core::{
    Arena, Effect, EffectCue, HordeError, PlayerId, PlayerView, PointKind, Presentation, Result, RewardLedger,
    SpatialQuery, TimerTable,
};
use horde_math::{sweep_sphere_point, Segment, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Attempts when picking a random patrol destination
const PATROL_POINT_ATTEMPTS: u32 = 5;
/// Arrival distance for patrol destinations
const PATROL_ACCEPTANCE: f32 = 50.0;

/// Purpose of a pending per-agent timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentTimer {
    /// No fresh sighting within the lose-sight window
    LoseSight,
    /// Periodic line-of-sight poll
    LosPoll,
    /// Periodic enemy-dead service
    EnemyDeadService,
    /// End of the stagger overlay
    Stagger,
    /// End of the anger overlay
    Anger,
    /// Corpse removal
    Despawn,
}

/// Notifications produced while updating agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiEvent {
    /// Agent entered the arena
    Spawned {
        agent: AgentId,
    },
    StateChanged {
        agent: AgentId,
        from: AIState,
        to: AIState,
    },
    /// A melee swing connected. The owner of player health applies it.
    PlayerHit {
        agent: AgentId,
        player: PlayerId,
        damage: f32,
    },
    /// Death path ran. Drives spawner kill counts and quest reports.
    Killed {
        agent: AgentId,
        killer: Option<PlayerId>,
        headshot: bool,
        enemy_type: String,
        location: Vec3,
    },
    /// Corpse removed; the id is now stale
    Removed {
        agent: AgentId,
    },
}

/// Services and frame data the director needs while updating
pub struct AiContext<'a> {
    pub world: &'a dyn SpatialQuery,
    pub players: &'a [PlayerView],
    pub fx: &'a mut dyn Presentation,
    pub rewards: &'a mut dyn RewardLedger,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> AiContext<'a> {
    /// Bundle the frame's services
    pub fn new(
        world: &'a dyn SpatialQuery,
        players: &'a [PlayerView],
        fx: &'a mut dyn Presentation,
        rewards: &'a mut dyn RewardLedger,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            world,
            players,
            fx,
            rewards,
            rng,
        }
    }
}

/// Options for a new agent
#[derive(Debug, Clone)]
pub struct SpawnParams {
    /// Subtype name, matched by kill-type quest objectives
    pub enemy_type: String,
    pub location: Vec3,
    pub facing: Vec3,
    pub patrol_tag: Option<String>,
}

impl SpawnParams {
    /// Spawn `enemy_type` at `location`, facing +X
    pub fn new(enemy_type: impl Into<String>, location: Vec3) -> Self {
        Self {
            enemy_type: enemy_type.into(),
            location,
            facing: Vec3::X,
            patrol_tag: None,
        }
    }

    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_patrol_tag(mut self, tag: Option<String>) -> Self {
        self.patrol_tag = tag;
        self
    }
}

/// Zombie director
pub struct HordeAi {
    config: ZombieConfig,
    agents: Arena<ZombieAgent>,
    timers: TimerTable<(AgentId, AgentTimer)>,
    events: Vec<AiEvent>,
}

impl Default for HordeAi {
    fn default() -> Self {
        Self::new(ZombieConfig::default())
    }
}

impl HordeAi {
    /// Create an empty director using `config` for every agent
    pub fn new(config: ZombieConfig) -> Self {
        Self {
            config,
            agents: Arena::new(),
            timers: TimerTable::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ZombieConfig {
        &self.config
    }

    /// Look up an agent. Stale ids resolve to `None`.
    pub fn agent(&self, id: AgentId) -> Option<&ZombieAgent> {
        self.agents.get(id)
    }

    /// Look up an agent, failing with [`HordeError::AgentNotFound`]
    pub fn agent_checked(&self, id: AgentId) -> Result<&ZombieAgent> {
        self.agents
            .get(id)
            .ok_or_else(|| HordeError::AgentNotFound(id.to_string()))
    }

    /// Iterate every agent, corpses included
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &ZombieAgent)> {
        self.agents.iter()
    }

    /// Number of agents, dead ones included until their corpse is removed
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether the id resolves to a living agent
    pub fn is_alive(&self, id: AgentId) -> bool {
        self.agents.get(id).is_some_and(|a| !a.is_dead())
    }

    /// Number of agents that are not dead
    pub fn living_count(&self) -> usize {
        self.agents.iter().filter(|(_, a)| !a.is_dead()).count()
    }

    /// Whether `timer` is scheduled for `id`
    pub fn is_timer_pending(&self, id: AgentId, timer: AgentTimer) -> bool {
        self.timers.is_pending((id, timer))
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<AiEvent> {
        std::mem::take(&mut self.events)
    }

    /// Create an agent, rolling its speed multiplier and first cooldown
    pub fn spawn(&mut self, params: SpawnParams, now: f64, rng: &mut dyn RngCore) -> AgentId {
        let multiplier = self.config.speed_multiplier.sample(rng);
        let cooldown = self.config.attack_cooldown.sample(rng);
        let agent = ZombieAgent::new(params.enemy_type, params.location, multiplier, cooldown, &self.config)
            .with_facing(params.facing)
            .with_patrol_tag(params.patrol_tag);

        let id = self.agents.insert(agent);
        self.timers
            .schedule_repeating((id, AgentTimer::LosPoll), now, self.config.los_check_interval as f64);
        self.timers
            .schedule_repeating((id, AgentTimer::EnemyDeadService), now, self.config.enemy_dead_interval as f64);

        log::debug!("Spawned zombie {} at {:?}", id, params.location);
        self.events.push(AiEvent::Spawned { agent: id });
        id
    }

    /// Remove an agent immediately
    pub fn despawn(&mut self, id: AgentId) -> bool {
        self.timers.cancel_where(|(agent, _)| *agent == id);
        if self.agents.remove(id).is_some() {
            log::debug!("Removed zombie {}", id);
            self.events.push(AiEvent::Removed { agent: id });
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Perception
    // ------------------------------------------------------------------

    /// Sight sense reported a player
    pub fn enemy_in_sight(&mut self, id: AgentId, player: &PlayerView, now: f64, ctx: &mut AiContext<'_>) {
        if !player.alive {
            return;
        }
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_dead() {
            return;
        }

        let lose_after = self.config.lose_sight_time.sample(ctx.rng);
        self.timers.schedule((id, AgentTimer::LoseSight), now, lose_after as f64);

        agent.set_last_known_enemy_location(player.location);
        agent.time_since_lost_los = 0.0;
        agent.had_los_last_check = true;
        agent.enemy = Some(player.id);

        if !matches!(agent.state, AIState::Attack | AIState::Staggered) {
            agent.set_state(AIState::Chase, &self.config, ctx.fx);
        }
        self.flush(id);
    }

    /// Lose-sight window expired without a new sighting
    pub fn clear_sight(&mut self, id: AgentId, fx: &mut dyn Presentation) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        agent.enemy = None;
        let next = if agent.has_last_known_enemy_location() {
            AIState::Alert
        } else {
            AIState::Patrol
        };
        agent.set_state(next, &self.config, fx);
        self.flush(id);
    }

    /// Periodic poll: refresh the last known location or give up the chase
    pub fn check_line_of_sight(&mut self, id: AgentId, ctx: &mut AiContext<'_>) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.state != AIState::Chase {
            return;
        }
        let Some(enemy) = agent.enemy else {
            return;
        };

        let target = find_player(ctx.players, enemy);
        let has_los = target.is_some_and(|p| has_line_of_sight(agent, p, ctx.world, &self.config));

        if has_los {
            if let Some(p) = target {
                agent.set_last_known_enemy_location(p.location);
            }
            agent.time_since_lost_los = 0.0;
        } else if agent.time_since_lost_los > self.config.los_lost_threshold {
            agent.set_state(AIState::Alert, &self.config, ctx.fx);
            agent.enemy = None;
            self.timers.cancel((id, AgentTimer::LoseSight));
        }
        agent.had_los_last_check = has_los;
        self.flush(id);
    }

    /// Periodic enemy bookkeeping
    pub fn enemy_dead_service(&mut self, id: AgentId, ctx: &mut AiContext<'_>) {
        let config = &self.config;
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_dead() {
            return;
        }

        let state = agent.state;
        match agent.enemy {
            Some(enemy) => match find_player(ctx.players, enemy).filter(|p| p.alive) {
                None => {
                    agent.enemy = None;
                    let next = if agent.has_last_known_enemy_location() {
                        AIState::Alert
                    } else {
                        AIState::Patrol
                    };
                    agent.set_state(next, config, ctx.fx);
                }
                Some(player) => {
                    agent.set_last_known_enemy_location(player.location);
                    if matches!(state, AIState::Patrol | AIState::Alert | AIState::Idle) {
                        agent.set_state(AIState::Chase, config, ctx.fx);
                    }
                    if state == AIState::Chase
                        && !has_line_of_sight(agent, player, ctx.world, config)
                        && agent.time_since_lost_los > config.los_lost_threshold
                    {
                        agent.enemy = None;
                        self.timers.cancel((id, AgentTimer::LoseSight));
                        agent.set_state(AIState::Alert, config, ctx.fx);
                    }
                }
            },
            None => {
                if state == AIState::Chase {
                    let next = if agent.has_last_known_enemy_location() {
                        AIState::Alert
                    } else {
                        AIState::Patrol
                    };
                    agent.set_state(next, config, ctx.fx);
                }
            }
        }
        self.flush(id);
    }

    // ------------------------------------------------------------------
    // Hit reactions
    // ------------------------------------------------------------------

    /// Force the Staggered overlay. Ignored while already staggered.
    pub fn apply_stagger(&mut self, id: AgentId, now: f64, fx: &mut dyn Presentation) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_staggered || agent.is_dead() {
            return;
        }

        // Enter the state before raising the flag, the flag blocks the transition
        agent.set_state(AIState::Staggered, &self.config, fx);
        agent.is_staggered = true;
        agent.task = None;

        self.timers
            .schedule((id, AgentTimer::Stagger), now, self.config.stagger_duration as f64);
        self.flush(id);
    }

    /// Stagger timeout: resume chasing, investigating or patrolling
    pub fn end_stagger(&mut self, id: AgentId, players: &[PlayerView], fx: &mut dyn Presentation) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        agent.is_staggered = false;

        let enemy_alive = agent
            .enemy
            .and_then(|e| find_player(players, e))
            .is_some_and(|p| p.alive);
        let next = if enemy_alive {
            AIState::Chase
        } else if agent.has_last_known_enemy_location() {
            AIState::Alert
        } else {
            AIState::Patrol
        };
        agent.set_state(next, &self.config, fx);
        self.flush(id);
    }

    /// Temporary speed boost. Refused while staggered.
    pub fn apply_anger(&mut self, id: AgentId, now: f64) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_staggered || agent.is_dead() {
            return;
        }

        agent.is_angered = true;
        agent.refresh_target_speed(&self.config);
        self.timers
            .schedule((id, AgentTimer::Anger), now, self.config.anger_duration as f64);
    }

    /// Drop the anger boost and restore the state speed
    pub fn end_anger(&mut self, id: AgentId) {
        if let Some(agent) = self.agents.get_mut(id) {
            agent.is_angered = false;
            agent.refresh_target_speed(&self.config);
        }
    }

    /// Roll stagger versus anger for a non-lethal hit
    pub fn process_hit_reaction(&mut self, id: AgentId, now: f64, ctx: &mut AiContext<'_>) {
        let chance = self.config.stagger_chance.clamp(0.0, 1.0) as f64;
        if ctx.rng.random_bool(chance) {
            self.apply_stagger(id, now, ctx.fx);
        } else {
            self.apply_anger(id, now);
        }
    }

    // ------------------------------------------------------------------
    // Damage and death
    // ------------------------------------------------------------------

    /// Apply damage to an agent. Returns false when the agent is missing or
    /// already dead.
    pub fn apply_damage(&mut self, id: AgentId, damage: &DamageInfo, now: f64, ctx: &mut AiContext<'_>) -> bool {
        let Some(agent) = self.agents.get_mut(id) else {
            log::warn!("Damage for unknown zombie {}", id);
            return false;
        };
        if agent.is_dead() {
            return false;
        }

        if damage.is_radial() {
            self.kill(id, damage.instigator, PointKind::Casual, now, ctx);
        } else if damage.is_headshot() {
            let head = damage.hit_point.unwrap_or_else(|| agent.eye_location(&self.config));
            ctx.fx
                .play(EffectCue::new(Effect::Headshot, head).with_source(id.to_bits()));
            self.kill(id, damage.instigator, PointKind::Headshot, now, ctx);
        } else {
            let (_, died) = agent.health.apply_damage(damage.amount);
            if died {
                self.finish_death(id, damage.instigator, PointKind::Casual, now, ctx);
            } else {
                self.process_hit_reaction(id, now, ctx);
            }
        }
        true
    }

    /// Terminal death path: effects, reward, removal after the grace delay
    pub fn kill(&mut self, id: AgentId, killer: Option<PlayerId>, kind: PointKind, now: f64, ctx: &mut AiContext<'_>) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_dead() {
            return;
        }
        agent.health.kill();
        self.finish_death(id, killer, kind, now, ctx);
    }

    /// Death effects, reward, events and removal for an agent whose health
    /// is already exhausted.
    fn finish_death(&mut self, id: AgentId, killer: Option<PlayerId>, kind: PointKind, now: f64, ctx: &mut AiContext<'_>) {
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        agent.task = None;
        agent.enemy = None;
        agent.patrol_goal = None;
        agent.players_in_range.clear();
        agent.is_staggered = false;
        agent.is_angered = false;
        if agent.chase_breathing {
            agent.chase_breathing = false;
            ctx.fx
                .play(EffectCue::new(Effect::ChaseBreathingStop, agent.location).with_source(id.to_bits()));
        }
        ctx.fx
            .play(EffectCue::new(Effect::Death, agent.location).with_source(id.to_bits()));

        let headshot = kind == PointKind::Headshot;
        if let Some(player) = killer {
            let reward = if headshot {
                self.config.headshot_reward
            } else {
                self.config.body_kill_reward
            };
            ctx.rewards.award_points(player, reward, kind);
        }

        let event = AiEvent::Killed {
            agent: id,
            killer,
            headshot,
            enemy_type: agent.enemy_type.clone(),
            location: agent.location,
        };

        self.timers.cancel_where(|(agent, _)| *agent == id);
        self.timers
            .schedule((id, AgentTimer::Despawn), now, self.config.corpse_grace_delay as f64);

        log::info!("Zombie {} killed (headshot: {}, killer: {:?})", id, headshot, killer);
        self.flush(id);
        self.events.push(event);
    }

    // ------------------------------------------------------------------
    // Melee
    // ------------------------------------------------------------------

    /// Begin a melee attack on the tracked enemy.
    ///
    /// Rejected when dead, staggered, on cooldown, or without a living
    /// target. Any running task is abandoned.
    pub fn try_attack(&mut self, id: AgentId, now: f64, ctx: &mut AiContext<'_>) -> bool {
        let Some(agent) = self.agents.get_mut(id) else {
            return false;
        };
        if agent.is_dead() || agent.is_staggered || !agent.can_attack(now) {
            return false;
        }
        let Some(target) = agent
            .enemy
            .and_then(|e| find_player(ctx.players, e))
            .filter(|p| p.alive)
        else {
            return false;
        };

        let windup = self.config.attack_windup.sample(ctx.rng);
        agent.face_towards(target.location);
        agent.set_state(AIState::Attack, &self.config, ctx.fx);
        ctx.fx
            .play(EffectCue::new(Effect::AttackStart, agent.attack_origin(&self.config)).with_source(id.to_bits()));
        agent.task = Some(AgentTask::Attack(AttackTask::new(target.id, windup)));

        log::trace!("Zombie {} winding up on {:?} for {:.2}s", id, target.id, windup);
        self.flush(id);
        true
    }

    /// Evaluate the swing probe and restart the cooldown
    fn perform_attack(&mut self, id: AgentId, now: f64, ctx: &mut AiContext<'_>) {
        let config = &self.config;
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_dead() {
            return;
        }

        let origin = agent.attack_origin(config);
        let probe = Segment::new(origin, origin + agent.facing * config.attack_reach);

        let struck = ctx
            .players
            .iter()
            .filter(|p| p.alive)
            .map(|p| {
                let top = p.location.z + config.player_capsule_half_height * 2.0;
                let point = Vec3::new(p.location.x, p.location.y, origin.z.clamp(p.location.z, top));
                (p, point)
            })
            .filter(|(_, point)| {
                sweep_sphere_point(&probe, config.attack_sweep_radius, *point, config.player_capsule_radius)
                    && ctx.world.has_clear_line(origin, *point)
            })
            .min_by(|a, b| a.1.distance_squared(origin).total_cmp(&b.1.distance_squared(origin)));

        if let Some((player, point)) = struck {
            let damage = config.attack_damage.sample(ctx.rng);
            ctx.fx
                .play(EffectCue::new(Effect::AttackHit, point).with_source(id.to_bits()));
            self.events.push(AiEvent::PlayerHit {
                agent: id,
                player: player.id,
                damage,
            });
            log::debug!("Zombie {} hit {:?} for {:.1}", id, player.id, damage);
        }

        let next_cooldown = config.attack_cooldown.sample(ctx.rng);
        agent.reset_attack_cooldown(now, next_cooldown);
    }

    // ------------------------------------------------------------------
    // Investigation
    // ------------------------------------------------------------------

    /// Start walking to the last known enemy location
    pub fn start_investigate(&mut self, id: AgentId, ctx: &mut AiContext<'_>) -> TaskStatus {
        let config = &self.config;
        let Some(agent) = self.agents.get_mut(id) else {
            return TaskStatus::Failed;
        };
        let Some(target) = agent.last_known_enemy_location else {
            return TaskStatus::Failed;
        };

        let duration = config.investigate_duration.sample(ctx.rng);
        agent.set_state(AIState::Alert, config, ctx.fx);

        let status = match ctx.world.project_to_nav(target, config.nav_extent) {
            Some(_) => {
                agent.task = Some(AgentTask::Investigate(InvestigateTask::new(target, duration)));
                TaskStatus::Running
            }
            None => {
                log::debug!("Zombie {} cannot reach {:?}, giving up", id, target);
                agent.clear_last_known_enemy_location();
                agent.set_state(AIState::Patrol, config, ctx.fx);
                TaskStatus::Failed
            }
        };
        self.flush(id);
        status
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance every agent by one world tick
    pub fn update(&mut self, now: f64, delta: f32, ctx: &mut AiContext<'_>) {
        for (id, timer) in self.timers.drain_due(now) {
            self.on_timer(id, timer, ctx);
        }

        for id in self.agents.handles() {
            self.tick_agent(id, now, delta, ctx);
            self.flush(id);
        }
    }

    fn on_timer(&mut self, id: AgentId, timer: AgentTimer, ctx: &mut AiContext<'_>) {
        log::trace!("Zombie {} timer {:?} fired", id, timer);
        match timer {
            AgentTimer::LoseSight => self.clear_sight(id, ctx.fx),
            AgentTimer::LosPoll => self.check_line_of_sight(id, ctx),
            AgentTimer::EnemyDeadService => self.enemy_dead_service(id, ctx),
            AgentTimer::Stagger => self.end_stagger(id, ctx.players, ctx.fx),
            AgentTimer::Anger => self.end_anger(id),
            AgentTimer::Despawn => {
                self.despawn(id);
            }
        }
    }

    fn tick_agent(&mut self, id: AgentId, now: f64, delta: f32, ctx: &mut AiContext<'_>) {
        let sensed = {
            let config = &self.config;
            let Some(agent) = self.agents.get_mut(id) else {
                return;
            };
            if agent.is_dead() {
                return;
            }

            // Line-of-sight accumulation shares the predicate with the poll
            if agent.state == AIState::Chase {
                let has_los = agent
                    .enemy
                    .and_then(|e| find_player(ctx.players, e))
                    .is_some_and(|p| has_line_of_sight(agent, p, ctx.world, config));
                if has_los {
                    agent.time_since_lost_los = 0.0;
                } else {
                    agent.time_since_lost_los += delta;
                }
            }

            sense_players(agent, ctx.players, ctx.world, config).cloned()
        };

        if let Some(player) = sensed {
            self.enemy_in_sight(id, &player, now, ctx);
        }

        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        update_players_in_range(agent, ctx.players, &self.config);
        agent.update_speed_interpolation(delta, &self.config);
        let step = move_agent(agent, delta, &self.config, ctx);

        self.advance_task(id, step, now, delta, ctx);
    }

    fn advance_task(&mut self, id: AgentId, step: Option<MoveStep>, now: f64, delta: f32, ctx: &mut AiContext<'_>) {
        let config = &self.config;
        let Some(agent) = self.agents.get_mut(id) else {
            return;
        };
        if agent.is_staggered {
            return;
        }

        match agent.task.take() {
            Some(AgentTask::Attack(mut task)) => match task.advance(delta) {
                AttackPhase::WindingUp => agent.task = Some(AgentTask::Attack(task)),
                AttackPhase::Strike => {
                    agent.task = Some(AgentTask::Attack(task));
                    self.perform_attack(id, now, ctx);
                }
                AttackPhase::Recover => {
                    let next = if agent.enemy.is_some() {
                        AIState::Chase
                    } else if agent.has_last_known_enemy_location() {
                        AIState::Alert
                    } else {
                        AIState::Patrol
                    };
                    agent.set_state(next, config, ctx.fx);
                }
            },
            Some(AgentTask::Investigate(mut task)) => {
                if agent.enemy.is_some() {
                    agent.set_state(AIState::Chase, config, ctx.fx);
                    return;
                }

                if !task.reached {
                    let close = agent.location.distance(task.target) <= config.investigate_acceptance_radius;
                    let stalled = matches!(step, Some(MoveStep::Arrived) | Some(MoveStep::Blocked));
                    task.reached = close || stalled;
                }

                if task.linger(delta) {
                    agent.clear_last_known_enemy_location();
                    agent.set_state(AIState::Patrol, config, ctx.fx);
                } else {
                    agent.task = Some(AgentTask::Investigate(task));
                }
            }
            None => {
                let wants_attack = agent.enemy.is_some_and(|e| {
                    agent.is_player_in_range(e) && find_player(ctx.players, e).is_some_and(|p| p.alive)
                }) && agent.can_attack(now);
                let wants_investigate =
                    agent.state == AIState::Alert && agent.enemy.is_none() && agent.has_last_known_enemy_location();

                if wants_attack {
                    self.try_attack(id, now, ctx);
                } else if wants_investigate {
                    self.start_investigate(id, ctx);
                }
            }
        }
    }

    fn flush(&mut self, id: AgentId) {
        if let Some(agent) = self.agents.get_mut(id) {
            for change in agent.take_transitions() {
                self.events.push(AiEvent::StateChanged {
                    agent: id,
                    from: change.from,
                    to: change.to,
                });
            }
        }
    }
}

/// Track living players entering and leaving the range sphere
fn update_players_in_range(agent: &mut ZombieAgent, players: &[PlayerView], config: &ZombieConfig) {
    let center = agent.range_center(config);
    let radius_sq = config.player_range_radius * config.player_range_radius;

    for player in players {
        let inside = player.alive && player.location.distance_squared(center) <= radius_sq;
        let tracked = agent.players_in_range.contains(&player.id);
        if inside && !tracked {
            log::trace!("{:?} entered zombie range", player.id);
            agent.players_in_range.insert(player.id);
        } else if !inside && tracked {
            log::trace!("{:?} left zombie range", player.id);
            agent.players_in_range.remove(&player.id);
        }
    }

    // Players that left the session
    agent
        .players_in_range
        .retain(|id| players.iter().any(|p| p.id == *id));
}

/// Move toward the goal for the current state
fn move_agent(agent: &mut ZombieAgent, delta: f32, config: &ZombieConfig, ctx: &mut AiContext<'_>) -> Option<MoveStep> {
    let goal = match agent.state {
        AIState::Chase | AIState::Staggered => agent
            .enemy
            .and_then(|e| find_player(ctx.players, e))
            .filter(|p| p.alive)
            .map(|p| (p.location, config.chase_stop_distance)),
        AIState::Alert => match &agent.task {
            Some(AgentTask::Investigate(task)) if !task.reached => {
                Some((task.target, config.investigate_acceptance_radius))
            }
            _ => None,
        },
        AIState::Patrol => {
            if agent.patrol_goal.is_none() {
                agent.patrol_goal = random_reachable_point(
                    ctx.world,
                    agent.home,
                    config.patrol_radius,
                    config.nav_extent,
                    PATROL_POINT_ATTEMPTS,
                    ctx.rng,
                );
            }
            agent.patrol_goal.map(|g| (g, PATROL_ACCEPTANCE))
        }
        AIState::Idle | AIState::Attack => None,
    };

    let (goal, stop_distance) = goal?;
    let step = step_towards(
        ctx.world,
        agent.location,
        goal,
        stop_distance,
        agent.current_walk_speed,
        delta,
        config.nav_extent,
    );

    match step {
        MoveStep::Moved(point) => {
            agent.face_towards(goal);
            agent.location = point;
        }
        MoveStep::Arrived => agent.face_towards(goal),
        MoveStep::Blocked => {}
    }
    if agent.state == AIState::Patrol && !matches!(step, MoveStep::Moved(_)) {
        agent.patrol_goal = None;
    }
    Some(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_combat::DamageInfo;
    use horde_core::{BoxWorld, EffectLog, PointsLedger};
    use horde_math::Aabb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Harness {
        ai: HordeAi,
        world: BoxWorld,
        players: Vec<PlayerView>,
        fx: EffectLog,
        ledger: PointsLedger,
        rng: StdRng,
    }

    impl Harness {
        fn new(config: ZombieConfig) -> Self {
            Self {
                ai: HordeAi::new(config),
                world: BoxWorld::new(5000.0),
                players: Vec::new(),
                fx: EffectLog::new(),
                ledger: PointsLedger::new(),
                rng: StdRng::seed_from_u64(42),
            }
        }

        fn stationary() -> Self {
            Self::new(ZombieConfig {
                patrol_radius: 0.0,
                ..Default::default()
            })
        }

        fn spawn(&mut self, location: Vec3) -> AgentId {
            self.ai.spawn(SpawnParams::new("walker", location), 0.0, &mut self.rng)
        }

        fn with_ctx<R>(&mut self, f: impl FnOnce(&mut HordeAi, &mut AiContext<'_>) -> R) -> R {
            let mut ctx = AiContext::new(&self.world, &self.players, &mut self.fx, &mut self.ledger, &mut self.rng);
            f(&mut self.ai, &mut ctx)
        }

        /// Run ticks `from..=to` at 10 Hz
        fn run(&mut self, from: u32, to: u32) {
            for tick in from..=to {
                let now = tick as f64 / 10.0;
                self.with_ctx(|ai, ctx| ai.update(now, 0.1, ctx));
            }
        }

        fn agent(&self, id: AgentId) -> &ZombieAgent {
            self.ai.agent(id).unwrap()
        }
    }

    #[test]
    fn test_sighting_starts_chase() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        h.players.push(PlayerView::new(PlayerId(1), Vec3::new(500.0, 0.0, 0.0)));

        h.run(1, 1);

        let zed = h.agent(id);
        assert_eq!(zed.state(), AIState::Chase);
        assert_eq!(zed.enemy(), Some(PlayerId(1)));
        assert!((zed.target_walk_speed() - 500.0 * zed.base_speed_multiplier()).abs() < 1e-3);
        assert!(h.fx.contains(Effect::ChaseBreathingStart));
        assert!(h.ai.is_timer_pending(id, AgentTimer::LoseSight));
        assert!(h.ai.drain_events().contains(&AiEvent::StateChanged {
            agent: id,
            from: AIState::Patrol,
            to: AIState::Chase,
        }));
    }

    #[test]
    fn test_lost_line_of_sight_goes_alert() {
        let mut h = Harness::stationary();
        h.world
            .add_obstacle(Aabb::new(Vec3::new(300.0, -1000.0, 0.0), Vec3::new(350.0, 1000.0, 400.0)));
        let id = h.spawn(Vec3::ZERO);
        h.players.push(PlayerView::new(PlayerId(1), Vec3::new(250.0, 0.0, 0.0)));

        h.run(1, 1);
        assert_eq!(h.agent(id).state(), AIState::Chase);

        // Player ducks behind the wall
        h.players[0].location = Vec3::new(800.0, 0.0, 0.0);
        h.run(2, 20);
        assert_eq!(h.agent(id).state(), AIState::Chase);
        assert!(h.agent(id).time_since_lost_los() > 1.5);

        h.run(21, 30);
        let zed = h.agent(id);
        assert_eq!(zed.state(), AIState::Alert);
        assert_eq!(zed.enemy(), None);
        assert!(zed.has_last_known_enemy_location());
    }

    #[test]
    fn test_lose_sight_timer_clears_enemy() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let player = PlayerView::new(PlayerId(1), Vec3::new(500.0, 0.0, 0.0));

        h.with_ctx(|ai, ctx| ai.enemy_in_sight(id, &player, 0.0, ctx));
        assert_eq!(h.agent(id).state(), AIState::Chase);

        h.with_ctx(|ai, ctx| ai.clear_sight(id, ctx.fx));
        assert_eq!(h.agent(id).enemy(), None);
        assert_eq!(h.agent(id).state(), AIState::Alert);
    }

    #[test]
    fn test_dead_player_is_not_sighted() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let corpse = PlayerView::new(PlayerId(1), Vec3::new(300.0, 0.0, 0.0)).dead();

        h.with_ctx(|ai, ctx| ai.enemy_in_sight(id, &corpse, 0.0, ctx));
        assert_eq!(h.agent(id).state(), AIState::Patrol);
        assert_eq!(h.agent(id).enemy(), None);
    }

    #[test]
    fn test_stagger_overrides_transitions() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let player = PlayerView::new(PlayerId(1), Vec3::new(500.0, 0.0, 0.0));
        h.players.push(player.clone());

        h.with_ctx(|ai, ctx| ai.apply_stagger(id, 0.0, ctx.fx));
        assert_eq!(h.agent(id).state(), AIState::Staggered);
        assert!(h.agent(id).is_staggered());

        // Sighting while staggered records the enemy but keeps the state
        h.with_ctx(|ai, ctx| ai.enemy_in_sight(id, &player, 0.1, ctx));
        assert_eq!(h.agent(id).state(), AIState::Staggered);
        assert_eq!(h.agent(id).enemy(), Some(PlayerId(1)));

        // Re-applying does not extend the window
        h.with_ctx(|ai, ctx| ai.apply_stagger(id, 0.3, ctx.fx));
        h.run(4, 4);
        assert!(h.agent(id).is_staggered());

        h.run(5, 5);
        assert!(!h.agent(id).is_staggered());
        assert_eq!(h.agent(id).state(), AIState::Chase);
    }

    #[test]
    fn test_stagger_ends_in_patrol_without_enemy() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);

        h.with_ctx(|ai, ctx| ai.apply_stagger(id, 0.0, ctx.fx));
        assert!((h.agent(id).target_walk_speed() - 100.0 * h.agent(id).base_speed_multiplier()).abs() < 1e-3);

        h.run(5, 5);
        assert_eq!(h.agent(id).state(), AIState::Patrol);
    }

    #[test]
    fn test_anger_burst() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let base = h.agent(id).target_walk_speed();

        h.ai.apply_anger(id, 0.0);
        assert!(h.agent(id).is_angered());
        assert!((h.agent(id).target_walk_speed() - base * 1.2).abs() < 1e-3);
        assert_eq!(h.agent(id).state(), AIState::Patrol);

        h.run(10, 10);
        assert!(!h.agent(id).is_angered());
        assert!((h.agent(id).target_walk_speed() - base).abs() < 1e-3);
    }

    #[test]
    fn test_anger_refused_while_staggered() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);

        h.with_ctx(|ai, ctx| ai.apply_stagger(id, 0.0, ctx.fx));
        h.ai.apply_anger(id, 0.0);
        assert!(!h.agent(id).is_angered());
    }

    #[test]
    fn test_hit_reaction_roll() {
        let mut always = Harness::new(ZombieConfig {
            stagger_chance: 1.0,
            patrol_radius: 0.0,
            ..Default::default()
        });
        let id = always.spawn(Vec3::ZERO);
        always.with_ctx(|ai, ctx| ai.apply_damage(id, &DamageInfo::point(10.0).with_bone("spine"), 0.0, ctx));
        assert!(always.agent(id).is_staggered());
        assert_eq!(always.agent(id).health().current, 90.0);

        let mut never = Harness::new(ZombieConfig {
            stagger_chance: 0.0,
            patrol_radius: 0.0,
            ..Default::default()
        });
        let id = never.spawn(Vec3::ZERO);
        never.with_ctx(|ai, ctx| ai.apply_damage(id, &DamageInfo::point(10.0).with_bone("spine"), 0.0, ctx));
        assert!(never.agent(id).is_angered());
        assert!(!never.agent(id).is_staggered());
    }

    #[test]
    fn test_headshot_kill_and_removal() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let shot = DamageInfo::point(5.0).with_bone("head").with_instigator(PlayerId(7));

        assert!(h.with_ctx(|ai, ctx| ai.apply_damage(id, &shot, 1.0, ctx)));
        assert!(h.agent(id).is_dead());
        assert!(h.fx.contains(Effect::Headshot));
        assert!(h.fx.contains(Effect::Death));

        let account = h.ledger.account(PlayerId(7));
        assert_eq!(account.points, 250);
        assert_eq!(account.headshots, 1);

        let events = h.ai.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            AiEvent::Killed { agent, headshot: true, killer: Some(PlayerId(7)), .. } if *agent == id
        )));

        // Further damage is ignored
        assert!(!h.with_ctx(|ai, ctx| ai.apply_damage(id, &DamageInfo::radial(50.0), 2.0, ctx)));
        assert_eq!(h.ledger.account(PlayerId(7)).points, 250);

        h.run(105, 105);
        assert!(h.agent(id).is_dead());
        h.run(110, 110);
        assert!(h.ai.agent(id).is_none());
        assert!(h.ai.drain_events().contains(&AiEvent::Removed { agent: id }));
    }

    #[test]
    fn test_body_damage_then_lethal() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let hit = DamageInfo::point(60.0).with_bone("spine").with_instigator(PlayerId(2));

        h.with_ctx(|ai, ctx| ai.apply_damage(id, &hit, 0.0, ctx));
        assert!(!h.agent(id).is_dead());
        h.with_ctx(|ai, ctx| ai.apply_damage(id, &hit, 0.2, ctx));
        assert!(h.agent(id).is_dead());
        assert_eq!(h.agent(id).health().current, 0.0);
        assert_eq!(h.ledger.account(PlayerId(2)).points, 100);
        assert_eq!(h.ai.living_count(), 0);
        assert!(h.fx.contains(Effect::Death));
        assert!(h.ai.is_timer_pending(id, AgentTimer::Despawn));
        assert!(h.ai.drain_events().iter().any(|event| matches!(
            event,
            AiEvent::Killed { agent, killer: Some(PlayerId(2)), headshot: false, .. } if *agent == id
        )));

        // Corpse is removed after the grace delay
        h.run(1, 105);
        assert!(h.ai.agent(id).is_none());
    }

    #[test]
    fn test_los_loss_requires_exceeding_threshold() {
        let mut h = Harness::stationary();
        h.world
            .add_obstacle(Aabb::new(Vec3::new(300.0, -1000.0, 0.0), Vec3::new(350.0, 1000.0, 400.0)));
        let id = h.spawn(Vec3::ZERO);
        let player = PlayerView::new(PlayerId(1), Vec3::new(800.0, 0.0, 0.0));
        h.players.push(player.clone());

        h.with_ctx(|ai, ctx| ai.enemy_in_sight(id, &player, 0.0, ctx));
        assert!(h.ai.is_timer_pending(id, AgentTimer::LoseSight));

        let threshold = h.ai.config().los_lost_threshold;
        h.ai.agents.get_mut(id).unwrap().time_since_lost_los = threshold;
        h.with_ctx(|ai, ctx| ai.check_line_of_sight(id, ctx));
        assert_eq!(h.agent(id).state(), AIState::Chase);

        h.ai.agents.get_mut(id).unwrap().time_since_lost_los = threshold + 0.1;
        h.with_ctx(|ai, ctx| ai.check_line_of_sight(id, ctx));
        assert_eq!(h.agent(id).state(), AIState::Alert);
        assert_eq!(h.agent(id).enemy(), None);
        assert!(!h.ai.is_timer_pending(id, AgentTimer::LoseSight));
    }

    #[test]
    fn test_radial_damage_kills_outright() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);

        h.with_ctx(|ai, ctx| ai.apply_damage(id, &DamageInfo::radial(1.0).with_instigator(PlayerId(3)), 0.0, ctx));
        assert!(h.agent(id).is_dead());
        assert_eq!(h.ledger.account(PlayerId(3)).points, 100);
        assert_eq!(h.ledger.account(PlayerId(3)).headshots, 0);
    }

    #[test]
    fn test_melee_attack_cycle() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        h.players.push(PlayerView::new(PlayerId(1), Vec3::new(100.0, 0.0, 0.0)));

        h.run(1, 1);
        assert_eq!(h.agent(id).state(), AIState::Attack);
        assert!(h.fx.contains(Effect::AttackStart));

        h.with_ctx(|ai, ctx| ai.update(0.7, 0.6, ctx));
        let hits: Vec<_> = h
            .ai
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                AiEvent::PlayerHit { player, damage, .. } => Some((player, damage)),
                _ => None,
            })
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, PlayerId(1));
        assert!((3.0..=12.0).contains(&hits[0].1));

        // Cooldown holds right after the swing
        assert!(!h.agent(id).can_attack(0.7));
        h.with_ctx(|ai, ctx| ai.update(0.8, 0.1, ctx));
        assert_eq!(h.agent(id).state(), AIState::Chase);
        assert!(!h.with_ctx(|ai, ctx| ai.try_attack(id, 0.9, ctx)));

        let ready_at = 0.7 + h.agent(id).attack_cooldown_duration() as f64 + 1e-6;
        assert!(h.with_ctx(|ai, ctx| ai.try_attack(id, ready_at, ctx)));
    }

    #[test]
    fn test_attack_rejected_without_target() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        assert!(!h.with_ctx(|ai, ctx| ai.try_attack(id, 0.0, ctx)));
        assert_eq!(h.agent(id).state(), AIState::Patrol);
    }

    #[test]
    fn test_players_in_range_counting() {
        let config = ZombieConfig::default();
        let mut zed = ZombieAgent::new("walker", Vec3::ZERO, 1.0, 2.0, &config);

        let mut players = vec![
            PlayerView::new(PlayerId(1), Vec3::new(120.0, 0.0, 0.0)),
            PlayerView::new(PlayerId(2), Vec3::new(100.0, 50.0, 0.0)).dead(),
        ];
        update_players_in_range(&mut zed, &players, &config);
        assert_eq!(zed.players_in_range_count(), 1);

        players[0].location = Vec3::new(1000.0, 0.0, 0.0);
        update_players_in_range(&mut zed, &players, &config);
        assert_eq!(zed.players_in_range_count(), 0);

        // Leaving again does not underflow
        update_players_in_range(&mut zed, &players, &config);
        assert_eq!(zed.players_in_range_count(), 0);
    }

    #[test]
    fn test_investigate_unreachable_returns_to_patrol() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        h.ai.agents.get_mut(id).unwrap().set_last_known_enemy_location(Vec3::new(90_000.0, 0.0, 0.0));

        let status = h.with_ctx(|ai, ctx| ai.start_investigate(id, ctx));
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(h.agent(id).state(), AIState::Patrol);
        assert!(!h.agent(id).has_last_known_enemy_location());
    }

    #[test]
    fn test_investigate_then_patrol() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        h.ai.agents.get_mut(id).unwrap().set_last_known_enemy_location(Vec3::new(300.0, 0.0, 0.0));

        assert_eq!(h.with_ctx(|ai, ctx| ai.start_investigate(id, ctx)), TaskStatus::Running);
        assert_eq!(h.agent(id).state(), AIState::Alert);

        h.run(1, 20);
        assert!(h.agent(id).location.x > 150.0);
        assert_eq!(h.agent(id).state(), AIState::Alert);

        h.run(21, 60);
        assert_eq!(h.agent(id).state(), AIState::Patrol);
        assert!(!h.agent(id).has_last_known_enemy_location());
        assert!(!h.agent(id).has_task());
    }

    #[test]
    fn test_enemy_dead_service_drops_dead_enemy() {
        let mut h = Harness::stationary();
        let id = h.spawn(Vec3::ZERO);
        let player = PlayerView::new(PlayerId(1), Vec3::new(500.0, 0.0, 0.0));
        h.with_ctx(|ai, ctx| ai.enemy_in_sight(id, &player, 0.0, ctx));

        h.players.push(player.dead());
        h.with_ctx(|ai, ctx| ai.enemy_dead_service(id, ctx));

        assert_eq!(h.agent(id).enemy(), None);
        assert_eq!(h.agent(id).state(), AIState::Alert);
    }

    #[test]
    fn test_stale_handle_after_despawn() {
        let mut h = Harness::stationary();
        let first = h.spawn(Vec3::ZERO);
        assert!(h.ai.despawn(first));
        let second = h.spawn(Vec3::ZERO);

        assert!(h.ai.agent(first).is_none());
        assert!(h.ai.agent(second).is_some());
        assert!(h.ai.agent_checked(first).is_err());
        assert!(!h.ai.is_timer_pending(first, AgentTimer::LosPoll));
    }
}
