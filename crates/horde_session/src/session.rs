//! Authoritative match session
//!
//! Owns the world, players, zombies, spawners and quests, and advances them
//! in a fixed order each tick. Events from one subsystem are routed to the
//! others here: zombie kills feed spawners and quests, melee hits land on
//! player health, quest completion triggers enable tagged volumes.

use crate::config::{PlayerSetup, SessionConfig};
use crate::data::DataTable;
use horde_ai::{AgentId, AiContext, AiEvent, HordeAi};
use horde_combat::{DamageInfo, Firearm, FirearmDefinition, FirearmEvent, Health, ProjectileSpawn, ShooterState, HEAD_BONE};
use horde_core::{
    BoxWorld, EffectCue, EffectLog, HordeError, PlayerId, PlayerView, PointsLedger, Result, SpatialQuery, StaticData,
};
use horde_math::{sweep_sphere_point, Segment, Vec3};
use horde_quest::{QuestContext, QuestData, QuestEvent, QuestItems, QuestManager, QuestTriggers};
use horde_spawner::{SpawnContext, SpawnVolume, SpawnerEvent, SpawnerId, SpawnerSystem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A connected player as the server sees it
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub location: Vec3,
    pub view_direction: Vec3,
    pub velocity: Vec3,
    pub airborne: bool,
    pub health: Health,
    pub weapon: Option<Firearm>,
}

impl Player {
    pub fn new(id: PlayerId, setup: &PlayerSetup) -> Self {
        Self {
            id,
            location: setup.location,
            view_direction: setup.view_direction.normalize_or_zero(),
            velocity: Vec3::ZERO,
            airborne: false,
            health: Health::new(setup.max_health),
            weapon: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    /// Frame view handed to AI, spawners and quests
    pub fn view(&self) -> PlayerView {
        let mut view = PlayerView::new(self.id, self.location).with_view_direction(self.view_direction);
        view.velocity = self.velocity;
        view.airborne = self.airborne;
        view.alive = self.is_alive();
        view
    }

    /// Shooter state sampled for fire control
    pub fn shooter(&self) -> ShooterState {
        let view = self.view();
        let mut shooter = ShooterState::new(self.id, view.eye_location, self.view_direction).with_velocity(self.velocity);
        if self.airborne {
            shooter = shooter.airborne();
        }
        if !self.is_alive() {
            shooter = shooter.dead();
        }
        shooter
    }
}

/// Everything observers may want to hear about, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Ai(AiEvent),
    Spawner(SpawnerEvent),
    Quest(QuestEvent),
    Firearm { player: PlayerId, event: FirearmEvent },
    PlayerDied { player: PlayerId },
}

pub struct GameSession {
    pub(crate) config: SessionConfig,
    pub(crate) world: BoxWorld,
    pub(crate) players: Vec<Player>,
    pub(crate) ai: HordeAi,
    pub(crate) spawners: SpawnerSystem,
    pub(crate) quests: QuestManager,
    pub(crate) triggers: QuestTriggers,
    pub(crate) items: QuestItems,
    pub(crate) weapons: DataTable<FirearmDefinition>,
    pub(crate) ledger: PointsLedger,
    pub(crate) effects: EffectLog,
    pub(crate) rng: StdRng,
    pub(crate) projectiles: Vec<ProjectileSpawn>,
    pub(crate) events: Vec<SessionEvent>,
    pub(crate) now: f64,
    pub(crate) tick: u64,
}

impl GameSession {
    /// Build a session from config and already loaded tables
    pub fn new(
        config: SessionConfig,
        quest_table: &DataTable<QuestData>,
        weapons: DataTable<FirearmDefinition>,
    ) -> Self {
        let world = BoxWorld::new(config.world_half_size);

        let players = config
            .players
            .iter()
            .enumerate()
            .map(|(index, setup)| {
                let mut player = Player::new(PlayerId(index as u64 + 1), setup);
                player.weapon = setup.weapon.as_deref().and_then(|id| match weapons.find(id) {
                    Some(definition) => Some(Firearm::new(definition.clone())),
                    None => {
                        log::warn!("{}", HordeError::UnknownDefinition(id.to_string()));
                        None
                    }
                });
                player
            })
            .collect();

        let mut spawners = SpawnerSystem::new();
        for placement in &config.spawners {
            spawners.add_volume(SpawnVolume::new(
                placement.name.clone(),
                placement.location,
                placement.config.clone(),
            ));
        }

        let mut triggers = QuestTriggers::new();
        for trigger in &config.quest_triggers {
            triggers.add(trigger.clone());
        }
        let mut items = QuestItems::new();
        for item in &config.quest_items {
            items.add(item.clone());
        }

        let mut quests = QuestManager::new(config.quest_settings.clone()).with_quests(quest_table.values().cloned());
        quests.begin_level(0.0);

        log::info!(
            "Session ready: {} players, {} spawners, {} quests, seed {}",
            config.players.len(),
            spawners.len(),
            quests.template_count(),
            config.seed
        );

        Self {
            world,
            players,
            ai: HordeAi::new(config.zombie.clone()),
            spawners,
            quests,
            triggers,
            items,
            weapons,
            ledger: PointsLedger::new(),
            effects: EffectLog::new(),
            rng: StdRng::seed_from_u64(config.seed),
            projectiles: Vec::new(),
            events: Vec::new(),
            now: 0.0,
            tick: 0,
            config,
        }
    }

    /// Build a session, loading the data tables the config points at
    pub fn from_config(config: SessionConfig) -> Result<Self> {
        let quests = match &config.quest_table {
            Some(path) => DataTable::load_from_file(path)?,
            None => DataTable::new(),
        };
        let weapons = match &config.weapon_table {
            Some(path) => DataTable::load_from_file(path)?,
            None => DataTable::new(),
        };
        Ok(Self::new(config, &quests, weapons))
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance one fixed tick
    pub fn tick(&mut self) {
        let delta = self.config.tick_interval;
        self.step(delta);
    }

    /// Advance by `delta` seconds
    pub fn step(&mut self, delta: f32) {
        self.now += delta as f64;
        self.tick += 1;
        let now = self.now;
        self.effects.drain();

        self.update_firearms(now);
        self.resolve_projectiles(now);

        let views = self.player_views();
        {
            let mut ctx = AiContext::new(&self.world, &views, &mut self.effects, &mut self.ledger, &mut self.rng);
            self.ai.update(now, delta, &mut ctx);
        }
        self.process_ai_events(now);

        let views = self.player_views();
        {
            let mut ctx = SpawnContext::new(&self.world, &views, &mut self.ai, &mut self.rng);
            self.spawners.update(now, delta, &mut ctx);
        }
        self.collect_spawner_events();

        {
            let mut ctx = QuestContext::new(&views, &mut self.ledger);
            self.triggers.update(&mut self.quests, &mut ctx);
            self.items.update(&mut self.quests, &mut ctx, &mut self.effects);
            self.quests.update(now, delta, &mut ctx);
        }
        self.process_quest_events();
    }

    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    fn update_firearms(&mut self, now: f64) {
        for player in &mut self.players {
            let shooter = player.shooter();
            let Some(weapon) = player.weapon.as_mut() else {
                continue;
            };
            weapon.update(now, &shooter, &mut self.effects, &mut self.rng);
            self.projectiles.extend(weapon.drain_projectiles());
            self.events.extend(
                weapon
                    .drain_events()
                    .into_iter()
                    .map(|event| SessionEvent::Firearm { player: player.id, event }),
            );
        }
    }

    /// Resolve pending shots against zombie head and body spheres
    fn resolve_projectiles(&mut self, now: f64) {
        let shots = std::mem::take(&mut self.projectiles);
        if shots.is_empty() {
            return;
        }
        let views = self.player_views();
        let combat = &self.config.combat;

        for shot in shots {
            let segment = Segment::new(shot.origin, shot.origin + shot.direction * combat.projectile_range);
            let blocked_at = self.world.trace_line(segment.start, segment.end).map(|hit| hit.distance);

            let mut best: Option<(f32, AgentId, bool, Vec3)> = None;
            for (id, agent) in self.ai.agents() {
                if agent.is_dead() {
                    continue;
                }
                let head = agent.eye_location(self.ai.config());
                let body = agent.location.offset_z(combat.body_height);
                let hit = if sweep_sphere_point(&segment, 0.0, head, combat.head_radius) {
                    (head, true)
                } else if sweep_sphere_point(&segment, 0.0, body, combat.body_radius) {
                    (body, false)
                } else {
                    continue;
                };
                let distance = shot.origin.distance(hit.0);
                if blocked_at.is_some_and(|d| d < distance) {
                    continue;
                }
                if best.map_or(true, |(d, ..)| distance < d) {
                    best = Some((distance, id, hit.1, hit.0));
                }
            }

            let Some((_, agent, headshot, point)) = best else {
                continue;
            };
            let mut damage = DamageInfo::point(combat.projectile_damage).with_hit_point(point);
            if let Some(owner) = shot.owner {
                damage = damage.with_instigator(owner);
            }
            if headshot {
                damage = damage.with_bone(HEAD_BONE);
            }
            let mut ctx = AiContext::new(&self.world, &views, &mut self.effects, &mut self.ledger, &mut self.rng);
            self.ai.apply_damage(agent, &damage, now, &mut ctx);
        }
    }

    fn process_ai_events(&mut self, now: f64) {
        for event in self.ai.drain_events() {
            match &event {
                AiEvent::Killed { agent, enemy_type, .. } => {
                    self.spawners.on_zombie_died(*agent, now);
                    let views = self.player_views();
                    let mut ctx = QuestContext::new(&views, &mut self.ledger);
                    self.quests.report_enemy_killed(enemy_type, &mut ctx);
                }
                AiEvent::PlayerHit { player, damage, .. } => self.damage_player(*player, *damage),
                _ => {}
            }
            self.events.push(SessionEvent::Ai(event));
        }
    }

    fn damage_player(&mut self, id: PlayerId, amount: f32) {
        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            log::warn!("Hit for unknown player {}", id);
            return;
        };
        let (_, died) = player.health.apply_damage(amount);
        if died {
            log::info!("Player {} died", id);
            if let Some(weapon) = player.weapon.as_mut() {
                weapon.stop_firing();
            }
            self.events.push(SessionEvent::PlayerDied { player: id });
        }
    }

    fn collect_spawner_events(&mut self) {
        self.events
            .extend(self.spawners.drain_events().into_iter().map(SessionEvent::Spawner));
    }

    pub(crate) fn process_quest_events(&mut self) {
        for event in self.quests.drain_events() {
            if let QuestEvent::CompletionTrigger { tag } = &event {
                self.triggers.enable_tagged(tag);
                if let Some(id) = self.spawners.find(tag) {
                    self.spawners.enable(id);
                }
            }
            self.events.push(SessionEvent::Quest(event));
        }
        self.collect_spawner_events();
    }

    // ------------------------------------------------------------------
    // External control
    // ------------------------------------------------------------------

    /// Replicated movement from the owning client. Dead players stay put.
    pub fn set_player_transform(&mut self, id: PlayerId, location: Vec3, view_direction: Vec3) -> bool {
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) if player.is_alive() => {
                player.velocity = (location - player.location) * (1.0 / self.config.tick_interval);
                player.location = location;
                player.view_direction = view_direction.normalize_or_zero();
                true
            }
            _ => false,
        }
    }

    /// Run quest operations with a reward context for the current players
    pub fn with_quests<R>(&mut self, f: impl FnOnce(&mut QuestManager, &mut QuestContext<'_>) -> R) -> R {
        let views = self.player_views();
        let result = {
            let mut ctx = QuestContext::new(&views, &mut self.ledger);
            f(&mut self.quests, &mut ctx)
        };
        self.process_quest_events();
        result
    }

    /// Spawn `count` zombies from the named spawner, ignoring player vision
    pub fn trigger_spawner(&mut self, name: &str, count: usize) -> usize {
        let Some(id) = self.spawners.find(name) else {
            log::warn!("No spawner named '{}'", name);
            return 0;
        };
        let views = self.player_views();
        let spawned = {
            let mut ctx = SpawnContext::new(&self.world, &views, &mut self.ai, &mut self.rng);
            self.spawners.trigger_spawn(id, count, self.now, &mut ctx)
        };
        self.collect_spawner_events();
        spawned
    }

    pub(crate) fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Fire-control output produced outside the tick
    pub(crate) fn collect_weapon_output(&mut self, index: usize) {
        let player = &mut self.players[index];
        let Some(weapon) = player.weapon.as_mut() else {
            return;
        };
        self.projectiles.extend(weapon.drain_projectiles());
        let id = player.id;
        self.events.extend(
            weapon
                .drain_events()
                .into_iter()
                .map(|event| SessionEvent::Firearm { player: id, event }),
        );
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &BoxWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut BoxWorld {
        &mut self.world
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn ai(&self) -> &HordeAi {
        &self.ai
    }

    pub fn spawners(&self) -> &SpawnerSystem {
        &self.spawners
    }

    pub fn spawner_id(&self, name: &str) -> Option<SpawnerId> {
        self.spawners.find(name)
    }

    pub fn quests(&self) -> &QuestManager {
        &self.quests
    }

    pub fn triggers(&self) -> &QuestTriggers {
        &self.triggers
    }

    pub fn items(&self) -> &QuestItems {
        &self.items
    }

    pub fn weapons(&self) -> &DataTable<FirearmDefinition> {
        &self.weapons
    }

    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Effects played during the last tick
    pub fn effects(&self) -> &[EffectCue] {
        self.effects.cues()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::ClientIntent;
    use horde_combat::{FireMode, SpreadConfig};
    use horde_quest::{QuestObjective, QuestTrigger};
    use horde_spawner::{SpawnMode, SpawnerConfig, SpawnerState};
    use horde_math::Aabb;

    fn rifle() -> FirearmDefinition {
        FirearmDefinition::new("rifle")
            .with_fire_modes(vec![FireMode::Single])
            .with_spread(SpreadConfig {
                base_angle: 0.0,
                increase_per_shot: 0.0,
                ..Default::default()
            })
    }

    fn session_with(config: SessionConfig, quests: Vec<QuestData>) -> GameSession {
        GameSession::new(
            config,
            &DataTable::from_rows(quests),
            DataTable::from_rows(vec![rifle()]),
        )
    }

    fn armed_config() -> SessionConfig {
        let mut config = SessionConfig::default().with_players(vec![
            PlayerSetup {
                weapon: Some("rifle".into()),
                ..Default::default()
            },
            PlayerSetup {
                location: Vec3::new(-300.0, 0.0, 0.0),
                ..Default::default()
            },
        ]);
        config.combat.projectile_damage = 500.0;
        config.with_spawner(
            "gate",
            Vec3::new(1000.0, 0.0, 100.0),
            SpawnerConfig::default().with_mode(SpawnMode::Triggered),
        )
    }

    /// Aim player 1 at the first living zombie and fire
    fn shoot_first_zombie(session: &mut GameSession) -> bool {
        let height = session.config.combat.body_height;
        let Some(target) = session
            .ai
            .agents()
            .find(|(_, a)| !a.is_dead())
            .map(|(_, a)| a.location.offset_z(height))
        else {
            return false;
        };
        let eye = session.players[0].view().eye_location;
        session.set_player_transform(PlayerId(1), Vec3::ZERO, target - eye);
        session.apply_intent(PlayerId(1), ClientIntent::Fire)
    }

    #[test]
    fn test_unknown_weapon_leaves_player_unarmed() {
        let config = SessionConfig::default().with_players(vec![PlayerSetup {
            weapon: Some("bazooka".into()),
            ..Default::default()
        }]);
        let session = session_with(config, Vec::new());
        assert!(session.players[0].weapon.is_none());
    }

    #[test]
    fn test_kill_feeds_spawner_and_quest() {
        let quest = QuestData::new("Cull").with_objective(QuestObjective::kill("kills", 2));
        let mut session = session_with(armed_config(), vec![quest]);
        assert!(session.with_quests(|quests, _| quests.start_quest("Cull")));

        session.tick();
        assert_eq!(session.trigger_spawner("gate", 1), 1);
        assert!(shoot_first_zombie(&mut session));
        session.tick();

        let gate = session.spawner_id("gate").unwrap();
        assert_eq!(session.spawners.volume(gate).unwrap().total_kills(), 1);
        assert_eq!(session.quests.current_objective("Cull").unwrap().current_count, 1);
        assert_eq!(session.ai.living_count(), 0);

        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Ai(AiEvent::Killed { killer: Some(PlayerId(1)), .. }))));
    }

    #[test]
    fn test_quest_rewards_reach_living_players() {
        let quest = QuestData::new("Cull")
            .with_objective(QuestObjective::kill("kills", 1))
            .with_rewards(500, 0);
        let mut session = session_with(armed_config(), vec![quest]);
        session.with_quests(|quests, _| quests.start_quest("Cull"));
        session.players[1].health.kill();

        session.trigger_spawner("gate", 1);
        shoot_first_zombie(&mut session);
        session.tick();

        assert!(session.quests.is_quest_completed("Cull"));
        // Kill reward plus completion for the shooter, nothing for the dead
        assert!(session.ledger.account(PlayerId(1)).points >= 600);
        assert_eq!(session.ledger.account(PlayerId(2)).points, 0);
    }

    #[test]
    fn test_melee_hit_damages_player() {
        let mut session = session_with(armed_config(), Vec::new());
        session.damage_player(PlayerId(2), 40.0);
        assert_eq!(session.players[1].health.current, 60.0);

        session.damage_player(PlayerId(2), 100.0);
        assert!(!session.players[1].is_alive());
        assert!(!session.player_views()[1].alive);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::PlayerDied { player: PlayerId(2) }));

        assert!(!session.set_player_transform(PlayerId(2), Vec3::ZERO, Vec3::X));
    }

    #[test]
    fn test_completion_trigger_enables_spawner_and_volume() {
        let quest = QuestData::new("Power").with_objective(
            QuestObjective::interact("breaker", "Breaker").with_completion_trigger("basement"),
        );
        let config = armed_config()
            .with_spawner(
                "basement",
                Vec3::new(0.0, 1000.0, 100.0),
                SpawnerConfig {
                    start_enabled: false,
                    ..Default::default()
                },
            )
            .with_quest_trigger(
                QuestTrigger::new("stairs", Aabb::new(Vec3::splat(-50.0), Vec3::splat(50.0)))
                    .with_tag("basement")
                    .disabled(),
            );
        let mut session = session_with(config, vec![quest]);
        let basement = session.spawner_id("basement").unwrap();
        assert_eq!(session.spawners.volume(basement).unwrap().state(), SpawnerState::Disabled);

        session.with_quests(|quests, ctx| {
            quests.start_quest("Power");
            quests.report_interaction("Breaker", ctx);
        });

        assert_ne!(session.spawners.volume(basement).unwrap().state(), SpawnerState::Disabled);
        assert!(session.triggers.iter().all(|(_, t)| t.enabled));
    }

    #[test]
    fn test_level_quests_start_after_delay() {
        let quest = QuestData::new("Intro")
            .with_objective(QuestObjective::kill("kills", 10))
            .starts_on_level_begin(0.0);
        let mut session = session_with(armed_config(), vec![quest]);

        session.step(0.5);
        assert!(!session.quests.is_quest_active("Intro"));
        session.step(0.6);
        assert!(session.quests.is_quest_active("Intro"));
    }

    #[test]
    fn test_effects_cleared_each_tick() {
        let mut session = session_with(armed_config(), Vec::new());
        session.apply_intent(PlayerId(1), ClientIntent::Fire);
        assert!(!session.effects().is_empty());
        session.tick();
        assert!(session.effects().is_empty());
    }
}
