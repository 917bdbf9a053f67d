//! Spawner system: drives every spawn volume once per tick

use crate::config::SpawnMode;
use crate::difficulty::difficulty_multiplier;
use crate::events::SpawnerEvent;
use crate::placement::{find_spawn_location, is_area_watched, is_player_in_range};
use crate::volume::{SpawnVolume, SpawnerState};
use horde_ai::{AgentId, HordeAi, SpawnParams};
use horde_core::services::living_player_count;
use horde_core::{Arena, Handle, HordeError, PlayerView, SpatialQuery, TimerTable};
use rand::{Rng, RngCore};

/// Identifier of a spawn volume
pub type SpawnerId = Handle<SpawnVolume>;

/// Creates zombies on behalf of spawn volumes and reports on them
pub trait ZombieFactory {
    /// Create a zombie. `None` if the factory refused.
    fn spawn_zombie(&mut self, params: SpawnParams, now: f64, rng: &mut dyn RngCore) -> Option<AgentId>;

    /// `Some(true)` while alive, `Some(false)` once dead, `None` after removal
    fn zombie_alive(&self, agent: AgentId) -> Option<bool>;

    /// Living zombies in the whole world
    fn living_zombies(&self) -> usize;
}

impl ZombieFactory for HordeAi {
    fn spawn_zombie(&mut self, params: SpawnParams, now: f64, rng: &mut dyn RngCore) -> Option<AgentId> {
        Some(self.spawn(params, now, rng))
    }

    fn zombie_alive(&self, agent: AgentId) -> Option<bool> {
        self.agent(agent).map(|a| !a.is_dead())
    }

    fn living_zombies(&self) -> usize {
        self.living_count()
    }
}

/// Frame data and services used while updating spawners
pub struct SpawnContext<'a> {
    pub world: &'a dyn SpatialQuery,
    pub players: &'a [PlayerView],
    pub zombies: &'a mut dyn ZombieFactory,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> SpawnContext<'a> {
    pub fn new(
        world: &'a dyn SpatialQuery,
        players: &'a [PlayerView],
        zombies: &'a mut dyn ZombieFactory,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            world,
            players,
            zombies,
            rng,
        }
    }
}

/// Owns every spawn volume in the level
#[derive(Default)]
pub struct SpawnerSystem {
    volumes: Arena<SpawnVolume>,
    /// Reactivation and re-entry recheck timers
    timers: TimerTable<SpawnerId>,
    events: Vec<SpawnerEvent>,
}

impl SpawnerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a volume
    pub fn add_volume(&mut self, volume: SpawnVolume) -> SpawnerId {
        log::debug!("Registered spawner '{}' ({:?})", volume.name, volume.state);
        self.volumes.insert(volume)
    }

    /// Remove a volume. Zombies it spawned stay in the world.
    pub fn remove_volume(&mut self, id: SpawnerId) -> Option<SpawnVolume> {
        self.timers.cancel(id);
        self.volumes.remove(id)
    }

    pub fn volume(&self, id: SpawnerId) -> Option<&SpawnVolume> {
        self.volumes.get(id)
    }

    pub fn volumes(&self) -> impl Iterator<Item = (SpawnerId, &SpawnVolume)> {
        self.volumes.iter()
    }

    /// Find a volume by name
    pub fn find(&self, name: &str) -> Option<SpawnerId> {
        self.volumes
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Whether a reactivation (or re-entry recheck) timer is armed
    pub fn is_reactivation_pending(&self, id: SpawnerId) -> bool {
        self.timers.is_pending(id)
    }

    /// Seconds until the reactivation timer fires
    pub fn reactivation_remaining(&self, id: SpawnerId, now: f64) -> Option<f64> {
        self.timers.remaining(id, now)
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<SpawnerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance every volume by one tick
    pub fn update(&mut self, now: f64, delta: f32, ctx: &mut SpawnContext<'_>) {
        for id in self.timers.drain_due(now) {
            self.on_reactivation_timer(id, now, ctx.players);
        }

        let Self {
            volumes,
            timers,
            events,
        } = self;

        for (id, volume) in volumes.iter_mut() {
            reap_dead_zombies(volume, &*ctx.zombies);
            update_state(id, volume, now, ctx.players, timers, events);

            if volume.state != SpawnerState::Active {
                continue;
            }

            volume.time_since_last_spawn += delta;
            let multiplier = difficulty_multiplier(
                &volume.config,
                ctx.zombies.living_zombies(),
                living_player_count(ctx.players),
            );
            if volume.time_since_last_spawn >= volume.base_interval() / multiplier {
                volume.time_since_last_spawn = 0.0;
                volume.interval_jitter = roll_jitter(volume, &mut *ctx.rng);
                attempt_spawn(id, volume, now, ctx, events);
            }
        }
    }

    /// A tracked zombie died. Returns the volume that owned it.
    pub fn on_zombie_died(&mut self, agent: AgentId, now: f64) -> Option<SpawnerId> {
        let Self {
            volumes,
            timers,
            events,
        } = self;

        let (id, volume) = volumes.iter_mut().find(|(_, v)| v.is_tracking(agent))?;
        volume.untrack(agent);
        volume.total_kills += 1;
        volume.current_alive = volume.current_alive.saturating_sub(1);
        log::debug!(
            "Spawner '{}' kill {}/{}",
            volume.name,
            volume.total_kills,
            volume.config.max_kills_before_exhaustion
        );

        if volume.state == SpawnerState::Active && volume.kill_quota_reached() {
            exhaust(id, volume, now, timers, events);
        }
        Some(id)
    }

    /// Spawn up to `count` zombies right now, skipping the vision test.
    ///
    /// Honors the concurrent cap. Ignored while disabled. Returns how many
    /// zombies were created.
    pub fn trigger_spawn(&mut self, id: SpawnerId, count: usize, now: f64, ctx: &mut SpawnContext<'_>) -> usize {
        let Some(volume) = self.volumes.get_mut(id) else {
            log::warn!("trigger_spawn: unknown spawner {}", id);
            return 0;
        };
        if volume.state == SpawnerState::Disabled {
            log::debug!("trigger_spawn ignored, spawner '{}' is disabled", volume.name);
            return 0;
        }
        if !has_spawn_class(volume) {
            return 0;
        }

        let mut spawned = 0;
        for _ in 0..count {
            if !volume.has_capacity() {
                break;
            }
            if spawn_one(id, volume, now, false, ctx, &mut self.events).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    /// Jump straight to Exhausted without arming reactivation
    pub fn force_exhaust(&mut self, id: SpawnerId) {
        let Some(volume) = self.volumes.get_mut(id) else {
            log::warn!("force_exhaust: unknown spawner {}", id);
            return;
        };
        if volume.state == SpawnerState::Disabled {
            return;
        }
        volume.total_kills = volume.config.max_kills_before_exhaustion;
        if set_state(id, volume, SpawnerState::Exhausted, &mut self.events) {
            volume.player_was_in_range = true;
            log::info!("Spawner '{}' force-exhausted", volume.name);
            self.events.push(SpawnerEvent::Exhausted { spawner: id });
        }
    }

    /// Reset counters and go Active
    pub fn force_reactivate(&mut self, id: SpawnerId) {
        let Some(volume) = self.volumes.get_mut(id) else {
            log::warn!("force_reactivate: unknown spawner {}", id);
            return;
        };
        reactivate(id, volume, &mut self.timers, &mut self.events);
    }

    /// Switch a volume off until `enable` is called
    pub fn disable(&mut self, id: SpawnerId) {
        let Some(volume) = self.volumes.get_mut(id) else {
            log::warn!("disable: unknown spawner {}", id);
            return;
        };
        self.timers.cancel(id);
        set_state(id, volume, SpawnerState::Disabled, &mut self.events);
    }

    /// Re-enable a disabled volume, clearing its kill count
    pub fn enable(&mut self, id: SpawnerId) {
        let Some(volume) = self.volumes.get_mut(id) else {
            log::warn!("enable: unknown spawner {}", id);
            return;
        };
        if volume.state == SpawnerState::Disabled {
            volume.total_kills = 0;
            set_state(id, volume, SpawnerState::Inactive, &mut self.events);
        }
    }

    fn on_reactivation_timer(&mut self, id: SpawnerId, now: f64, players: &[PlayerView]) {
        let Some(volume) = self.volumes.get_mut(id) else {
            return;
        };
        if volume.state != SpawnerState::Exhausted {
            return;
        }

        if volume.config.require_reentry_for_reactivation {
            let in_range = is_player_in_range(players, volume.location, &volume.config);
            if in_range && volume.player_was_in_range {
                log::debug!("Spawner '{}' waiting for players to leave and return", volume.name);
                self.timers
                    .schedule(id, now, volume.config.reentry_recheck_interval as f64);
                return;
            }
        }

        reactivate(id, volume, &mut self.timers, &mut self.events);
    }
}

fn set_state(id: SpawnerId, volume: &mut SpawnVolume, to: SpawnerState, events: &mut Vec<SpawnerEvent>) -> bool {
    if volume.state == to {
        return false;
    }
    let from = volume.state;
    volume.state = to;
    log::info!("Spawner '{}' {:?} -> {:?}", volume.name, from, to);
    events.push(SpawnerEvent::StateChanged { spawner: id, from, to });
    true
}

fn update_state(
    id: SpawnerId,
    volume: &mut SpawnVolume,
    now: f64,
    players: &[PlayerView],
    timers: &mut TimerTable<SpawnerId>,
    events: &mut Vec<SpawnerEvent>,
) {
    let in_range = is_player_in_range(players, volume.location, &volume.config);

    match volume.state {
        SpawnerState::Disabled => return,
        SpawnerState::Inactive => {
            if in_range {
                set_state(id, volume, SpawnerState::Active, events);
            }
        }
        SpawnerState::Active => {
            if volume.kill_quota_reached() {
                exhaust(id, volume, now, timers, events);
                return;
            }
            if volume.config.deactivate_when_far && !in_range {
                set_state(id, volume, SpawnerState::Inactive, events);
            }
        }
        SpawnerState::Exhausted => {
            if !in_range {
                volume.player_was_in_range = false;
            }
            return;
        }
    }

    volume.player_was_in_range = in_range;
}

fn exhaust(
    id: SpawnerId,
    volume: &mut SpawnVolume,
    now: f64,
    timers: &mut TimerTable<SpawnerId>,
    events: &mut Vec<SpawnerEvent>,
) {
    if !set_state(id, volume, SpawnerState::Exhausted, events) {
        return;
    }
    volume.player_was_in_range = true;
    events.push(SpawnerEvent::Exhausted { spawner: id });

    if volume.config.can_reactivate {
        timers.schedule(id, now, volume.config.reactivation_delay as f64);
        log::info!(
            "Spawner '{}' exhausted, reactivation in {:.0}s",
            volume.name,
            volume.config.reactivation_delay
        );
    } else {
        log::info!("Spawner '{}' exhausted", volume.name);
    }
}

fn reactivate(
    id: SpawnerId,
    volume: &mut SpawnVolume,
    timers: &mut TimerTable<SpawnerId>,
    events: &mut Vec<SpawnerEvent>,
) {
    if volume.state == SpawnerState::Disabled {
        return;
    }
    timers.cancel(id);
    volume.total_kills = 0;
    volume.current_wave_spawned = 0;
    volume.time_since_last_spawn = 0.0;
    set_state(id, volume, SpawnerState::Active, events);
    events.push(SpawnerEvent::Reactivated { spawner: id });
}

/// Drop tracked agents that died or vanished, counting each as a kill
fn reap_dead_zombies(volume: &mut SpawnVolume, zombies: &dyn ZombieFactory) {
    let mut reaped = 0;
    volume.spawned.retain(|agent| {
        let alive = zombies.zombie_alive(*agent) == Some(true);
        if !alive {
            reaped += 1;
        }
        alive
    });
    volume.total_kills += reaped;
    volume.current_alive = volume.spawned.len();
}

fn roll_jitter(volume: &SpawnVolume, rng: &mut dyn RngCore) -> f32 {
    let deviation = volume.config.spawn_interval_deviation.abs();
    if deviation <= 0.0 {
        return 0.0;
    }
    rng.random_range(-deviation..=deviation)
}

fn has_spawn_class(volume: &SpawnVolume) -> bool {
    if volume.config.spawn_class.is_none() {
        log::warn!(
            "{}",
            HordeError::MissingSpawnClass(volume.name.clone())
        );
        return false;
    }
    true
}

/// Gate shared by the continuous and wave modes
fn can_spawn(volume: &SpawnVolume, ctx: &SpawnContext<'_>) -> bool {
    if volume.config.mode == SpawnMode::Triggered || !has_spawn_class(volume) {
        return false;
    }
    if !volume.has_capacity() {
        log::trace!("Spawner '{}' at concurrent cap", volume.name);
        return false;
    }
    if volume.config.scale_with_global_zombie_count
        && ctx.zombies.living_zombies() >= volume.config.global_zombie_limit
    {
        log::trace!("Spawner '{}' blocked by global limit", volume.name);
        return false;
    }
    if volume.config.check_player_vision
        && is_area_watched(ctx.world, ctx.players, volume.location, &volume.config)
    {
        log::trace!("Spawner '{}' is in view", volume.name);
        return false;
    }
    true
}

fn attempt_spawn(
    id: SpawnerId,
    volume: &mut SpawnVolume,
    now: f64,
    ctx: &mut SpawnContext<'_>,
    events: &mut Vec<SpawnerEvent>,
) {
    if !can_spawn(volume, ctx) {
        return;
    }

    let count = match volume.config.mode {
        SpawnMode::Wave => {
            let mut count = volume
                .config
                .wave_size
                .saturating_sub(volume.current_wave_spawned)
                .min(volume.config.max_concurrent_zombies.saturating_sub(volume.current_alive));
            if volume.config.scale_with_global_zombie_count {
                let headroom = volume
                    .config
                    .global_zombie_limit
                    .saturating_sub(ctx.zombies.living_zombies());
                count = count.min(headroom);
            }
            count
        }
        _ => 1,
    };

    let check_vision = volume.config.check_player_vision;
    for _ in 0..count {
        if spawn_one(id, volume, now, check_vision, ctx, events).is_none() {
            continue;
        }
        if volume.config.mode == SpawnMode::Wave {
            volume.current_wave_spawned += 1;
            if volume.current_wave_spawned >= volume.config.wave_size {
                volume.current_wave_spawned = 0;
                volume.time_since_last_spawn = -volume.config.wave_delay;
                log::debug!("Spawner '{}' wave complete", volume.name);
            }
        }
    }
}

fn spawn_one(
    id: SpawnerId,
    volume: &mut SpawnVolume,
    now: f64,
    check_vision: bool,
    ctx: &mut SpawnContext<'_>,
    events: &mut Vec<SpawnerEvent>,
) -> Option<AgentId> {
    let class = volume.config.spawn_class.clone()?;
    let Some(location) = find_spawn_location(
        ctx.world,
        ctx.players,
        volume.location,
        &volume.config,
        check_vision,
        &mut *ctx.rng,
    ) else {
        log::debug!("Spawner '{}' found no free location this cycle", volume.name);
        return None;
    };

    let params = SpawnParams::new(class, location).with_patrol_tag(volume.config.patrol_tag.clone());
    let agent = ctx.zombies.spawn_zombie(params, now, &mut *ctx.rng)?;
    volume.track(agent);
    events.push(SpawnerEvent::ZombieSpawned {
        spawner: id,
        agent,
        location,
    });
    Some(agent)
}
