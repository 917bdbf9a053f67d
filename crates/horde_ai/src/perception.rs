//! Sight and line-of-sight tests
//!
//! Every "can this zombie see that player" decision goes through
//! [`has_line_of_sight`], so the per-tick accumulator, the periodic poll
//! and the enemy-dead service never disagree.

use crate::agent::ZombieAgent;
use crate::config::ZombieConfig;
use horde_core::{PlayerView, SpatialQuery};
use horde_math::Vec3;

/// Point on a player the zombie aims its sight ray at
pub fn sight_target(player: &PlayerView, config: &ZombieConfig) -> Vec3 {
    player.location.offset_z(config.target_chest_offset)
}

/// Unobstructed ray from the agent's eyes to the player's chest.
///
/// Dead players are never visible. Characters do not block the ray.
pub fn has_line_of_sight(
    agent: &ZombieAgent,
    player: &PlayerView,
    world: &dyn SpatialQuery,
    config: &ZombieConfig,
) -> bool {
    if !player.alive {
        return false;
    }
    world.has_clear_line(agent.eye_location(config), sight_target(player, config))
}

/// Whether the player is inside the sight cone and radius
pub fn in_sight_cone(agent: &ZombieAgent, player: &PlayerView, radius: f32, config: &ZombieConfig) -> bool {
    let eye = agent.eye_location(config);
    let to_target = sight_target(player, config) - eye;
    if to_target.length_squared() > radius * radius {
        return false;
    }

    let flat = Vec3::new(to_target.x, to_target.y, 0.0);
    if flat.length_squared() <= f32::EPSILON {
        return true;
    }
    agent.facing.angle_between_degrees(flat) <= config.sight_half_angle
}

/// Full sight sense: living, in the cone, and in line of sight.
///
/// The tracked enemy stays sensed out to the lose-sight radius.
pub fn can_sense(agent: &ZombieAgent, player: &PlayerView, world: &dyn SpatialQuery, config: &ZombieConfig) -> bool {
    if !player.alive {
        return false;
    }
    let radius = if agent.enemy() == Some(player.id) {
        config.lose_sight_radius
    } else {
        config.sight_radius
    };
    in_sight_cone(agent, player, radius, config) && has_line_of_sight(agent, player, world, config)
}

/// Pick the player reported by this tick's sight sense.
///
/// The tracked enemy wins while it is still sensed, otherwise the nearest
/// sensed player.
pub fn sense_players<'a>(
    agent: &ZombieAgent,
    players: &'a [PlayerView],
    world: &dyn SpatialQuery,
    config: &ZombieConfig,
) -> Option<&'a PlayerView> {
    if let Some(enemy) = agent.enemy() {
        if let Some(tracked) = players.iter().find(|p| p.id == enemy) {
            if can_sense(agent, tracked, world, config) {
                return Some(tracked);
            }
        }
    }

    players
        .iter()
        .filter(|p| can_sense(agent, p, world, config))
        .min_by(|a, b| {
            let da = a.location.distance_squared(agent.location);
            let db = b.location.distance_squared(agent.location);
            da.total_cmp(&db)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::{BoxWorld, PlayerId};
    use horde_math::Aabb;

    fn agent() -> ZombieAgent {
        ZombieAgent::new("walker", Vec3::ZERO, 1.0, 2.0, &ZombieConfig::default())
    }

    #[test]
    fn test_line_of_sight_blocked_by_wall() {
        let config = ZombieConfig::default();
        let world = BoxWorld::new(5000.0)
            .with_obstacle(Aabb::new(Vec3::new(200.0, -100.0, 0.0), Vec3::new(250.0, 100.0, 300.0)));
        let zed = agent();

        let behind_wall = PlayerView::new(PlayerId(1), Vec3::new(500.0, 0.0, 0.0));
        let beside_wall = PlayerView::new(PlayerId(2), Vec3::new(500.0, 600.0, 0.0));

        assert!(!has_line_of_sight(&zed, &behind_wall, &world, &config));
        assert!(has_line_of_sight(&zed, &beside_wall, &world, &config));
    }

    #[test]
    fn test_dead_player_not_visible() {
        let config = ZombieConfig::default();
        let world = BoxWorld::new(5000.0);
        let player = PlayerView::new(PlayerId(1), Vec3::new(300.0, 0.0, 0.0)).dead();

        assert!(!has_line_of_sight(&agent(), &player, &world, &config));
        assert!(!can_sense(&agent(), &player, &world, &config));
    }

    #[test]
    fn test_sight_cone_and_radius() {
        let config = ZombieConfig::default();
        let zed = agent();

        let ahead = PlayerView::new(PlayerId(1), Vec3::new(800.0, 0.0, 0.0));
        let behind = PlayerView::new(PlayerId(2), Vec3::new(-300.0, 0.0, 0.0));
        let far = PlayerView::new(PlayerId(3), Vec3::new(1500.0, 0.0, 0.0));

        assert!(in_sight_cone(&zed, &ahead, config.sight_radius, &config));
        assert!(!in_sight_cone(&zed, &behind, config.sight_radius, &config));
        assert!(!in_sight_cone(&zed, &far, config.sight_radius, &config));
        assert!(in_sight_cone(&zed, &far, config.lose_sight_radius, &config));
    }

    #[test]
    fn test_tracked_enemy_kept_to_lose_sight_radius() {
        let config = ZombieConfig::default();
        let world = BoxWorld::new(5000.0);
        let mut zed = agent();
        let players = vec![
            PlayerView::new(PlayerId(1), Vec3::new(1500.0, 0.0, 0.0)),
            PlayerView::new(PlayerId(2), Vec3::new(400.0, 100.0, 0.0)),
        ];

        assert_eq!(sense_players(&zed, &players, &world, &config).map(|p| p.id), Some(PlayerId(2)));

        zed.enemy = Some(PlayerId(1));
        assert_eq!(sense_players(&zed, &players, &world, &config).map(|p| p.id), Some(PlayerId(1)));
    }
}
