//! Spawn placement: activation distance, player vision and location sampling

use crate::config::SpawnerConfig;
use horde_core::services::nearest_living_player;
use horde_core::{PlayerView, SpatialQuery};
use horde_math::Vec3;
use rand::{Rng, RngCore};

/// Distance from `center` to the closest living player
pub fn closest_player_distance(players: &[PlayerView], center: Vec3) -> Option<f32> {
    nearest_living_player(players, center).map(|(_, distance)| distance)
}

/// Whether the closest living player is inside the activation band
pub fn is_player_in_range(players: &[PlayerView], center: Vec3, config: &SpawnerConfig) -> bool {
    closest_player_distance(players, center).is_some_and(|distance| {
        distance >= config.min_activation_distance && distance <= config.max_activation_distance
    })
}

fn in_view_cone(player: &PlayerView, point: Vec3, angle: f32) -> bool {
    player.view_direction.angle_between_degrees(point - player.eye_location) <= angle
}

/// Whether any living player is looking at the volume.
///
/// The centre counts as seen when it is inside the view cone and the
/// sightline is either clear or blocked within `vision_buffer_distance` of
/// the centre.
pub fn is_area_watched(
    world: &dyn SpatialQuery,
    players: &[PlayerView],
    center: Vec3,
    config: &SpawnerConfig,
) -> bool {
    players
        .iter()
        .filter(|p| p.alive)
        .filter(|p| in_view_cone(p, center, config.player_vision_angle))
        .any(|player| match world.trace_line(player.eye_location, center) {
            None => true,
            Some(hit) => {
                let to_spawn = player.eye_location.distance(center);
                hit.distance >= to_spawn - config.vision_buffer_distance
            }
        })
}

/// Whether any living player has a clear view of a candidate point
pub fn is_point_watched(
    world: &dyn SpatialQuery,
    players: &[PlayerView],
    point: Vec3,
    config: &SpawnerConfig,
) -> bool {
    let probe = point.offset_z(config.visibility_probe_height);
    players
        .iter()
        .filter(|p| p.alive)
        .filter(|p| in_view_cone(p, point, config.player_vision_angle))
        .any(|player| world.has_clear_line(player.eye_location, probe))
}

/// Sample a free, navigable and unwatched point inside the volume.
///
/// Returns `None` once the attempt budget is spent.
pub fn find_spawn_location(
    world: &dyn SpatialQuery,
    players: &[PlayerView],
    center: Vec3,
    config: &SpawnerConfig,
    check_vision: bool,
    rng: &mut dyn RngCore,
) -> Option<Vec3> {
    let extent = config.box_extent;
    for attempt in 0..config.location_attempts {
        let offset = Vec3::new(
            sample_axis(rng, extent.x),
            sample_axis(rng, extent.y),
            0.0,
        );
        let Some(candidate) = world.project_to_nav(center + offset, config.nav_extent) else {
            log::trace!("Spawn attempt {} off the navmesh", attempt);
            continue;
        };

        let capsule_center = candidate.offset_z(config.capsule_half_height);
        if world.overlaps_capsule(capsule_center, config.capsule_radius, config.capsule_half_height) {
            log::trace!("Spawn attempt {} blocked at {:?}", attempt, candidate);
            continue;
        }

        if check_vision && is_point_watched(world, players, candidate, config) {
            log::trace!("Spawn attempt {} visible to a player", attempt);
            continue;
        }

        return Some(candidate);
    }
    None
}

fn sample_axis(rng: &mut dyn RngCore, half_extent: f32) -> f32 {
    if half_extent <= 0.0 {
        return 0.0;
    }
    rng.random_range(-half_extent..=half_extent)
}
