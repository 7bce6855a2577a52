//! Overlap queries between the player and world entities.
//!
//! Pickup is a per-pair predicate so the caller decides which candidates to
//! feed in (normally the loot the spatial index reports near the camera).
//! Obstacle contacts are only reported; how to respond is up to the caller.

use grove_core::math::Rect;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupPolicy {
    /// Picked up when more than half of the loot's area is covered.
    AreaOverlap,
    /// Picked up when the loot's center is inside the player, edges included.
    #[default]
    CenterPoint,
}

impl PickupPolicy {
    pub fn picks_up(self, player: &Rect, loot: &Rect) -> bool {
        match self {
            PickupPolicy::AreaOverlap => player.intersection_area(loot) > loot.area() / 2.0,
            PickupPolicy::CenterPoint => player.contains_point(loot.center()),
        }
    }
}

/// Candidates the player picks up this frame, in candidate order.
pub fn pickup_hits<K: Copy>(
    policy: PickupPolicy,
    player: &Rect,
    candidates: impl IntoIterator<Item = (K, Rect)>,
) -> Vec<K> {
    candidates
        .into_iter()
        .filter(|(_, loot)| policy.picks_up(player, loot))
        .map(|(key, _)| key)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleContact<E, O> {
    pub entity: E,
    pub obstacle: O,
    pub overlap_area: f32,
}

/// Every `(entity, obstacle)` pair whose rects share a nonzero area.
pub fn obstacle_contacts<E: Copy, O: Copy>(
    entities: &[(E, Rect)],
    obstacles: &[(O, Rect)],
) -> Vec<ObstacleContact<E, O>> {
    let mut contacts = Vec::new();
    for &(entity, entity_rect) in entities {
        for &(obstacle, obstacle_rect) in obstacles {
            let overlap_area = entity_rect.intersection_area(&obstacle_rect);
            if overlap_area > 0.0 {
                contacts.push(ObstacleContact {
                    entity,
                    obstacle,
                    overlap_area,
                });
            }
        }
    }
    contacts
}
