/// Spatial queries: the one place proximity and collision are decided.
///
/// ## Architecture
///
/// Two distinct concepts:
///   1. EARTH   : what the cell IS (`EarthGrid`)
///   2. ACTORS  : who is near a position (registry + player)
///
/// Everything here is a pure read over a `FieldView`. Mutation happens in
/// `sim::step` after the query has returned.
///
/// ## Distances
///
/// Radius tests compare footprint centres (anchor + half a sprite), using
/// Euclidean distance. Since every footprint is the same size the offset
/// cancels out, but it is kept explicit so the helpers read like the rules.
///
/// ## Pathable cell
///
/// A footprint anchored at (x, y) is pathable when ALL of:
///   - it lies inside the board (`0..OIL_FIELD_WIDTH` × `0..GAME_BOARD_HEIGHT`)
///   - none of its 16 cells holds earth
///   - no live boulder centre is within `BOULDER_BLOCK_RADIUS`
///
/// Protester movement, squirt launch/flight and the pathfinder all share it.

use super::entity::{Actor, ActorId, KindTag, Player};
use super::grid::{EarthGrid, GAME_BOARD_HEIGHT, OIL_FIELD_WIDTH, SPRITE_HEIGHT, SPRITE_WIDTH};

/// Centre distance at which a boulder blocks movement.
pub const BOULDER_BLOCK_RADIUS: f64 = 3.0;

// ══════════════════════════════════════════════════════════════
// Geometry (no world state)
// ══════════════════════════════════════════════════════════════

/// Distance between the centres of two footprints.
#[inline]
pub fn distance(ax: i32, ay: i32, bx: i32, by: i32) -> f64 {
    let half_w = SPRITE_WIDTH as f64 / 2.0;
    let half_h = SPRITE_HEIGHT as f64 / 2.0;
    let dx = (ax as f64 + half_w) - (bx as f64 + half_w);
    let dy = (ay as f64 + half_h) - (by as f64 + half_h);
    (dx * dx + dy * dy).sqrt()
}

#[inline]
pub fn within_radius(ax: i32, ay: i32, bx: i32, by: i32, radius: f64) -> bool {
    distance(ax, ay, bx, by) <= radius
}

/// Do the footprints anchored at a and b share any cell?
#[inline]
pub fn overlaps(ax: i32, ay: i32, bx: i32, by: i32) -> bool {
    ax < bx + SPRITE_WIDTH && ax + SPRITE_WIDTH > bx
        && ay < by + SPRITE_HEIGHT && ay + SPRITE_HEIGHT > by
}

/// Is the whole footprint inside the board?
#[inline]
pub fn footprint_on_board(x: i32, y: i32) -> bool {
    x >= 0 && x + SPRITE_WIDTH <= OIL_FIELD_WIDTH
        && y >= 0 && y + SPRITE_HEIGHT <= GAME_BOARD_HEIGHT
}

// ══════════════════════════════════════════════════════════════
// Queries over the field
// ══════════════════════════════════════════════════════════════

/// Read-only view of everything spatial queries need.
#[derive(Clone, Copy)]
pub struct FieldView<'a> {
    pub grid: &'a EarthGrid,
    pub actors: &'a [Actor],
    pub player: &'a Player,
}

impl<'a> FieldView<'a> {
    fn live_boulders(&self) -> impl Iterator<Item = &'a Actor> {
        self.actors.iter().filter(|a| a.alive && a.blocks_movement())
    }

    /// Any live boulder overlapping the footprint or with its centre within `radius`.
    pub fn any_boulder_near(&self, x: i32, y: i32, radius: f64) -> bool {
        self.any_boulder_near_except(x, y, radius, None)
    }

    /// As `any_boulder_near`, ignoring the boulder `skip` (a falling boulder
    /// must not collide with itself).
    pub fn any_boulder_near_except(&self, x: i32, y: i32, radius: f64, skip: Option<ActorId>) -> bool {
        self.live_boulders()
            .filter(|b| Some(b.id) != skip)
            .any(|b| overlaps(x, y, b.x, b.y) || within_radius(x, y, b.x, b.y, radius))
    }

    /// Centre-distance only check, as used for movement blocking.
    pub fn boulder_within(&self, x: i32, y: i32, radius: f64) -> bool {
        self.live_boulders().any(|b| within_radius(x, y, b.x, b.y, radius))
    }

    /// Does a boulder stop the player from stepping onto (x, y)?
    pub fn boulder_blocks_player(&self, x: i32, y: i32) -> bool {
        self.boulder_within(x, y, BOULDER_BLOCK_RADIUS)
    }

    /// See module docs.
    pub fn is_pathable_cell(&self, x: i32, y: i32) -> bool {
        footprint_on_board(x, y)
            && self.grid.is_clear_footprint(x, y)
            && !self.boulder_within(x, y, BOULDER_BLOCK_RADIUS)
    }

    /// Is a sight-line cell blocked? Earth in the cell, or a boulder
    /// overlapping a footprint anchored there.
    pub fn cell_blocks_sight(&self, x: i32, y: i32) -> bool {
        self.grid.has_earth(x, y) || self.any_boulder_near(x, y, 0.0)
    }

    /// Is the live player or any live actor (optionally of one kind) within `radius`?
    ///
    /// Used during placement; a radius of 0 means "exactly at this anchor".
    pub fn is_any_entity_near(&self, x: i32, y: i32, radius: f64, only: Option<KindTag>) -> bool {
        if only.is_none() && self.player.alive && within_radius(x, y, self.player.x, self.player.y, radius) {
            return true;
        }
        self.actors.iter().any(|a| {
            a.alive
                && only.map_or(true, |k| a.tag() == k)
                && within_radius(x, y, a.x, a.y, radius)
        })
    }
}
