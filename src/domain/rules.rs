/// Movement and interaction rules as pure functions.
///
/// These encode "what is legal" without performing the action.
///
/// ### Player step
/// ┌──────────────────────────────────┬─────────┐
/// │ Condition                        │ Allow?  │
/// ├──────────────────────────────────┼─────────┤
/// │ Left  and x == 0                 │ DENY    │
/// │ Right and x == 60                │ DENY    │
/// │ Up    and y == 60                │ DENY    │
/// │ Down  and y == 0                 │ DENY    │
/// │ Boulder centre within 3.0 of dest│ DENY    │
/// │ Otherwise (earth is dug away)    │ ALLOW   │
/// └──────────────────────────────────┴─────────┘
///
/// ### Facing (shout check)
/// ┌────────┬──────────────────────────────────┐
/// │ Facing │ Player must be                   │
/// ├────────┼──────────────────────────────────┤
/// │ Right  │ x >= own x, |dy| < sprite height │
/// │ Left   │ x <= own x, |dy| < sprite height │
/// │ Up     │ y >= own y, |dx| < sprite width  │
/// │ Down   │ y <= own y, |dx| < sprite width  │
/// └────────┴──────────────────────────────────┘

use super::entity::Direction;
use super::grid::{EARTH_FIELD_HEIGHT, GAME_BOARD_HEIGHT, OIL_FIELD_WIDTH, SPRITE_HEIGHT, SPRITE_WIDTH};
use super::physics::FieldView;

/// Longest straight sight line a protester can follow.
pub const MAX_SIGHT: u32 = GAME_BOARD_HEIGHT as u32;

/// Where a player step in `dir` would land, if the move is allowed.
pub fn player_step_target(view: &FieldView, x: i32, y: i32, dir: Direction) -> Option<(i32, i32)> {
    let in_bounds = match dir {
        Direction::Left => x > 0,
        Direction::Right => x < OIL_FIELD_WIDTH - SPRITE_WIDTH,
        Direction::Up => y < EARTH_FIELD_HEIGHT,
        Direction::Down => y > 0,
    };
    if !in_bounds { return None; }
    let (nx, ny) = dir.step_from(x, y);
    if view.boulder_blocks_player(nx, ny) { return None; }
    Some((nx, ny))
}

/// Squirts launch one full sprite ahead of the shooter.
pub fn squirt_launch_position(x: i32, y: i32, dir: Direction) -> (i32, i32) {
    let (dx, dy) = dir.delta();
    (x + dx * SPRITE_WIDTH, y + dy * SPRITE_HEIGHT)
}

/// Is an actor at (x, y) facing `dir` looking at the target (tx, ty)?
pub fn is_facing(dir: Direction, x: i32, y: i32, tx: i32, ty: i32) -> bool {
    match dir {
        Direction::Right => tx >= x && (ty - y).abs() < SPRITE_HEIGHT,
        Direction::Left => tx <= x && (ty - y).abs() < SPRITE_HEIGHT,
        Direction::Up => ty >= y && (tx - x).abs() < SPRITE_WIDTH,
        Direction::Down => ty <= y && (tx - x).abs() < SPRITE_WIDTH,
    }
}

/// Axis-aligned unobstructed sight line from (x, y) to (tx, ty).
///
/// Returns the number of cells along the line, or `None` when the two are not
/// on a shared row/column, the line is longer than `MAX_SIGHT`, or any cell of
/// the sweeping edge is blocked.
pub fn line_of_sight(view: &FieldView, x: i32, y: i32, tx: i32, ty: i32) -> Option<u32> {
    let mut dist = 0u32;
    if x == tx {
        let step = if y < ty { 1 } else { -1 };
        let mut cy = y;
        while cy != ty {
            cy += step;
            dist += 1;
            if dist > MAX_SIGHT { return None; }
            if (0..SPRITE_WIDTH).any(|i| view.cell_blocks_sight(x + i, cy)) { return None; }
        }
        Some(dist)
    } else if y == ty {
        let step = if x < tx { 1 } else { -1 };
        let mut cx = x;
        while cx != tx {
            cx += step;
            dist += 1;
            if dist > MAX_SIGHT { return None; }
            if (0..SPRITE_HEIGHT).any(|i| view.cell_blocks_sight(cx, y + i)) { return None; }
        }
        Some(dist)
    } else {
        None
    }
}

/// Direction along the shared row/column toward the target.
pub fn straight_line_direction(x: i32, y: i32, tx: i32, ty: i32) -> Option<Direction> {
    if x == tx && y != ty {
        Some(if y < ty { Direction::Up } else { Direction::Down })
    } else if y == ty && x != tx {
        Some(if x < tx { Direction::Right } else { Direction::Left })
    } else {
        None
    }
}
