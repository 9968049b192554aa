/// Protester AI: BFS pathfinding plus random patrol choices.
///
/// Pathfinding runs a plain breadth-first search over footprint anchors,
/// using `FieldView::is_pathable_cell` as the walkability test. Each reached
/// cell remembers the direction it was entered from; the route is rebuilt by
/// walking those back from the goal, so no per-node path copies are made.
///
/// Searches are not cached: the field changes every tick (digging, falling
/// boulders), so each call starts from scratch.
///
/// Patrol helpers take the RNG explicitly; the world owns the only one.

use std::collections::VecDeque;

use rand::Rng;

use super::entity::Direction;
use super::grid::{GAME_BOARD_HEIGHT, OIL_FIELD_WIDTH};
use super::physics::FieldView;

/// Cells further than this from the start are reached but not expanded.
const SEARCH_DEPTH_CAP: u32 = 200;

/// `path_length` result when the goal cannot be reached.
pub const UNREACHABLE: u32 = 9999;

/// Where leaving protesters head, and where new ones appear.
pub const EXIT: (i32, i32) = (60, 60);

const PATROL_MIN_STEPS: i32 = 8;
const PATROL_MAX_STEPS: i32 = 60;

// ── Pathfinding ──

struct Route {
    length: u32,
    first_step: Option<Direction>,
}

#[inline]
fn on_board(x: i32, y: i32) -> bool {
    x >= 0 && x < OIL_FIELD_WIDTH && y >= 0 && y < GAME_BOARD_HEIGHT
}

#[inline]
fn cell_index(x: i32, y: i32) -> usize {
    (y * OIL_FIELD_WIDTH + x) as usize
}

fn shortest_route(view: &FieldView, start: (i32, i32), goal: (i32, i32)) -> Option<Route> {
    if !on_board(start.0, start.1) || !on_board(goal.0, goal.1) { return None; }

    let cells = (OIL_FIELD_WIDTH * GAME_BOARD_HEIGHT) as usize;
    let mut dist: Vec<Option<u32>> = vec![None; cells];
    let mut entered: Vec<Option<Direction>> = vec![None; cells];
    let mut queue: VecDeque<(i32, i32)> = VecDeque::with_capacity(256);

    dist[cell_index(start.0, start.1)] = Some(0);
    queue.push_back(start);

    while let Some((cx, cy)) = queue.pop_front() {
        let d = dist[cell_index(cx, cy)].unwrap_or(0);
        if (cx, cy) == goal {
            return Some(Route {
                length: d,
                first_step: first_step(&entered, start, goal),
            });
        }
        if d > SEARCH_DEPTH_CAP { continue; }

        for dir in Direction::ALL {
            let (nx, ny) = dir.step_from(cx, cy);
            if !on_board(nx, ny) { continue; }
            let i = cell_index(nx, ny);
            if dist[i].is_some() || !view.is_pathable_cell(nx, ny) { continue; }
            dist[i] = Some(d + 1);
            entered[i] = Some(dir);
            queue.push_back((nx, ny));
        }
    }

    None
}

/// Walk the entering directions back from the goal; the last one seen is the first move.
fn first_step(entered: &[Option<Direction>], start: (i32, i32), goal: (i32, i32)) -> Option<Direction> {
    let (mut x, mut y) = goal;
    let mut first = None;
    while (x, y) != start {
        let dir = entered[cell_index(x, y)]?;
        first = Some(dir);
        let (dx, dy) = dir.delta();
        x -= dx;
        y -= dy;
    }
    first
}

/// First move of a shortest path. `None` when unreachable or already there.
pub fn next_step_toward(view: &FieldView, from: (i32, i32), to: (i32, i32)) -> Option<Direction> {
    shortest_route(view, from, to).and_then(|r| r.first_step)
}

/// Length of the shortest path, or `UNREACHABLE`.
pub fn path_length(view: &FieldView, from: (i32, i32), to: (i32, i32)) -> u32 {
    shortest_route(view, from, to).map_or(UNREACHABLE, |r| r.length)
}

// ── Patrol ──

pub fn can_step(view: &FieldView, x: i32, y: i32, dir: Direction) -> bool {
    let (nx, ny) = dir.step_from(x, y);
    view.is_pathable_cell(nx, ny)
}

pub fn walkable_directions(view: &FieldView, x: i32, y: i32) -> Vec<Direction> {
    Direction::ALL.into_iter().filter(|&d| can_step(view, x, y, d)).collect()
}

pub fn patrol_steps<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(PATROL_MIN_STEPS..=PATROL_MAX_STEPS)
}

/// A fresh patrol leg: a random walkable direction (any direction when boxed in).
pub fn choose_patrol<R: Rng + ?Sized>(view: &FieldView, x: i32, y: i32, rng: &mut R) -> (Direction, i32) {
    let open = walkable_directions(view, x, y);
    let dir = if open.is_empty() {
        Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
    } else {
        open[rng.gen_range(0..open.len())]
    };
    (dir, patrol_steps(rng))
}

/// A perpendicular turn, if one is walkable.
pub fn choose_perpendicular_turn<R: Rng + ?Sized>(
    view: &FieldView,
    x: i32, y: i32,
    facing: Direction,
    rng: &mut R,
) -> Option<(Direction, i32)> {
    let open: Vec<Direction> = facing.perpendicular()
        .into_iter()
        .filter(|&d| can_step(view, x, y, d))
        .collect();
    if open.is_empty() { return None; }
    let dir = open[rng.gen_range(0..open.len())];
    Some((dir, patrol_steps(rng)))
}
