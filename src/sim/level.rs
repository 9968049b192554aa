/// Level setup and the in-level spawner.
///
/// ## Population (per level L)
///
/// ┌──────────┬─────────────────────┬──────────┬────────────────────────────┐
/// │ Kind     │ Count               │ Rows     │ Extra rule                 │
/// ├──────────┼─────────────────────┼──────────┼────────────────────────────┤
/// │ Boulder  │ min(L/2 + 2, 9)     │ 20..=56  │ earth under it is removed  │
/// │ Gold     │ max(5 - L/2, 2)     │ 0..=56   │ hidden                     │
/// │ Barrel   │ min(2 + L, 21)      │ 0..=56   │ hidden                     │
/// └──────────┴─────────────────────┴──────────┴────────────────────────────┘
///
/// Every placement keeps its footprint out of the shaft and stays more than
/// `MIN_SPACING` away from everything already placed, the player included.
/// A spot that cannot be found after `PLACEMENT_ATTEMPTS` tries is skipped.
///
/// ## Spawner (end of every tick)
///
///   - Protesters walk in at the exit once `max(25, 200 - L)` ticks have
///     passed since the last one, up to `min(15, 2 + 1.5·L)` on the field.
///   - With odds 1 in `25·L + 300`, a timed goodie appears: a sonar kit at
///     the top-left corner (1 in 5), otherwise a water pool in open ground.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::domain::ai::{self, EXIT};
use crate::domain::entity::{Actor, GoodieKind, ProtesterVariant};
use crate::domain::grid::{footprint, in_shaft, OIL_FIELD_WIDTH, SPRITE_WIDTH};
use super::world::{Phase, WorldState};

const PLACEMENT_ATTEMPTS: u32 = 1000;
const WATER_POOL_ATTEMPTS: u32 = 50;
const MIN_SPACING: f64 = 6.0;

const MAX_BOULDERS: u32 = 9;
const MAX_BARRELS: u32 = 21;
const MIN_GOLD: u32 = 2;

const MAX_X: i32 = OIL_FIELD_WIDTH - SPRITE_WIDTH;
const MAX_Y: i32 = 56;
const BOULDER_MIN_Y: i32 = 20;

const MAX_PROTESTERS: u32 = 15;
const MIN_PROTESTER_WAIT: u32 = 25;
const MAX_HARDCORE_PCT: u32 = 90;

const SONAR_KIT_SPOT: (i32, i32) = (0, 60);

// ══════════════════════════════════════════════════════════════
// Level start
// ══════════════════════════════════════════════════════════════

/// Fresh field for `world.level`. Score and lives carry over.
pub fn start_level(world: &mut WorldState) {
    world.reset_field();
    world.phase = Phase::Playing;
    populate(world);
    info!(
        level = world.level,
        actors = world.actors.len(),
        barrels = world.barrels_remaining,
        earth = world.grid.remaining(),
        "level started"
    );
}

fn populate(world: &mut WorldState) {
    let level = world.level;
    let boulders = (level / 2 + 2).min(MAX_BOULDERS);
    let gold = 5u32.saturating_sub(level / 2).max(MIN_GOLD);
    let barrels = level.saturating_add(2).min(MAX_BARRELS);

    for _ in 0..boulders {
        match find_spot(world, BOULDER_MIN_Y) {
            Some((x, y)) => {
                world.grid.remove_footprint(x, y);
                let id = world.alloc_id();
                world.add_actor(Actor::boulder(id, x, y));
            }
            None => warn!(level, "no room for a boulder"),
        }
    }

    place_buried(world, GoodieKind::Gold, gold);
    world.barrels_remaining = place_buried(world, GoodieKind::Barrel, barrels);
}

/// Place up to `count` hidden goodies. Returns how many found a spot.
fn place_buried(world: &mut WorldState, kind: GoodieKind, count: u32) -> u32 {
    let mut placed = 0;
    for _ in 0..count {
        match find_spot(world, 0) {
            Some((x, y)) => {
                let id = world.alloc_id();
                world.add_actor(Actor::goodie(id, x, y, kind, None));
                placed += 1;
            }
            None => warn!(level = world.level, ?kind, "no room for goodie"),
        }
    }
    placed
}

fn overlaps_shaft(x: i32, y: i32) -> bool {
    footprint(x, y).any(|(cx, cy)| in_shaft(cx, cy))
}

fn find_spot(world: &mut WorldState, min_y: i32) -> Option<(i32, i32)> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let x = world.rng.gen_range(0..=MAX_X);
        let y = world.rng.gen_range(min_y..=MAX_Y);
        if overlaps_shaft(x, y) { continue; }
        if world.view().is_any_entity_near(x, y, MIN_SPACING, None) { continue; }
        return Some((x, y));
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Spawner
// ══════════════════════════════════════════════════════════════

pub fn spawn_new_actors(world: &mut WorldState) {
    spawn_protester(world);
    spawn_timed_goodie(world);
}

fn protester_target(level: u32) -> u32 {
    ((level as f64 * 1.5) as u32).saturating_add(2).min(MAX_PROTESTERS)
}

fn protester_wait(level: u32) -> u32 {
    200u32.saturating_sub(level).max(MIN_PROTESTER_WAIT)
}

fn spawn_protester(world: &mut WorldState) {
    let level = world.level;
    if world.ticks_since_protester < protester_wait(level)
        || world.protesters_on_field >= protester_target(level)
    {
        return;
    }

    let hardcore_pct = level.saturating_mul(10).saturating_add(30).min(MAX_HARDCORE_PCT);
    let variant = if world.rng.gen_range(0..100) < hardcore_pct {
        ProtesterVariant::Hardcore
    } else {
        ProtesterVariant::Regular
    };

    let id = world.alloc_id();
    let mut actor = Actor::protester(id, EXIT.0, EXIT.1, variant, level);
    let (dir, steps) = {
        let (view, rng) = world.view_and_rng();
        ai::choose_patrol(&view, EXIT.0, EXIT.1, rng)
    };
    actor.facing = dir;
    if let Some(p) = actor.as_protester_mut() {
        p.steps_left = steps;
    }
    world.queue_spawn(actor);
    world.protesters_on_field += 1;
    world.ticks_since_protester = 0;
    debug!(id = id.0, ?variant, on_field = world.protesters_on_field, "protester spawned");
}

fn spawn_timed_goodie(world: &mut WorldState) {
    let level = world.level;
    let odds = level.saturating_mul(25).saturating_add(300);
    if world.rng.gen_range(0..odds) != 0 { return; }

    let lifetime = Some(300u32.saturating_sub(level.saturating_mul(10)).max(100));
    if world.rng.gen_range(0..5) == 0 {
        let id = world.alloc_id();
        world.queue_spawn(Actor::goodie(id, SONAR_KIT_SPOT.0, SONAR_KIT_SPOT.1, GoodieKind::SonarKit, lifetime));
        debug!(id = id.0, "sonar kit spawned");
        return;
    }

    for _ in 0..WATER_POOL_ATTEMPTS {
        let x = world.rng.gen_range(0..=MAX_X);
        let y = world.rng.gen_range(0..=MAX_Y);
        if !world.grid.is_clear_footprint(x, y) { continue; }
        if world.view().is_any_entity_near(x, y, 0.0, None) { continue; }
        let id = world.alloc_id();
        world.queue_spawn(Actor::goodie(id, x, y, GoodieKind::WaterPool, lifetime));
        debug!(id = id.0, x, y, "water pool spawned");
        return;
    }
}
