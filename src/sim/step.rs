/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Player (dig own footprint, then at most one command)
///   2. Terminal check (player dead / no barrels left)
///   3. Every live registered actor, in registration order,
///      with the terminal check after each one
///   4. Dead sweep
///   5. Spawner (new protesters, timed goodies)
///   6. Queued spawns join the registry
///   7. Final player check
///
/// Anything created during steps 1–5 lands in `world.spawned` and first
/// acts on the next tick. An actor killed mid-tick is skipped for the rest
/// of it and removed by the sweep.

use tracing::{debug, info};

use crate::domain::entity::{
    Actor, ActorKind, BoulderState, Damage, DamageOutcome, DamageSource, GoodieKind, KeyCommand, KindTag,
    BOULDER_WAIT_TICKS, DROPPED_GOLD_TICKS,
};
use crate::domain::physics::within_radius;
use crate::domain::rules;
use super::event::GameEvent;
use super::level;
use super::protester;
use super::world::WorldState;

const SONAR_RADIUS: f64 = 12.0;
const REVEAL_RADIUS: f64 = 4.0;
const PICKUP_RADIUS: f64 = 3.0;
const BONK_RADIUS: f64 = 3.0;
const BONK_DAMAGE: i32 = 100;
const SQUIRT_HIT_RADIUS: f64 = 3.0;
const SQUIRT_DAMAGE: i32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickStatus {
    Continue,
    PlayerDied,
    LevelFinished,
}

#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub status: TickStatus,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, key: Option<KeyCommand>) -> StepOutcome {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.ticks_since_protester = world.ticks_since_protester.saturating_add(1);

    if !world.player.alive {
        return finish(world, TickStatus::PlayerDied, events);
    }

    update_player(world, key, &mut events);
    if let Some(status) = terminal_status(world) {
        return finish(world, status, events);
    }

    for i in 0..world.actors.len() {
        if !world.actors[i].alive { continue; }
        update_actor(world, i, &mut events);
        if let Some(status) = terminal_status(world) {
            return finish(world, status, events);
        }
    }

    sweep_dead(world);
    level::spawn_new_actors(world);
    world.flush_spawned();

    if !world.player.alive {
        return finish(world, TickStatus::PlayerDied, events);
    }
    StepOutcome { status: TickStatus::Continue, events }
}

fn terminal_status(world: &WorldState) -> Option<TickStatus> {
    if !world.player.alive {
        Some(TickStatus::PlayerDied)
    } else if world.barrels_remaining == 0 {
        Some(TickStatus::LevelFinished)
    } else {
        None
    }
}

fn finish(world: &mut WorldState, status: TickStatus, mut events: Vec<GameEvent>) -> StepOutcome {
    match status {
        TickStatus::PlayerDied => {
            world.lives = world.lives.saturating_sub(1);
            info!(level = world.level, tick = world.tick, lives = world.lives, "player died");
        }
        TickStatus::LevelFinished => {
            events.push(GameEvent::LevelFinished);
            info!(level = world.level, tick = world.tick, score = world.score, "level finished");
        }
        TickStatus::Continue => {}
    }
    StepOutcome { status, events }
}

fn update_actor(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    match world.actors[i].tag() {
        KindTag::Boulder => update_boulder(world, i, events),
        KindTag::Squirt => update_squirt(world, i, events),
        KindTag::Goodie => update_goodie(world, i, events),
        KindTag::Protester => protester::update_protester(world, i, events),
    }
}

fn sweep_dead(world: &mut WorldState) {
    let mut protesters_removed = 0;
    world.actors.retain(|a| {
        if !a.alive && a.is_protester() {
            protesters_removed += 1;
        }
        a.alive
    });
    world.protesters_on_field = world.protesters_on_field.saturating_sub(protesters_removed);
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn update_player(world: &mut WorldState, key: Option<KeyCommand>, events: &mut Vec<GameEvent>) {
    if world.grid.remove_footprint(world.player.x, world.player.y) {
        events.push(GameEvent::Dig);
    }

    let cmd = match key { Some(c) => c, None => return };
    match cmd {
        KeyCommand::Move(dir) => {
            if world.player.facing != dir {
                world.player.facing = dir;
                return;
            }
            let (x, y) = (world.player.x, world.player.y);
            let target = rules::player_step_target(&world.view(), x, y, dir);
            if let Some((nx, ny)) = target {
                world.player.x = nx;
                world.player.y = ny;
            }
        }
        KeyCommand::Fire => fire_squirt(world, events),
        KeyCommand::Sonar => use_sonar(world, events),
        KeyCommand::DropGold => drop_gold(world),
        KeyCommand::Quit => world.player.give_up(),
    }
}

fn fire_squirt(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.water == 0 { return; }
    world.player.water -= 1;
    events.push(GameEvent::SquirtFired);

    let facing = world.player.facing;
    let (sx, sy) = rules::squirt_launch_position(world.player.x, world.player.y, facing);
    if world.view().is_pathable_cell(sx, sy) {
        let id = world.alloc_id();
        world.queue_spawn(Actor::squirt(id, sx, sy, facing));
    }
}

fn use_sonar(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.sonar == 0 { return; }
    world.player.sonar -= 1;
    events.push(GameEvent::SonarUsed);
    let (px, py) = (world.player.x, world.player.y);
    reveal_nearby(world, px, py, SONAR_RADIUS);
}

/// Make hidden barrels and buried gold within `radius` visible.
pub fn reveal_nearby(world: &mut WorldState, x: i32, y: i32, radius: f64) {
    for a in world.actors.iter_mut() {
        let revealable = a.goodie_kind().map_or(false, |k| k.sonar_revealable());
        if revealable && !a.visible && within_radius(x, y, a.x, a.y, radius) {
            a.set_visible(true);
        }
    }
}

fn drop_gold(world: &mut WorldState) {
    if world.player.gold == 0 { return; }
    world.player.gold -= 1;
    let id = world.alloc_id();
    let (px, py) = (world.player.x, world.player.y);
    world.queue_spawn(Actor::goodie(id, px, py, GoodieKind::DroppedGold, Some(DROPPED_GOLD_TICKS)));
}

/// Apply damage to the player; emits the give-up cue if it was fatal.
pub(super) fn damage_player(world: &mut WorldState, damage: Damage, events: &mut Vec<GameEvent>) {
    if world.player.take_damage(damage.amount) {
        debug!(source = ?damage.source, "player gave up");
        events.push(GameEvent::PlayerGaveUp);
    }
}

// ══════════════════════════════════════════════════════════════
// Boulder
// ══════════════════════════════════════════════════════════════

fn boulder_state(actor: &Actor) -> Option<BoulderState> {
    match &actor.kind {
        ActorKind::Boulder(b) => Some(b.state),
        _ => None,
    }
}

fn set_boulder_state(actor: &mut Actor, state: BoulderState) {
    if let ActorKind::Boulder(b) = &mut actor.kind {
        b.state = state;
    }
}

fn update_boulder(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let state = match boulder_state(&world.actors[i]) { Some(s) => s, None => return };
    let (id, x, y) = (world.actors[i].id, world.actors[i].x, world.actors[i].y);

    match state {
        BoulderState::Stable => {
            if !world.grid.has_earth_below(x, y) {
                set_boulder_state(&mut world.actors[i], BoulderState::Waiting { ticks_left: BOULDER_WAIT_TICKS });
            }
        }
        BoulderState::Waiting { ticks_left } => {
            let left = ticks_left.saturating_sub(1);
            if left == 0 {
                set_boulder_state(&mut world.actors[i], BoulderState::Falling);
                events.push(GameEvent::BoulderFalling { id });
            } else {
                set_boulder_state(&mut world.actors[i], BoulderState::Waiting { ticks_left: left });
            }
        }
        BoulderState::Falling => {
            let ty = y - 1;
            let blocked = ty < 0
                || !world.grid.is_clear_footprint(x, ty)
                || world.view().any_boulder_near_except(x, ty, 0.0, Some(id));
            if blocked {
                world.actors[i].set_dead();
                return;
            }
            world.actors[i].y = ty;
            let bonk = Damage { amount: BONK_DAMAGE, source: DamageSource::Boulder(id) };
            let driven_off = bonk_in_radius(world, x, ty, BONK_RADIUS, bonk, events);
            if driven_off > 0 {
                debug!(id = id.0, driven_off, "boulder drove protesters off");
            }
        }
    }
}

/// Falling-boulder hit: the player and every bonkable protester in range.
/// Returns how many protesters gave up.
fn bonk_in_radius(world: &mut WorldState, x: i32, y: i32, radius: f64, damage: Damage, events: &mut Vec<GameEvent>) -> usize {
    let p = &world.player;
    if p.can_be_bonked() && within_radius(x, y, p.x, p.y, radius) {
        damage_player(world, damage, events);
    }
    let mut driven_off = 0;
    for j in 0..world.actors.len() {
        let a = &world.actors[j];
        if a.alive && a.can_be_bonked() && within_radius(x, y, a.x, a.y, radius)
            && protester::annoy_protester(world, j, damage, events) == DamageOutcome::GaveUp
        {
            driven_off += 1;
        }
    }
    driven_off
}

// ══════════════════════════════════════════════════════════════
// Squirt
// ══════════════════════════════════════════════════════════════

fn update_squirt(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let (id, x, y, facing) = {
        let a = &world.actors[i];
        (a.id, a.x, a.y, a.facing)
    };

    let hit = Damage { amount: SQUIRT_DAMAGE, source: DamageSource::Squirt(id) };
    if annoy_protesters_in_radius(world, x, y, SQUIRT_HIT_RADIUS, hit, events) {
        world.actors[i].set_dead();
        return;
    }

    let exhausted = match &mut world.actors[i].kind {
        ActorKind::Squirt(s) => {
            s.range_left -= 1;
            s.range_left < 0
        }
        _ => return,
    };
    if exhausted {
        world.actors[i].set_dead();
        return;
    }

    let (nx, ny) = facing.step_from(x, y);
    if !world.view().is_pathable_cell(nx, ny) {
        world.actors[i].set_dead();
        return;
    }
    world.actors[i].x = nx;
    world.actors[i].y = ny;
}

/// Damage every hittable protester within `radius`. Returns whether any was hit.
pub fn annoy_protesters_in_radius(
    world: &mut WorldState,
    x: i32, y: i32,
    radius: f64,
    damage: Damage,
    events: &mut Vec<GameEvent>,
) -> bool {
    let mut hit_any = false;
    for j in 0..world.actors.len() {
        let a = &world.actors[j];
        if a.alive && a.can_be_hit() && within_radius(x, y, a.x, a.y, radius)
            && protester::annoy_protester(world, j, damage, events) != DamageOutcome::Ignored
        {
            hit_any = true;
        }
    }
    hit_any
}

// ══════════════════════════════════════════════════════════════
// Goodie
// ══════════════════════════════════════════════════════════════

fn update_goodie(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let (kind, expired) = match &mut world.actors[i].kind {
        ActorKind::Goodie(g) => {
            let expired = match g.ticks_left.as_mut() {
                Some(t) => {
                    *t = t.saturating_sub(1);
                    *t == 0
                }
                None => false,
            };
            (g.kind, expired)
        }
        _ => return,
    };
    if expired {
        world.actors[i].set_dead();
        return;
    }
    let (x, y) = (world.actors[i].x, world.actors[i].y);

    if kind == GoodieKind::DroppedGold {
        let taker = world.actors.iter().position(|a| {
            a.alive && a.can_pick_up_gold() && within_radius(x, y, a.x, a.y, PICKUP_RADIUS)
        });
        if let Some(j) = taker {
            protester::accept_gold(world, j, events);
            world.actors[i].set_dead();
        }
        return;
    }

    let p = &world.player;
    if !p.alive { return; }

    if !world.actors[i].visible {
        if within_radius(x, y, p.x, p.y, REVEAL_RADIUS) {
            world.actors[i].set_visible(true);
        }
        return;
    }

    if kind.player_pickable() && within_radius(x, y, p.x, p.y, PICKUP_RADIUS) {
        world.actors[i].set_dead();
        world.score += kind.points();
        collect(world, kind, events);
    }
}

fn collect(world: &mut WorldState, kind: GoodieKind, events: &mut Vec<GameEvent>) {
    match kind {
        GoodieKind::Barrel => {
            world.barrels_remaining = world.barrels_remaining.saturating_sub(1);
            debug!(left = world.barrels_remaining, "barrel found");
            events.push(GameEvent::OilFound);
            return;
        }
        GoodieKind::Gold => world.player.gold += 1,
        GoodieKind::SonarKit => world.player.sonar += 2,
        GoodieKind::WaterPool => world.player.water += 5,
        GoodieKind::DroppedGold => return,
    }
    events.push(GameEvent::ItemCollected);
}
