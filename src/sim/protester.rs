/// Protester behaviour, regular and hardcore.
///
/// ## Per-tick decision (non-resting ticks only)
///
/// ┌───┬──────────────────────────────────────────┬──────────────────────────┐
/// │ # │ Condition                                │ Action                   │
/// ├───┼──────────────────────────────────────────┼──────────────────────────┤
/// │ 1 │ must leave, standing on the exit         │ leave the field (dies)   │
/// │ 2 │ must leave                               │ one step toward the exit │
/// │ 3 │ player within 4, faced, shout cooled off │ shout (2 damage)         │
/// │ 4 │ hardcore, player within tracking range   │ one step along the path  │
/// │ 5 │ straight clear line, more than 4 away    │ one step toward player   │
/// │ 6 │ otherwise                                │ patrol                   │
/// └───┴──────────────────────────────────────────┴──────────────────────────┘
///
/// A resting protester only counts its rest down. Every active tick starts
/// a fresh rest of `move_delay` ticks, so protesters act once every
/// `move_delay + 1` ticks.

use tracing::debug;

use crate::domain::ai::{self, EXIT};
use crate::domain::entity::{
    stun_ticks_for_level, ActorKind, Damage, DamageOutcome, DamageSource, Direction,
    ProtesterVariant, BOULDER_KILL_BONUS,
};
use crate::domain::physics::within_radius;
use crate::domain::rules;
use super::event::GameEvent;
use super::step::damage_player;
use super::world::WorldState;

const SHOUT_RADIUS: f64 = 4.0;
const SHOUT_DAMAGE: i32 = 2;
/// Active ticks between two shouts.
const SHOUT_COOLDOWN: u32 = 15;
/// Chasing along a straight line stops this close to the player.
const SIGHT_MIN_DISTANCE: u32 = 4;
/// Active ticks before a patrolling protester considers a side turn.
const TURN_INTERVAL: u32 = 200;
const HARDCORE_TRACK_BASE: u32 = 16;

pub fn update_protester(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let (must_leave, variant) = match &mut world.actors[i].kind {
        ActorKind::Protester(p) => {
            if p.is_resting() {
                p.resting_ticks -= 1;
                return;
            }
            p.resting_ticks = p.move_delay;
            p.ticks_since_shout = p.ticks_since_shout.saturating_add(1);
            p.ticks_since_turn = p.ticks_since_turn.saturating_add(1);
            (p.must_leave, p.variant)
        }
        _ => return,
    };

    if must_leave {
        leave_field(world, i);
        return;
    }
    if try_shout(world, i, events) { return; }
    if variant == ProtesterVariant::Hardcore && pursue_by_path(world, i) { return; }
    if pursue_by_sight(world, i) { return; }
    patrol(world, i);
}

fn step_actor(world: &mut WorldState, i: usize, dir: Direction) {
    let a = &mut world.actors[i];
    let (nx, ny) = dir.step_from(a.x, a.y);
    a.facing = dir;
    a.x = nx;
    a.y = ny;
}

fn leave_field(world: &mut WorldState, i: usize) {
    let (x, y) = (world.actors[i].x, world.actors[i].y);
    if (x, y) == EXIT {
        world.actors[i].set_dead();
        debug!(id = world.actors[i].id.0, "protester left the field");
        return;
    }
    let dir = ai::next_step_toward(&world.view(), (x, y), EXIT);
    if let Some(dir) = dir {
        step_actor(world, i, dir);
    }
}

fn try_shout(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) -> bool {
    let a = &world.actors[i];
    let p = &world.player;
    let cooled = a.as_protester().map_or(false, |pr| pr.ticks_since_shout > SHOUT_COOLDOWN);
    if !p.alive
        || !cooled
        || !within_radius(a.x, a.y, p.x, p.y, SHOUT_RADIUS)
        || !rules::is_facing(a.facing, a.x, a.y, p.x, p.y)
    {
        return false;
    }

    let id = a.id;
    if let Some(pr) = world.actors[i].as_protester_mut() {
        pr.ticks_since_shout = 0;
    }
    events.push(GameEvent::ProtesterYelled { id });
    damage_player(world, Damage { amount: SHOUT_DAMAGE, source: DamageSource::Shout(id) }, events);
    true
}

/// Hardcore only: follow the maze toward the player when close enough by path.
fn pursue_by_path(world: &mut WorldState, i: usize) -> bool {
    let from = (world.actors[i].x, world.actors[i].y);
    let target = (world.player.x, world.player.y);
    let range = world.level.saturating_mul(2).saturating_add(HARDCORE_TRACK_BASE);

    let step = {
        let view = world.view();
        if ai::path_length(&view, from, target) > range {
            None
        } else {
            ai::next_step_toward(&view, from, target)
                .filter(|&d| ai::can_step(&view, from.0, from.1, d))
        }
    };
    match step {
        Some(dir) => {
            step_actor(world, i, dir);
            true
        }
        None => false,
    }
}

fn pursue_by_sight(world: &mut WorldState, i: usize) -> bool {
    let (x, y) = (world.actors[i].x, world.actors[i].y);
    let (px, py) = (world.player.x, world.player.y);

    let step = {
        let view = world.view();
        match (rules::line_of_sight(&view, x, y, px, py), rules::straight_line_direction(x, y, px, py)) {
            (Some(dist), Some(dir)) if dist > SIGHT_MIN_DISTANCE && ai::can_step(&view, x, y, dir) => Some(dir),
            _ => None,
        }
    };
    let dir = match step { Some(d) => d, None => return false };
    step_actor(world, i, dir);
    if let Some(p) = world.actors[i].as_protester_mut() {
        p.steps_left = 0;
    }
    true
}

fn patrol(world: &mut WorldState, i: usize) {
    let (x, y) = (world.actors[i].x, world.actors[i].y);
    let (steps_left, since_turn) = match world.actors[i].as_protester_mut() {
        Some(p) => {
            p.steps_left -= 1;
            (p.steps_left, p.ticks_since_turn)
        }
        None => return,
    };

    if steps_left <= 0 {
        let (dir, steps) = {
            let (view, rng) = world.view_and_rng();
            ai::choose_patrol(&view, x, y, rng)
        };
        set_leg(world, i, dir, steps);
    } else if since_turn >= TURN_INTERVAL {
        let facing = world.actors[i].facing;
        let turn = {
            let (view, rng) = world.view_and_rng();
            ai::choose_perpendicular_turn(&view, x, y, facing, rng)
        };
        if let Some((dir, steps)) = turn {
            set_leg(world, i, dir, steps);
            if let Some(p) = world.actors[i].as_protester_mut() {
                p.ticks_since_turn = 0;
            }
        }
    }

    let facing = world.actors[i].facing;
    if ai::can_step(&world.view(), x, y, facing) {
        step_actor(world, i, facing);
    } else if let Some(p) = world.actors[i].as_protester_mut() {
        p.steps_left = 0;
    }
}

fn set_leg(world: &mut WorldState, i: usize, dir: Direction, steps: i32) {
    world.actors[i].facing = dir;
    if let Some(p) = world.actors[i].as_protester_mut() {
        p.steps_left = steps;
    }
}

// ══════════════════════════════════════════════════════════════
// Reactions
// ══════════════════════════════════════════════════════════════

/// Damage a protester. A protester already on its way out ignores it.
///
/// Running out of health does not remove the protester: it switches to
/// leaving and walks to the exit.
pub fn annoy_protester(
    world: &mut WorldState,
    j: usize,
    damage: Damage,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let stun = stun_ticks_for_level(world.level);
    let a = &mut world.actors[j];
    let id = a.id;
    let variant = match a.as_protester() {
        Some(p) if a.is_damageable() => p.variant,
        _ => return DamageOutcome::Ignored,
    };

    a.hp -= damage.amount;
    if a.hp > 0 {
        if let Some(p) = a.as_protester_mut() {
            p.resting_ticks = stun;
        }
        events.push(GameEvent::ProtesterAnnoyed { id });
        return DamageOutcome::StillPresent;
    }

    a.hp = 0;
    if let Some(p) = a.as_protester_mut() {
        p.set_must_leave();
    }
    let bonus = if damage.is_from_boulder() { BOULDER_KILL_BONUS } else { variant.squirt_bonus() };
    world.score += bonus;
    events.push(GameEvent::ProtesterGaveUp { id });
    debug!(id = id.0, ?variant, bonus, "protester gave up");
    DamageOutcome::GaveUp
}

/// A protester picked up dropped gold. Regulars head home; hardcores
/// pocket it and stand staring for a while.
pub fn accept_gold(world: &mut WorldState, j: usize, events: &mut Vec<GameEvent>) {
    let stun = stun_ticks_for_level(world.level);
    let a = &mut world.actors[j];
    let id = a.id;
    let p = match a.as_protester_mut() { Some(p) => p, None => return };

    let bonus = p.variant.gold_bonus();
    match p.variant {
        ProtesterVariant::Regular => p.set_must_leave(),
        ProtesterVariant::Hardcore => p.resting_ticks = stun,
    }
    world.score += bonus;
    events.push(GameEvent::ProtesterFoundGold { id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Actor, ActorId};
    use crate::domain::grid::EarthGrid;

    fn world_with(variant: ProtesterVariant, x: i32, y: i32) -> WorldState {
        let mut w = WorldState::new(9, 0, 3);
        let id = w.alloc_id();
        w.add_actor(Actor::protester(id, x, y, variant, 0));
        w
    }

    fn prot(w: &WorldState) -> crate::domain::entity::Protester {
        *w.actors[0].as_protester().expect("protester")
    }

    fn squirt_hit() -> Damage {
        Damage { amount: 2, source: DamageSource::Squirt(ActorId(99)) }
    }

    #[test]
    fn resting_protester_only_counts_down() {
        let mut w = world_with(ProtesterVariant::Regular, 40, 60);
        w.actors[0].as_protester_mut().expect("protester").resting_ticks = 2;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (40, 60));
        assert_eq!(prot(&w).resting_ticks, 0);
        assert_eq!(prot(&w).ticks_since_turn, 201);
    }

    #[test]
    fn leaving_protester_ignores_damage() {
        let mut w = world_with(ProtesterVariant::Regular, 40, 60);
        w.actors[0].as_protester_mut().expect("protester").set_must_leave();
        let mut events = vec![];
        assert_eq!(annoy_protester(&mut w, 0, squirt_hit(), &mut events), DamageOutcome::Ignored);
        assert!(events.is_empty());
        assert_eq!(w.actors[0].hp, 5);
        assert_eq!(w.score, 0);
    }

    #[test]
    fn non_fatal_hit_stuns() {
        let mut w = world_with(ProtesterVariant::Regular, 40, 60);
        let mut events = vec![];
        let outcome = annoy_protester(&mut w, 0, squirt_hit(), &mut events);
        assert_eq!(outcome, DamageOutcome::StillPresent);
        assert_eq!(w.actors[0].hp, 3);
        assert_eq!(prot(&w).resting_ticks, 100);
        assert_eq!(events, vec![GameEvent::ProtesterAnnoyed { id: w.actors[0].id }]);
    }

    #[test]
    fn leaving_protester_walks_to_exit() {
        let mut w = world_with(ProtesterVariant::Regular, 30, 30);
        w.actors[0].as_protester_mut().expect("protester").set_must_leave();
        let mut events = vec![];
        let mut last = ai::path_length(&w.view(), (30, 30), EXIT);
        assert_eq!(last, 60);

        for _ in 0..1000 {
            update_protester(&mut w, 0, &mut events);
            if !w.actors[0].alive { break; }
            let here = (w.actors[0].x, w.actors[0].y);
            let d = ai::path_length(&w.view(), here, EXIT);
            assert!(d <= last);
            last = d;
        }
        assert!(!w.actors[0].alive);
        assert_eq!((w.actors[0].x, w.actors[0].y), EXIT);
        assert!(events.is_empty());
    }

    #[test]
    fn shouts_when_facing_close_player() {
        let mut w = world_with(ProtesterVariant::Regular, 34, 60);
        let id = w.actors[0].id;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!(events, vec![GameEvent::ProtesterYelled { id }]);
        assert_eq!(w.player.hp, 8);
        assert_eq!(prot(&w).ticks_since_shout, 0);

        // Cooldown: no second shout on the next few active ticks
        events.clear();
        for _ in 0..8 {
            update_protester(&mut w, 0, &mut events);
        }
        assert!(!events.iter().any(|e| matches!(e, GameEvent::ProtesterYelled { .. })));
        assert_eq!(w.player.hp, 8);
    }

    #[test]
    fn no_shout_when_facing_away() {
        let mut w = world_with(ProtesterVariant::Regular, 34, 60);
        w.actors[0].facing = Direction::Right;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert!(events.is_empty());
        assert_eq!(w.player.hp, 10);
    }

    #[test]
    fn chases_along_clear_line() {
        let mut w = world_with(ProtesterVariant::Regular, 40, 30);
        w.grid = EarthGrid::empty();
        w.player.y = 30;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (39, 30));
        assert_eq!(w.actors[0].facing, Direction::Left);
        assert_eq!(prot(&w).steps_left, 0);
    }

    #[test]
    fn hardcore_tracks_by_path() {
        let mut w = world_with(ProtesterVariant::Hardcore, 36, 24);
        w.grid = EarthGrid::empty();
        w.player.y = 30;
        let before = ai::path_length(&w.view(), (36, 24), (30, 30));
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        let here = (w.actors[0].x, w.actors[0].y);
        assert_eq!(ai::path_length(&w.view(), here, (30, 30)), before - 1);
    }

    #[test]
    fn hardcore_ignores_path_beyond_tracking_range() {
        // 20 cells away along an open row: too far to track, close enough to see
        let mut w = world_with(ProtesterVariant::Hardcore, 50, 60);
        w.grid = EarthGrid::empty();
        assert!(ai::path_length(&w.view(), (50, 60), (30, 60)) > HARDCORE_TRACK_BASE);
        w.actors[0].as_protester_mut().expect("protester").steps_left = 20;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (49, 60));
        assert_eq!(prot(&w).steps_left, 0);

        // Out of range and out of sight: keeps patrolling away
        let mut w = world_with(ProtesterVariant::Hardcore, 50, 30);
        w.grid = EarthGrid::empty();
        w.actors[0].facing = Direction::Right;
        w.actors[0].as_protester_mut().expect("protester").steps_left = 20;
        w.actors[0].as_protester_mut().expect("protester").ticks_since_turn = 0;
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (51, 30));
        assert_eq!(prot(&w).steps_left, 19);
    }

    #[test]
    fn regular_does_not_track_around_corners() {
        let mut w = world_with(ProtesterVariant::Regular, 36, 24);
        w.grid = EarthGrid::empty();
        w.player.y = 30;
        w.actors[0].facing = Direction::Right;
        w.actors[0].as_protester_mut().expect("protester").steps_left = 20;
        w.actors[0].as_protester_mut().expect("protester").ticks_since_turn = 0;
        let before = ai::path_length(&w.view(), (36, 24), (30, 30));
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (37, 24));
        assert_eq!(ai::path_length(&w.view(), (37, 24), (30, 30)), before + 1);
        assert!(events.is_empty());
    }

    #[test]
    fn long_patrol_leg_forces_side_turn() {
        let mut w = world_with(ProtesterVariant::Regular, 10, 20);
        w.grid = EarthGrid::empty();
        w.player.x = 0;
        w.actors[0].facing = Direction::Right;
        {
            let p = w.actors[0].as_protester_mut().expect("protester");
            p.steps_left = 50;
            p.ticks_since_turn = TURN_INTERVAL - 1;
        }
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        let a = &w.actors[0];
        assert!(matches!(a.facing, Direction::Up | Direction::Down));
        assert_eq!(a.x, 10);
        assert!(a.y == 19 || a.y == 21);
        assert_eq!(prot(&w).ticks_since_turn, 0);
        assert!((8..=60).contains(&prot(&w).steps_left));
    }

    #[test]
    fn no_side_turn_before_interval() {
        let mut w = world_with(ProtesterVariant::Regular, 10, 20);
        w.grid = EarthGrid::empty();
        w.player.x = 0;
        w.actors[0].facing = Direction::Right;
        {
            let p = w.actors[0].as_protester_mut().expect("protester");
            p.steps_left = 50;
            p.ticks_since_turn = 10;
        }
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (11, 20));
        assert_eq!(w.actors[0].facing, Direction::Right);
        assert_eq!(prot(&w).ticks_since_turn, 11);
        assert_eq!(prot(&w).steps_left, 49);
    }

    #[test]
    fn blocked_patrol_step_ends_leg() {
        let mut w = world_with(ProtesterVariant::Regular, 60, 20);
        w.grid = EarthGrid::empty();
        w.player.x = 0;
        w.actors[0].facing = Direction::Right;
        {
            let p = w.actors[0].as_protester_mut().expect("protester");
            p.steps_left = 30;
            p.ticks_since_turn = 0;
        }
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!((w.actors[0].x, w.actors[0].y), (60, 20));
        assert_eq!(prot(&w).steps_left, 0);
    }

    #[test]
    fn huge_level_does_not_overflow() {
        let mut w = world_with(ProtesterVariant::Hardcore, 36, 24);
        w.level = u32::MAX;
        w.grid = EarthGrid::empty();
        w.player.y = 30;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        assert_eq!(annoy_protester(&mut w, 0, squirt_hit(), &mut events), DamageOutcome::StillPresent);
        assert_eq!(prot(&w).resting_ticks, 50);
    }

    #[test]
    fn patrol_walks_shaft() {
        let mut w = world_with(ProtesterVariant::Regular, 30, 30);
        w.player.x = 0;
        let mut events = vec![];
        update_protester(&mut w, 0, &mut events);
        let a = &w.actors[0];
        assert_eq!(a.x, 30);
        assert!(a.y == 29 || a.y == 31);
        assert!(matches!(a.facing, Direction::Up | Direction::Down));
    }

    #[test]
    fn regular_leaves_with_gold() {
        let mut w = world_with(ProtesterVariant::Regular, 40, 60);
        let mut events = vec![];
        accept_gold(&mut w, 0, &mut events);
        assert!(prot(&w).must_leave);
        assert_eq!(w.score, 25);
    }

    #[test]
    fn hardcore_stares_at_gold() {
        let mut w = world_with(ProtesterVariant::Hardcore, 40, 60);
        let mut events = vec![];
        accept_gold(&mut w, 0, &mut events);
        assert_eq!(events, vec![GameEvent::ProtesterFoundGold { id: w.actors[0].id }]);
        assert!(!prot(&w).must_leave);
        assert_eq!(prot(&w).resting_ticks, 100);
        assert_eq!(w.score, 50);

        for _ in 0..100 {
            update_protester(&mut w, 0, &mut events);
        }
        assert_eq!((w.actors[0].x, w.actors[0].y), (40, 60));
        assert!(w.actors[0].alive);
    }
}
