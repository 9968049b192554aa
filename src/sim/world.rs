/// WorldState: the complete state of a running level.
///
/// ## Ownership
///
///   - `grid`:    earth; only ever loses cells after `start_level`.
///   - `player`:  the singleton, kept apart from the registry because it is
///                 scheduled first and checked after every other actor.
///   - `actors`:  the registry, in registration order. Update order is
///                 this order.
///   - `spawned`: actors created during the current tick. They join
///                 `actors` after the dead sweep so they first act next tick.
///
/// All randomness comes from `rng`, seeded once at construction.

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::entity::{Actor, ActorId, Player};
use crate::domain::grid::EarthGrid;
use crate::domain::physics::FieldView;

/// Ticks already "elapsed" since the last protester at level start,
/// so the first one walks in straight away.
pub const INITIAL_PROTESTER_WAIT: u32 = 200;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

pub struct WorldState {
    // ── Field ──
    pub grid: EarthGrid,

    // ── Entities ──
    pub player: Player,
    pub actors: Vec<Actor>,
    pub spawned: Vec<Actor>,
    next_id: u32,

    // ── Level tracking ──
    pub level: u32,
    pub barrels_remaining: u32,
    pub protesters_on_field: u32,
    pub ticks_since_protester: u32,
    pub tick: u64,

    // ── Meta ──
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub rng: ChaCha8Rng,
}

// ── Construction ──

impl WorldState {
    /// A fresh field with no actors. `sim::level::start_level` populates it.
    pub fn new(seed: u64, level: u32, lives: u32) -> Self {
        WorldState {
            grid: EarthGrid::new_field(),
            player: Player::new(),
            actors: vec![],
            spawned: vec![],
            next_id: 1,
            level,
            barrels_remaining: 0,
            protesters_on_field: 0,
            ticks_since_protester: INITIAL_PROTESTER_WAIT,
            tick: 0,
            phase: Phase::Playing,
            score: 0,
            lives,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Throw away the field and every actor. Score, lives and RNG carry over.
    pub fn reset_field(&mut self) {
        self.grid = EarthGrid::new_field();
        self.player = Player::new();
        self.actors.clear();
        self.spawned.clear();
        self.barrels_remaining = 0;
        self.protesters_on_field = 0;
        self.ticks_since_protester = INITIAL_PROTESTER_WAIT;
        self.tick = 0;
    }
}

// ── Registry ──

impl WorldState {
    pub fn alloc_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register immediately (level population).
    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    /// Register after this tick's sweep.
    pub fn queue_spawn(&mut self, actor: Actor) {
        self.spawned.push(actor);
    }

    /// Move queued spawns into the registry.
    pub fn flush_spawned(&mut self) {
        self.actors.append(&mut self.spawned);
    }

    /// Read-only view for spatial queries and pathfinding.
    pub fn view(&self) -> FieldView<'_> {
        FieldView { grid: &self.grid, actors: &self.actors, player: &self.player }
    }

    /// The view plus the RNG, for AI choices that need both at once.
    pub fn view_and_rng(&mut self) -> (FieldView<'_>, &mut ChaCha8Rng) {
        (FieldView { grid: &self.grid, actors: &self.actors, player: &self.player }, &mut self.rng)
    }
}

// ── Status line ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StatusLine {
    pub level: u32,
    pub lives: u32,
    pub health_pct: i32,
    pub water: u32,
    pub gold: u32,
    pub oil_left: u32,
    pub sonar: u32,
    pub score: u32,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lvl: {:2}  Lives: {}  Hlth: {:3}%  Wtr: {:2}  Gld: {:2}  Oil Left: {:2}  Sonar: {:2}  Scr: {:06}",
            self.level, self.lives, self.health_pct, self.water, self.gold,
            self.oil_left, self.sonar, self.score,
        )
    }
}

impl WorldState {
    pub fn status(&self) -> StatusLine {
        StatusLine {
            level: self.level,
            lives: self.lives,
            health_pct: self.player.hp * 10,
            water: self.player.water,
            gold: self.player.gold,
            oil_left: self.barrels_remaining,
            sonar: self.player.sonar,
            score: self.score,
        }
    }
}
