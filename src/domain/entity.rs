/// Entities: Player, and the registry actors (Boulder, Squirt, Goodie, Protester).
///
/// Actors share one struct with a closed `ActorKind` enum for the
/// per-kind state. Capability flags are resolved from the kind (and its
/// current state) instead of being stored, so a protester that has given
/// up stops being hittable without any bookkeeping.

// ── Direction / input ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by the pathfinder and by random direction picks.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Cell delta. `y` grows upward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn perpendicular(self) -> [Direction; 2] {
        if self.is_horizontal() {
            [Direction::Up, Direction::Down]
        } else {
            [Direction::Left, Direction::Right]
        }
    }

    pub fn step_from(self, x: i32, y: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

/// One decoded key press. At most one is consumed per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyCommand {
    Move(Direction),
    Fire,
    Sonar,
    DropGold,
    Quit,
}

// ── Player ──

pub const PLAYER_START: (i32, i32) = (30, 60);
pub const PLAYER_HP: i32 = 10;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub hp: i32,
    pub alive: bool,
    pub water: u32,
    pub sonar: u32,
    pub gold: u32,
}

impl Player {
    pub fn new() -> Self {
        Player {
            x: PLAYER_START.0,
            y: PLAYER_START.1,
            facing: Direction::Right,
            hp: PLAYER_HP,
            alive: true,
            water: 5,
            sonar: 1,
            gold: 0,
        }
    }

    /// Apply damage. Returns true if this hit finished the player off.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0 {
            self.hp = 0;
            self.alive = false;
            return true;
        }
        false
    }

    /// Forced elimination (quit key). No give-up cue.
    pub fn give_up(&mut self) {
        self.hp = 0;
        self.alive = false;
    }

    pub fn can_be_bonked(&self) -> bool {
        self.alive
    }
}

impl Default for Player {
    fn default() -> Self {
        Player::new()
    }
}

// ── Actors ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// Kind discriminator, for queries that filter by kind without borrowing state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KindTag {
    Boulder,
    Squirt,
    Goodie,
    Protester,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoulderState {
    Stable,
    Waiting { ticks_left: u32 },
    Falling,
}

pub const BOULDER_WAIT_TICKS: u32 = 30;

#[derive(Clone, Copy, Debug)]
pub struct Boulder {
    pub state: BoulderState,
}

pub const SQUIRT_RANGE: i32 = 4;

#[derive(Clone, Copy, Debug)]
pub struct Squirt {
    pub range_left: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoodieKind {
    Barrel,
    Gold,
    /// Gold the player dropped as a bribe. Only protesters can take it.
    DroppedGold,
    SonarKit,
    WaterPool,
}

impl GoodieKind {
    pub fn points(self) -> u32 {
        match self {
            GoodieKind::Barrel => 1000,
            GoodieKind::Gold => 10,
            GoodieKind::DroppedGold => 0,
            GoodieKind::SonarKit => 75,
            GoodieKind::WaterPool => 100,
        }
    }

    pub fn starts_visible(self) -> bool {
        !matches!(self, GoodieKind::Barrel | GoodieKind::Gold)
    }

    pub fn player_pickable(self) -> bool {
        self != GoodieKind::DroppedGold
    }

    /// Revealed by sonar when hidden.
    pub fn sonar_revealable(self) -> bool {
        matches!(self, GoodieKind::Barrel | GoodieKind::Gold)
    }
}

pub const DROPPED_GOLD_TICKS: u32 = 100;

#[derive(Clone, Copy, Debug)]
pub struct Goodie {
    pub kind: GoodieKind,
    /// `None` = permanent.
    pub ticks_left: Option<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProtesterVariant {
    Regular,
    Hardcore,
}

impl ProtesterVariant {
    pub fn initial_hp(self) -> i32 {
        match self {
            ProtesterVariant::Regular => 5,
            ProtesterVariant::Hardcore => 20,
        }
    }

    /// Bonus for driving it off with squirts.
    pub fn squirt_bonus(self) -> u32 {
        match self {
            ProtesterVariant::Regular => 100,
            ProtesterVariant::Hardcore => 250,
        }
    }

    pub fn gold_bonus(self) -> u32 {
        match self {
            ProtesterVariant::Regular => 25,
            ProtesterVariant::Hardcore => 50,
        }
    }
}

pub const BOULDER_KILL_BONUS: u32 = 500;

#[derive(Clone, Copy, Debug)]
pub struct Protester {
    pub variant: ProtesterVariant,
    pub resting_ticks: u32,
    /// Ticks rested between moves, fixed at spawn from the level number.
    pub move_delay: u32,
    pub must_leave: bool,
    pub steps_left: i32,
    pub ticks_since_shout: u32,
    pub ticks_since_turn: u32,
}

impl Protester {
    pub fn new(variant: ProtesterVariant, level: u32) -> Self {
        Protester {
            variant,
            resting_ticks: 0,
            move_delay: move_delay_for_level(level),
            must_leave: false,
            steps_left: 0,
            ticks_since_shout: 16,
            ticks_since_turn: 201,
        }
    }

    pub fn is_resting(&self) -> bool {
        self.resting_ticks > 0
    }

    /// One-way: a leaving protester never comes back.
    pub fn set_must_leave(&mut self) {
        self.must_leave = true;
        self.resting_ticks = 0;
    }
}

pub fn move_delay_for_level(level: u32) -> u32 {
    3u32.saturating_sub(level / 4)
}

/// Stun after a non-fatal hit, and hardcore stare time after taking gold.
pub fn stun_ticks_for_level(level: u32) -> u32 {
    100u32.saturating_sub(level.saturating_mul(10)).max(50)
}

#[derive(Clone, Copy, Debug)]
pub enum ActorKind {
    Boulder(Boulder),
    Squirt(Squirt),
    Goodie(Goodie),
    Protester(Protester),
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub alive: bool,
    pub visible: bool,
    pub hp: i32,
    pub kind: ActorKind,
}

impl Actor {
    fn with_kind(id: ActorId, x: i32, y: i32, facing: Direction, kind: ActorKind) -> Self {
        Actor { id, x, y, facing, alive: true, visible: true, hp: 0, kind }
    }

    pub fn boulder(id: ActorId, x: i32, y: i32) -> Self {
        Actor::with_kind(id, x, y, Direction::Down, ActorKind::Boulder(Boulder { state: BoulderState::Stable }))
    }

    pub fn squirt(id: ActorId, x: i32, y: i32, facing: Direction) -> Self {
        Actor::with_kind(id, x, y, facing, ActorKind::Squirt(Squirt { range_left: SQUIRT_RANGE }))
    }

    pub fn goodie(id: ActorId, x: i32, y: i32, kind: GoodieKind, lifetime: Option<u32>) -> Self {
        let mut a = Actor::with_kind(
            id, x, y, Direction::Right,
            ActorKind::Goodie(Goodie { kind, ticks_left: lifetime }),
        );
        a.visible = kind.starts_visible();
        a
    }

    pub fn protester(id: ActorId, x: i32, y: i32, variant: ProtesterVariant, level: u32) -> Self {
        let mut a = Actor::with_kind(
            id, x, y, Direction::Left,
            ActorKind::Protester(Protester::new(variant, level)),
        );
        a.hp = variant.initial_hp();
        a
    }

    pub fn tag(&self) -> KindTag {
        match self.kind {
            ActorKind::Boulder(_) => KindTag::Boulder,
            ActorKind::Squirt(_) => KindTag::Squirt,
            ActorKind::Goodie(_) => KindTag::Goodie,
            ActorKind::Protester(_) => KindTag::Protester,
        }
    }

    pub fn is_boulder(&self) -> bool {
        self.tag() == KindTag::Boulder
    }

    pub fn is_protester(&self) -> bool {
        self.tag() == KindTag::Protester
    }

    pub fn as_protester(&self) -> Option<&Protester> {
        match &self.kind {
            ActorKind::Protester(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_protester_mut(&mut self) -> Option<&mut Protester> {
        match &mut self.kind {
            ActorKind::Protester(p) => Some(p),
            _ => None,
        }
    }

    pub fn goodie_kind(&self) -> Option<GoodieKind> {
        match &self.kind {
            ActorKind::Goodie(g) => Some(g.kind),
            _ => None,
        }
    }

    fn is_active_protester(&self) -> bool {
        self.as_protester().map_or(false, |p| !p.must_leave)
    }

    // ── Capability table ──

    pub fn blocks_movement(&self) -> bool {
        self.is_boulder()
    }

    /// Can a squirt hit it?
    pub fn can_be_hit(&self) -> bool {
        self.is_active_protester()
    }

    /// Can a falling boulder hurt it?
    pub fn can_be_bonked(&self) -> bool {
        self.is_active_protester()
    }

    pub fn can_pick_up_gold(&self) -> bool {
        self.is_active_protester()
    }

    pub fn is_damageable(&self) -> bool {
        self.is_active_protester()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_dead(&mut self) {
        self.alive = false;
    }
}

// ── Damage ──

/// Who dealt a hit. Scoring depends on it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DamageSource {
    Boulder(ActorId),
    Squirt(ActorId),
    Shout(ActorId),
}

#[derive(Clone, Copy, Debug)]
pub struct Damage {
    pub amount: i32,
    pub source: DamageSource,
}

impl Damage {
    pub fn is_from_boulder(&self) -> bool {
        matches!(self.source, DamageSource::Boulder(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DamageOutcome {
    /// Target could not be damaged (already leaving).
    Ignored,
    StillPresent,
    GaveUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_deltas_grow_upward() {
        assert_eq!(Direction::Up.delta(), (0, 1));
        assert_eq!(Direction::Down.step_from(5, 5), (5, 4));
        assert_eq!(Direction::Left.perpendicular(), [Direction::Up, Direction::Down]);
        assert_eq!(Direction::Up.perpendicular(), [Direction::Left, Direction::Right]);
    }

    #[test]
    fn player_dies_once() {
        let mut p = Player::new();
        assert!(!p.take_damage(2));
        assert_eq!(p.hp, 8);
        assert!(p.take_damage(100));
        assert_eq!(p.hp, 0);
        assert!(!p.alive);
        assert!(!p.take_damage(2));
    }

    #[test]
    fn protester_constructor_sets_hp_and_state() {
        let a = Actor::protester(ActorId(3), 60, 60, ProtesterVariant::Hardcore, 8);
        assert_eq!(a.hp, 20);
        assert_eq!(a.facing, Direction::Left);
        let p = a.as_protester().expect("protester");
        assert_eq!(p.variant, ProtesterVariant::Hardcore);
        assert_eq!(p.move_delay, 1);
        assert!(!p.is_resting());
        assert!(Actor::boulder(ActorId(4), 0, 0).as_protester().is_none());
    }

    #[test]
    fn leaving_protester_loses_capabilities() {
        let mut a = Actor::protester(ActorId(1), 60, 60, ProtesterVariant::Regular, 0);
        assert!(a.can_be_hit() && a.can_be_bonked() && a.can_pick_up_gold() && a.is_damageable());
        assert!(!a.blocks_movement());
        assert!(Actor::boulder(ActorId(2), 0, 0).blocks_movement());
        if let Some(p) = a.as_protester_mut() {
            p.set_must_leave();
        }
        assert!(!a.can_be_hit());
        assert!(!a.can_be_bonked());
        assert!(!a.can_pick_up_gold());
        assert!(!a.is_damageable());
    }

    #[test]
    fn goodie_visibility_per_kind() {
        assert!(!Actor::goodie(ActorId(1), 0, 0, GoodieKind::Barrel, None).visible);
        assert!(!Actor::goodie(ActorId(2), 0, 0, GoodieKind::Gold, None).visible);
        assert!(Actor::goodie(ActorId(3), 0, 0, GoodieKind::WaterPool, Some(100)).visible);
        assert!(Actor::goodie(ActorId(4), 0, 0, GoodieKind::DroppedGold, Some(100)).visible);
        assert!(!GoodieKind::DroppedGold.player_pickable());
    }

    #[test]
    fn level_scaled_timers() {
        assert_eq!(move_delay_for_level(0), 3);
        assert_eq!(move_delay_for_level(4), 2);
        assert_eq!(move_delay_for_level(20), 0);
        assert_eq!(stun_ticks_for_level(0), 100);
        assert_eq!(stun_ticks_for_level(3), 70);
        assert_eq!(stun_ticks_for_level(9), 50);
        assert_eq!(stun_ticks_for_level(u32::MAX), 50);
        assert_eq!(move_delay_for_level(u32::MAX), 0);
    }
}
