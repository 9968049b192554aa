/// Earth grid: dense per-cell earth presence over the oil field.
///
/// Coordinates are cell units with `y` growing upward (row 0 is the bottom).
/// The field is `OIL_FIELD_WIDTH × EARTH_FIELD_HEIGHT`; the board extends to
/// `GAME_BOARD_HEIGHT` rows, and the rows above the earth never hold earth.
///
/// Earth is created once at level start and only ever removed afterwards.
/// Out-of-bounds reads report "no earth" so callers never index past the edge.

pub const OIL_FIELD_WIDTH: i32 = 64;
pub const EARTH_FIELD_HEIGHT: i32 = 60;
pub const GAME_BOARD_HEIGHT: i32 = 64;

pub const SPRITE_WIDTH: i32 = 4;
pub const SPRITE_HEIGHT: i32 = 4;

/// The permanent vertical shaft: columns `SHAFT_LEFT..=SHAFT_RIGHT`,
/// rows `SHAFT_BOTTOM` and up, never hold earth.
pub const SHAFT_LEFT: i32 = 30;
pub const SHAFT_RIGHT: i32 = 33;
pub const SHAFT_BOTTOM: i32 = 4;

#[derive(Clone, Debug)]
pub struct EarthGrid {
    cells: Vec<bool>,
}

impl EarthGrid {
    /// A fresh level: earth everywhere except the shaft.
    pub fn new_field() -> Self {
        let mut grid = EarthGrid::empty();
        for y in 0..EARTH_FIELD_HEIGHT {
            for x in 0..OIL_FIELD_WIDTH {
                if !in_shaft(x, y) {
                    grid.set_earth(x, y);
                }
            }
        }
        grid
    }

    /// No earth at all.
    pub fn empty() -> Self {
        EarthGrid {
            cells: vec![false; (OIL_FIELD_WIDTH * EARTH_FIELD_HEIGHT) as usize],
        }
    }

    #[inline]
    pub fn has_earth(&self, x: i32, y: i32) -> bool {
        in_field(x, y) && self.cells[index(x, y)]
    }

    /// Remove one cell of earth. Returns whether earth was present.
    pub fn remove_earth(&mut self, x: i32, y: i32) -> bool {
        if !self.has_earth(x, y) {
            return false;
        }
        self.cells[index(x, y)] = false;
        true
    }

    pub fn set_earth(&mut self, x: i32, y: i32) {
        if in_field(x, y) {
            self.cells[index(x, y)] = true;
        }
    }

    /// No earth anywhere in the footprint anchored at (x, y).
    pub fn is_clear_footprint(&self, x: i32, y: i32) -> bool {
        footprint(x, y).all(|(cx, cy)| !self.has_earth(cx, cy))
    }

    /// Remove every earth cell in the footprint. Returns whether any was removed.
    pub fn remove_footprint(&mut self, x: i32, y: i32) -> bool {
        let mut removed = false;
        for (cx, cy) in footprint(x, y) {
            removed |= self.remove_earth(cx, cy);
        }
        removed
    }

    /// Is there earth anywhere in the row directly beneath the footprint?
    pub fn has_earth_below(&self, x: i32, y: i32) -> bool {
        (x..x + SPRITE_WIDTH).any(|cx| self.has_earth(cx, y - 1))
    }

    /// Number of earth cells left on the field.
    pub fn remaining(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// All cells of the footprint anchored at (x, y), bottom row first.
pub fn footprint(x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> {
    (y..y + SPRITE_HEIGHT).flat_map(move |cy| (x..x + SPRITE_WIDTH).map(move |cx| (cx, cy)))
}

pub fn in_shaft(x: i32, y: i32) -> bool {
    (SHAFT_LEFT..=SHAFT_RIGHT).contains(&x) && y >= SHAFT_BOTTOM
}

#[inline]
fn in_field(x: i32, y: i32) -> bool {
    x >= 0 && x < OIL_FIELD_WIDTH && y >= 0 && y < EARTH_FIELD_HEIGHT
}

#[inline]
fn index(x: i32, y: i32) -> usize {
    (y * OIL_FIELD_WIDTH + x) as usize
}
