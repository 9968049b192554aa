/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Paint the board into a 64×64 pixel map (one colour per cell)
///   2. Pack two board rows per terminal row with '▀' (fg = upper, bg = lower)
///   3. Compare each terminal cell with the previous frame
///   4. Only emit terminal commands for cells that changed, batched with `queue!`
///   5. Swap front/back
///
/// Board `y` grows upward, so the top terminal row shows rows 63 and 62.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Actor, ActorKind, Direction, GoodieKind, ProtesterVariant};
use crate::domain::grid::{footprint, EARTH_FIELD_HEIGHT, GAME_BOARD_HEIGHT, OIL_FIELD_WIDTH, SPRITE_WIDTH};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, also used
    /// for `Clear`, so row gaps match cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Board pixels
// ══════════════════════════════════════════════════════════════

const BOARD_W: usize = OIL_FIELD_WIDTH as usize;
const BOARD_H: usize = GAME_BOARD_HEIGHT as usize;

const SKY: Color = Color::Rgb { r: 30, g: 40, b: 70 };
const TUNNEL: Color = Cell::BASE_BG;
const PLAYER: Color = Color::Rgb { r: 80, g: 230, b: 90 };
const PLAYER_FACE: Color = Color::Rgb { r: 230, g: 255, b: 230 };

fn earth_color(y: i32) -> Color {
    // Darker further down
    let shade = (y * 60 / EARTH_FIELD_HEIGHT) as u8;
    Color::Rgb { r: 110 + shade, g: 70 + shade / 2, b: 30 }
}

fn actor_color(a: &Actor) -> Color {
    match &a.kind {
        ActorKind::Boulder(_) => Color::Rgb { r: 150, g: 150, b: 150 },
        ActorKind::Squirt(_) => Color::Rgb { r: 120, g: 200, b: 255 },
        ActorKind::Goodie(g) => match g.kind {
            GoodieKind::Barrel => Color::Rgb { r: 20, g: 20, b: 20 },
            GoodieKind::Gold | GoodieKind::DroppedGold => Color::Rgb { r: 255, g: 210, b: 40 },
            GoodieKind::SonarKit => Color::Rgb { r: 60, g: 230, b: 230 },
            GoodieKind::WaterPool => Color::Rgb { r: 40, g: 90, b: 255 },
        },
        ActorKind::Protester(p) => match (p.variant, p.must_leave) {
            (_, true) => Color::Rgb { r: 120, g: 90, b: 90 },
            (ProtesterVariant::Regular, false) => Color::Rgb { r: 235, g: 80, b: 60 },
            (ProtesterVariant::Hardcore, false) => Color::Rgb { r: 210, g: 60, b: 210 },
        },
    }
}

/// Cell inside a footprint that marks which way it faces.
fn facing_pixel(x: i32, y: i32, facing: Direction) -> (i32, i32) {
    let mid = SPRITE_WIDTH / 2;
    match facing {
        Direction::Up => (x + mid, y + SPRITE_WIDTH - 1),
        Direction::Down => (x + mid, y),
        Direction::Left => (x, y + mid),
        Direction::Right => (x + SPRITE_WIDTH - 1, y + mid),
    }
}

/// One colour per board cell, index `y * BOARD_W + x`.
fn board_pixels(world: &WorldState) -> Vec<Color> {
    fn put(px: &mut [Color], x: i32, y: i32, c: Color) {
        if (0..OIL_FIELD_WIDTH).contains(&x) && (0..GAME_BOARD_HEIGHT).contains(&y) {
            px[y as usize * BOARD_W + x as usize] = c;
        }
    }

    let mut px = vec![SKY; BOARD_W * BOARD_H];

    for y in 0..EARTH_FIELD_HEIGHT {
        for x in 0..OIL_FIELD_WIDTH {
            let c = if world.grid.has_earth(x, y) { earth_color(y) } else { TUNNEL };
            put(&mut px, x, y, c);
        }
    }

    for a in world.actors.iter().filter(|a| a.alive && a.visible) {
        let c = actor_color(a);
        for (x, y) in footprint(a.x, a.y) {
            put(&mut px, x, y, c);
        }
    }

    let p = &world.player;
    if p.alive {
        for (x, y) in footprint(p.x, p.y) {
            put(&mut px, x, y, PLAYER);
        }
        let (fx, fy) = facing_pixel(p.x, p.y, p.facing);
        put(&mut px, fx, fy, PLAYER_FACE);
    }
    px
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_ROWS: usize = BOARD_H / 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Playing => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let left = self.front.width.saturating_sub(BOARD_W) / 2;

        let hud = w.status().to_string();
        self.front.put_str(left, HUD_ROW, &hud, Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);

        let px = board_pixels(w);
        for row in 0..MAP_ROWS {
            let upper = BOARD_H - 1 - row * 2;
            let lower = upper - 1;
            for x in 0..BOARD_W {
                let cell = Cell::from_char('▀', px[upper * BOARD_W + x], px[lower * BOARD_W + x]);
                self.front.set(left + x, MAP_ROW + row, cell);
            }
        }

        let help = "←↑↓→ move  SPACE squirt  Z sonar  TAB gold  ESC give up";
        self.front.put_str(left, MAP_ROW + MAP_ROWS + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════════════╗",
            "║          GAME  OVER          ║",
            "╚══════════════════════════════╝",
        ];
        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, red, Color::Reset);
        }
        let score = format!("◈ Final Score: {}", w.score);
        let level = format!("◈ Reached Level: {}", w.level);
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        self.front.put_str(8, 10, &level, Color::White, Color::Reset);
        self.front.put_str(8, 12, "▸ ENTER: Play again", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(8, 13, "▸ ESC:   Quit", Color::DarkGrey, Color::Reset);
    }
}
