/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into the `front` buffer, diffed cell-by-cell
/// against the `back` buffer (the previous frame), and only changed runs
/// are written to the terminal, batched with `queue!` and flushed once.
/// That keeps redraws flicker-free without clearing the screen.
///
/// The simulation runs in pixels; the renderer quantizes positions back
/// to tile cells, with each tile occupying 2 terminal columns.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{EnemyKind, EntityKind};
use crate::domain::physics::TILE_SIZE;
use crate::sim::world::{Phase, WorldState};

// ── Cell: one terminal column in the back-buffer ──

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell. Using the
    /// same RGB for `Clear(ClearType::All)` and all cell backgrounds keeps
    /// the inter-row gap pixels on VTE terminals from showing through as
    /// horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 25, g: 18, b: 10 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel that matches no real cell, so every position diffs dirty.
    const INVALID: Cell = Cell {
        ch: '\0',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        // Color::Reset would fall back to the terminal default and break
        // the uniform background; normalize it away.
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y), clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Fill both terminal columns of one tile.
    fn put_tile(&mut self, col: usize, row: usize, a: char, b: char, fg: Color, bg: Color) {
        self.set(col, row, Cell::new(a, fg, bg));
        self.set(col + 1, row, Cell::new(b, fg, bg));
    }
}

// ── Renderer ──

/// Each tile = 2 terminal columns, so tile (tx) maps to columns (tx*2, tx*2+1).
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 40, g: 28, b: 8 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 170, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 80 };
const SAND: Color = Color::Rgb { r: 210, g: 170, b: 110 };
const SAND_DARK: Color = Color::Rgb { r: 110, g: 80, b: 40 };
const DANGER: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const PLAYER: Color = Color::Rgb { r: 80, g: 255, b: 80 };

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
        self.reshape(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Resize both buffers and force a full repaint.
    fn reshape(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.reshape(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // A phase switch replaces the whole screen; repaint everything.
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(),
            Phase::Playing => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed runs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        // Start every frame from known colors rather than ResetColor: the
        // terminal's native default may differ from BASE_BG.
        let mut fg = Color::White;
        let mut bg = Cell::BASE_BG;
        queue!(self.writer, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                if self.front.get(x, y) == self.back.get(x, y) {
                    x += 1;
                    continue;
                }

                // Changed run: position the cursor once, then print until
                // the row matches the previous frame again.
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                while x < self.front.width {
                    let cell = self.front.get(x, y);
                    if cell == self.back.get(x, y) {
                        break;
                    }
                    if cell.fg != fg {
                        queue!(self.writer, SetForegroundColor(cell.fg))?;
                        fg = cell.fg;
                    }
                    if cell.bg != bg {
                        queue!(self.writer, SetBackgroundColor(cell.bg))?;
                        bg = cell.bg;
                    }
                    queue!(self.writer, Print(cell.ch))?;
                    x += 1;
                }
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let buf_w = self.front.width;
        let room_name = w
            .rooms
            .get(w.session.current_room.wrapping_sub(1))
            .map(|r| r.name.as_str())
            .unwrap_or("???");

        // ── HUD row ──
        let key_status = if w.session.has_key { "⚷" } else { "–" };
        let hud = format!(
            " Room {}: {}  ♥×{}  Key:{}  ${} ",
            w.session.current_room, room_name, w.session.lives,
            key_status, w.session.treasures_collected,
        );
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map: walls from the occupancy grid ──
        let grid_h = w.solid.height;
        for ty in 0..grid_h {
            for tx in 0..w.solid.width {
                if w.solid.is_solid(tx as i32, ty as i32) {
                    self.front.put_tile(tx * CELL_W, MAP_ROW + ty, '▓', '▓', SAND, SAND_DARK);
                }
            }
        }

        // ── Entities, quantized from pixels to tiles ──
        for e in &w.entities {
            let (col, row) = match self.pixel_to_buf(e.pos.x, e.pos.y) {
                Some(p) => p,
                None => continue,
            };
            let (a, b, fg) = match e.kind {
                EntityKind::Rope => (' ', '║', SAND),
                EntityKind::Key => ('K', ' ', GOLD),
                EntityKind::Door { .. } => ('[', ']', SAND),
                EntityKind::Treasure => ('$', ' ', GOLD),
                EntityKind::Trap => ('^', '^', DANGER),
                EntityKind::Enemy(EnemyKind::Mummy) => ('M', ' ', Color::White),
                EntityKind::Enemy(EnemyKind::Pharaoh) => ('P', ' ', GOLD),
                EntityKind::Enemy(EnemyKind::WingedAvatar) => ('W', ' ', Color::Cyan),
            };
            self.front.put_tile(col, row, a, b, fg, Color::Reset);
        }

        // ── Player ──
        if let Some((col, row)) = self.pixel_to_buf(w.player.pos.x, w.player.pos.y) {
            self.front.put_tile(col, row, '@', ' ', PLAYER, Color::Reset);
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + grid_h + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            for x in 0..buf_w {
                self.front.set(x, msg_row, Cell::new(' ', Color::Black, MSG_BG));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + grid_h + 3;
        if help_row < self.front.height {
            let help = " ←→:Run  ↑↓:Climb  Space:Jump (needs a run-up)  R:Restart  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Map a pixel position to front-buffer (col, row), or None when the
    /// position has fallen outside the grid.
    fn pixel_to_buf(&self, px: f32, py: f32) -> Option<(usize, usize)> {
        if px < 0.0 || py < 0.0 {
            return None;
        }
        let col = (px / TILE_SIZE) as usize * CELL_W;
        let row = MAP_ROW + (py / TILE_SIZE) as usize;
        if col + 1 < self.front.width && row < self.front.height {
            Some((col, row))
        } else {
            None
        }
    }

    // ── Static screens (title, game over) ──

    fn compose_title(&mut self) {
        let title = [
            r"  ___  _                          _     _        ___                    ",
            r" | _ \| |_   __ _  _ _  __ _  ___| |_  ( ) ___  / __| _  _  _ _  ___ ___",
            r" |  _/| ' \ / _` || '_|/ _` |/ _ \ '_ \|/ (_-< | (__ | || || '_|(_-</ -_)",
            r" |_|  |_||_|\__,_||_|  \__,_|\___/_.__/   /__/  \___| \_,_||_|  /__/\___|",
        ];

        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Escape the Tomb  ◈◈";
        let sx = 2 + (title[1].len().saturating_sub(subtitle.len())) / 2;
        self.front.put_str(sx, 7, subtitle, PLAYER, Color::Reset);

        let tagline = "━━━ Terminal Edition (Rust) ━━━";
        let tx = 2 + (title[1].len().saturating_sub(tagline.len())) / 2;
        self.front.put_str(tx, 9, tagline, SAND, Color::Reset);

        // Menu options
        let menu_base = 12;
        self.front.put_str(8, menu_base, "ENTER   Enter the Tomb", PLAYER, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        // Controls reference
        let help = [
            "Controls",
            "  ←→ / AD       Run             ↑↓ / WS  Climb ropes",
            "  SPACE         Jump (after a running start)",
            "  R  Restart    ESC  Title",
            "",
            "Grab the key, open the door, and mind the winged avatar:",
            "its touch steals the key and scatters you through the tomb.",
        ];

        let help_base = menu_base + 3;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔═════════════════════════════════╗",
            "║    ☥  THE CURSE  CLAIMS  YOU  ☥ ║",
            "╚═════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, DANGER, Color::Reset);
        }
        let treasure = format!("◈ Treasure plundered: {}", w.session.treasures_collected);
        let room = format!("◈ Fell in room: {}", w.session.current_room);
        self.front.put_str(8, 9, &treasure, Color::White, Color::Reset);
        self.front.put_str(8, 10, &room, Color::White, Color::Reset);
        self.front.put_str(8, 12, "▸ ENTER / R: Try again", PLAYER, Color::Reset);
        self.front.put_str(8, 13, "▸ ESC / Q:   Quit", Color::DarkGrey, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_str_clips_at_the_right_edge() {
        let mut buf = FrameBuffer::new(4, 2);
        buf.put_str(2, 0, "abcd", Color::White, Color::Reset);
        assert_eq!(buf.get(2, 0).ch, 'a');
        assert_eq!(buf.get(3, 0).ch, 'b');
        // Nothing wrapped onto the next row.
        assert_eq!(buf.get(0, 1).ch, ' ');
    }

    #[test]
    fn out_of_bounds_cells_read_blank_and_ignore_writes() {
        let mut buf = FrameBuffer::new(2, 2);
        buf.set(5, 5, Cell::new('x', Color::White, Color::Reset));
        assert_eq!(buf.get(5, 5).ch, ' ');
    }

    #[test]
    fn tile_fill_claims_both_columns() {
        let mut buf = FrameBuffer::new(4, 1);
        buf.put_tile(2, 0, '[', ']', SAND, Color::Reset);
        assert_eq!(buf.get(2, 0).ch, '[');
        assert_eq!(buf.get(3, 0).ch, ']');
    }

    #[test]
    fn reset_background_is_normalized_to_base() {
        let cell = Cell::new('x', Color::White, Color::Reset);
        assert_eq!(cell.bg, Cell::BASE_BG);
    }
}
