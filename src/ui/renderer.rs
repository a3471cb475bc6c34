/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the session. Anything that moves after the
/// session has already moved on (flying pieces, flashes) comes from
/// `Effects`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::piece::Piece;
use crate::domain::side::Side;
use crate::sim::event::DeathCause;
use crate::sim::session::{Phase, Session};
use super::effects::{Effects, FlyingPiece};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell's
    /// background keeps VTE terminals from showing lines between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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

    /// Like `set` but with signed coordinates; off-screen writes are dropped.
    fn set_i(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 {
            self.set(x as usize, y as usize, cell);
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn put_str_i(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if ch != ' ' {
                self.set_i(x + i as i32, y, Cell::from_char(ch, fg, bg));
            }
        }
    }

    /// Centered string on row `y`.
    fn put_center(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

const HUD_ROW: usize = 0;
const BAR_ROW: usize = 1;
/// Terminal rows per tower level.
const PIECE_H: i32 = 3;
/// Columns of the sushi body.
const PIECE_W: i32 = 10;
/// Columns of a pair of chopsticks.
const STICK_LEN: i32 = 9;
/// Gap between the tower and the cat.
const CAT_GAP: i32 = 2;
const CAT_W: i32 = 7;

const CAT_IDLE: [&str; 3] = [
    r" /\_/\ ",
    r"( o.o )",
    r" (   ) ",
];
const CAT_PUNCH_LEFT: [&str; 3] = [
    r" /\_/\ ",
    r"( >.< )",
    r"=(   ) ",
];
const CAT_PUNCH_RIGHT: [&str; 3] = [
    r" /\_/\ ",
    r"( >.< )",
    r" (   )=",
];
const CAT_FLAT: [&str; 3] = [
    r"       ",
    r" _____ ",
    r"(x_x )~",
];

// ── Palette ──

const RICE: Color = Color::Rgb { r: 240, g: 236, b: 220 };
const SALMON: Color = Color::Rgb { r: 250, g: 128, b: 90 };
const TUNA: Color = Color::Rgb { r: 200, g: 50, b: 70 };
const NORI: Color = Color::Rgb { r: 30, g: 60, b: 40 };
const STICK: Color = Color::Rgb { r: 190, g: 140, b: 80 };
const PLATE: Color = Color::Rgb { r: 120, g: 160, b: 200 };
const CAT: Color = Color::Rgb { r: 255, g: 200, b: 120 };
const BLOOD: Color = Color::Rgb { r: 220, g: 40, b: 40 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

/// Blend `c` toward the base background by `alpha` (1.0 = unchanged).
fn fade(c: Color, alpha: f32) -> Color {
    let (br, bg, bb) = (22.0, 22.0, 35.0);
    match c {
        Color::Rgb { r, g, b } => {
            let mix = |v: u8, base: f32| (base + (v as f32 - base) * alpha).round() as u8;
            Color::Rgb { r: mix(r, br), g: mix(g, bg), b: mix(b, bb) }
        }
        other => other,
    }
}

/// Red-shift a color for the game-over tint.
fn tint_red(c: Color) -> Color {
    match c {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: r.saturating_add(60).max(160),
            g: g / 3,
            b: b / 3,
        },
        other => other,
    }
}

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
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Width of the tappable area in columns, as of the last frame.
    pub fn width(&self) -> usize {
        self.term_w
    }

    pub fn render(&mut self, session: &Session, fx: &Effects, pad_connected: bool) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            log::debug!("terminal resized to {}x{}", self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(session.phase()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase());
        }

        self.front.clear();

        match session.phase() {
            Phase::Title => self.compose_title(session, fx, pad_connected),
            Phase::Ready => self.compose_ready(session, fx),
            Phase::Playing => self.compose_playing(session, fx),
            Phase::GameOver => self.compose_game_over(session, fx),
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
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

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

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

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Geometry ──

    /// Tower axis column.
    fn axis(&self) -> i32 {
        self.front.width as i32 / 2
    }

    /// Row of the ground line under the base plate.
    fn ground(&self) -> i32 {
        self.front.height as i32 - 3
    }

    /// Top row of the slot at `level`. Level 0 sits on the ground and
    /// is where the cat stands.
    fn level_top(&self, level: i32) -> i32 {
        self.ground() - (level + 1) * PIECE_H
    }

    // ── Compose: build front buffer content ──

    fn compose_title(&mut self, s: &Session, fx: &Effects, pad_connected: bool) {
        let logo = [
            r" ____            _     _   _   _      _         ",
            r"/ ___| _   _ ___| |__ (_) | \ | | ___| | _____  ",
            r"\___ \| | | / __| '_ \| | |  \| |/ _ \ |/ / _ \ ",
            r" ___) | |_| \__ \ | | | | | |\  |  __/   < (_) |",
            r"|____/ \__,_|___/_| |_|_| |_| \_|\___|_|\_\___/ ",
        ];
        for (i, line) in logo.iter().enumerate() {
            self.front.put_center(2 + i, line, GOLD, Color::Reset);
        }
        self.front.put_center(8, "~ punch the sushi, dodge the chopsticks ~", SALMON, Color::Reset);

        let menu = 11;
        let prompt = if fx.blink(20) { "ENTER  Play" } else { "           " };
        self.front.put_center(menu, prompt, GREEN, Color::Reset);
        self.front.put_center(menu + 1, "  Q    Quit ", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  Click left / right half     Punch from that side",
            "  Left  / A / Z               Punch from the left",
            "  Right / D / X               Punch from the right",
            "  ESC / Q                     Quit",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_center(menu + 3 + i, line, color, Color::Reset);
        }

        let status = format!(
            " seed {}   gamepad: {} ",
            s.seed(),
            if pad_connected { "connected" } else { "none" },
        );
        let row = self.front.height.saturating_sub(1);
        self.front.put_str(1, row, &status, Color::DarkGrey, Color::Reset);
    }

    fn compose_ready(&mut self, s: &Session, fx: &Effects) {
        self.compose_scene(s, fx, false);
        self.compose_hud(s, fx);

        let row = self.front.height.saturating_sub(1);
        self.front.fill_row(row, MSG_BG);
        let msg = if fx.blink(15) { " TAP LEFT OR RIGHT TO START " } else { "" };
        self.front.put_center(row, msg, Color::Black, MSG_BG);
    }

    fn compose_playing(&mut self, s: &Session, fx: &Effects) {
        self.compose_scene(s, fx, false);
        self.compose_hud(s, fx);
    }

    fn compose_game_over(&mut self, s: &Session, fx: &Effects) {
        self.compose_scene(s, fx, s.is_over());

        if fx.flash > 0 && fx.flash % 4 >= 2 {
            let flash_bg = match fx.death {
                Some(DeathCause::Starved) => Color::Rgb { r: 40, g: 30, b: 80 },
                _ => Color::Rgb { r: 90, g: 10, b: 10 },
            };
            self.front.fill_row(HUD_ROW, flash_bg);
            self.front.fill_row(BAR_ROW, flash_bg);
        }

        let box_art = [
            "╔══════════════════════════════╗",
            "║          GAME  OVER          ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_center(3 + i, l, BLOOD, Color::Reset);
        }

        let cause = match s.death() {
            Some(DeathCause::Crushed) => "Flattened by chopsticks",
            Some(DeathCause::Starved) => "Ran out of appetite",
            None => "",
        };
        let score = format!("Final Score: {}", s.score());
        let seed = format!("Seed: {}", s.seed());
        self.front.put_center(7, cause, Color::White, Color::Reset);
        self.front.put_center(8, &score, GOLD, Color::Reset);
        self.front.put_center(9, &seed, Color::DarkGrey, Color::Reset);
        self.front.put_center(11, "ENTER: Play again   ESC: Quit", GREEN, Color::Reset);
    }

    /// Score line plus health bar across the top two rows.
    fn compose_hud(&mut self, s: &Session, fx: &Effects) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.fill_row(BAR_ROW, HUD_BG);

        let score = format!(" SCORE {:>5}", s.score());
        self.front.put_str(0, HUD_ROW, &score, GOLD, HUD_BG);

        let bar_w = self.front.width.saturating_sub(4).min(40);
        let health = s.health();
        let filled = (health * bar_w as f32).round() as usize;
        let low = health < 0.25;
        let color = if health > 0.5 {
            GREEN
        } else if !low {
            GOLD
        } else if fx.blink(6) {
            BLOOD
        } else {
            fade(BLOOD, 0.5)
        };
        let x0 = (self.front.width.saturating_sub(bar_w)) / 2;
        for i in 0..bar_w {
            let ch = if i < filled { '█' } else { '░' };
            let fg = if i < filled { color } else { Color::DarkGrey };
            self.front.set(x0 + i, BAR_ROW, Cell::from_char(ch, fg, HUD_BG));
        }
    }

    /// Ground, plate, tower, cat and anything in flight.
    fn compose_scene(&mut self, s: &Session, fx: &Effects, dead: bool) {
        let tint = |c: Color| if dead { tint_red(c) } else { c };

        // Ground
        let ground = self.ground();
        for x in 0..self.front.width {
            self.front.set_i(x as i32, ground, Cell::from_char('▔', tint(NORI), Color::Reset));
        }

        // Base plate, always under level 0
        let axis = self.axis();
        let plate_w = PIECE_W + 4;
        let plate: String = "▁".repeat(plate_w as usize);
        self.front.put_str_i(axis - plate_w / 2, ground - 1, &plate, tint(PLATE), Color::Reset);

        // Tower, drawn in z order so a settled tower overlaps cleanly
        let mut pieces: Vec<&Piece> = s.tower().iter().collect();
        pieces.sort_by_key(|p| p.z);
        for piece in pieces {
            self.compose_piece(piece, 0, 0, tint, 1.0);
        }

        // Cat
        let crushed = dead && s.death() == Some(DeathCause::Crushed);
        let art = if crushed {
            CAT_FLAT
        } else if fx.punch > 0 {
            match s.character() {
                Side::Right => CAT_PUNCH_LEFT,
                _ => CAT_PUNCH_RIGHT,
            }
        } else {
            CAT_IDLE
        };
        let cat_x = match s.character() {
            Side::Right => axis + PIECE_W / 2 + CAT_GAP,
            _ => axis - PIECE_W / 2 - CAT_GAP - CAT_W,
        };
        let cat_top = self.level_top(0);
        let cat_color = if crushed { BLOOD } else { tint(CAT) };
        for (i, line) in art.iter().enumerate() {
            self.front.put_str_i(cat_x, cat_top + i as i32, line, cat_color, Color::Reset);
        }

        for f in &fx.flying {
            self.compose_flying(f);
        }
    }

    fn compose_flying(&mut self, f: &FlyingPiece) {
        // knocked out from the front slot, which is level 1 at the time
        let lift = f.lift();
        let dx = f.offset();
        let alpha = f.alpha();
        let mut shown = f.piece.clone();
        shown.level = 1;
        self.compose_piece(&shown, dx, -lift, |c| c, alpha);
    }

    /// One sushi piece with its chopsticks. `dx`/`dy` shift it off its slot.
    fn compose_piece(&mut self, piece: &Piece, dx: i32, dy: i32, tint: impl Fn(Color) -> Color, alpha: f32) {
        let top = self.level_top(piece.level) + dy;
        if top + PIECE_H < 0 || top > self.front.height as i32 {
            return;
        }
        let left = self.axis() - PIECE_W / 2 + dx;
        let fish = if piece.id.0 % 2 == 0 { SALMON } else { TUNA };
        let col = |c: Color| fade(tint(c), alpha);

        let topping: String = "▄".repeat(PIECE_W as usize);
        let rice: String = std::iter::once('▐')
            .chain(std::iter::repeat('▓').take(PIECE_W as usize - 2))
            .chain(std::iter::once('▌'))
            .collect();
        let wrap: String = "▀".repeat(PIECE_W as usize);
        self.front.put_str_i(left, top, &topping, col(fish), Color::Reset);
        self.front.put_str_i(left, top + 1, &rice, col(RICE), col(NORI));
        self.front.put_str_i(left, top + 2, &wrap, col(NORI), Color::Reset);

        let sticks: String = "═".repeat(STICK_LEN as usize);
        match piece.side {
            Side::Left => {
                self.front.put_str_i(left - STICK_LEN, top + 1, &sticks, col(STICK), Color::Reset);
            }
            Side::Right => {
                self.front.put_str_i(left + PIECE_W, top + 1, &sticks, col(STICK), Color::Reset);
            }
            Side::None => {}
        }
    }
}
