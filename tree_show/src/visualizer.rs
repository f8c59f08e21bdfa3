//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MERRY CHRISTMAS                        │
//! │                                                             │
//! │                  .  particle tree  .                        │
//! │               (photo overlay when two                       │
//! │                 hands are detected)                         │
//! │                                                             │
//! │  status bar                                        ♪ cue    │
//! │  key legend                                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pointer stands in for the tracked hand; holding `H` simulates the
//! two-hands condition and `O` the open palm.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use particle_field::{HandPosition, ParticleField, TreeMode};

use crate::app::{AppState, UiCommand};
use crate::gesture::{SimInput, SimKey};
use crate::show::ShowState;
use crate::supervisor::RenderSupervisor;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 960;
pub const WIN_H: usize = 640;

const STATUS_Y:   usize = WIN_H - 40;
const HORIZON_Y:  f32   = (WIN_H as f32) * 0.62;
const CAM_DIST:   f32   = 20.0;
const FOCAL:      f32   = 900.0;

const SKY_TOP:     u32 = 0xFF02_0205;
const SKY_BOTTOM:  u32 = 0xFF0A_2F1E;
const TEXT_BG:     u32 = 0xFF0F_3460;
const GOLD:        u32 = 0xFFD4_AF37;
const DIM_TEXT:    u32 = 0xFF88_8888;
const FRAME_WHITE: u32 = 0xFFF5_F0E8;

// ════════════════════════════════════════════════════════════════════════════
// OverlayView — what the app exposes for the photo overlay
// ════════════════════════════════════════════════════════════════════════════

/// Borrowed view of the current photo for one frame.
pub struct OverlayView<'a> {
    pub uri:     &'a str,
    pub index:   usize,
    pub len:     usize,
    /// Bumps when the photo set is replaced; keys the decode cache.
    pub version: u64,
}

/// Decoded pixels kept between frames so the data URI is only decoded
/// when the set or the cursor changes.
struct CachedPhoto {
    version: u64,
    index:   usize,
    width:   usize,
    height:  usize,
    pixels:  Vec<u32>,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
    ui_tx:  Sender<UiCommand>,

    // Held-key edges for the simulated boolean conditions.
    two_hands_down: bool,
    open_hand_down: bool,

    photo_cache: Option<CachedPhoto>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, ui_tx: Sender<UiCommand>) -> Result<Self, String> {
        let mut window = Window::new(
            "Gesture Tree — particle Christmas show",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![SKY_TOP; WIN_W * WIN_H],
            sim_tx,
            ui_tx,
            two_hands_down: false,
            open_hand_down: false,
            photo_cache: None,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll window input; pointer and held keys feed the gesture
    /// simulator, one-shot keys feed the shell command channel.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);

        if one_shot(&self.window, Key::Q) {
            let _ = self.ui_tx.send(UiCommand::Quit);
            return false;
        }
        if one_shot(&self.window, Key::Space) {
            let _ = self.ui_tx.send(UiCommand::ToggleMode);
        }
        if one_shot(&self.window, Key::P) {
            let _ = self.ui_tx.send(UiCommand::StartShow);
        }
        if one_shot(&self.window, Key::Escape) {
            let _ = self.ui_tx.send(UiCommand::StopShow);
        }
        if one_shot(&self.window, Key::U) {
            let _ = self.ui_tx.send(UiCommand::UploadPhotos);
        }
        if one_shot(&self.window, Key::G) {
            let _ = self.ui_tx.send(UiCommand::PublishShare);
        }
        if one_shot(&self.window, Key::M) {
            let _ = self.ui_tx.send(UiCommand::CreateMine);
        }
        if one_shot(&self.window, Key::R) {
            let _ = self.ui_tx.send(UiCommand::RetryScene);
        }

        // Discrete swipes.
        if one_shot(&self.window, Key::Left) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::SwipeLeft));
        }
        if one_shot(&self.window, Key::Right) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::SwipeRight));
        }

        // Direct mode commands, as the bridge would issue them.
        if one_shot(&self.window, Key::C) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ChaosMode));
        }
        if one_shot(&self.window, Key::F) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::FormedMode));
        }

        // Held boolean conditions — announce edges only.
        let two = self.window.is_key_down(Key::H);
        if two != self.two_hands_down {
            self.two_hands_down = two;
            let key = if two { SimInput::KeyDown(SimKey::TwoHands) } else { SimInput::KeyUp(SimKey::TwoHands) };
            let _ = self.sim_tx.send(key);
        }
        let open = self.window.is_key_down(Key::O);
        if open != self.open_hand_down {
            self.open_hand_down = open;
            let key = if open { SimInput::KeyDown(SimKey::OpenHand) } else { SimInput::KeyUp(SimKey::OpenHand) };
            let _ = self.sim_tx.send(key);
        }

        // Pointer → simulated hand.
        match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((mx, my)) => {
                let _ = self.sim_tx.send(SimInput::Pointer {
                    x: mx / WIN_W as f32,
                    y: my / WIN_H as f32,
                    inside: true,
                });
            }
            None => {
                let _ = self.sim_tx.send(SimInput::Pointer { x: 0.5, y: 0.5, inside: false });
            }
        }

        true
    }

    /// Render one frame.  The scene itself runs under the supervisor; the
    /// chrome (status bar, legend, fallback view) is always drawn.
    pub fn render(&mut self, app: &AppState, supervisor: &mut RenderSupervisor) {
        self.fill_sky();

        if supervisor.failure().is_none() {
            supervisor.run(|| self.draw_scene(app));
        }
        if let Some(message) = supervisor.failure() {
            let message = message.to_string();
            self.draw_error_view(&message);
        }

        self.draw_chrome(app);
        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── scene (supervised) ────────────────────────────────────────────────

    fn draw_scene(&mut self, app: &AppState) -> Result<(), String> {
        self.draw_title();
        self.draw_particles(app.field());
        self.draw_hand_marker(app.hand());
        if let Some(view) = app.overlay_view() {
            self.draw_photo_overlay(&view)?;
        }
        Ok(())
    }

    fn draw_particles(&mut self, field: &ParticleField) {
        for p in field.particles() {
            let [x, y, z] = p.pos;
            let depth = z + CAM_DIST;
            if depth <= 1.0 {
                continue;
            }
            let persp = FOCAL / depth;
            let sx = (WIN_W as f32 / 2.0 + x * persp) as isize;
            let sy = (HORIZON_Y - (y - particle_field::TREE_HEIGHT * 0.35) * persp * 0.9) as isize;
            // Nearer particles draw slightly larger.
            let size = if depth < CAM_DIST { 3 } else { 2 };
            self.fill_rect_clipped(sx, sy, size, size, p.color);
        }
    }

    fn draw_hand_marker(&mut self, hand: &HandPosition) {
        if !hand.detected {
            return;
        }
        let cx = (hand.x * WIN_W as f32) as isize;
        let cy = (hand.y * WIN_H as f32) as isize;
        for d in -6isize..=6 {
            self.set_pixel_clipped(cx + d, cy, GOLD);
            self.set_pixel_clipped(cx, cy + d, GOLD);
        }
    }

    fn draw_title(&mut self) {
        let title = "MERRY CHRISTMAS";
        let w = text_width(title, 3);
        self.draw_text_scaled(title, (WIN_W - w) / 2, 22, GOLD, 3);
    }

    // ── photo overlay ─────────────────────────────────────────────────────

    fn draw_photo_overlay(&mut self, view: &OverlayView<'_>) -> Result<(), String> {
        self.ensure_photo_cached(view)?;

        // Dim the whole scene behind the print.
        for px in self.buf.iter_mut() {
            *px = blend(*px, 0xFF00_0000, 0.55);
        }

        // A bordered print: padding all round, a wider strip below for
        // the counter.
        let box_size = (WIN_W.min(WIN_H) as f32 * 0.55) as usize;
        let pad = 14usize;
        let caption_h = 46usize;
        let frame_w = box_size + pad * 2;
        let frame_h = box_size + pad * 2 + caption_h;
        let fx = (WIN_W - frame_w) / 2;
        let fy = (WIN_H - frame_h) / 2;

        self.fill_rect(fx, fy, frame_w, frame_h, FRAME_WHITE);

        // Gold clip centred on the top edge.
        self.fill_rect(fx + frame_w / 2 - 18, fy.saturating_sub(5), 36, 10, GOLD);

        self.blit_photo_fit(
            view.version,
            fx + pad,
            fy + pad,
            box_size,
            box_size,
        );

        let counter = format!("{} / {}", view.index + 1, view.len);
        let cw = text_width(&counter, 2);
        self.draw_text_scaled(&counter, fx + (frame_w - cw) / 2, fy + pad + box_size + 10, 0xFF33_3333, 2);

        let hint = "SWIPE LEFT: PREV   SWIPE RIGHT: NEXT";
        let hw = text_width(hint, 1);
        self.draw_text(hint, fx + (frame_w.saturating_sub(hw)) / 2, fy + pad + box_size + 28, 0xFF77_7777);
        Ok(())
    }

    fn ensure_photo_cached(&mut self, view: &OverlayView<'_>) -> Result<(), String> {
        let fresh = self
            .photo_cache
            .as_ref()
            .map(|c| c.version == view.version && c.index == view.index)
            .unwrap_or(false);
        if fresh {
            return Ok(());
        }
        let decoded = photo_share::decode_data_uri(view.uri).map_err(|e| e.to_string())?;
        let rgba = decoded.to_rgba8();
        let (w, h) = (rgba.width() as usize, rgba.height() as usize);
        let pixels = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
            })
            .collect();
        self.photo_cache = Some(CachedPhoto {
            version: view.version,
            index:   view.index,
            width:   w,
            height:  h,
            pixels,
        });
        Ok(())
    }

    /// Nearest-neighbour blit of the cached photo, letterboxed into the
    /// destination box.
    fn blit_photo_fit(&mut self, version: u64, dx: usize, dy: usize, dw: usize, dh: usize) {
        let photo = match &self.photo_cache {
            Some(c) if c.version == version => c,
            _ => return,
        };
        if photo.width == 0 || photo.height == 0 {
            return;
        }
        let scale = (dw as f32 / photo.width as f32).min(dh as f32 / photo.height as f32);
        let out_w = (photo.width as f32 * scale) as usize;
        let out_h = (photo.height as f32 * scale) as usize;
        let ox = dx + (dw - out_w) / 2;
        let oy = dy + (dh - out_h) / 2;

        let mut rows = Vec::with_capacity(out_h);
        for row in 0..out_h {
            let sy = (row as f32 / scale) as usize;
            let mut line = Vec::with_capacity(out_w);
            for col in 0..out_w {
                let sx = (col as f32 / scale) as usize;
                line.push(photo.pixels[sy.min(photo.height - 1) * photo.width + sx.min(photo.width - 1)]);
            }
            rows.push(line);
        }
        for (row, line) in rows.into_iter().enumerate() {
            for (col, color) in line.into_iter().enumerate() {
                self.set_pixel(ox + col, oy + row, color);
            }
        }
    }

    // ── chrome (never supervised) ─────────────────────────────────────────

    fn draw_error_view(&mut self, message: &str) {
        for px in self.buf.iter_mut() {
            *px = blend(*px, 0xFF00_0000, 0.8);
        }
        let title = "SOMETHING WENT WRONG";
        let tw = text_width(title, 2);
        self.draw_text_scaled(title, (WIN_W - tw) / 2, WIN_H / 2 - 40, GOLD, 2);

        let detail = truncate(message, 80);
        let dw = text_width(&detail, 1);
        self.draw_text(&detail, (WIN_W.saturating_sub(dw)) / 2, WIN_H / 2, 0xFFCC_CCCC);

        let hint = "PRESS R TO TRY AGAIN";
        let hw = text_width(hint, 1);
        self.draw_text(hint, (WIN_W - hw) / 2, WIN_H / 2 + 24, GOLD);
    }

    fn draw_chrome(&mut self, app: &AppState) {
        // Status bar.
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_text(&app.status.to_uppercase(), 10, STATUS_Y + 6, 0xFFEE_EEEE);

        // Show-state cue on the right.
        let cue = match app.show_state() {
            ShowState::Idle    => "",
            ShowState::Waiting => "OPEN HAND...",
            ShowState::Playing => "# SHOW",
            ShowState::Stopped => "STOPPED",
        };
        if !cue.is_empty() {
            let cw = text_width(cue, 1);
            self.draw_text(cue, WIN_W - cw - 10, STATUS_Y + 6, GOLD);
        }

        // Playing pulse around the frame.
        if app.is_playing() {
            self.draw_border(2, 2, WIN_W - 4, WIN_H - 4, GOLD);
        }

        // Mode + view tags under the status text.
        let mode_tag = match app.field().mode() {
            TreeMode::Chaos  => "MODE: CHAOS",
            TreeMode::Formed => "MODE: FORMED",
        };
        self.draw_text(mode_tag, 10, STATUS_Y + 20, DIM_TEXT);
        if app.is_shared_view() {
            self.draw_text("SHARED VIEW", 140, STATUS_Y + 20, GOLD);
        }

        if app.is_loading_share() {
            let note = "LOADING SHARED PHOTOS...";
            let nw = text_width(note, 2);
            self.draw_text_scaled(note, (WIN_W - nw) / 2, WIN_H / 2, GOLD, 2);
        }

        self.draw_text(
            "SPACE=TOGGLE  P=SHOW  ESC=STOP  U=UPLOAD  G=SHARE  M=MINE  H=HANDS  O=OPEN  ARROWS=SWIPE  Q=QUIT",
            240,
            STATUS_Y + 20,
            DIM_TEXT,
        );
    }

    // ── primitive drawing helpers ─────────────────────────────────────────

    fn fill_sky(&mut self) {
        for row in 0..WIN_H {
            let t = row as f32 / WIN_H as f32;
            let color = blend(SKY_TOP, SKY_BOTTOM, t);
            let line = &mut self.buf[row * WIN_W..(row + 1) * WIN_W];
            line.fill(color);
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn fill_rect_clipped(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        for row in 0..h as isize {
            for col in 0..w as isize {
                self.set_pixel_clipped(x + col, y + row, color);
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            if y < WIN_H {
                self.buf[y * WIN_W + col] = color;
            }
            if y + h - 1 < WIN_H {
                self.buf[(y + h - 1) * WIN_W + col] = color;
            }
        }
        for row in y..(y + h).min(WIN_H) {
            if x < WIN_W {
                self.buf[row * WIN_W + x] = color;
            }
            if x + w - 1 < WIN_W {
                self.buf[row * WIN_W + x + w - 1] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_clipped(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// 4×6 bitmap text, uppercased.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32) {
        self.draw_text_scaled(text, x, y, color, 1);
    }

    fn draw_text_scaled(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch.to_ascii_uppercase());
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..4usize {
                    if bits & (1 << (3 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 5 * scale; // 4 wide + 1 gap
            if cx + 5 * scale > WIN_W {
                break;
            }
        }
    }
}

/// Pixel width of `text` at `scale`.
fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 5 * scale
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 3).collect::<String>() + "..."
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 4×6 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 6] {
    match c {
        '0' => [0b0110, 0b1001, 0b1011, 0b1101, 0b1001, 0b0110],
        '1' => [0b0010, 0b0110, 0b0010, 0b0010, 0b0010, 0b0111],
        '2' => [0b0110, 0b1001, 0b0001, 0b0010, 0b0100, 0b1111],
        '3' => [0b1110, 0b0001, 0b0110, 0b0001, 0b0001, 0b1110],
        '4' => [0b1001, 0b1001, 0b1111, 0b0001, 0b0001, 0b0001],
        '5' => [0b1111, 0b1000, 0b1110, 0b0001, 0b0001, 0b1110],
        '6' => [0b0110, 0b1000, 0b1110, 0b1001, 0b1001, 0b0110],
        '7' => [0b1111, 0b0001, 0b0010, 0b0010, 0b0100, 0b0100],
        '8' => [0b0110, 0b1001, 0b0110, 0b1001, 0b1001, 0b0110],
        '9' => [0b0110, 0b1001, 0b1001, 0b0111, 0b0001, 0b0110],
        'A' => [0b0110, 0b1001, 0b1001, 0b1111, 0b1001, 0b1001],
        'B' => [0b1110, 0b1001, 0b1110, 0b1001, 0b1001, 0b1110],
        'C' => [0b0111, 0b1000, 0b1000, 0b1000, 0b1000, 0b0111],
        'D' => [0b1110, 0b1001, 0b1001, 0b1001, 0b1001, 0b1110],
        'E' => [0b1111, 0b1000, 0b1110, 0b1000, 0b1000, 0b1111],
        'F' => [0b1111, 0b1000, 0b1110, 0b1000, 0b1000, 0b1000],
        'G' => [0b0111, 0b1000, 0b1000, 0b1011, 0b1001, 0b0111],
        'H' => [0b1001, 0b1001, 0b1111, 0b1001, 0b1001, 0b1001],
        'I' => [0b0111, 0b0010, 0b0010, 0b0010, 0b0010, 0b0111],
        'J' => [0b0001, 0b0001, 0b0001, 0b0001, 0b1001, 0b0110],
        'K' => [0b1001, 0b1010, 0b1100, 0b1100, 0b1010, 0b1001],
        'L' => [0b1000, 0b1000, 0b1000, 0b1000, 0b1000, 0b1111],
        'M' => [0b1001, 0b1111, 0b1111, 0b1001, 0b1001, 0b1001],
        'N' => [0b1001, 0b1101, 0b1101, 0b1011, 0b1011, 0b1001],
        'O' => [0b0110, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110],
        'P' => [0b1110, 0b1001, 0b1001, 0b1110, 0b1000, 0b1000],
        'Q' => [0b0110, 0b1001, 0b1001, 0b1001, 0b1010, 0b0101],
        'R' => [0b1110, 0b1001, 0b1001, 0b1110, 0b1010, 0b1001],
        'S' => [0b0111, 0b1000, 0b0110, 0b0001, 0b0001, 0b1110],
        'T' => [0b1111, 0b0010, 0b0010, 0b0010, 0b0010, 0b0010],
        'U' => [0b1001, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110],
        'V' => [0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0110],
        'W' => [0b1001, 0b1001, 0b1001, 0b1111, 0b1111, 0b1001],
        'X' => [0b1001, 0b1001, 0b0110, 0b0110, 0b1001, 0b1001],
        'Y' => [0b1001, 0b1001, 0b0110, 0b0010, 0b0010, 0b0010],
        'Z' => [0b1111, 0b0001, 0b0010, 0b0100, 0b1000, 0b1111],
        '-' => [0b0000, 0b0000, 0b1111, 0b0000, 0b0000, 0b0000],
        '=' => [0b0000, 0b1111, 0b0000, 0b1111, 0b0000, 0b0000],
        '+' => [0b0000, 0b0010, 0b0111, 0b0010, 0b0000, 0b0000],
        '/' => [0b0001, 0b0001, 0b0010, 0b0010, 0b0100, 0b0100],
        ':' => [0b0000, 0b0010, 0b0000, 0b0000, 0b0010, 0b0000],
        '.' => [0b0000, 0b0000, 0b0000, 0b0000, 0b0000, 0b0010],
        ',' => [0b0000, 0b0000, 0b0000, 0b0000, 0b0010, 0b0100],
        '!' => [0b0010, 0b0010, 0b0010, 0b0010, 0b0000, 0b0010],
        '#' => [0b0101, 0b1111, 0b0101, 0b0101, 0b1111, 0b0101],
        '(' => [0b0010, 0b0100, 0b0100, 0b0100, 0b0100, 0b0010],
        ')' => [0b0100, 0b0010, 0b0010, 0b0010, 0b0010, 0b0100],
        '♪' => [0b0011, 0b0010, 0b0010, 0b0010, 0b1110, 0b1110],
        ' ' => [0b0000; 6],
        _   => [0b0000, 0b0000, 0b0010, 0b0000, 0b0000, 0b0000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF;
    let br = (b >> 16) & 0xFF;
    let ag = (a >> 8) & 0xFF;
    let bg = (b >> 8) & 0xFF;
    let ab = a & 0xFF;
    let bb = b & 0xFF;
    0xFF00_0000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn blend_midpoint_is_grey() {
        let mid = blend(0xFF000000, 0xFFFFFFFF, 0.5);
        let r = (mid >> 16) & 0xFF;
        assert!((120..=135).contains(&r));
    }

    #[test]
    fn glyphs_fit_four_columns() {
        for c in "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-=/:.,!#() ".chars() {
            for row in char_glyph(c) {
                assert!(row <= 0b1111, "glyph {c:?} overflows 4 bits");
            }
        }
    }

    #[test]
    fn text_width_counts_cells() {
        assert_eq!(text_width("ABC", 1), 15);
        assert_eq!(text_width("ABC", 2), 30);
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }
}
