//! Top-level application state machine.
//!
//! `AppState` owns the particle field, the gallery, the show orchestrator
//! and the audio player, and is mutated only through `handle_gesture`,
//! `handle_command`, `apply` (worker results) and the per-frame `tick` —
//! all called from the main loop, so no two mutations ever interleave.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::{error, info, warn};

use carol_audio::{LoopWindow, PlaybackEvent, Player, Track};
use particle_field::{HandPosition, ParticleField, TreeMode};
use photo_share::{encode_photos, Direction, Gallery, ShareStore};

use crate::gesture::{
    spawn_gesture_source, GestureEvent, SimGestureSource, SimInput, SwipeDirection,
};
use crate::show::{ShowOrchestrator, ShowState};
use crate::supervisor::RenderSupervisor;
use crate::visualizer::{OverlayView, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
pub struct AppConfig {
    pub particle_count:  usize,
    /// The fixed show track (WAV).
    pub audio_path:      PathBuf,
    pub loop_window:     LoopWindow,
    /// Base URL of the share service.
    pub api_base:        String,
    /// Selects shared-view mode on startup (the `?share=` analog).
    pub share_id:        Option<String>,
    /// Override for the local fallback store directory.
    pub local_share_dir: Option<PathBuf>,
    /// External tracker command (only consulted with the `tracker`
    /// feature); otherwise the keyboard/pointer simulator drives.
    pub tracker_command: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            particle_count:  2400,
            audio_path:      PathBuf::from("assets/christmas_list.wav"),
            loop_window:     LoopWindow::default(),
            api_base:        "http://127.0.0.1:8787".to_string(),
            share_id:        None,
            local_share_dir: None,
            tracker_command: None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Commands and worker events
// ════════════════════════════════════════════════════════════════════════════

/// Shell controls, distinct from bridge gestures: these are the buttons
/// of the original overlay, driven from the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiCommand {
    ToggleMode,
    StartShow,
    StopShow,
    /// Open the file picker and upload the chosen photos.
    UploadPhotos,
    /// Save the current photo set under a fresh share id (local store).
    PublishShare,
    /// Leave shared view and start an own tree.
    CreateMine,
    /// Clear a tripped render scope and re-attempt the scene.
    RetryScene,
    Quit,
}

/// Result of a gallery-replacing worker.  Each carries the token it was
/// issued with; stale tokens are discarded so a slow early task can never
/// clobber the result of a newer one.
#[derive(Debug)]
pub enum WorkerEvent {
    PhotosReady { token: u64, photos: Vec<String> },
    PhotosFailed { token: u64, error: String },
    ShareResolved { token: u64, photos: Option<Vec<String>> },
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── visual state ─────────────────────────────────────────────────────
    field: ParticleField,
    hand:  HandPosition,

    // ── show ─────────────────────────────────────────────────────────────
    orchestrator: ShowOrchestrator,
    player:       Player,

    // ── photos ───────────────────────────────────────────────────────────
    gallery:       Gallery,
    store:         ShareStore,
    two_hands:     bool,
    open_hand:     bool,
    shared_view:   bool,
    loading_share: bool,
    /// Bumped whenever the photo set is replaced; keys the overlay cache.
    photo_version: u64,

    // ── workers ──────────────────────────────────────────────────────────
    /// Latest issued token; completions carrying anything older are stale.
    task_seq:  u64,
    worker_tx: Sender<WorkerEvent>,
    worker_rx: Receiver<WorkerEvent>,

    // ── status message ───────────────────────────────────────────────────
    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        let track = match Track::load(&cfg.audio_path) {
            Ok(t) => {
                info!("show track loaded: {:?} ({:.0?})", cfg.audio_path, t.duration());
                t
            }
            Err(e) => {
                error!("show track unavailable: {e}");
                Track::silent()
            }
        };
        let player = Player::spawn(track, cfg.loop_window);

        let store = match cfg.local_share_dir {
            Some(dir) => ShareStore::with_local_dir(&cfg.api_base, dir),
            None => ShareStore::new(&cfg.api_base),
        };

        let (worker_tx, worker_rx) = mpsc::channel();

        let mut app = AppState {
            field: ParticleField::new(cfg.particle_count),
            hand: HandPosition::default(),
            orchestrator: ShowOrchestrator::new(),
            player,
            gallery: Gallery::new(),
            store,
            two_hands: false,
            open_hand: false,
            shared_view: false,
            loading_share: false,
            photo_version: 0,
            task_seq: 0,
            worker_tx,
            worker_rx,
            status: "Ready — Space re-forms the tree, P arms the show".to_string(),
        };

        if let Some(id) = cfg.share_id {
            app.shared_view = true;
            app.begin_share_fetch(id);
        }
        app
    }

    // ── process one GestureEvent ─────────────────────────────────────────

    pub fn handle_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Hand { x, y, detected } => {
                self.hand = HandPosition { x, y, detected };
            }

            GestureEvent::TwoHands(detected) => {
                self.two_hands = detected;
                if detected && !self.gallery.is_empty() {
                    self.status = format!(
                        "Memory {} / {} — swipe to browse",
                        self.gallery.index() + 1,
                        self.gallery.len()
                    );
                }
            }

            GestureEvent::OpenHand(held) => {
                self.open_hand = held;
            }

            GestureEvent::Swipe(direction) => {
                if self.gallery.is_empty() {
                    return;
                }
                self.gallery.advance(match direction {
                    SwipeDirection::Right => Direction::Next,
                    SwipeDirection::Left  => Direction::Previous,
                });
                self.status = format!(
                    "Memory {} / {}",
                    self.gallery.index() + 1,
                    self.gallery.len()
                );
            }

            GestureEvent::SetMode(mode) => {
                self.field.set_mode(mode);
                self.status = match mode {
                    TreeMode::Chaos  => "Scatter!".to_string(),
                    TreeMode::Formed => "Tree re-formed".to_string(),
                };
            }
        }
    }

    // ── process one UiCommand ────────────────────────────────────────────

    /// Handle everything except `UploadPhotos`, `RetryScene` and `Quit`,
    /// which the run loop intercepts (file picker, supervisor, exit).
    pub fn handle_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::ToggleMode => {
                let mode = self.field.toggle();
                self.status = match mode {
                    TreeMode::Chaos  => "Chaos — wave a hand to stir the swirl".to_string(),
                    TreeMode::Formed => "Tree re-formed".to_string(),
                };
            }

            UiCommand::StartShow => {
                if self.orchestrator.request_start() {
                    self.status = "Show armed — scatter the tree and open a hand".to_string();
                }
            }

            UiCommand::StopShow => {
                let mut mode = self.field.mode();
                if self.orchestrator.request_stop(&mut mode, &self.player) {
                    self.field.set_mode(mode);
                    self.status = "Show stopped — tree re-formed".to_string();
                }
            }

            UiCommand::PublishShare => {
                if self.shared_view {
                    self.status = "This is someone else's tree — press M to start your own".to_string();
                } else if self.gallery.is_empty() {
                    self.status = "Nothing to share yet — press U to add photos".to_string();
                } else {
                    let id = new_share_id();
                    match self.store.save_local(&id, self.gallery.photos()) {
                        Ok(()) => self.status = format!("Saved — open with --share {id}"),
                        Err(e) => {
                            error!("failed to save share: {e}");
                            self.status = "Could not save the share".to_string();
                        }
                    }
                }
            }

            UiCommand::CreateMine => {
                self.shared_view = false;
                self.loading_share = false;
                self.gallery.replace(Vec::new());
                self.photo_version += 1;
                // Invalidate any in-flight share fetch.
                self.task_seq += 1;
                self.status = "Your own tree — press U to add photos".to_string();
            }

            UiCommand::UploadPhotos | UiCommand::RetryScene | UiCommand::Quit => {}
        }
    }

    // ── workers ──────────────────────────────────────────────────────────

    fn issue_token(&mut self) -> u64 {
        self.task_seq += 1;
        self.task_seq
    }

    /// Convert picked files on a worker thread, then swap the gallery.
    pub fn begin_upload(&mut self, paths: Vec<PathBuf>) {
        if self.shared_view {
            self.status = "Shared view is read-only — press M to start your own tree".to_string();
            return;
        }
        let token = self.issue_token();
        let tx = self.worker_tx.clone();
        self.status = "Reading photos…".to_string();
        thread::spawn(move || {
            let event = match encode_photos(&paths) {
                Ok(photos) => WorkerEvent::PhotosReady { token, photos },
                Err(e) => WorkerEvent::PhotosFailed { token, error: e.to_string() },
            };
            let _ = tx.send(event);
        });
    }

    /// Resolve a shared photo set on a worker thread.
    fn begin_share_fetch(&mut self, id: String) {
        let token = self.issue_token();
        let tx = self.worker_tx.clone();
        let store = self.store.clone();
        self.loading_share = true;
        self.status = "Loading shared photos…".to_string();
        thread::spawn(move || {
            let photos = store.resolve(&id);
            let _ = tx.send(WorkerEvent::ShareResolved { token, photos });
        });
    }

    /// Apply one worker result; anything with a stale token is dropped.
    fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::PhotosReady { token, photos } => {
                if token != self.task_seq {
                    info!("discarding stale upload result (token {token})");
                    return;
                }
                let count = photos.len();
                self.gallery.replace(photos);
                self.photo_version += 1;
                self.status = if count == 0 {
                    "No image files in that selection".to_string()
                } else {
                    format!("{count} photos ready — hold H (two hands) to view")
                };
            }

            WorkerEvent::PhotosFailed { token, error } => {
                if token != self.task_seq {
                    return;
                }
                warn!("photo upload failed: {error}");
                self.status = "Could not read those photos — previous set kept".to_string();
            }

            WorkerEvent::ShareResolved { token, photos } => {
                if token != self.task_seq {
                    info!("discarding stale share result (token {token})");
                    return;
                }
                self.loading_share = false;
                match photos {
                    Some(photos) => {
                        let count = photos.len();
                        self.gallery.replace(photos);
                        self.photo_version += 1;
                        self.status = format!("{count} shared photos — hold H to view");
                    }
                    None => {
                        self.status = "Shared photos not found".to_string();
                    }
                }
            }
        }
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    pub fn tick(&mut self) {
        self.field.tick(&self.hand);

        if self
            .orchestrator
            .observe(self.field.mode(), self.open_hand, &self.player)
        {
            self.status = "♪ Show playing".to_string();
        }

        for event in self.player.drain_events() {
            match event {
                PlaybackEvent::Started => self.status = "♪ Show playing".to_string(),
                PlaybackEvent::Looped => {}
                PlaybackEvent::Position(t) => {
                    let secs = t.as_secs();
                    self.status = format!("♪ {}:{:02}", secs / 60, secs % 60);
                }
                PlaybackEvent::Ended => {
                    self.status = "Track ended".to_string();
                }
            }
        }

        loop {
            match self.worker_rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn field(&self) -> &ParticleField { &self.field }
    pub fn hand(&self) -> &HandPosition { &self.hand }
    pub fn show_state(&self) -> ShowState { self.orchestrator.state() }
    pub fn is_playing(&self) -> bool { self.player.is_playing() }
    pub fn is_shared_view(&self) -> bool { self.shared_view }
    pub fn is_loading_share(&self) -> bool { self.loading_share }
    pub fn gallery(&self) -> &Gallery { &self.gallery }

    /// The photo overlay is visible only while two hands are detected and
    /// there is something to show.
    pub fn overlay_view(&self) -> Option<OverlayView<'_>> {
        if !self.two_hands || self.gallery.is_empty() {
            return None;
        }
        let uri = self.gallery.current()?;
        Some(OverlayView {
            uri,
            index:   self.gallery.index(),
            len:     self.gallery.len(),
            version: self.photo_version,
        })
    }
}

/// Short base-36 id for locally published shares.
fn new_share_id() -> String {
    (0..8)
        .map(|_| char::from_digit(fastrand::u32(0..36), 36).unwrap_or('x'))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the visualizer, the gesture source (simulation by default,
/// external tracker with `--features tracker` wiring in `main`), and
/// drives the event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), String> {
    // ── gesture source (sim by default, external tracker if configured) ──
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    #[cfg(feature = "tracker")]
    let gesture_rx = match cfg.tracker_command.clone() {
        Some(command) => {
            drop(sim_rx); // pointer/key gestures are unused in tracker mode
            spawn_gesture_source(crate::gesture::TrackerGestureSource { command })
        }
        None => spawn_gesture_source(SimGestureSource { rx: sim_rx }),
    };
    #[cfg(not(feature = "tracker"))]
    let gesture_rx = spawn_gesture_source(SimGestureSource { rx: sim_rx });

    // ── ui command channel ────────────────────────────────────────────────
    let (ui_tx, ui_rx) = mpsc::channel::<UiCommand>();

    // ── visualizer (owns the window and both senders) ────────────────────
    let mut vis = Visualizer::new(sim_tx, ui_tx)?;
    let mut supervisor = RenderSupervisor::new();

    // ── app state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);

    // ── main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        if !vis.poll_input() {
            break;
        }

        // 1. Drain shell commands.  The picker and the supervisor live
        //    here rather than in AppState: one blocks, one owns the frame.
        loop {
            match ui_rx.try_recv() {
                Ok(UiCommand::Quit) => return Ok(()),
                Ok(UiCommand::UploadPhotos) => {
                    if app.is_shared_view() {
                        app.begin_upload(Vec::new()); // reports the read-only hint
                    } else if let Some(paths) = pick_photo_files() {
                        app.begin_upload(paths);
                    }
                }
                Ok(UiCommand::RetryScene) => supervisor.reset(),
                Ok(cmd) => app.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 2. Drain gesture events.
        loop {
            match gesture_rx.try_recv() {
                Ok(event) => app.handle_gesture(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 3. Per-frame logic.
        app.tick();

        // 4. Render.
        vis.render(&app, &mut supervisor);
    }

    Ok(())
}

/// Native multi-select picker for the upload surface.  Non-image files
/// slipping through the filter are skipped again during encoding.
fn pick_photo_files() -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Choose photos")
        .add_filter("images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
        .pick_files()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
