//! The playback thread and its command/event channels.
//!
//! One `Player` owns one thread, one decoded [`Track`] and one output
//! stream.  Commands go in over an mpsc channel; playback events come back
//! the same way and are drained non-blocking by the application's frame
//! loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::track::Track;

// ════════════════════════════════════════════════════════════════════════════
// LoopWindow
// ════════════════════════════════════════════════════════════════════════════

/// Start of the show's loop window — 0:44 into the track.
pub const LOOP_START: Duration = Duration::from_secs(44);
/// End of the show's loop window — 1:12 into the track.
pub const LOOP_END: Duration = Duration::from_secs(72);

/// The fixed playback window.  Position always (re)starts at `start` and
/// snaps back there the moment it reaches `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopWindow {
    pub start: Duration,
    pub end:   Duration,
}

impl LoopWindow {
    pub fn new(start: Duration, end: Duration) -> Self {
        LoopWindow { start, end }
    }
}

impl Default for LoopWindow {
    fn default() -> Self {
        LoopWindow { start: LOOP_START, end: LOOP_END }
    }
}

/// The window resolved to frame indices for one particular track.
#[derive(Clone, Copy, Debug)]
struct FrameWindow {
    start: usize,
    end:   usize,
}

impl FrameWindow {
    fn for_track(window: &LoopWindow, track: &Track) -> Self {
        let start = track.frame_at(window.start);
        let end = track.frame_at(window.end).max(start);
        FrameWindow { start, end }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Commands and events
// ════════════════════════════════════════════════════════════════════════════

enum PlayerCommand {
    /// (Re)start from the window's start offset.
    Play,
    /// Pause and rewind to the start offset, playing or not.
    Stop,
    /// Terminate the thread, releasing the output stream.
    Quit,
}

/// Emitted by the playback thread for the application's status display.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Playback actually began.
    Started,
    /// Position reached the window end and snapped back to the start.
    Looped,
    /// The track ran out underneath the window — playback stopped itself.
    Ended,
    /// Progress marker, emitted once per chunk.
    Position(Duration),
}

// ════════════════════════════════════════════════════════════════════════════
// AudioOut — abstraction over cpal / silent backends
// ════════════════════════════════════════════════════════════════════════════

trait AudioOut {
    /// Begin or resume device output.
    fn start(&mut self) -> Result<(), String>;
    /// Queue one interleaved chunk, blocking until it fits.
    fn write(&mut self, chunk: &[f32]);
    /// Go quiet; position bookkeeping stays with the caller.
    fn pause(&mut self);
}

// ── cpal backend ──────────────────────────────────────────────────────────

struct CpalOut {
    stream:   cpal::Stream,
    producer: ringbuf::HeapProd<f32>,
}

impl CpalOut {
    fn open(sample_rate: u32, channels: u16) -> Result<CpalOut, String> {
        use cpal::traits::{DeviceTrait, HostTrait};
        use ringbuf::traits::{Consumer, Split};
        use ringbuf::HeapRb;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no output device available".to_string())?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // Half a second of queue between the feeder thread and the callback.
        let capacity = (sample_rate as usize / 2).max(1024) * channels as usize;
        let ring = HeapRb::<f32>::new(capacity);
        let (producer, mut consumer) = ring.split();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let read = consumer.pop_slice(data);
                    for sample in data[read..].iter_mut() {
                        *sample = 0.0;
                    }
                },
                |err| warn!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| format!("failed to build output stream: {e}"))?;

        Ok(CpalOut { stream, producer })
    }
}

impl AudioOut for CpalOut {
    fn start(&mut self) -> Result<(), String> {
        use cpal::traits::StreamTrait;
        self.stream.play().map_err(|e| e.to_string())
    }

    fn write(&mut self, chunk: &[f32]) {
        use ringbuf::traits::Producer;
        let mut written = 0;
        while written < chunk.len() {
            written += self.producer.push_slice(&chunk[written..]);
            if written < chunk.len() {
                thread::sleep(Duration::from_millis(2));
            }
        }
    }

    fn pause(&mut self) {
        use cpal::traits::StreamTrait;
        let _ = self.stream.pause();
    }
}

// ── silent backend (no device, tests) ─────────────────────────────────────

/// Consumes chunks in real time without making sound, so loop timing and
/// events behave identically on machines with no audio hardware.
struct NullOut {
    sample_rate: u32,
    channels:    u16,
}

impl AudioOut for NullOut {
    fn start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn write(&mut self, chunk: &[f32]) {
        let frames = chunk.len() / self.channels.max(1) as usize;
        let secs = frames as f64 / self.sample_rate.max(1) as f64;
        thread::sleep(Duration::from_secs_f64(secs));
    }

    fn pause(&mut self) {}
}

/// Open the default device for the track's format, falling back to the
/// silent backend with a warning when that fails.
fn open_audio_output(sample_rate: u32, channels: u16) -> Box<dyn AudioOut> {
    match CpalOut::open(sample_rate, channels) {
        Ok(out) => {
            info!("audio output open at {sample_rate} Hz, {channels} ch");
            Box::new(out)
        }
        Err(e) => {
            warn!("audio device unavailable ({e}) — using silent output");
            Box::new(NullOut { sample_rate, channels })
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — the handle
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the playback thread.  Dropping it shuts the thread down and
/// releases the output stream.
pub struct Player {
    cmd_tx:   Sender<PlayerCommand>,
    event_rx: Receiver<PlaybackEvent>,
    playing:  Arc<AtomicBool>,
}

impl Player {
    /// Spawn the playback thread for `track` looping over `window`.
    pub fn spawn(track: Track, window: LoopWindow) -> Player {
        Player::spawn_inner(track, window, false)
    }

    fn spawn_inner(track: Track, window: LoopWindow, force_silent: bool) -> Player {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let (event_tx, event_rx) = mpsc::channel::<PlaybackEvent>();
        let playing = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&playing);
        thread::spawn(move || {
            player_thread(track, window, cmd_rx, event_tx, flag, force_silent);
        });

        Player { cmd_tx, event_rx, playing }
    }

    pub fn play(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Play);
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Stop);
    }

    /// Whether samples are actually being emitted right now.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Drain any pending playback events (non-blocking).
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        let mut out = Vec::new();
        while let Ok(e) = self.event_rx.try_recv() {
            out.push(e);
        }
        out
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

/// Frames queued per iteration (~46 ms at 44.1 kHz).
const CHUNK_FRAMES: usize = 2048;

/// What the thread should do at the current position.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Queue this many frames.
    Chunk(usize),
    /// Position reached the window end — snap back to the window start.
    Rewind,
    /// Position reached the end of the track itself.
    End,
}

/// Decide the next step.  The track-end check comes first: when the window
/// end lies past the track, the track runs out and playback ends naturally
/// instead of looping.
fn plan_step(pos: usize, window: &FrameWindow, total_frames: usize) -> Step {
    if pos >= total_frames {
        return Step::End;
    }
    if pos >= window.end {
        return Step::Rewind;
    }
    let horizon = window.end.min(total_frames);
    Step::Chunk(CHUNK_FRAMES.min(horizon - pos))
}

fn player_thread(
    track:        Track,
    window:       LoopWindow,
    cmd_rx:       Receiver<PlayerCommand>,
    event_tx:     Sender<PlaybackEvent>,
    playing_flag: Arc<AtomicBool>,
    force_silent: bool,
) {
    let mut sink: Box<dyn AudioOut> = if force_silent {
        Box::new(NullOut {
            sample_rate: track.sample_rate(),
            channels:    track.channels(),
        })
    } else {
        open_audio_output(track.sample_rate(), track.channels())
    };

    let frames = FrameWindow::for_track(&window, &track);
    let mut pos = frames.start;
    let mut playing = false;

    loop {
        // ── drain commands ────────────────────────────────────────────────
        loop {
            match cmd_rx.try_recv() {
                Ok(PlayerCommand::Play) => {
                    pos = frames.start;
                    if track.frames() == 0 {
                        warn!("player: no audio samples loaded — staying stopped");
                    } else {
                        match sink.start() {
                            Ok(()) => {
                                playing = true;
                                playing_flag.store(true, Ordering::Relaxed);
                                let _ = event_tx.send(PlaybackEvent::Started);
                            }
                            Err(e) => {
                                error!("player: playback failed to start: {e}");
                            }
                        }
                    }
                }
                Ok(PlayerCommand::Stop) => {
                    playing = false;
                    playing_flag.store(false, Ordering::Relaxed);
                    pos = frames.start;
                    sink.pause();
                }
                Ok(PlayerCommand::Quit) => return,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if !playing {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        // ── emit the next chunk, loop, or end ─────────────────────────────
        match plan_step(pos, &frames, track.frames()) {
            Step::Chunk(n) => {
                sink.write(track.chunk(pos, n));
                pos += n;
                let _ = event_tx.send(PlaybackEvent::Position(track.time_at(pos)));
            }
            Step::Rewind => {
                pos = frames.start;
                let _ = event_tx.send(PlaybackEvent::Looped);
            }
            Step::End => {
                playing = false;
                playing_flag.store(false, Ordering::Relaxed);
                sink.pause();
                let _ = event_tx.send(PlaybackEvent::Ended);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn window_frames() -> FrameWindow {
        FrameWindow { start: 2000, end: 4000 }
    }

    #[test]
    fn plan_rewinds_at_window_end_not_zero() {
        // Reaching the end offset rewinds; the caller resets to the window
        // start, never to frame 0.
        assert_eq!(plan_step(4000, &window_frames(), 8000), Step::Rewind);
        assert_eq!(plan_step(4100, &window_frames(), 8000), Step::Rewind);
    }

    #[test]
    fn plan_chunks_inside_window() {
        assert_eq!(plan_step(2000, &window_frames(), 8000), Step::Chunk(2000));
        assert_eq!(plan_step(3900, &window_frames(), 8000), Step::Chunk(100));
    }

    #[test]
    fn plan_ends_when_track_runs_out_under_window() {
        // Window end past the track: the track end wins.
        let w = FrameWindow { start: 100, end: 50_000 };
        assert_eq!(plan_step(1000, &w, 1000), Step::End);
        assert_eq!(plan_step(990, &w, 1000), Step::Chunk(10));
    }

    fn spawn_silent(track: Track, window: LoopWindow) -> Player {
        Player::spawn_inner(track, window, true)
    }

    #[test]
    fn loop_window_resets_to_start_offset() {
        // 1 s of mono audio at 8 kHz; loop over [250 ms, 500 ms).
        let track = Track::from_samples(vec![0.1; 8000], 1, 8000);
        let window = LoopWindow::new(Duration::from_millis(250), Duration::from_millis(500));
        let player = spawn_silent(track, window);

        player.play();
        thread::sleep(Duration::from_millis(900));

        let events = player.drain_events();
        assert!(events.contains(&PlaybackEvent::Started));
        assert!(
            events.iter().any(|e| *e == PlaybackEvent::Looped),
            "expected at least one loop in {events:?}"
        );
        // Every reported position stays inside the window — the rewind goes
        // to the start offset, not to zero.
        for e in &events {
            if let PlaybackEvent::Position(t) = e {
                assert!(*t >= window.start, "position {t:?} before window start");
                assert!(*t <= window.end, "position {t:?} past window end");
            }
        }
        assert!(player.is_playing(), "looping must not clear is_playing");

        player.stop();
        thread::sleep(Duration::from_millis(50));
        assert!(!player.is_playing());
    }

    #[test]
    fn natural_end_clears_is_playing() {
        // Window end far past a 250 ms track: playback ends on its own.
        let track = Track::from_samples(vec![0.1; 2000], 1, 8000);
        let window = LoopWindow::new(Duration::from_millis(100), Duration::from_secs(30));
        let player = spawn_silent(track, window);

        player.play();
        thread::sleep(Duration::from_millis(600));

        let events = player.drain_events();
        assert!(events.contains(&PlaybackEvent::Ended), "events: {events:?}");
        assert!(!player.is_playing());
    }

    #[test]
    fn empty_track_never_starts() {
        let player = spawn_silent(Track::silent(), LoopWindow::default());
        player.play();
        thread::sleep(Duration::from_millis(100));
        assert!(!player.is_playing());
        let events = player.drain_events();
        assert!(!events.contains(&PlaybackEvent::Started));
    }

    #[test]
    fn stop_while_stopped_is_harmless() {
        let track = Track::from_samples(vec![0.0; 4000], 1, 8000);
        let player = spawn_silent(track, LoopWindow::default());
        player.stop();
        thread::sleep(Duration::from_millis(50));
        assert!(!player.is_playing());
    }
}
