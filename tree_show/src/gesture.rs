//! The gesture bridge — signals in, `GestureEvent`s out.
//!
//! The public interface is [`GestureEvent`] delivered over an `mpsc`
//! channel.  Consumers don't care whether events came from the keyboard
//! and pointer simulator or from an external hand-tracking process; hand
//! recognition itself lives outside this crate either way.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use particle_field::TreeMode;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// Direction of a discrete swipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// A high-level signal emitted by the bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    /// Continuous hand position in `[0,1]²` plus a detection flag.
    Hand { x: f32, y: f32, detected: bool },

    /// Both hands became visible (true) or stopped being visible (false).
    TwoHands(bool),

    /// An open-hand pose is being held (true) or was released (false).
    OpenHand(bool),

    /// Discrete swipe; each one is delivered at most once.
    Swipe(SwipeDirection),

    /// Mode command from the bridge — the tracker decides when a pose
    /// means "scatter" or "re-form"; the core just obeys.
    SetMode(TreeMode),
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSource trait — unified interface for sim and tracker
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`GestureEvent`]s over a channel.
pub trait GestureSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>);
}

/// Spawn a gesture source on its own thread and return the receiving end.
pub fn spawn_gesture_source<G: GestureSource>(source: G) -> Receiver<GestureEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimGestureSource — keyboard/pointer simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer position mapped to the capture frame; `inside` is false
    /// when the pointer has left the window.
    Pointer { x: f32, y: f32, inside: bool },
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated gesture keys (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    TwoHands,   // hold H
    OpenHand,   // hold O
    SwipeLeft,  // Left arrow
    SwipeRight, // Right arrow
    ChaosMode,  // C
    FormedMode, // F
}

/// Translates [`SimInput`] from the window into bridge events.  This
/// keeps the window event loop ignorant of gesture semantics.
pub struct SimGestureSource {
    pub rx: Receiver<SimInput>,
}

impl GestureSource for SimGestureSource {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>) {
        for input in self.rx {
            let event = match input {
                SimInput::Pointer { x, y, inside } => GestureEvent::Hand {
                    x: x.clamp(0.0, 1.0),
                    y: y.clamp(0.0, 1.0),
                    detected: inside,
                },
                SimInput::KeyDown(SimKey::TwoHands)   => GestureEvent::TwoHands(true),
                SimInput::KeyUp(SimKey::TwoHands)     => GestureEvent::TwoHands(false),
                SimInput::KeyDown(SimKey::OpenHand)   => GestureEvent::OpenHand(true),
                SimInput::KeyUp(SimKey::OpenHand)     => GestureEvent::OpenHand(false),
                SimInput::KeyDown(SimKey::SwipeLeft)  => GestureEvent::Swipe(SwipeDirection::Left),
                SimInput::KeyDown(SimKey::SwipeRight) => GestureEvent::Swipe(SwipeDirection::Right),
                SimInput::KeyDown(SimKey::ChaosMode)  => GestureEvent::SetMode(TreeMode::Chaos),
                SimInput::KeyDown(SimKey::FormedMode) => GestureEvent::SetMode(TreeMode::Formed),
                SimInput::KeyUp(_) => continue,
            };
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerGestureSource — external hand tracker (feature = "tracker")
// ════════════════════════════════════════════════════════════════════════════

/// One frame from the external tracker process, as newline-delimited JSON
/// on its stdout.  The tracker owns all computer vision; this side only
/// translates and debounces.
#[cfg(feature = "tracker")]
#[derive(Debug, serde::Deserialize)]
pub struct TrackerFrame {
    pub x:        f32,
    pub y:        f32,
    pub detected: bool,
    /// Number of hands currently visible.
    #[serde(default)]
    pub hands:    u8,
    /// 0.0 = fist, 1.0 = fully open palm.
    #[serde(default)]
    pub openness: f32,
    /// "left" / "right" on the frame where a swipe completed.
    #[serde(default)]
    pub swipe:    Option<String>,
    /// "chaos" / "formed" when the tracker recognized a mode pose.
    #[serde(default)]
    pub mode:     Option<String>,
}

/// Edge-detection state between tracker frames, so boolean conditions are
/// only announced when they change and each swipe is emitted once.
#[cfg(feature = "tracker")]
#[derive(Default)]
struct TrackerEdges {
    two_hands:   bool,
    open:        bool,
    open_frames: u32,
}

/// Frames the open-palm pose must hold before it counts.
#[cfg(feature = "tracker")]
const OPEN_HOLD: u32 = 4;
#[cfg(feature = "tracker")]
const OPEN_THRESHOLD: f32 = 0.8;

#[cfg(feature = "tracker")]
impl TrackerEdges {
    fn apply(&mut self, frame: &TrackerFrame, mut emit: impl FnMut(GestureEvent)) {
        emit(GestureEvent::Hand {
            x: frame.x.clamp(0.0, 1.0),
            y: frame.y.clamp(0.0, 1.0),
            detected: frame.detected,
        });

        let two = frame.hands >= 2;
        if two != self.two_hands {
            self.two_hands = two;
            emit(GestureEvent::TwoHands(two));
        }

        if frame.detected && frame.openness >= OPEN_THRESHOLD {
            self.open_frames += 1;
        } else {
            self.open_frames = 0;
        }
        let open = self.open_frames >= OPEN_HOLD;
        if open != self.open {
            self.open = open;
            emit(GestureEvent::OpenHand(open));
        }

        match frame.swipe.as_deref() {
            Some("left")  => emit(GestureEvent::Swipe(SwipeDirection::Left)),
            Some("right") => emit(GestureEvent::Swipe(SwipeDirection::Right)),
            _ => {}
        }

        match frame.mode.as_deref() {
            Some("chaos")  => emit(GestureEvent::SetMode(TreeMode::Chaos)),
            Some("formed") => emit(GestureEvent::SetMode(TreeMode::Formed)),
            _ => {}
        }
    }
}

/// Gesture source backed by an external tracker process.  Spawns the
/// configured command and translates each stdout line.
#[cfg(feature = "tracker")]
pub struct TrackerGestureSource {
    /// Command line to launch, e.g. `hand-tracker --camera 0`.
    pub command: String,
}

#[cfg(feature = "tracker")]
impl GestureSource for TrackerGestureSource {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>) {
        use std::io::{BufRead, BufReader};
        use std::process::{Command, Stdio};
        use tracing::{error, warn};

        let mut parts = self.command.split_whitespace();
        let program = match parts.next() {
            Some(p) => p.to_string(),
            None => {
                error!("tracker: empty command");
                return;
            }
        };

        let child = Command::new(&program)
            .args(parts)
            .stdout(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                error!("tracker: failed to launch {program}: {e}");
                return;
            }
        };

        let stdout = match child.stdout.take() {
            Some(s) => s,
            None => return,
        };

        let mut edges = TrackerEdges::default();
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            let frame: TrackerFrame = match serde_json::from_str(&line) {
                Ok(f) => f,
                Err(e) => {
                    warn!("tracker: bad frame ({e})");
                    continue;
                }
            };
            let mut closed = false;
            edges.apply(&frame, |event| {
                if tx.send(event).is_err() {
                    closed = true;
                }
            });
            if closed {
                break;
            }
        }
        let _ = child.kill();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn run_sim(inputs: Vec<SimInput>) -> Vec<GestureEvent> {
        let (in_tx, in_rx) = mpsc::channel();
        for i in inputs {
            in_tx.send(i).unwrap();
        }
        drop(in_tx); // source drains and exits
        let rx = spawn_gesture_source(SimGestureSource { rx: in_rx });
        rx.iter().collect()
    }

    #[test]
    fn pointer_becomes_hand_position() {
        let events = run_sim(vec![SimInput::Pointer { x: 0.25, y: 0.75, inside: true }]);
        assert_eq!(
            events,
            vec![GestureEvent::Hand { x: 0.25, y: 0.75, detected: true }]
        );
    }

    #[test]
    fn pointer_outside_window_clears_detection() {
        let events = run_sim(vec![SimInput::Pointer { x: 1.4, y: -0.2, inside: false }]);
        assert_eq!(
            events,
            vec![GestureEvent::Hand { x: 1.0, y: 0.0, detected: false }]
        );
    }

    #[test]
    fn hold_keys_emit_matching_edges() {
        let events = run_sim(vec![
            SimInput::KeyDown(SimKey::TwoHands),
            SimInput::KeyUp(SimKey::TwoHands),
            SimInput::KeyDown(SimKey::OpenHand),
            SimInput::KeyUp(SimKey::OpenHand),
        ]);
        assert_eq!(
            events,
            vec![
                GestureEvent::TwoHands(true),
                GestureEvent::TwoHands(false),
                GestureEvent::OpenHand(true),
                GestureEvent::OpenHand(false),
            ]
        );
    }

    #[test]
    fn arrows_become_single_swipes() {
        let events = run_sim(vec![
            SimInput::KeyDown(SimKey::SwipeRight),
            SimInput::KeyDown(SimKey::SwipeLeft),
        ]);
        assert_eq!(
            events,
            vec![
                GestureEvent::Swipe(SwipeDirection::Right),
                GestureEvent::Swipe(SwipeDirection::Left),
            ]
        );
    }

    #[test]
    fn mode_keys_command_the_field() {
        let events = run_sim(vec![
            SimInput::KeyDown(SimKey::ChaosMode),
            SimInput::KeyDown(SimKey::FormedMode),
        ]);
        assert_eq!(
            events,
            vec![
                GestureEvent::SetMode(TreeMode::Chaos),
                GestureEvent::SetMode(TreeMode::Formed),
            ]
        );
    }

    #[cfg(feature = "tracker")]
    mod tracker {
        use super::*;

        fn frame(hands: u8, openness: f32, swipe: Option<&str>) -> TrackerFrame {
            TrackerFrame {
                x: 0.5,
                y: 0.5,
                detected: true,
                hands,
                openness,
                swipe: swipe.map(str::to_string),
                mode: None,
            }
        }

        fn apply_all(edges: &mut TrackerEdges, frames: &[TrackerFrame]) -> Vec<GestureEvent> {
            let mut out = Vec::new();
            for f in frames {
                edges.apply(f, |e| out.push(e));
            }
            out
        }

        #[test]
        fn two_hands_announced_only_on_change() {
            let mut edges = TrackerEdges::default();
            let events = apply_all(
                &mut edges,
                &[frame(2, 0.0, None), frame(2, 0.0, None), frame(1, 0.0, None)],
            );
            let toggles: Vec<_> = events
                .iter()
                .filter(|e| matches!(e, GestureEvent::TwoHands(_)))
                .collect();
            assert_eq!(
                toggles,
                vec![&GestureEvent::TwoHands(true), &GestureEvent::TwoHands(false)]
            );
        }

        #[test]
        fn open_palm_needs_a_sustained_hold() {
            let mut edges = TrackerEdges::default();
            let held: Vec<_> = (0..OPEN_HOLD + 1).map(|_| frame(1, 0.95, None)).collect();
            let events = apply_all(&mut edges, &held);
            let opens = events
                .iter()
                .filter(|e| **e == GestureEvent::OpenHand(true))
                .count();
            assert_eq!(opens, 1);

            // A single open frame after a drop must not re-trigger.
            let events = apply_all(&mut edges, &[frame(1, 0.1, None), frame(1, 0.95, None)]);
            assert!(events.iter().all(|e| !matches!(e, GestureEvent::OpenHand(true))));
        }

        #[test]
        fn swipes_pass_through_once_per_frame() {
            let mut edges = TrackerEdges::default();
            let events = apply_all(
                &mut edges,
                &[frame(1, 0.0, Some("right")), frame(1, 0.0, None)],
            );
            let swipes = events
                .iter()
                .filter(|e| matches!(e, GestureEvent::Swipe(_)))
                .count();
            assert_eq!(swipes, 1);
        }

        #[test]
        fn frames_parse_from_json_lines() {
            let f: TrackerFrame =
                serde_json::from_str(r#"{"x":0.4,"y":0.6,"detected":true,"hands":2}"#).unwrap();
            assert_eq!(f.hands, 2);
            assert!(f.swipe.is_none());
        }
    }
}
