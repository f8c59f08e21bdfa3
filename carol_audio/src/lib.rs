//! # carol_audio
//!
//! Playback of the show track over a fixed loop window.
//!
//! The controller owns one decoded track and one playback thread for its
//! whole lifetime.  `play()` always (re)starts from the window's start
//! offset; while playing, the position is checked against the end offset
//! and snapped back to the start the moment it reaches it — a tight loop
//! over the chorus rather than the whole song.  `stop()` pauses and
//! rewinds to the start offset unconditionally.
//!
//! Output goes to the default `cpal` device when one can be opened with
//! the track's format, and to a silent real-time backend otherwise, so a
//! machine with no audio hardware still runs the show with correct timing.

pub mod player;
pub mod track;

pub use player::{LoopWindow, PlaybackEvent, Player, LOOP_END, LOOP_START};
pub use track::{Track, TrackError};
