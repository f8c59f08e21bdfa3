//! The show state machine.
//!
//! Starting the show does not start the music: `request_start` only arms
//! the machine, and a per-frame `observe` fires the actual transition once
//! the tree has scattered into chaos *and* an open hand is recognized.
//! Stopping is the one path that forces the tree back into its formed
//! shape, so the show always ends on a whole tree.

use particle_field::TreeMode;

// ════════════════════════════════════════════════════════════════════════════
// ShowState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowState {
    /// Nothing requested yet.
    Idle,
    /// Start requested; armed until chaos + open hand coincide.
    Waiting,
    /// Music running.
    Playing,
    /// Explicitly stopped; may be re-armed.
    Stopped,
}

// ════════════════════════════════════════════════════════════════════════════
// AudioControl — the slice of the player the show drives
// ════════════════════════════════════════════════════════════════════════════

pub trait AudioControl {
    fn play(&self);
    fn stop(&self);
}

impl AudioControl for carol_audio::Player {
    fn play(&self) {
        carol_audio::Player::play(self);
    }
    fn stop(&self) {
        carol_audio::Player::stop(self);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShowOrchestrator
// ════════════════════════════════════════════════════════════════════════════

pub struct ShowOrchestrator {
    state: ShowState,
}

impl Default for ShowOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowOrchestrator {
    pub fn new() -> Self {
        ShowOrchestrator { state: ShowState::Idle }
    }

    pub fn state(&self) -> ShowState {
        self.state
    }

    /// Arm the show.  Only valid from `Idle` or `Stopped`; returns whether
    /// the request took effect.
    pub fn request_start(&mut self) -> bool {
        match self.state {
            ShowState::Idle | ShowState::Stopped => {
                self.state = ShowState::Waiting;
                true
            }
            _ => false,
        }
    }

    /// Per-frame watcher.  Fires `Waiting → Playing` (and exactly one
    /// `play()`) the first frame both conditions hold.
    pub fn observe(&mut self, mode: TreeMode, open_hand: bool, audio: &impl AudioControl) -> bool {
        if self.state == ShowState::Waiting && mode == TreeMode::Chaos && open_hand {
            audio.play();
            self.state = ShowState::Playing;
            true
        } else {
            false
        }
    }

    /// Stop the show.  Only valid while `Playing`; stops the music and
    /// forces the tree back to its formed shape.
    pub fn request_stop(&mut self, mode: &mut TreeMode, audio: &impl AudioControl) -> bool {
        if self.state == ShowState::Playing {
            audio.stop();
            *mode = TreeMode::Formed;
            self.state = ShowState::Stopped;
            true
        } else {
            false
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingAudio {
        plays: Cell<u32>,
        stops: Cell<u32>,
    }

    impl AudioControl for CountingAudio {
        fn play(&self) {
            self.plays.set(self.plays.get() + 1);
        }
        fn stop(&self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    #[test]
    fn start_arms_from_idle_and_stopped() {
        let mut show = ShowOrchestrator::new();
        assert!(show.request_start());
        assert_eq!(show.state(), ShowState::Waiting);

        let mut show = ShowOrchestrator::new();
        show.state = ShowState::Stopped;
        assert!(show.request_start());
        assert_eq!(show.state(), ShowState::Waiting);
    }

    #[test]
    fn start_is_ignored_while_armed_or_playing() {
        let mut show = ShowOrchestrator::new();
        show.request_start();
        assert!(!show.request_start());
        show.state = ShowState::Playing;
        assert!(!show.request_start());
        assert_eq!(show.state(), ShowState::Playing);
    }

    #[test]
    fn waiting_fires_only_when_both_conditions_hold() {
        let audio = CountingAudio::default();
        let mut show = ShowOrchestrator::new();
        show.request_start();

        // Chaos alone, then open hand alone: still waiting.
        assert!(!show.observe(TreeMode::Chaos, false, &audio));
        assert!(!show.observe(TreeMode::Formed, true, &audio));
        assert_eq!(show.state(), ShowState::Waiting);
        assert_eq!(audio.plays.get(), 0);

        // Both at once: playing, exactly one play().
        assert!(show.observe(TreeMode::Chaos, true, &audio));
        assert_eq!(show.state(), ShowState::Playing);
        assert_eq!(audio.plays.get(), 1);

        // Further frames with the conditions held don't re-fire.
        assert!(!show.observe(TreeMode::Chaos, true, &audio));
        assert_eq!(audio.plays.get(), 1);
    }

    #[test]
    fn observe_does_nothing_unless_armed() {
        let audio = CountingAudio::default();
        let mut show = ShowOrchestrator::new();
        assert!(!show.observe(TreeMode::Chaos, true, &audio));
        assert_eq!(show.state(), ShowState::Idle);
        assert_eq!(audio.plays.get(), 0);
    }

    #[test]
    fn stop_forces_formed_and_stops_audio_once() {
        let audio = CountingAudio::default();
        let mut show = ShowOrchestrator::new();
        show.request_start();
        show.observe(TreeMode::Chaos, true, &audio);

        let mut mode = TreeMode::Chaos;
        assert!(show.request_stop(&mut mode, &audio));
        assert_eq!(show.state(), ShowState::Stopped);
        assert_eq!(mode, TreeMode::Formed);
        assert_eq!(audio.stops.get(), 1);

        // Stop outside Playing is a no-op.
        let mut mode = TreeMode::Chaos;
        assert!(!show.request_stop(&mut mode, &audio));
        assert_eq!(mode, TreeMode::Chaos);
        assert_eq!(audio.stops.get(), 1);
    }

    #[test]
    fn full_cycle_can_rearm() {
        let audio = CountingAudio::default();
        let mut show = ShowOrchestrator::new();
        show.request_start();
        show.observe(TreeMode::Chaos, true, &audio);
        let mut mode = TreeMode::Chaos;
        show.request_stop(&mut mode, &audio);

        assert!(show.request_start());
        assert_eq!(show.state(), ShowState::Waiting);
    }
}
