//! Decoded show-track samples.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to open {path}: {source}")]
    Open {
        path:   String,
        source: hound::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path:   String,
        source: hound::Error,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// Track
// ════════════════════════════════════════════════════════════════════════════

/// An in-memory track: interleaved `f32` samples plus format metadata.
///
/// Decoded once at startup; the playback thread only ever borrows chunks.
#[derive(Clone, Debug, Default)]
pub struct Track {
    samples:     Vec<f32>,
    channels:    u16,
    sample_rate: u32,
}

impl Track {
    /// Decode a WAV file into memory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Track, TrackError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let mut reader = hound::WavReader::open(path).map_err(|source| TrackError::Open {
            path: name.clone(),
            source,
        })?;

        let spec = reader.spec();
        let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };
        let samples = samples.map_err(|source| TrackError::Decode { path: name, source })?;

        Ok(Track {
            samples,
            channels:    spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    /// Build a track from raw interleaved samples (tests, synthetic tones).
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Track {
        Track { samples, channels, sample_rate }
    }

    /// A zero-length placeholder used when the asset is missing; playing
    /// it is a no-op reported by the player.
    pub fn silent() -> Track {
        Track { samples: Vec::new(), channels: 2, sample_rate: 44_100 }
    }

    pub fn channels(&self) -> u16 { self.channels.max(1) }

    pub fn sample_rate(&self) -> u32 { self.sample_rate.max(1) }

    /// Total length in frames (one frame = one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels() as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate() as f64)
    }

    /// Frame index for a time offset (may lie past the end of the track).
    pub fn frame_at(&self, t: Duration) -> usize {
        (t.as_secs_f64() * self.sample_rate() as f64) as usize
    }

    /// Time offset of a frame index.
    pub fn time_at(&self, frame: usize) -> Duration {
        Duration::from_secs_f64(frame as f64 / self.sample_rate() as f64)
    }

    /// Borrow up to `max_frames` interleaved frames starting at `frame`.
    pub fn chunk(&self, frame: usize, max_frames: usize) -> &[f32] {
        let ch = self.channels() as usize;
        let lo = (frame * ch).min(self.samples.len());
        let hi = ((frame + max_frames) * ch).min(self.samples.len());
        &self.samples[lo..hi]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_counts_per_channel() {
        let t = Track::from_samples(vec![0.0; 800], 2, 8000);
        assert_eq!(t.frames(), 400);
    }

    #[test]
    fn frame_time_round_trip() {
        let t = Track::from_samples(vec![0.0; 8000], 1, 8000);
        let f = t.frame_at(Duration::from_millis(250));
        assert_eq!(f, 2000);
        assert_eq!(t.time_at(f), Duration::from_millis(250));
    }

    #[test]
    fn chunk_clamps_to_track_end() {
        let t = Track::from_samples(vec![0.5; 100], 1, 8000);
        assert_eq!(t.chunk(90, 64).len(), 10);
        assert!(t.chunk(200, 64).is_empty());
    }

    #[test]
    fn silent_track_is_empty() {
        let t = Track::silent();
        assert_eq!(t.frames(), 0);
        assert_eq!(t.duration(), Duration::ZERO);
    }
}
