//! Audio boundary: playable sound handles and their end-of-playback latch.
//!
//! The audio device runs on its own thread and reports completion through
//! an [`EndSignal`]. The tick loop never receives callbacks; it polls the
//! signal once per tick and consumes it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Where a sound is heard from. Volume in `0.0..=1.0`, pan in `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioPlacement {
    pub volume: f32,
    pub pan: f32,
}

impl AudioPlacement {
    /// Full volume, centered on the listener.
    pub const LISTENER: Self = Self {
        volume: 1.0,
        pan: 0.0,
    };

    pub fn new(volume: f32, pan: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            pan: pan.clamp(-1.0, 1.0),
        }
    }
}

impl Default for AudioPlacement {
    fn default() -> Self {
        Self::LISTENER
    }
}

/// One-shot end-of-playback flag shared with the audio thread.
///
/// `arm` registers interest, `fire` (audio thread) sets the flag only while
/// armed, and `take` returns true exactly once per arming. Arming again
/// clears any stale completion, so replays never see the previous end.
#[derive(Clone, Default)]
pub struct EndSignal {
    inner: Arc<SignalState>,
}

#[derive(Default)]
struct SignalState {
    armed: AtomicBool,
    fired: AtomicBool,
}

impl EndSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.inner.fired.store(false, Ordering::Release);
        self.inner.armed.store(true, Ordering::Release);
    }

    /// Called by the audio backend when playback ends.
    pub fn fire(&self) {
        if self.inner.armed.load(Ordering::Acquire) {
            self.inner.fired.store(true, Ordering::Release);
        }
    }

    /// Consume the completion. Disarms, so later `fire`s are ignored until
    /// the next `arm`.
    pub fn take(&self) -> bool {
        if self.inner.fired.swap(false, Ordering::AcqRel) {
            self.inner.armed.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub fn disarm(&self) {
        self.inner.armed.store(false, Ordering::Release);
        self.inner.fired.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for EndSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndSignal")
            .field("armed", &self.inner.armed.load(Ordering::Relaxed))
            .field("fired", &self.inner.fired.load(Ordering::Relaxed))
            .finish()
    }
}

/// A decoded, playable clip owned by the audio subsystem.
pub trait Sound: Send + Sync {
    /// Start playback from the beginning.
    fn play(&self, placement: AudioPlacement);

    /// Stop playback if running. Must not fire the end signal.
    fn stop(&self);

    /// Completion latch for the most recent `play`.
    fn end_signal(&self) -> &EndSignal;
}

/// Shared sound handle as handed out by the asset loader.
pub type SoundHandle = Arc<dyn Sound>;
