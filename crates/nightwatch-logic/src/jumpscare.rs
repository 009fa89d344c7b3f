//! Jumpscare playback: a GIF timeline synchronized with an optional sound.
//!
//! The timeline advances at most one frame per tick. Each frame stays up for
//! its own delay (converted to ticks at the night's frame rate) and then its
//! disposal rule decides whether the frames shown so far stay composited
//! under the next one. The renderer always draws [`Jumpscare::composited`].
//!
//! Completion has two gates: the timeline reaching its last frame, and the
//! attached sound reporting its end. [`Jumpscare::advance`] returns `true`
//! exactly once, on the tick both gates are satisfied.

use crate::assets::{GifFrame, ImageHandle};
use crate::audio::{AudioPlacement, SoundHandle};
use crate::clock::seconds_to_ticks;
use crate::error::ConfigError;

pub struct Jumpscare {
    frames: Vec<GifFrame>,
    sound_start_frame: usize,
    cams_down_frame: usize,
    sound: Option<SoundHandle>,
    placement: AudioPlacement,

    index: usize,
    frame_started: Option<u64>,
    visible: Vec<usize>,
    sound_started: bool,
    frames_done: bool,
    sound_done: bool,
    finished: bool,
}

impl Jumpscare {
    pub fn new(
        frames: Vec<GifFrame>,
        sound_start_frame: usize,
        cams_down_frame: usize,
        sound: Option<SoundHandle>,
    ) -> Result<Self, ConfigError> {
        if frames.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "jumpscare.frames",
                reason: "at least one frame is required".into(),
            });
        }
        if sound_start_frame >= frames.len() {
            return Err(ConfigError::InvalidSetting {
                field: "jumpscare.sound_start_frame",
                reason: format!(
                    "frame {sound_start_frame} is past the last frame ({})",
                    frames.len() - 1
                ),
            });
        }
        let mut scare = Self {
            frames,
            sound_start_frame,
            cams_down_frame,
            sound,
            placement: AudioPlacement::LISTENER,
            index: 0,
            frame_started: None,
            visible: Vec::new(),
            sound_started: false,
            frames_done: false,
            sound_done: false,
            finished: false,
        };
        scare.reset();
        Ok(scare)
    }

    /// Where the scream is heard from. Defaults to the listener.
    pub fn with_placement(mut self, placement: AudioPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Rewind to the first frame and forget any previous playback.
    pub fn reset(&mut self) {
        self.index = 0;
        self.frame_started = None;
        self.visible.clear();
        self.visible.push(0);
        self.sound_started = false;
        self.frames_done = false;
        self.sound_done = self.sound.is_none();
        self.finished = false;
        if let Some(sound) = &self.sound {
            sound.stop();
            sound.end_signal().disarm();
        }
    }

    /// Advance one tick. Returns `true` only on the tick playback completes.
    pub fn advance(&mut self, tick: u64, fps: u32) -> bool {
        if self.finished {
            return false;
        }

        let started = *self.frame_started.get_or_insert(tick);
        if !self.sound_started && self.index >= self.sound_start_frame {
            self.start_sound();
        }

        let last = self.frames.len() - 1;
        if self.index < last {
            let delay = seconds_to_ticks(self.frames[self.index].delay_seconds, fps);
            if tick.saturating_sub(started) >= delay {
                self.step();
                self.frame_started = Some(tick);
                if self.index == self.sound_start_frame {
                    self.start_sound();
                }
            }
        }
        if self.index == last {
            self.frames_done = true;
        }

        if self.sound_started && !self.sound_done {
            if let Some(sound) = &self.sound {
                self.sound_done = sound.end_signal().take();
            }
        }

        if self.frames_done && self.sound_done {
            self.finished = true;
            return true;
        }
        false
    }

    fn step(&mut self) {
        if self.frames[self.index].disposal.clears() {
            self.visible.clear();
        }
        self.index += 1;
        self.visible.push(self.index);
    }

    fn start_sound(&mut self) {
        self.sound_started = true;
        if let Some(sound) = &self.sound {
            sound.end_signal().arm();
            sound.play(self.placement);
        }
    }

    /// Stop the sound without finishing. Used when a night is torn down.
    pub fn stop(&mut self) {
        if let Some(sound) = &self.sound {
            sound.stop();
            sound.end_signal().disarm();
        }
    }

    /// Frames to draw this tick, bottom to top.
    pub fn composited(&self) -> Vec<&ImageHandle> {
        self.visible.iter().map(|&i| &self.frames[i].image).collect()
    }

    pub fn frame_index(&self) -> usize {
        self.index
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The player may no longer use the camera monitor.
    pub fn cams_forced_down(&self) -> bool {
        self.index >= self.cams_down_frame
    }

    pub fn sound_started(&self) -> bool {
        self.sound_started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl std::fmt::Debug for Jumpscare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jumpscare")
            .field("frames", &self.frames.len())
            .field("index", &self.index)
            .field("sound", &self.sound.is_some())
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::{Disposal, RecordingSound};
    use crate::audio::Sound;

    fn frame(key: &str, delay_seconds: f32, disposal: Disposal) -> GifFrame {
        GifFrame {
            image: ImageHandle::new(key),
            delay_seconds,
            disposal,
        }
    }

    fn keys(scare: &Jumpscare) -> Vec<&str> {
        scare.composited().iter().map(|h| h.key()).collect()
    }

    fn run_until_index(scare: &mut Jumpscare, tick: &mut u64, index: usize) {
        while scare.frame_index() < index {
            scare.advance(*tick, 60);
            *tick += 1;
        }
    }

    #[test]
    fn restore_to_background_clears_prior_frames() {
        let mut scare = Jumpscare::new(
            vec![
                frame("A", 0.05, Disposal::Unspecified),
                frame("B", 0.05, Disposal::RestoreToBackground),
                frame("C", 0.05, Disposal::Unspecified),
            ],
            0,
            0,
            None,
        )
        .unwrap();
        let mut tick = 0;
        assert_eq!(keys(&scare), ["A"]);
        run_until_index(&mut scare, &mut tick, 1);
        assert_eq!(keys(&scare), ["A", "B"]);
        run_until_index(&mut scare, &mut tick, 2);
        assert_eq!(keys(&scare), ["C"]);
    }

    #[test]
    fn frames_accumulate_without_disposal() {
        let mut scare = Jumpscare::new(
            vec![
                frame("A", 0.0, Disposal::DoNotDispose),
                frame("B", 0.0, Disposal::Unspecified),
                frame("C", 0.0, Disposal::Unspecified),
            ],
            0,
            3,
            None,
        )
        .unwrap();
        let mut tick = 0;
        run_until_index(&mut scare, &mut tick, 2);
        assert_eq!(keys(&scare), ["A", "B", "C"]);
    }

    #[test]
    fn frame_held_for_its_delay() {
        // 0.1 s at 60 fps = 6 ticks
        let mut scare = Jumpscare::new(
            vec![
                frame("A", 0.1, Disposal::Unspecified),
                frame("B", 0.1, Disposal::Unspecified),
            ],
            0,
            0,
            None,
        )
        .unwrap();
        for tick in 0..6 {
            assert!(!scare.advance(tick, 60));
            assert_eq!(scare.frame_index(), 0, "tick {tick}");
        }
        assert!(scare.advance(6, 60));
        assert_eq!(scare.frame_index(), 1);
    }

    #[test]
    fn no_sound_finishes_on_last_frame_once() {
        let mut scare = Jumpscare::new(
            vec![frame("A", 0.0, Disposal::Unspecified), frame("B", 0.0, Disposal::Unspecified)],
            0,
            0,
            None,
        )
        .unwrap();
        assert!(scare.advance(0, 60));
        assert!(scare.is_finished());
        assert!(!scare.advance(1, 60));
        assert!(!scare.advance(2, 60));
    }

    #[test]
    fn waits_for_both_gates() {
        let sound = Arc::new(RecordingSound::new());
        let mut scare = Jumpscare::new(
            vec![frame("A", 0.0, Disposal::Unspecified), frame("B", 0.0, Disposal::Unspecified)],
            0,
            1,
            Some(sound.clone()),
        )
        .unwrap();

        assert!(!scare.advance(0, 60));
        assert_eq!(scare.frame_index(), 1);
        assert!(!scare.advance(1, 60));
        assert!(!scare.advance(2, 60));

        sound.finish();
        assert!(scare.advance(3, 60));
        assert!(!scare.advance(4, 60));
    }

    #[test]
    fn sound_finishing_first_waits_for_frames() {
        let sound = Arc::new(RecordingSound::new());
        let mut scare = Jumpscare::new(
            vec![frame("A", 0.5, Disposal::Unspecified), frame("B", 0.0, Disposal::Unspecified)],
            0,
            0,
            Some(sound.clone()),
        )
        .unwrap();
        assert!(!scare.advance(0, 60));
        sound.finish();
        for tick in 1..30 {
            assert!(!scare.advance(tick, 60));
        }
        assert!(scare.advance(30, 60));
    }

    #[test]
    fn sound_starts_on_its_frame() {
        let sound = Arc::new(RecordingSound::new());
        let mut scare = Jumpscare::new(
            vec![
                frame("A", 0.05, Disposal::Unspecified),
                frame("B", 0.05, Disposal::Unspecified),
                frame("C", 0.05, Disposal::Unspecified),
            ],
            1,
            2,
            Some(sound.clone()),
        )
        .unwrap();

        let mut tick = 0;
        while scare.frame_index() < 1 {
            assert_eq!(sound.play_count(), 0);
            assert!(!scare.cams_forced_down());
            scare.advance(tick, 60);
            tick += 1;
        }
        assert_eq!(sound.play_count(), 1);
        assert!(!scare.cams_forced_down());

        run_until_index(&mut scare, &mut tick, 2);
        assert!(scare.cams_forced_down());
        assert_eq!(sound.play_count(), 1);
    }

    #[test]
    fn reset_ignores_previous_sound_end() {
        let sound = Arc::new(RecordingSound::new());
        let mut scare = Jumpscare::new(
            vec![frame("A", 0.0, Disposal::Unspecified)],
            0,
            0,
            Some(sound.clone()),
        )
        .unwrap();
        assert!(!scare.advance(0, 60));
        sound.finish();
        assert!(scare.advance(1, 60));

        scare.reset();
        // Stale end from the first run must not finish the replay
        sound.end_signal().fire();
        assert!(!scare.advance(10, 60));
        assert_eq!(sound.play_count(), 2);
        sound.finish();
        assert!(scare.advance(11, 60));
    }

    #[test]
    fn rejects_out_of_range_sound_frame() {
        let err = Jumpscare::new(vec![frame("A", 0.0, Disposal::Unspecified)], 1, 0, None);
        assert!(err.is_err());
        assert!(Jumpscare::new(Vec::new(), 0, 0, None).is_err());
    }
}
