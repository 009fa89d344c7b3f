//! Night-start phone call: one voice line with optional captions.

use crate::audio::{AudioPlacement, SoundHandle};
use crate::clock::tick_millis;
use crate::subtitles::Subtitles;

pub struct PhoneCall {
    sound: SoundHandle,
    subtitles: Subtitles,
    started_at: Option<u64>,
    ended: bool,
}

impl PhoneCall {
    pub fn new(sound: SoundHandle, subtitles: Subtitles) -> Self {
        Self {
            sound,
            subtitles,
            started_at: None,
            ended: false,
        }
    }

    /// Start on the first call, then report the caption for this tick.
    /// Returns `None` once the call has ended or been muted.
    pub fn tick(&mut self, tick: u64, fps: u32) -> Option<&str> {
        if self.ended {
            return None;
        }
        let started = match self.started_at {
            Some(t) => t,
            None => {
                self.sound.end_signal().arm();
                self.sound.play(AudioPlacement::LISTENER);
                self.started_at = Some(tick);
                tick
            }
        };
        if self.sound.end_signal().take() {
            self.ended = true;
            return None;
        }
        let elapsed_ms = tick_millis(tick.saturating_sub(started), fps);
        self.subtitles.cue_at(elapsed_ms).map(|c| c.text.as_str())
    }

    /// Hang up early.
    pub fn mute(&mut self) {
        if !self.ended {
            self.sound.stop();
            self.sound.end_signal().disarm();
            self.ended = true;
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::RecordingSound;
    use crate::subtitles::parse_srt;

    fn call() -> (PhoneCall, Arc<RecordingSound>) {
        let sound = Arc::new(RecordingSound::new());
        let subs = parse_srt(
            "1\n00:00:00,000 --> 00:00:01,000\nHello, hello?\n\n\
2\n00:00:02,000 --> 00:00:03,000\nCheck the doors.\n\n",
        )
        .unwrap();
        (PhoneCall::new(sound.clone(), subs), sound)
    }

    #[test]
    fn captions_follow_elapsed_time() {
        let (mut phone, sound) = call();
        assert_eq!(phone.tick(100, 60), Some("Hello, hello?"));
        assert_eq!(sound.play_count(), 1);
        assert_eq!(phone.tick(160, 60), None);
        assert_eq!(phone.tick(220, 60), Some("Check the doors."));
    }

    #[test]
    fn ends_with_sound() {
        let (mut phone, sound) = call();
        phone.tick(0, 60);
        sound.finish();
        assert_eq!(phone.tick(1, 60), None);
        assert!(phone.is_ended());
        assert_eq!(sound.play_count(), 1);
    }

    #[test]
    fn mute_stops_playback() {
        let (mut phone, sound) = call();
        phone.tick(0, 60);
        phone.mute();
        assert!(!sound.is_playing());
        assert_eq!(phone.tick(30, 60), None);
    }
}
