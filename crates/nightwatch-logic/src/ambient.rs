//! Ambient sound scheduler.
//!
//! Every `interval_ticks` ticks, if nothing it started is still playing, the
//! scheduler rolls `chance` and on success plays one sound chosen by weight.
//! Sounds flagged `on_camera` are placed at a random camera's audio position;
//! the rest play at the listener.

use rand::seq::IteratorRandom;
use rand::{Rng, RngCore};

use crate::audio::{AudioPlacement, SoundHandle};
use crate::camera::{CameraId, CameraMap};
use crate::error::ConfigError;

pub struct AmbientSound {
    pub sound: SoundHandle,
    pub weight: f32,
    pub on_camera: bool,
}

impl AmbientSound {
    pub fn new(sound: SoundHandle, weight: f32, on_camera: bool) -> Self {
        Self {
            sound,
            weight,
            on_camera,
        }
    }
}

/// A sound the scheduler just started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientCue {
    pub index: usize,
    pub camera: Option<CameraId>,
    pub placement: AudioPlacement,
}

pub struct AmbientSoundSystem {
    sounds: Vec<AmbientSound>,
    interval_ticks: u64,
    chance: f64,
    playing: Option<usize>,
}

impl AmbientSoundSystem {
    pub fn new(
        sounds: Vec<AmbientSound>,
        interval_ticks: u64,
        chance: f64,
    ) -> Result<Self, ConfigError> {
        if interval_ticks == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "ambient.interval_ticks",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::InvalidSetting {
                field: "ambient.chance",
                reason: format!("{chance} is not a probability"),
            });
        }
        Ok(Self {
            sounds,
            interval_ticks,
            chance,
            playing: None,
        })
    }

    /// A scheduler that never plays anything.
    pub fn silent() -> Self {
        Self {
            sounds: Vec::new(),
            interval_ticks: 1,
            chance: 0.0,
            playing: None,
        }
    }

    pub fn sounds(&self) -> &[AmbientSound] {
        &self.sounds
    }

    pub fn playing(&self) -> Option<usize> {
        self.playing
    }

    /// Weighted pick over sounds with positive weight.
    pub fn pick(&self, rng: &mut dyn RngCore) -> Option<usize> {
        let total: f64 = self
            .sounds
            .iter()
            .filter(|s| s.weight > 0.0)
            .map(|s| s.weight as f64)
            .sum();
        if total <= 0.0 {
            return None;
        }

        let roll = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for (idx, sound) in self.sounds.iter().enumerate() {
            if sound.weight <= 0.0 {
                continue;
            }
            cumulative += sound.weight as f64;
            if roll < cumulative {
                return Some(idx);
            }
            last = Some(idx);
        }
        // Float rounding at the top end
        last
    }

    /// Run one tick of the scheduler.
    pub fn tick(
        &mut self,
        tick: u64,
        cameras: &CameraMap,
        rng: &mut dyn RngCore,
    ) -> Option<AmbientCue> {
        if let Some(idx) = self.playing {
            if self.sounds[idx].sound.end_signal().take() {
                self.playing = None;
            }
        }
        if self.playing.is_some() || tick % self.interval_ticks != 0 {
            return None;
        }
        if rng.gen::<f64>() >= self.chance {
            return None;
        }

        let index = self.pick(rng)?;
        let sound = &self.sounds[index];
        let (camera, placement) = if sound.on_camera {
            match cameras.iter().choose(rng) {
                Some((id, cam)) => (Some(id), cam.audio()),
                None => (None, AudioPlacement::LISTENER),
            }
        } else {
            (None, AudioPlacement::LISTENER)
        };

        self.playing = Some(index);
        sound.sound.end_signal().arm();
        sound.sound.play(placement);
        log::debug!("ambient sound {index} at tick {tick}");
        Some(AmbientCue {
            index,
            camera,
            placement,
        })
    }

    /// Stop whatever the scheduler started and clear the latch.
    pub fn stop(&mut self) {
        if let Some(idx) = self.playing.take() {
            let sound = &self.sounds[idx].sound;
            sound.stop();
            sound.end_signal().disarm();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::assets::{ImageHandle, RecordingSound};
    use crate::camera::{Camera, HitRegion};

    fn map() -> CameraMap {
        let cam = |name: &str, volume: f32, pan: f32| {
            Camera::builder()
                .name(name)
                .background(ImageHandle::new(name))
                .region(HitRegion::new(0, 0, 1, 1))
                .audio(AudioPlacement::new(volume, pan))
                .build()
                .unwrap()
        };
        CameraMap::new(
            ImageHandle::new("map"),
            "a",
            vec![cam("a", 0.2, -0.5), cam("b", 0.6, 0.5)],
        )
        .unwrap()
    }

    fn system(weights: &[f32], chance: f64) -> (AmbientSoundSystem, Vec<Arc<RecordingSound>>) {
        let recorders: Vec<Arc<RecordingSound>> =
            weights.iter().map(|_| Arc::new(RecordingSound::new())).collect();
        let sounds = weights
            .iter()
            .zip(&recorders)
            .map(|(w, r)| AmbientSound::new(r.clone(), *w, false))
            .collect();
        (AmbientSoundSystem::new(sounds, 10, chance).unwrap(), recorders)
    }

    #[test]
    fn weighted_pick_matches_proportions() {
        let (ambient, _) = system(&[2.0, 3.0, 5.0], 1.0);
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            counts[ambient.pick(&mut rng).unwrap()] += 1;
        }
        for (count, expected) in counts.iter().zip([0.2, 0.3, 0.5]) {
            let share = *count as f64 / trials as f64;
            assert!((share - expected).abs() < 0.01, "{counts:?}");
        }
    }

    #[test]
    fn non_positive_weights_never_chosen() {
        let (ambient, _) = system(&[0.0, 4.0, -1.0], 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10_000 {
            assert_eq!(ambient.pick(&mut rng), Some(1));
        }
    }

    #[test]
    fn zero_total_weight_is_noop() {
        let (mut ambient, recorders) = system(&[0.0, 0.0], 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(ambient.pick(&mut rng), None);
        assert_eq!(ambient.tick(0, &map(), &mut rng), None);
        assert!(recorders.iter().all(|r| r.play_count() == 0));
    }

    #[test]
    fn only_on_interval_and_never_overlapping() {
        let (mut ambient, recorders) = system(&[1.0], 1.0);
        let cameras = map();
        let mut rng = StdRng::seed_from_u64(2);

        assert!(ambient.tick(3, &cameras, &mut rng).is_none());
        assert!(ambient.tick(10, &cameras, &mut rng).is_some());
        // Still playing at the next opportunity
        assert!(ambient.tick(20, &cameras, &mut rng).is_none());
        assert_eq!(recorders[0].play_count(), 1);

        recorders[0].finish();
        assert!(ambient.tick(25, &cameras, &mut rng).is_none());
        assert_eq!(ambient.playing(), None);
        assert!(ambient.tick(30, &cameras, &mut rng).is_some());
        assert_eq!(recorders[0].play_count(), 2);
    }

    #[test]
    fn zero_chance_never_plays() {
        let (mut ambient, recorders) = system(&[1.0], 0.0);
        let cameras = map();
        let mut rng = StdRng::seed_from_u64(2);
        for tick in 0..1000 {
            assert!(ambient.tick(tick, &cameras, &mut rng).is_none());
        }
        assert_eq!(recorders[0].play_count(), 0);
    }

    #[test]
    fn camera_sounds_use_camera_placement() {
        let recorder = Arc::new(RecordingSound::new());
        let mut ambient = AmbientSoundSystem::new(
            vec![AmbientSound::new(recorder.clone(), 1.0, true)],
            1,
            1.0,
        )
        .unwrap();
        let cameras = map();
        let mut rng = StdRng::seed_from_u64(4);
        let cue = ambient.tick(0, &cameras, &mut rng).unwrap();
        let id = cue.camera.unwrap();
        assert_eq!(cue.placement, cameras.get(id).unwrap().audio());
        assert_eq!(recorder.placements(), vec![cue.placement]);
    }

    #[test]
    fn bad_settings_rejected() {
        assert!(AmbientSoundSystem::new(Vec::new(), 0, 0.5).is_err());
        assert!(AmbientSoundSystem::new(Vec::new(), 10, 1.5).is_err());
    }
}
