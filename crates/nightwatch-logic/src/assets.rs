//! Asset loader boundary.
//!
//! Decoding images, GIFs and audio happens outside this crate. A night only
//! sees opaque [`ImageHandle`]s, decoded [`GifFrame`] lists and [`Sound`]
//! handles, all produced up front by an [`AssetLoader`].
//!
//! [`MemoryAssets`] is an in-process loader backed by a manifest. Its sounds
//! are [`RecordingSound`]s that record playback and are finished by hand,
//! standing in for the audio thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::audio::{AudioPlacement, EndSignal, Sound, SoundHandle};
use crate::error::AssetError;
use crate::subtitles::{parse_srt, Subtitles};

/// Opaque reference to a decoded image, keyed by its asset path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle(Arc<str>);

impl ImageHandle {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({})", self.0)
    }
}

/// What happens to a GIF frame once its delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposal {
    #[default]
    Unspecified,
    DoNotDispose,
    RestoreToBackground,
}

impl Disposal {
    /// Whether frames shown so far are cleared before the next frame.
    pub fn clears(self) -> bool {
        matches!(self, Disposal::RestoreToBackground)
    }
}

/// One decoded animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GifFrame {
    pub image: ImageHandle,
    pub delay_seconds: f32,
    pub disposal: Disposal,
}

/// Produces decoded assets for a night. Called only while a night is built.
pub trait AssetLoader {
    fn load_image(&self, path: &str) -> Result<ImageHandle, AssetError>;

    fn load_gif(&self, path: &str) -> Result<Vec<GifFrame>, AssetError>;

    fn load_sound(&self, path: &str) -> Result<SoundHandle, AssetError>;

    fn load_subtitles(&self, path: &str) -> Result<Subtitles, AssetError>;
}

/// Sound that records each playback instead of reaching a device.
#[derive(Default)]
pub struct RecordingSound {
    plays: Mutex<Vec<AudioPlacement>>,
    playing: AtomicBool,
    signal: EndSignal,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play_count(&self) -> usize {
        lock(&self.plays).len()
    }

    pub fn placements(&self) -> Vec<AudioPlacement> {
        lock(&self.plays).clone()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// End playback as the audio thread would. No-op when not playing.
    pub fn finish(&self) {
        if self.playing.swap(false, Ordering::AcqRel) {
            self.signal.fire();
        }
    }
}

impl Sound for RecordingSound {
    fn play(&self, placement: AudioPlacement) {
        lock(&self.plays).push(placement);
        self.playing.store(true, Ordering::Release);
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::Release);
    }

    fn end_signal(&self) -> &EndSignal {
        &self.signal
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Frame description inside an [`AssetManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFrame {
    /// Image key; defaults to `<gif path>#<index>`.
    #[serde(default)]
    pub image: Option<String>,
    pub delay_seconds: f32,
    #[serde(default)]
    pub disposal: Disposal,
}

/// Declarative contents for a [`MemoryAssets`] loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub gifs: HashMap<String, Vec<ManifestFrame>>,
    #[serde(default)]
    pub sounds: Vec<String>,
    /// Path → raw SubRip text.
    #[serde(default)]
    pub subtitles: HashMap<String, String>,
}

/// In-memory asset loader.
#[derive(Default)]
pub struct MemoryAssets {
    images: HashMap<String, ImageHandle>,
    gifs: HashMap<String, Vec<GifFrame>>,
    sounds: HashMap<String, Arc<RecordingSound>>,
    subtitles: HashMap<String, String>,
    corrupt: HashMap<String, String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &AssetManifest) -> Self {
        let mut assets = Self::new();
        for path in &manifest.images {
            assets.add_image(path);
        }
        for (path, frames) in &manifest.gifs {
            let frames = frames
                .iter()
                .enumerate()
                .map(|(i, f)| GifFrame {
                    image: ImageHandle::new(
                        f.image.as_deref().unwrap_or(&format!("{path}#{i}")),
                    ),
                    delay_seconds: f.delay_seconds,
                    disposal: f.disposal,
                })
                .collect();
            assets.add_gif(path, frames);
        }
        for path in &manifest.sounds {
            assets.add_sound(path);
        }
        for (path, text) in &manifest.subtitles {
            assets.add_subtitles(path, text);
        }
        assets
    }

    pub fn add_image(&mut self, path: &str) -> &mut Self {
        self.images.insert(path.to_string(), ImageHandle::new(path));
        self
    }

    pub fn add_gif(&mut self, path: &str, frames: Vec<GifFrame>) -> &mut Self {
        self.gifs.insert(path.to_string(), frames);
        self
    }

    pub fn add_sound(&mut self, path: &str) -> Arc<RecordingSound> {
        self.sounds
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(RecordingSound::new()))
            .clone()
    }

    pub fn add_subtitles(&mut self, path: &str, srt: &str) -> &mut Self {
        self.subtitles.insert(path.to_string(), srt.to_string());
        self
    }

    /// Make any later load of `path` fail as undecodable.
    pub fn mark_corrupt(&mut self, path: &str, reason: &str) -> &mut Self {
        self.corrupt.insert(path.to_string(), reason.to_string());
        self
    }

    pub fn sound(&self, path: &str) -> Option<Arc<RecordingSound>> {
        self.sounds.get(path).cloned()
    }

    /// Finish every sound that is currently playing.
    pub fn finish_playing(&self) -> usize {
        let mut finished = 0;
        for sound in self.sounds.values() {
            if sound.is_playing() {
                sound.finish();
                finished += 1;
            }
        }
        finished
    }

    fn check_corrupt(&self, path: &str) -> Result<(), AssetError> {
        match self.corrupt.get(path) {
            Some(reason) => Err(AssetError::Corrupt {
                path: path.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl AssetLoader for MemoryAssets {
    fn load_image(&self, path: &str) -> Result<ImageHandle, AssetError> {
        self.check_corrupt(path)?;
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::Missing(path.to_string()))
    }

    fn load_gif(&self, path: &str) -> Result<Vec<GifFrame>, AssetError> {
        self.check_corrupt(path)?;
        let frames = self
            .gifs
            .get(path)
            .ok_or_else(|| AssetError::Missing(path.to_string()))?;
        if frames.is_empty() {
            return Err(AssetError::Corrupt {
                path: path.to_string(),
                reason: "gif has no frames".into(),
            });
        }
        Ok(frames.clone())
    }

    fn load_sound(&self, path: &str) -> Result<SoundHandle, AssetError> {
        self.check_corrupt(path)?;
        self.sounds
            .get(path)
            .map(|s| s.clone() as SoundHandle)
            .ok_or_else(|| AssetError::Missing(path.to_string()))
    }

    fn load_subtitles(&self, path: &str) -> Result<Subtitles, AssetError> {
        self.check_corrupt(path)?;
        let text = self
            .subtitles
            .get(path)
            .ok_or_else(|| AssetError::Missing(path.to_string()))?;
        parse_srt(text).map_err(|source| AssetError::Subtitles {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_report_path() {
        let assets = MemoryAssets::new();
        assert_eq!(
            assets.load_image("office.png"),
            Err(AssetError::Missing("office.png".into()))
        );
        assert!(matches!(
            assets.load_sound("fan.wav"),
            Err(AssetError::Missing(_))
        ));
    }

    #[test]
    fn empty_gif_is_corrupt() {
        let mut assets = MemoryAssets::new();
        assets.add_gif("scare.gif", Vec::new());
        assert!(matches!(
            assets.load_gif("scare.gif"),
            Err(AssetError::Corrupt { .. })
        ));
    }

    #[test]
    fn bad_subtitles_surface_as_asset_error() {
        let mut assets = MemoryAssets::new();
        assets.add_subtitles("call.srt", "1\nno timecode\n\n");
        assert!(matches!(
            assets.load_subtitles("call.srt"),
            Err(AssetError::Subtitles { .. })
        ));
    }

    #[test]
    fn manifest_names_gif_frames() {
        let manifest: AssetManifest = serde_json::from_str(
            r#"{
                "gifs": { "bear.gif": [
                    { "delay_seconds": 0.1 },
                    { "delay_seconds": 0.2, "disposal": "restore_to_background" }
                ]},
                "sounds": ["scream.wav"]
            }"#,
        )
        .unwrap();
        let assets = MemoryAssets::from_manifest(&manifest);
        let frames = assets.load_gif("bear.gif").unwrap();
        assert_eq!(frames[1].image.key(), "bear.gif#1");
        assert_eq!(frames[1].disposal, Disposal::RestoreToBackground);
        assert!(assets.load_sound("scream.wav").is_ok());
    }

    #[test]
    fn recording_sound_fires_on_finish() {
        let sound = RecordingSound::new();
        sound.end_signal().arm();
        sound.play(AudioPlacement::LISTENER);
        assert!(sound.is_playing());
        sound.finish();
        assert!(!sound.is_playing());
        assert!(sound.end_signal().take());
        assert_eq!(sound.play_count(), 1);
    }
}
