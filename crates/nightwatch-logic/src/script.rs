//! Night scripts: the JSON description of one night.
//!
//! A script names every camera, agent and sound of a night. Building it
//! resolves every asset through an [`AssetLoader`] and every agent kind
//! through an [`AgentRegistry`], so a broken script fails before the first
//! tick rather than halfway through the night.
//!
//! ```json
//! {
//!   "name": "night1",
//!   "duration_seconds": 360,
//!   "map_image": "map.png",
//!   "start_camera": "stage",
//!   "cameras": [
//!     { "name": "stage", "background": "stage.png",
//!       "region": { "x": 0, "y": 0, "width": 40, "height": 20 },
//!       "connections": ["hall"] }
//!   ],
//!   "agents": [
//!     { "name": "freddy", "kind": "stalker", "start_camera": "stage",
//!       "schedule": { "0": 2, "120": 8 }, "patience_seconds": 4.9,
//!       "jumpscare": { "gif": "freddy.gif", "sound": "scream.ogg" } }
//!   ]
//! }
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ambient::{AmbientSound, AmbientSoundSystem};
use crate::animatronic::{AiSchedule, Animatronic, DEFAULT_MAX_AI_LEVEL};
use crate::assets::AssetLoader;
use crate::audio::AudioPlacement;
use crate::camera::{Camera, CameraMap, HitRegion};
use crate::clock::{seconds_to_ticks, DEFAULT_FPS};
use crate::error::{ConfigError, NightError};
use crate::jumpscare::Jumpscare;
use crate::night::{Night, NightConfig};
use crate::phone::PhoneCall;
use crate::registry::AgentRegistry;
use crate::subtitles::Subtitles;

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_max_ai_level() -> u8 {
    DEFAULT_MAX_AI_LEVEL
}

fn default_interval() -> u64 {
    1
}

fn default_volume() -> f32 {
    1.0
}

fn default_weight() -> f32 {
    1.0
}

/// One night, as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightScript {
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    pub duration_seconds: f32,
    /// Fixed seed for a reproducible night. `None` draws one at build time.
    #[serde(default)]
    pub seed: Option<u64>,
    pub map_image: String,
    pub start_camera: String,
    pub cameras: Vec<CameraSpec>,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub ambient: Option<AmbientSpec>,
    #[serde(default)]
    pub phone_call: Option<PhoneCallSpec>,
}

/// Required fields are optional here so the camera builder reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub region: Option<HitRegion>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub left_door: bool,
    #[serde(default)]
    pub right_door: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub pan: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    /// Registry identifier, e.g. `stalker`.
    pub kind: String,
    pub start_camera: String,
    #[serde(default = "default_max_ai_level")]
    pub max_ai_level: u8,
    /// Level before the first schedule mark.
    #[serde(default)]
    pub ai_level: u8,
    #[serde(default)]
    pub schedule: AiSchedule,
    #[serde(default = "default_interval")]
    pub movement_interval_ticks: u64,
    #[serde(default)]
    pub forbidden: Vec<String>,
    #[serde(default)]
    pub patience_seconds: Option<f32>,
    pub jumpscare: JumpscareSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpscareSpec {
    pub gif: String,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub sound_start_frame: usize,
    #[serde(default)]
    pub cams_down_frame: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientSpec {
    pub interval_ticks: u64,
    pub chance: f64,
    #[serde(default)]
    pub sounds: Vec<AmbientSoundSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientSoundSpec {
    pub path: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub on_camera: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneCallSpec {
    pub sound: String,
    #[serde(default)]
    pub subtitles: Option<String>,
}

impl NightScript {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Script(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Script(e.to_string()))
    }

    /// Ticks the night lasts at its frame rate.
    pub fn duration_ticks(&self) -> u64 {
        seconds_to_ticks(self.duration_seconds, self.fps)
    }

    /// Validate the script, load its assets and set up a [`Night`].
    pub fn build(
        &self,
        loader: &dyn AssetLoader,
        registry: &AgentRegistry,
    ) -> Result<Night, NightError> {
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(ConfigError::InvalidSetting {
                field: "duration_seconds",
                reason: format!("{} is not a positive duration", self.duration_seconds),
            }
            .into());
        }

        let cameras = self.build_cameras(loader)?;

        let mut agents = Vec::with_capacity(self.agents.len());
        for spec in &self.agents {
            let start = cameras
                .id(&spec.start_camera)
                .map_err(|_| ConfigError::UnknownAgentCamera {
                    agent: spec.name.clone(),
                    camera: spec.start_camera.clone(),
                })?;
            if let Some(missing) = spec.forbidden.iter().find(|c| cameras.id(c).is_err()) {
                return Err(ConfigError::InvalidAgent {
                    agent: spec.name.clone(),
                    reason: format!("forbidden camera `{missing}` does not exist"),
                }
                .into());
            }
            agents.push((build_agent(spec, loader, registry)?, start));
        }

        let ambient = match &self.ambient {
            Some(spec) => {
                let mut sounds = Vec::with_capacity(spec.sounds.len());
                for s in &spec.sounds {
                    sounds.push(AmbientSound::new(
                        loader.load_sound(&s.path)?,
                        s.weight,
                        s.on_camera,
                    ));
                }
                AmbientSoundSystem::new(sounds, spec.interval_ticks, spec.chance)?
            }
            None => AmbientSoundSystem::silent(),
        };

        let phone = match &self.phone_call {
            Some(spec) => {
                let subtitles = match &spec.subtitles {
                    Some(path) => loader.load_subtitles(path)?,
                    None => Subtitles::default(),
                };
                Some(PhoneCall::new(loader.load_sound(&spec.sound)?, subtitles))
            }
            None => None,
        };

        let seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let config = NightConfig {
            name: self.name.clone(),
            fps: self.fps,
            duration_ticks: self.duration_ticks(),
            seed,
        };
        Night::new(config, cameras, agents, ambient, phone)
    }

    fn build_cameras(&self, loader: &dyn AssetLoader) -> Result<CameraMap, NightError> {
        let mut cameras = Vec::with_capacity(self.cameras.len());
        for spec in &self.cameras {
            let mut builder = Camera::builder()
                .connections(spec.connections.iter().map(String::as_str))
                .left_door(spec.left_door)
                .right_door(spec.right_door)
                .audio(AudioPlacement::new(spec.volume, spec.pan));
            if let Some(name) = &spec.name {
                builder = builder.name(name);
            }
            if let Some(path) = &spec.background {
                builder = builder.background(loader.load_image(path)?);
            }
            if let Some(region) = spec.region {
                builder = builder.region(region);
            }
            cameras.push(builder.build()?);
        }
        let map_image = loader.load_image(&self.map_image)?;
        Ok(CameraMap::new(map_image, &self.start_camera, cameras)?)
    }
}

fn build_agent(
    spec: &AgentSpec,
    loader: &dyn AssetLoader,
    registry: &AgentRegistry,
) -> Result<Animatronic, NightError> {
    let behavior = registry.create(spec)?;
    if spec.movement_interval_ticks == 0 {
        return Err(ConfigError::InvalidAgent {
            agent: spec.name.clone(),
            reason: "movement_interval_ticks must be at least 1".into(),
        }
        .into());
    }

    let frames = loader.load_gif(&spec.jumpscare.gif)?;
    let sound = match &spec.jumpscare.sound {
        Some(path) => Some(loader.load_sound(path)?),
        None => None,
    };
    let jumpscare = Jumpscare::new(
        frames,
        spec.jumpscare.sound_start_frame,
        spec.jumpscare.cams_down_frame,
        sound,
    )
    .map_err(|e| ConfigError::InvalidAgent {
        agent: spec.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(Animatronic::new(
        &spec.name,
        spec.max_ai_level,
        spec.schedule.clone(),
        jumpscare,
        behavior,
    )?
    .with_ai_level(spec.ai_level)
    .with_movement_interval(spec.movement_interval_ticks))
}
