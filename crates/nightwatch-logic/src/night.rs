//! Night orchestrator: the fixed-rate tick loop.
//!
//! A [`Night`] owns the camera map, the agents, the ambient scheduler and the
//! night's single seeded RNG. Each [`Night::tick`] runs the agents in a fixed
//! order against the player's input, then the ambient scheduler. When an
//! agent's jumpscare fires, normal simulation freezes and only that agent's
//! jumpscare is advanced until it completes, ending the night in failure.
//! Reaching the configured duration without a kill ends it in success.
//!
//! ```
//! use nightwatch_logic::night::{NightOutcome, PlayerInput};
//! # use nightwatch_logic::assets::ImageHandle;
//! # use nightwatch_logic::camera::{Camera, CameraMap, HitRegion};
//! # use nightwatch_logic::ambient::AmbientSoundSystem;
//! # use nightwatch_logic::night::{Night, NightConfig};
//! # let office = Camera::builder().name("office").background(ImageHandle::new("o"))
//! #     .region(HitRegion::new(0, 0, 1, 1)).build().unwrap();
//! # let map = CameraMap::new(ImageHandle::new("m"), "office", vec![office]).unwrap();
//! let config = NightConfig { name: "night1".into(), fps: 60, duration_ticks: 120, seed: 1 };
//! let mut night = Night::new(config, map, Vec::new(), AmbientSoundSystem::silent(), None).unwrap();
//! let outcome = loop {
//!     if let Some(outcome) = night.tick(PlayerInput::default()).unwrap().outcome {
//!         break outcome;
//!     }
//! };
//! assert_eq!(outcome, NightOutcome::Completed);
//! ```

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::ambient::AmbientSoundSystem;
use crate::animatronic::{Animatronic, HideContext, MovementContext};
use crate::assets::ImageHandle;
use crate::camera::{AgentId, CameraId, CameraMap, DoorSide};
use crate::clock::tick_seconds;
use crate::error::{ConfigError, GraphError, NightError};
use crate::phone::PhoneCall;

/// Fixed parameters of one night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightConfig {
    pub name: String,
    pub fps: u32,
    /// Ticks to survive.
    pub duration_ticks: u64,
    pub seed: u64,
}

/// What the player is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub left_door_open: bool,
    pub right_door_open: bool,
    pub cams_up: bool,
}

impl PlayerInput {
    pub fn door_open(&self, side: DoorSide) -> bool {
        match side {
            DoorSide::Left => self.left_door_open,
            DoorSide::Right => self.right_door_open,
        }
    }
}

impl Default for PlayerInput {
    /// Both doors open, monitor down.
    fn default() -> Self {
        Self {
            left_door_open: true,
            right_door_open: true,
            cams_up: false,
        }
    }
}

/// Terminal result of a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightOutcome {
    /// Survived until the duration elapsed.
    Completed,
    /// A jumpscare played to the end.
    Failed,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NightEvent {
    AiLevelChanged {
        agent: String,
        level: u8,
    },
    AgentMoved {
        agent: String,
        from: String,
        to: String,
    },
    AmbientCue {
        sound: usize,
        camera: Option<String>,
    },
    JumpscareStarted {
        agent: String,
    },
    PhoneCallEnded,
}

/// What the renderer draws this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    CameraFeed {
        camera: String,
        background: ImageHandle,
        /// Agents visible on the selected camera, in arrival order.
        overlays: Vec<String>,
        cams_up: bool,
    },
    Jumpscare {
        agent: String,
        frames: Vec<ImageHandle>,
        cams_forced_down: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub view: View,
    pub events: Vec<NightEvent>,
    /// Phone call caption showing this tick.
    pub subtitle: Option<String>,
    pub outcome: Option<NightOutcome>,
}

pub struct Night {
    config: NightConfig,
    tick: u64,
    rng: StdRng,
    cameras: CameraMap,
    agents: Vec<Animatronic>,
    ambient: AmbientSoundSystem,
    phone: Option<PhoneCall>,
    active: Option<AgentId>,
    outcome: Option<NightOutcome>,
    /// Set when the camera graph was found inconsistent mid-tick.
    halted: bool,
}

impl Night {
    /// Set up a night. Every agent is placed at its starting camera.
    pub fn new(
        config: NightConfig,
        mut cameras: CameraMap,
        agents: Vec<(Animatronic, CameraId)>,
        ambient: AmbientSoundSystem,
        phone: Option<PhoneCall>,
    ) -> Result<Self, NightError> {
        if config.fps == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "fps",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if config.duration_ticks == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "duration",
                reason: "night must last at least one tick".into(),
            }
            .into());
        }

        let mut names = HashSet::new();
        let mut placed = Vec::with_capacity(agents.len());
        for (idx, (agent, start)) in agents.into_iter().enumerate() {
            if !names.insert(agent.name().to_string()) {
                return Err(ConfigError::DuplicateAgent(agent.name().to_string()).into());
            }
            cameras.place(AgentId(idx), start)?;
            placed.push(agent);
        }

        log::info!(
            "night `{}`: {} cameras, {} agents, {} ticks at {} fps, seed {}",
            config.name,
            cameras.len(),
            placed.len(),
            config.duration_ticks,
            config.fps,
            config.seed
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            tick: 0,
            cameras,
            agents: placed,
            ambient,
            phone,
            active: None,
            outcome: None,
            halted: false,
        })
    }

    pub fn config(&self) -> &NightConfig {
        &self.config
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn cameras(&self) -> &CameraMap {
        &self.cameras
    }

    pub fn agents(&self) -> &[Animatronic] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<(AgentId, &Animatronic)> {
        self.agents
            .iter()
            .enumerate()
            .find(|(_, a)| a.name() == name)
            .map(|(idx, a)| (AgentId(idx), a))
    }

    /// Camera name an agent is standing at.
    pub fn location_of(&self, name: &str) -> Option<&str> {
        let (id, _) = self.agent(name)?;
        let cam = self.cameras.location(id)?;
        self.cameras.get(cam).map(|c| c.name())
    }

    pub fn outcome(&self) -> Option<NightOutcome> {
        self.outcome
    }

    /// Agent whose jumpscare is playing.
    pub fn jumpscaring(&self) -> Option<&Animatronic> {
        self.active.map(|id| &self.agents[id.0])
    }

    /// Whether the player can currently use the camera monitor.
    pub fn cams_locked(&self) -> bool {
        self.jumpscaring()
            .map(|a| a.jumpscare().cams_forced_down())
            .unwrap_or(false)
    }

    /// Switch the monitor to another camera.
    pub fn select_camera(&mut self, name: &str) -> Result<(), NightError> {
        if self.cams_locked() {
            return Err(NightError::CamerasLocked);
        }
        self.cameras.select(name)?;
        Ok(())
    }

    /// Switch the monitor to whichever camera button covers a map point.
    pub fn select_at(&mut self, x: i32, y: i32) -> Result<Option<&str>, NightError> {
        if self.cams_locked() {
            return Err(NightError::CamerasLocked);
        }
        let Some(id) = self.cameras.camera_at(x, y) else {
            return Ok(None);
        };
        let name = self
            .cameras
            .get(id)
            .map(|c| c.name().to_string())
            .ok_or_else(|| GraphError::UnknownCamera(id.to_string()))?;
        self.cameras.select(&name)?;
        Ok(Some(self.cameras.selected_camera().name()))
    }

    /// Hang up the phone call, if one is running.
    pub fn mute_call(&mut self) {
        if let Some(phone) = self.phone.as_mut() {
            phone.mute();
        }
    }

    /// Advance the night by one tick.
    pub fn tick(&mut self, input: PlayerInput) -> Result<TickReport, NightError> {
        if self.outcome.is_some() || self.halted {
            return Err(NightError::Ended);
        }
        let tick = self.tick;
        let fps = self.config.fps;
        let mut events = Vec::new();

        if let Some(id) = self.active {
            let finished = self.agents[id.0].jumpscare_mut().advance(tick, fps);
            self.tick += 1;
            if finished {
                self.finish(NightOutcome::Failed);
            }
            return Ok(TickReport {
                tick,
                view: self.jumpscare_view(id),
                events,
                subtitle: None,
                outcome: self.outcome,
            });
        }

        let subtitle = match self.phone.as_mut() {
            Some(phone) if !phone.is_ended() => {
                let caption = phone.tick(tick, fps).map(str::to_string);
                if phone.is_ended() {
                    events.push(NightEvent::PhoneCallEnded);
                }
                caption
            }
            _ => None,
        };

        let cams_up = input.cams_up;
        let triggered = match self.run_agents(tick, input, &mut events) {
            Ok(triggered) => triggered,
            Err(err) => {
                log::error!(
                    "night `{}` halted at tick {tick}: {err}",
                    self.config.name
                );
                self.halted = true;
                self.release_audio();
                return Err(err.into());
            }
        };

        if let Some(cue) = self.ambient.tick(tick, &self.cameras, &mut self.rng) {
            events.push(NightEvent::AmbientCue {
                sound: cue.index,
                camera: cue
                    .camera
                    .and_then(|c| self.cameras.get(c))
                    .map(|c| c.name().to_string()),
            });
        }

        self.tick += 1;

        if let Some(id) = triggered {
            let agent = &mut self.agents[id.0];
            log::info!("tick {tick}: jumpscare by {}", agent.name());
            events.push(NightEvent::JumpscareStarted {
                agent: agent.name().to_string(),
            });
            self.active = Some(id);
            self.ambient.stop();
            self.mute_call();

            let scare = self.agents[id.0].jumpscare_mut();
            scare.reset();
            if scare.advance(tick, fps) {
                self.finish(NightOutcome::Failed);
            }
            return Ok(TickReport {
                tick,
                view: self.jumpscare_view(id),
                events,
                subtitle: None,
                outcome: self.outcome,
            });
        }

        let view = self.camera_view(tick, cams_up);
        if self.tick >= self.config.duration_ticks {
            self.finish(NightOutcome::Completed);
        }
        Ok(TickReport {
            tick,
            view,
            events,
            subtitle,
            outcome: self.outcome,
        })
    }

    /// Run every agent once. The first agent to strike wins the tick.
    fn run_agents(
        &mut self,
        tick: u64,
        input: PlayerInput,
        events: &mut Vec<NightEvent>,
    ) -> Result<Option<AgentId>, GraphError> {
        let cams_up = input.cams_up;
        let fps = self.config.fps;
        let second = tick_seconds(tick, fps);
        let mut triggered = None;

        for idx in 0..self.agents.len() {
            let id = AgentId(idx);
            let agent = &mut self.agents[idx];

            if let Some(level) = agent.update_ai_level(second) {
                events.push(NightEvent::AiLevelChanged {
                    agent: agent.name().to_string(),
                    level,
                });
            }

            let mut here = self
                .cameras
                .location(id)
                .ok_or_else(|| GraphError::AgentNotPresent {
                    agent: agent.name().to_string(),
                    camera: "<none>".into(),
                })?;
            let camera = self
                .cameras
                .get(here)
                .ok_or_else(|| GraphError::UnknownCamera(here.to_string()))?;
            let ctx = MovementContext {
                tick,
                camera,
                watched: cams_up && self.cameras.selected() == here,
                cams_up,
            };

            if agent.movement_opportunity(&ctx, &mut self.rng) {
                if let Some(to) = agent.choose_destination(&self.cameras, here, &mut self.rng) {
                    self.cameras.move_agent(id, here, to)?;
                    if let (Some(from_cam), Some(to_cam)) =
                        (self.cameras.get(here), self.cameras.get(to))
                    {
                        agent.notify_moved(from_cam, to_cam);
                        log::debug!(
                            "tick {tick}: {} {} -> {}",
                            agent.name(),
                            from_cam.name(),
                            to_cam.name()
                        );
                        events.push(NightEvent::AgentMoved {
                            agent: agent.name().to_string(),
                            from: from_cam.name().to_string(),
                            to: to_cam.name().to_string(),
                        });
                    }
                    here = to;
                }
            }

            let camera = self
                .cameras
                .get(here)
                .ok_or_else(|| GraphError::UnknownCamera(here.to_string()))?;
            let door_open = camera
                .door()
                .map(|side| input.door_open(side))
                .unwrap_or(false);
            let watched = cams_up && self.cameras.selected() == here;
            let strikes = agent.attempt_jumpscare(
                tick,
                door_open,
                cams_up,
                watched,
                camera,
                fps,
                &mut self.rng,
            );
            if strikes && triggered.is_none() {
                triggered = Some(id);
            }
        }
        Ok(triggered)
    }

    fn camera_view(&self, tick: u64, cams_up: bool) -> View {
        let camera = self.cameras.selected_camera();
        let ctx = HideContext {
            tick,
            cams_up,
            camera,
        };
        let overlays = camera
            .occupants()
            .iter()
            .map(|id| &self.agents[id.0])
            .filter(|agent| !agent.hides_from_camera(&ctx))
            .map(|agent| agent.name().to_string())
            .collect();
        View::CameraFeed {
            camera: camera.name().to_string(),
            background: camera.background().clone(),
            overlays,
            cams_up,
        }
    }

    fn jumpscare_view(&self, id: AgentId) -> View {
        let agent = &self.agents[id.0];
        let scare = agent.jumpscare();
        View::Jumpscare {
            agent: agent.name().to_string(),
            frames: scare.composited().into_iter().cloned().collect(),
            cams_forced_down: scare.cams_forced_down(),
        }
    }

    fn finish(&mut self, outcome: NightOutcome) {
        log::info!(
            "night `{}` ended at tick {}: {:?}",
            self.config.name,
            self.tick,
            outcome
        );
        self.outcome = Some(outcome);
        self.release_audio();
    }

    fn release_audio(&mut self) {
        self.ambient.stop();
        self.mute_call();
        if let Some(id) = self.active {
            self.agents[id.0].jumpscare_mut().stop();
        }
    }

    /// Tear the night down mid-way. Stops every sound the night started.
    pub fn shutdown(self) {
        log::info!(
            "night `{}` shut down at tick {}",
            self.config.name,
            self.tick
        );
    }
}

impl Drop for Night {
    fn drop(&mut self) {
        self.release_audio();
    }
}
