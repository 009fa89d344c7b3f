//! Animatronic agents: AI level schedule, movement rolls, and the behavior
//! hooks each agent kind customizes.
//!
//! An [`Animatronic`] owns the parts every agent shares (name, AI level,
//! schedule, jumpscare). What makes an agent distinct lives behind the
//! [`Behavior`] trait, one implementation per agent kind (see
//! [`crate::behaviors`]). The agent never stores its own location; the
//! [`CameraMap`] is the single owner of who stands where.
//!
//! Per tick the night drives each agent through, in order:
//! 1. [`Animatronic::update_ai_level`]
//! 2. [`Animatronic::movement_opportunity`]
//! 3. [`Animatronic::choose_destination`] (only on success)
//! 4. [`Animatronic::attempt_jumpscare`]
//! 5. [`Animatronic::hides_from_camera`]

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraId, CameraMap};
use crate::error::ConfigError;
use crate::jumpscare::Jumpscare;

/// Upper AI level bound used when a script does not set one.
pub const DEFAULT_MAX_AI_LEVEL: u8 = 20;

/// Logical state, for reporting. Kinds decide which of these they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Roaming,
    ApproachingDoor,
    CommittedToKill,
    Neutralized,
}

/// Sparse map from simulated second to AI level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AiSchedule {
    marks: BTreeMap<u32, u8>,
}

impl AiSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks<I>(marks: I) -> Self
    where
        I: IntoIterator<Item = (u32, u8)>,
    {
        Self {
            marks: marks.into_iter().collect(),
        }
    }

    /// Set the level reached at `second`. Later calls for the same second win.
    pub fn set(&mut self, second: u32, level: u8) {
        self.marks.insert(second, level);
    }

    /// Latest mark at or before `second`.
    pub fn latest(&self, second: u32) -> Option<(u32, u8)> {
        self.marks
            .range(..=second)
            .next_back()
            .map(|(&mark, &level)| (mark, level))
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Inputs to a movement opportunity.
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    pub tick: u64,
    pub camera: &'a Camera,
    /// The player has the monitor up on this agent's camera.
    pub watched: bool,
    pub cams_up: bool,
}

/// Inputs to a jumpscare attempt. Built fresh every tick.
#[derive(Debug, Clone, Copy)]
pub struct JumpscareContext<'a> {
    pub tick: u64,
    /// The agent is at a door camera and that door is open.
    pub door_open: bool,
    pub cams_up: bool,
    /// The monitor is up and showing the agent's camera.
    pub watched: bool,
    pub camera: &'a Camera,
    pub fps: u32,
    pub ai_level: u8,
    pub max_ai_level: u8,
}

/// Inputs to the camera-hide check.
#[derive(Debug, Clone, Copy)]
pub struct HideContext<'a> {
    pub tick: u64,
    pub cams_up: bool,
    pub camera: &'a Camera,
}

/// Hooks an agent kind implements. Every hook must be non-blocking and
/// must treat "nowhere to go" or "not at a door" as ordinary states.
pub trait Behavior: Send {
    /// Registry identifier of this kind.
    fn kind(&self) -> &'static str;

    /// Gate before the movement roll. Return `false` to skip this
    /// opportunity without drawing from the RNG.
    fn on_movement_attempt(&mut self, ctx: &MovementContext<'_>) -> bool {
        let _ = ctx;
        !self.is_committed()
    }

    /// Whether `target` is a legal destination for this agent.
    fn on_movement_target(&self, target: &Camera) -> bool {
        let _ = target;
        true
    }

    /// Notified after the map has moved the agent.
    fn on_moved(&mut self, from: &Camera, to: &Camera) {
        let _ = (from, to);
    }

    /// Called every tick. Returns `true` on exactly the tick the kill fires.
    fn on_jumpscare_attempt(
        &mut self,
        ctx: &JumpscareContext<'_>,
        rng: &mut dyn RngCore,
    ) -> bool;

    /// Whether the agent is left off the live camera feed this tick.
    fn on_hide_from_camera(&self, ctx: &HideContext<'_>) -> bool {
        let _ = ctx;
        false
    }

    fn is_committed(&self) -> bool {
        false
    }

    fn state(&self) -> AgentState {
        if self.is_committed() {
            AgentState::CommittedToKill
        } else {
            AgentState::Roaming
        }
    }
}

/// Probability `ai_level / max_ai_level` draw: uniform in `[0, max)`,
/// succeeding when below the current level.
pub fn roll_movement(ai_level: u8, max_ai_level: u8, rng: &mut dyn RngCore) -> bool {
    if max_ai_level == 0 {
        return false;
    }
    rng.gen_range(0..max_ai_level) < ai_level
}

pub struct Animatronic {
    name: String,
    schedule: AiSchedule,
    applied_mark: Option<u32>,
    ai_level: u8,
    max_ai_level: u8,
    movement_interval: u64,
    jumpscare: Jumpscare,
    behavior: Box<dyn Behavior>,
}

impl Animatronic {
    pub fn new(
        name: &str,
        max_ai_level: u8,
        schedule: AiSchedule,
        jumpscare: Jumpscare,
        behavior: Box<dyn Behavior>,
    ) -> Result<Self, ConfigError> {
        if max_ai_level == 0 {
            return Err(ConfigError::InvalidAgent {
                agent: name.to_string(),
                reason: "max_ai_level must be at least 1".into(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            schedule,
            applied_mark: None,
            ai_level: 0,
            max_ai_level,
            movement_interval: 1,
            jumpscare,
            behavior,
        })
    }

    /// Only sample movement on ticks that are multiples of `ticks`.
    pub fn with_movement_interval(mut self, ticks: u64) -> Self {
        self.movement_interval = ticks.max(1);
        self
    }

    /// Starting level before any schedule mark applies.
    pub fn with_ai_level(mut self, level: u8) -> Self {
        self.ai_level = level.min(self.max_ai_level);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.behavior.kind()
    }

    pub fn ai_level(&self) -> u8 {
        self.ai_level
    }

    pub fn max_ai_level(&self) -> u8 {
        self.max_ai_level
    }

    pub fn set_ai_level(&mut self, level: u8) {
        self.ai_level = level.min(self.max_ai_level);
    }

    pub fn state(&self) -> AgentState {
        self.behavior.state()
    }

    pub fn jumpscare(&self) -> &Jumpscare {
        &self.jumpscare
    }

    pub fn jumpscare_mut(&mut self) -> &mut Jumpscare {
        &mut self.jumpscare
    }

    /// Apply the newest schedule mark at or before `second`, once.
    ///
    /// A mark is applied the first time elapsed time reaches it; afterwards
    /// the level is left alone until a newer mark is crossed. Returns the new
    /// level when it was applied this call.
    pub fn update_ai_level(&mut self, second: u32) -> Option<u8> {
        let (mark, level) = self.schedule.latest(second)?;
        if self.applied_mark == Some(mark) {
            return None;
        }
        self.applied_mark = Some(mark);
        self.ai_level = level.min(self.max_ai_level);
        Some(self.ai_level)
    }

    /// Whether the agent gets to move this tick.
    pub fn movement_opportunity(
        &mut self,
        ctx: &MovementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> bool {
        if ctx.tick % self.movement_interval != 0 {
            return false;
        }
        if !self.behavior.on_movement_attempt(ctx) {
            return false;
        }
        roll_movement(self.ai_level, self.max_ai_level, rng)
    }

    /// Uniformly pick a legal neighbor of `from`. `None` means stay put.
    pub fn choose_destination(
        &self,
        map: &CameraMap,
        from: CameraId,
        rng: &mut dyn RngCore,
    ) -> Option<CameraId> {
        let legal: Vec<CameraId> = map
            .neighbors(from)
            .into_iter()
            .filter(|id| {
                map.get(*id)
                    .map(|cam| self.behavior.on_movement_target(cam))
                    .unwrap_or(false)
            })
            .collect();
        legal.choose(rng).copied()
    }

    pub fn notify_moved(&mut self, from: &Camera, to: &Camera) {
        self.behavior.on_moved(from, to);
    }

    pub fn attempt_jumpscare(
        &mut self,
        tick: u64,
        door_open: bool,
        cams_up: bool,
        watched: bool,
        camera: &Camera,
        fps: u32,
        rng: &mut dyn RngCore,
    ) -> bool {
        let ctx = JumpscareContext {
            tick,
            door_open,
            cams_up,
            watched,
            camera,
            fps,
            ai_level: self.ai_level,
            max_ai_level: self.max_ai_level,
        };
        self.behavior.on_jumpscare_attempt(&ctx, rng)
    }

    pub fn hides_from_camera(&self, ctx: &HideContext<'_>) -> bool {
        self.behavior.on_hide_from_camera(ctx)
    }
}

impl std::fmt::Debug for Animatronic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animatronic")
            .field("name", &self.name)
            .field("kind", &self.behavior.kind())
            .field("ai_level", &self.ai_level)
            .field("max_ai_level", &self.max_ai_level)
            .field("state", &self.behavior.state())
            .finish()
    }
}
