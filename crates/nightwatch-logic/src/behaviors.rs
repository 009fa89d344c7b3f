//! Built-in agent kinds.
//!
//! | Kind | Registry id | At an open door |
//! |------|-------------|-----------------|
//! | [`Stalker`] | `stalker` | Kills once the door has stayed open for its patience |
//! | [`Ambusher`] | `ambusher` | Arms after its patience, hides from cameras, kills when the monitor goes down |
//! | [`Rusher`] | `rusher` | Rolls its AI level every tick and kills on success |
//!
//! Every kind refuses to enter the cameras on its forbidden list.

use rand::{Rng, RngCore};

use crate::animatronic::{AgentState, Behavior, HideContext, JumpscareContext, MovementContext};
use crate::camera::Camera;
use crate::clock::seconds_to_ticks;

/// Cameras an agent never walks into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forbidden(Vec<String>);

impl Forbidden {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, camera: &Camera) -> bool {
        !self.0.iter().any(|n| n == camera.name())
    }
}

/// Counts how long a door has been continuously open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorTimer {
    opened_at: Option<u64>,
}

impl DoorTimer {
    /// Ticks the door has been open as of `tick`, or `None` while closed.
    /// A closed observation resets the count.
    pub fn observe(&mut self, tick: u64, door_open: bool) -> Option<u64> {
        if !door_open {
            self.opened_at = None;
            return None;
        }
        let since = *self.opened_at.get_or_insert(tick);
        Some(tick.saturating_sub(since))
    }

    pub fn reset(&mut self) {
        self.opened_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.opened_at.is_some()
    }
}

/// Waits at a door and kills after it has stayed open for `patience_seconds`.
#[derive(Debug, Clone)]
pub struct Stalker {
    patience_seconds: f32,
    forbidden: Forbidden,
    timer: DoorTimer,
    committed: bool,
}

impl Stalker {
    pub fn new(patience_seconds: f32, forbidden: Forbidden) -> Self {
        Self {
            patience_seconds,
            forbidden,
            timer: DoorTimer::default(),
            committed: false,
        }
    }
}

impl Behavior for Stalker {
    fn kind(&self) -> &'static str {
        "stalker"
    }

    fn on_movement_target(&self, target: &Camera) -> bool {
        self.forbidden.allows(target)
    }

    fn on_moved(&mut self, _from: &Camera, _to: &Camera) {
        self.timer.reset();
    }

    fn on_jumpscare_attempt(
        &mut self,
        ctx: &JumpscareContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> bool {
        if self.committed {
            return false;
        }
        let Some(open_for) = self.timer.observe(ctx.tick, ctx.door_open) else {
            return false;
        };
        if open_for >= seconds_to_ticks(self.patience_seconds, ctx.fps) {
            log::debug!("stalker lost patience at tick {}", ctx.tick);
            self.committed = true;
            return true;
        }
        false
    }

    fn is_committed(&self) -> bool {
        self.committed
    }

    fn state(&self) -> AgentState {
        if self.committed {
            AgentState::CommittedToKill
        } else if self.timer.is_running() {
            AgentState::ApproachingDoor
        } else {
            AgentState::Roaming
        }
    }
}

/// Arms after the door stays open for `patience_seconds`, then strikes the
/// first tick the player is not looking at the monitor. While armed it does
/// not show up on cameras, and while watched it cannot move.
#[derive(Debug, Clone)]
pub struct Ambusher {
    patience_seconds: f32,
    forbidden: Forbidden,
    timer: DoorTimer,
    armed: bool,
    watched: bool,
}

impl Ambusher {
    pub fn new(patience_seconds: f32, forbidden: Forbidden) -> Self {
        Self {
            patience_seconds,
            forbidden,
            timer: DoorTimer::default(),
            armed: false,
            watched: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Behavior for Ambusher {
    fn kind(&self) -> &'static str {
        "ambusher"
    }

    fn on_movement_attempt(&mut self, ctx: &MovementContext<'_>) -> bool {
        self.watched = ctx.watched;
        !self.armed && !self.watched
    }

    fn on_movement_target(&self, target: &Camera) -> bool {
        self.forbidden.allows(target)
    }

    fn on_moved(&mut self, _from: &Camera, _to: &Camera) {
        self.timer.reset();
        self.armed = false;
    }

    fn on_jumpscare_attempt(
        &mut self,
        ctx: &JumpscareContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> bool {
        self.watched = ctx.watched;
        let Some(open_for) = self.timer.observe(ctx.tick, ctx.door_open) else {
            if self.armed {
                log::debug!("ambusher disarmed by closed door at tick {}", ctx.tick);
            }
            self.armed = false;
            return false;
        };
        if !self.armed && open_for >= seconds_to_ticks(self.patience_seconds, ctx.fps) {
            log::debug!("ambusher armed at tick {}", ctx.tick);
            self.armed = true;
        }
        self.armed && !ctx.cams_up
    }

    fn on_hide_from_camera(&self, _ctx: &HideContext<'_>) -> bool {
        self.armed
    }

    fn is_committed(&self) -> bool {
        self.armed
    }

    fn state(&self) -> AgentState {
        if self.armed {
            AgentState::CommittedToKill
        } else if self.watched {
            AgentState::Neutralized
        } else if self.timer.is_running() {
            AgentState::ApproachingDoor
        } else {
            AgentState::Roaming
        }
    }
}

/// No patience at all: each tick at an open door is a kill roll at the
/// agent's movement odds.
#[derive(Debug, Clone, Default)]
pub struct Rusher {
    forbidden: Forbidden,
}

impl Rusher {
    pub fn new(forbidden: Forbidden) -> Self {
        Self { forbidden }
    }
}

impl Behavior for Rusher {
    fn kind(&self) -> &'static str {
        "rusher"
    }

    fn on_movement_target(&self, target: &Camera) -> bool {
        self.forbidden.allows(target)
    }

    fn on_jumpscare_attempt(
        &mut self,
        ctx: &JumpscareContext<'_>,
        rng: &mut dyn RngCore,
    ) -> bool {
        if !ctx.door_open || ctx.max_ai_level == 0 {
            return false;
        }
        rng.gen_range(0..ctx.max_ai_level) < ctx.ai_level
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::assets::ImageHandle;
    use crate::camera::HitRegion;

    fn door_cam() -> Camera {
        Camera::builder()
            .name("west_hall_corner")
            .background(ImageHandle::new("corner.png"))
            .region(HitRegion::new(0, 0, 1, 1))
            .left_door(true)
            .build()
            .unwrap()
    }

    fn ctx(camera: &Camera, tick: u64, door_open: bool, cams_up: bool) -> JumpscareContext<'_> {
        JumpscareContext {
            tick,
            door_open,
            cams_up,
            watched: false,
            camera,
            fps: 60,
            ai_level: 10,
            max_ai_level: 20,
        }
    }

    #[test]
    fn stalker_strikes_after_patience() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut stalker = Stalker::new(4.9, Forbidden::default());
        for tick in 0..294 {
            assert!(
                !stalker.on_jumpscare_attempt(&ctx(&cam, tick, true, true), &mut rng),
                "tick {tick}"
            );
        }
        assert_eq!(stalker.state(), AgentState::ApproachingDoor);
        assert!(stalker.on_jumpscare_attempt(&ctx(&cam, 294, true, true), &mut rng));
        assert_eq!(stalker.state(), AgentState::CommittedToKill);
    }

    #[test]
    fn closing_door_resets_stalker() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut stalker = Stalker::new(4.9, Forbidden::default());
        for tick in 0..200 {
            assert!(!stalker.on_jumpscare_attempt(&ctx(&cam, tick, true, true), &mut rng));
        }
        assert!(!stalker.on_jumpscare_attempt(&ctx(&cam, 200, false, true), &mut rng));
        assert_eq!(stalker.state(), AgentState::Roaming);
        // Reopened at 201: full patience again
        for tick in 201..495 {
            assert!(!stalker.on_jumpscare_attempt(&ctx(&cam, tick, true, true), &mut rng));
        }
        assert!(stalker.on_jumpscare_attempt(&ctx(&cam, 495, true, true), &mut rng));
    }

    #[test]
    fn committed_stalker_does_not_move() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut stalker = Stalker::new(0.0, Forbidden::default());
        assert!(stalker.on_jumpscare_attempt(&ctx(&cam, 0, true, true), &mut rng));
        let mv = MovementContext {
            tick: 1,
            camera: &cam,
            watched: false,
            cams_up: true,
        };
        assert!(!stalker.on_movement_attempt(&mv));
    }

    #[test]
    fn ambusher_waits_for_monitor_down() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ambusher = Ambusher::new(1.0, Forbidden::default());
        for tick in 0..60 {
            assert!(!ambusher.on_jumpscare_attempt(&ctx(&cam, tick, true, true), &mut rng));
        }
        // Armed at 60 but the player is on cameras
        assert!(!ambusher.on_jumpscare_attempt(&ctx(&cam, 60, true, true), &mut rng));
        assert!(ambusher.is_armed());
        let hide = HideContext {
            tick: 60,
            cams_up: true,
            camera: &cam,
        };
        assert!(ambusher.on_hide_from_camera(&hide));
        assert!(ambusher.on_jumpscare_attempt(&ctx(&cam, 61, true, false), &mut rng));
    }

    #[test]
    fn closing_door_disarms_ambusher() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ambusher = Ambusher::new(0.5, Forbidden::default());
        for tick in 0..=30 {
            ambusher.on_jumpscare_attempt(&ctx(&cam, tick, true, true), &mut rng);
        }
        assert!(ambusher.is_armed());
        assert!(!ambusher.on_jumpscare_attempt(&ctx(&cam, 31, false, false), &mut rng));
        assert!(!ambusher.is_armed());
    }

    #[test]
    fn watched_ambusher_is_neutralized() {
        let cam = door_cam();
        let mut ambusher = Ambusher::new(1.0, Forbidden::default());
        let mv = MovementContext {
            tick: 0,
            camera: &cam,
            watched: true,
            cams_up: true,
        };
        assert!(!ambusher.on_movement_attempt(&mv));
        assert_eq!(ambusher.state(), AgentState::Neutralized);
    }

    #[test]
    fn ambusher_released_when_monitor_turns_away() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ambusher = Ambusher::new(1.0, Forbidden::default());
        let mv = MovementContext {
            tick: 0,
            camera: &cam,
            watched: true,
            cams_up: true,
        };
        ambusher.on_movement_attempt(&mv);
        assert_eq!(ambusher.state(), AgentState::Neutralized);

        // Off the movement interval: only the per-tick attempt sees the feed
        let mut seen = ctx(&cam, 1, false, true);
        seen.watched = true;
        ambusher.on_jumpscare_attempt(&seen, &mut rng);
        assert_eq!(ambusher.state(), AgentState::Neutralized);
        ambusher.on_jumpscare_attempt(&ctx(&cam, 2, false, false), &mut rng);
        assert_eq!(ambusher.state(), AgentState::Roaming);
    }

    #[test]
    fn rusher_needs_open_door() {
        let cam = door_cam();
        let mut rng = StdRng::seed_from_u64(9);
        let mut rusher = Rusher::default();
        for tick in 0..500 {
            assert!(!rusher.on_jumpscare_attempt(&ctx(&cam, tick, false, false), &mut rng));
        }
        let hits = (0..1000)
            .filter(|&t| rusher.on_jumpscare_attempt(&ctx(&cam, t, true, false), &mut rng))
            .count();
        // ai 10 of 20
        assert!((400..600).contains(&hits), "hits {hits}");
    }

    #[test]
    fn forbidden_cameras_refused() {
        let cam = door_cam();
        let rusher = Rusher::new(Forbidden::new(["west_hall_corner"]));
        assert!(!rusher.on_movement_target(&cam));
        assert!(Rusher::default().on_movement_target(&cam));
    }
}
