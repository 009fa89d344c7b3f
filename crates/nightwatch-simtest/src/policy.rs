//! Scripted players. Each one turns the previous tick's report into the
//! next tick's input, seeing only what a real player would see.

use nightwatch_logic::camera::DoorSide;
use nightwatch_logic::night::{Night, PlayerInput, TickReport, View};

use crate::cli::Policy;

/// Ticks spent on one door camera before flipping to the next.
const DWELL_TICKS: u64 = 20;
/// Monitor cycle: up for `LOOK_TICKS`, then down for the rest.
const CYCLE_TICKS: u64 = 60;
const LOOK_TICKS: u64 = 45;

pub trait Player {
    fn input(&mut self, night: &mut Night, last: Option<&TickReport>) -> PlayerInput;
}

pub fn player(policy: Policy, night: &Night) -> Box<dyn Player> {
    match policy {
        Policy::Idle => Box::new(Idle),
        Policy::DoorsClosed => Box::new(DoorsClosed),
        Policy::Watchful => Box::new(Watchful::new(night)),
    }
}

struct Idle;

impl Player for Idle {
    fn input(&mut self, _night: &mut Night, _last: Option<&TickReport>) -> PlayerInput {
        PlayerInput::default()
    }
}

struct DoorsClosed;

impl Player for DoorsClosed {
    fn input(&mut self, _night: &mut Night, _last: Option<&TickReport>) -> PlayerInput {
        PlayerInput {
            left_door_open: false,
            right_door_open: false,
            cams_up: false,
        }
    }
}

struct Watchful {
    doors: Vec<(String, DoorSide)>,
    turn: usize,
    left_closed: bool,
    right_closed: bool,
}

impl Watchful {
    fn new(night: &Night) -> Self {
        let doors = night
            .cameras()
            .iter()
            .filter_map(|(_, cam)| cam.door().map(|side| (cam.name().to_string(), side)))
            .collect();
        Self {
            doors,
            turn: 0,
            left_closed: false,
            right_closed: false,
        }
    }

    fn set_closed(&mut self, side: DoorSide, closed: bool) {
        match side {
            DoorSide::Left => self.left_closed = closed,
            DoorSide::Right => self.right_closed = closed,
        }
    }
}

impl Player for Watchful {
    fn input(&mut self, night: &mut Night, last: Option<&TickReport>) -> PlayerInput {
        if let Some(View::CameraFeed {
            camera,
            overlays,
            cams_up: true,
            ..
        }) = last.map(|r| &r.view)
        {
            let side = self
                .doors
                .iter()
                .find(|(name, _)| name == camera)
                .map(|(_, side)| *side);
            if let Some(side) = side {
                self.set_closed(side, !overlays.is_empty());
            }
        }

        let tick = night.tick_count();
        let cams_up = tick % CYCLE_TICKS < LOOK_TICKS;
        if cams_up && tick % DWELL_TICKS == 0 && !self.doors.is_empty() {
            let (name, _) = &self.doors[self.turn % self.doors.len()];
            self.turn += 1;
            if let Err(err) = night.select_camera(name) {
                log::debug!("watchful player could not switch to {name}: {err}");
            }
        }

        PlayerInput {
            left_door_open: !self.left_closed,
            right_door_open: !self.right_closed,
            cams_up,
        }
    }
}
