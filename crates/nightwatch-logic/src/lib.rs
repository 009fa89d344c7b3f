//! Night simulation engine for Nightwatch.
//!
//! This crate holds everything that decides what happens during a night,
//! independent of any renderer, window or audio device. The host feeds a
//! [`night::PlayerInput`] into [`night::Night::tick`] at a fixed rate and
//! draws the returned [`night::TickReport`]. Assets and sound playback reach
//! the engine only through the [`assets::AssetLoader`] and [`audio::Sound`]
//! traits, so the whole night runs headless in tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ambient`] | Weighted random ambient sounds on a fixed interval |
//! | [`animatronic`] | Agents: AI level schedule, movement rolls, behavior hooks |
//! | [`assets`] | Asset loader boundary, GIF frames, in-memory loader |
//! | [`audio`] | Sound handles, placement, end-of-playback latch |
//! | [`behaviors`] | Built-in agent kinds (stalker, ambusher, rusher) |
//! | [`camera`] | Camera graph, occupancy, selection and hit testing |
//! | [`clock`] | Tick ↔ time conversion |
//! | [`error`] | Error types |
//! | [`jumpscare`] | Frame/sound-synchronized jumpscare playback |
//! | [`night`] | Night orchestrator and tick loop |
//! | [`phone`] | Night-start phone call with captions |
//! | [`registry`] | Agent kind → behavior constructor |
//! | [`script`] | JSON night scripts and night construction |
//! | [`store`] | Key-value progress store |
//! | [`subtitles`] | SubRip subtitle parsing |

pub mod ambient;
pub mod animatronic;
pub mod assets;
pub mod audio;
pub mod behaviors;
pub mod camera;
pub mod clock;
pub mod error;
pub mod jumpscare;
pub mod night;
pub mod phone;
pub mod registry;
pub mod script;
pub mod store;
pub mod subtitles;
