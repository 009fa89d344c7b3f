//! Tick ↔ wall-time conversion at a fixed frame rate.

/// Frame rate used when a night script does not set one.
pub const DEFAULT_FPS: u32 = 60;

/// Whole ticks covering `seconds`, rounded to the nearest tick.
pub fn seconds_to_ticks(seconds: f32, fps: u32) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds as f64 * fps as f64).round() as u64
}

/// Simulated whole seconds elapsed at `tick`.
pub fn tick_seconds(tick: u64, fps: u32) -> u32 {
    (tick / fps.max(1) as u64) as u32
}

/// Simulated milliseconds elapsed at `tick`.
pub fn tick_millis(tick: u64, fps: u32) -> u64 {
    tick * 1000 / fps.max(1) as u64
}
