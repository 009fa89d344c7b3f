use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    about = "Headless night runner: plays nights with scripted players and tallies outcomes",
    version
)]
pub struct Args {
    /// Night script JSON (default: the bundled first night)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Asset manifest JSON matching --script (default: the bundled manifest)
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Nights to play per policy
    #[arg(long, default_value_t = 20)]
    pub nights: u32,

    /// Seed of the first night; night `i` uses `seed + i`
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Only run this player policy
    #[arg(long, value_enum)]
    pub policy: Option<Policy>,

    /// JSON progress store to record every outcome into
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Print every night and every check, not just failures
    #[arg(long)]
    pub verbose: bool,
}

/// Scripted player behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Doors open, monitor down, all night
    Idle,
    /// Both doors shut, all night
    DoorsClosed,
    /// Cycles the door cameras and shuts a door while someone stands at it
    Watchful,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::Idle, Policy::DoorsClosed, Policy::Watchful];

    pub fn name(self) -> &'static str {
        match self {
            Policy::Idle => "idle",
            Policy::DoorsClosed => "doors-closed",
            Policy::Watchful => "watchful",
        }
    }
}
