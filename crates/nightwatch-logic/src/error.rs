//! Error types for night setup and the tick loop.
//!
//! Everything except [`GraphError`] is raised while a night is being built,
//! before the first tick. A `GraphError` coming out of [`crate::night::Night::tick`]
//! means the engine itself recorded an agent at the wrong camera.

use thiserror::Error;

/// Camera graph lookups and agent moves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no camera named `{0}`")]
    UnknownCamera(String),
    #[error("agent `{agent}` is not at camera `{camera}`")]
    AgentNotPresent { agent: String, camera: String },
}

/// Invalid night configuration. Fatal: the night never starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("camera built without a {0}")]
    CameraMissingField(&'static str),
    #[error("duplicate camera name `{0}`")]
    DuplicateCamera(String),
    #[error("start camera `{0}` does not exist")]
    UnknownStartCamera(String),
    #[error("camera `{from}` connects to unknown camera `{to}`")]
    UnknownConnection { from: String, to: String },
    #[error("agent `{agent}` starts at unknown camera `{camera}`")]
    UnknownAgentCamera { agent: String, camera: String },
    #[error("duplicate agent name `{0}`")]
    DuplicateAgent(String),
    #[error("unknown agent kind `{0}`")]
    UnknownAgentKind(String),
    #[error("agent `{agent}`: {reason}")]
    InvalidAgent { agent: String, reason: String },
    #[error("invalid night setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
    #[error("malformed night script: {0}")]
    Script(String),
}

/// An asset could not be produced by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    Missing(String),
    #[error("asset `{path}` could not be decoded: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("subtitles `{path}`: {source}")]
    Subtitles {
        path: String,
        #[source]
        source: SubtitleError,
    },
}

/// SubRip parse failure. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubtitleError {
    #[error("line {line}: malformed timecode `{text}`")]
    MalformedTimecode { line: usize, text: String },
    #[error("line {line}: cue has no timecode")]
    MissingTimecode { line: usize },
    #[error("line {line}: cue is not terminated by a blank line")]
    UnterminatedCue { line: usize },
}

/// Failure of a [`crate::store::KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store contents: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can stop a night from being built or advanced.
#[derive(Debug, Error)]
pub enum NightError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("camera feed is forced down")]
    CamerasLocked,
    #[error("night has already ended")]
    Ended,
}
