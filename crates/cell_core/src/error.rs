use std::path::PathBuf;

use thiserror::Error;

use crate::patch::Socket;
use crate::types::{Indexed, ModuleKind};

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("socket `{}` has no source", .0.name())]
    NotASource(Socket),
    #[error("socket `{}` has no sink", .0.name())]
    NotASink(Socket),
    #[error("unknown socket `{0}`")]
    UnknownSocket(String),
    #[error("patch command queue is full")]
    QueueFull,
}

#[derive(Debug, Error)]
pub enum RackError {
    #[error("rack is full ({capacity} slots)")]
    Full { capacity: usize },
    #[error("{kind:?} cannot be bound after {after:?}; rack categories are bound in order")]
    OutOfOrder { kind: ModuleKind, after: ModuleKind },
    #[error("{0:?} is an engine stage, not a rack module")]
    NotRackModule(ModuleKind),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive, got {0}")]
    SampleRate(f32),
    #[error("DC blocker coefficient must be in (0, 1), got {0}")]
    DcBlockCoefficient(f32),
    #[error("command queue capacity must be at least 1")]
    CommandCapacity,
    #[error("unknown control `{0}`")]
    UnknownControl(String),
    #[error("control `{name}` is not finite: {value}")]
    NonFiniteControl { name: String, value: f32 },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Rack(#[from] RackError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}
