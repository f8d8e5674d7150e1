//! Signal-cell synthesizer core
//!
//! A fixed topology of modules (oscillators, filters, chaos maps and the rest)
//! that read and write shared signal cells, a patch bay that routes them by
//! rewriting cell handles, and an engine that runs the whole graph once per
//! output sample. This crate does no audio I/O; hosts call
//! [`Engine::tick`] at the sample rate.

#[macro_use]
extern crate cell_derive;

extern crate parking_lot;
extern crate serde;
extern crate serde_json;

pub mod cell;
pub mod commands;
pub mod config;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod patch;
pub mod rack;
pub mod types;

// Re-export commonly used items
pub use cell::{CellId, Cells, SignalCell, is_unpatched};
pub use commands::PatchCommand;
pub use config::EngineConfig;
pub use control::{ChaosUnit, ControlSurface, Param, Pot};
pub use dsp::chaos::Variant;
pub use engine::{Engine, Frame};
pub use error::{ConfigError, PatchError, RackError};
pub use patch::{Cable, Socket};
pub use types::{Indexed, Module, ModuleKind};
