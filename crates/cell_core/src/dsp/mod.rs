//! Processing modules and the small DSP helpers they share.

pub mod chaos;
pub mod core;
pub mod filters;
pub mod oscillators;
pub mod utilities;
pub mod utils;
