pub mod lfo;
pub mod vco;
