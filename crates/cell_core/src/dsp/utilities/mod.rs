pub mod delay;
pub mod envelope;
pub mod rotor;
pub mod sample_and_hold;
pub mod vca;
