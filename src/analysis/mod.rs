pub mod features;
pub mod pipeline;
pub mod risk;
pub mod synth;
pub mod validation;
