pub mod artifact;
pub mod config;
pub mod features;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod scaler;
