pub mod config;
pub mod effects;
pub mod engine;
pub mod input;
pub mod ml;
pub mod sim;
