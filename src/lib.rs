pub mod chain;
pub mod config;
pub mod errors;
pub mod feeds;
pub mod models;
pub mod risk;
pub mod simulation;
pub mod strategy;
pub mod types;
