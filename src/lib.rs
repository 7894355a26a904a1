pub mod cli;
pub mod config;
pub mod error;
pub mod orchestration;
pub mod provider;
pub mod tools;
pub mod usage;
