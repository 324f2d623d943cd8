mod client;
mod config;
mod device_repository;
mod migrations;

pub use client::*;
pub use config::*;
pub use device_repository::*;
pub use migrations::*;
