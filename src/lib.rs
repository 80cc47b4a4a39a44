pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod params;
pub mod services;
pub mod session;
pub mod state;
