pub mod config;
pub mod documents;
pub mod health;
pub mod image;
pub mod sessions;
pub mod turns;
pub mod utils;
