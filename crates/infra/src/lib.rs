pub mod config;
pub mod db;
pub mod effects;
pub mod events;
pub mod logging;
pub mod store;
