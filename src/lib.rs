pub mod adaptation;
pub mod config;
pub mod contracts;
pub mod logging;
pub mod types;
