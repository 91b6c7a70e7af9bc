pub mod catalog;
pub mod cli;
pub mod config;
pub mod logging;
pub mod mechanics;
pub mod protocol;
pub mod roster;
pub mod server;
