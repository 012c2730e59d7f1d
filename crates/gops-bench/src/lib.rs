pub mod analytics;
pub mod config;
pub mod console;
pub mod extract;
pub mod logging;
pub mod tournament;
