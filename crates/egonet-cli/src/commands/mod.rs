pub mod bench;
pub mod config;
pub mod import;
pub mod stats;
pub mod wipe;
