pub mod board_io;
pub mod config_io;
pub mod snapshot;
pub mod store;
