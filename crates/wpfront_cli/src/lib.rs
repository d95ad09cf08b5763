pub mod config_loader;
pub mod export;
pub mod server;
