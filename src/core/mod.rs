// src/core/mod.rs
//! Core services shared by the pipelines and the CLI

pub mod backend;
pub mod config_manager;
pub mod fs_ops;
pub mod service_client;

pub use backend::TailorBackend;
pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use service_client::ServiceClient;
