//! Client for a résumé tailoring backend: single tailoring runs, batch runs
//! over job links, and the client-side state both share.

pub mod archive;
pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

pub use batch::{BatchOrchestrator, BatchOutcome, BatchRequest, BatchResult};
pub use config::{derive_inputs, derive_mode, PromptConfiguration, Tolerance, ToleranceMode};
pub use error::{TailorError, TailorResult, ValidationError};
pub use pipeline::{JdSource, SinglePipeline};
pub use session::Session;
pub use state::{ClientStateStore, StateSnapshot};
