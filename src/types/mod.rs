// src/types/mod.rs
//! Request and response shapes of the generation backend

pub mod request;
pub mod response;

pub use request::{BatchFormat, Provider, TailoringRequest};
pub use response::ErrorBody;
