//! Server crate for the crop recommendation engine.
//!
//! This crate contains the orchestrator that coordinates all components
//! of a recommendation request, plus the startup context and
//! configuration it runs on.

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod query;

pub use config::{ConfigError, EngineConfig};
pub use context::EngineContext;
pub use error::RecommendError;
pub use orchestrator::{ADVISORY, RecommendationOrchestrator, RecommendationResult};
pub use query::{CropQuery, FieldError, QueryInput, ValidationError};
