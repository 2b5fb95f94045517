//! Bot application crate.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{Application, FeatureSource, MarketSnapshot, ModelScorer, NullModelScorer};
pub use config::{AppConfig, OperatingMode, SymbolConfig, VenueConfig};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
