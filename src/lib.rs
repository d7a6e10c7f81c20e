// Core modules
pub mod analysis;
pub mod config;
pub mod error;
pub mod indicators;
pub mod levels;
pub mod models;
pub mod risk;
pub mod structure;
pub mod synthetic;
pub mod validation;
pub mod volume_profile;

// Re-export commonly used types
pub use analysis::{analyze_market, MarketAnalysis};
pub use config::Settings;
pub use error::Error;
pub use models::*;
pub use validation::{PredictionValidator, ValidationContext, ValidatorConfig};

// Error handling
pub type Result<T> = std::result::Result<T, Error>;
