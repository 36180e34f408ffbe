/// Engine configuration loading from engine.toml
pub mod engine;

pub use engine::{EngineConfig, SaleNumberingConfig};
