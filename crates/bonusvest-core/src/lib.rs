pub mod chart_json;
pub mod config;
pub mod series;
pub mod synthetic;
pub mod window;

pub use chart_json::CloseHistory;
pub use config::{
    ConfigError, DataConfig, SimConfig, StrategyParams, SyntheticConfig, UnvestedValuation,
    WindowConfig,
};
pub use series::{PricePoint, PriceSeries, SeriesError};
pub use window::{compute_windows, Window, WindowAlignment};
