//! Domain types for bandcast

pub mod features;
pub mod interval;
pub mod position;
pub mod signal;

pub use features::{FeatureRow, FeatureTable, FEATURE_COLUMNS, FEATURE_COUNT};
pub use interval::{PriceInterval, PriceSeries, ReturnInterval, ReturnSeries};
pub use position::{Entry, OpenPosition, PositionSide, PositionState};
pub use signal::{Signal, SignalKind};
