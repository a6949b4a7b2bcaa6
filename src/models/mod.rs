pub mod alert;
pub mod candle;
pub mod snapshot;

pub use alert::{AlertEvent, AlertState};
pub use candle::{Candle, Series};
pub use snapshot::IndicatorSnapshot;
