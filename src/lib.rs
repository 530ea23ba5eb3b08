//! NEM12 interval-metering analytics.
//!
//! Reads a NEM12 CSV, slices the consumption and generation blocks and
//! derives daily, time-of-day, seasonal and day-type views, outliers and a
//! short forecast for each channel.

pub mod data;
pub mod engine;
pub mod error;

pub use data::blocks::{BlockStrategy, Channel};
pub use data::parser::RawTable;
pub use engine::pipeline::{analyze, Dashboard};
pub use error::{Nem12Error, Result};
