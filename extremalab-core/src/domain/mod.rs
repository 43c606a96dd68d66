//! Domain types for ExtremaLab

pub mod bar;
pub mod extremum;
pub mod series;
pub mod window;

pub use bar::Bar;
pub use extremum::Extremum;
pub use series::{Column, TimeSeries};
