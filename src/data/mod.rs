//! Data sources: the NOAA download and the synthetic generator.

pub mod noaa;
pub mod synthetic;

pub use noaa::{DEFAULT_URL, NoaaClient};
pub use synthetic::{SyntheticSpec, generate_series};
