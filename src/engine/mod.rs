pub mod analyzer;
pub mod forecast;
pub mod outliers;
pub mod pipeline;
pub mod series;
