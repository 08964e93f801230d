//! Cleaning, aggregation and the pipelines built from them.
//!
//! [`clean`] coerces the macronutrient columns and fills gaps, [`aggregate`]
//! derives the per-diet views, and [`analyzer`] runs both and hands every
//! view to the exporters.

pub mod aggregate;
pub mod analyzer;
pub mod clean;
pub mod types;
pub mod utility;
