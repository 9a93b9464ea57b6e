//! Core domain types and logic.

pub mod price;
pub mod indicator;
pub mod snapshot;
pub mod weights;
pub mod allocation;
pub mod params;
pub mod universe;
pub mod error;
