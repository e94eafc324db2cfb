//! Utility types and functions for the viewer.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`BBox3f`], [`Radius`] and easing helpers
//! - Math type re-exports from glam

mod error;
mod math;

pub use error::*;
pub use math::*;
