//! Language frontends for Velox
//!
//! This module contains implementations of the `Frontend` trait.

pub mod velox;

pub use velox::VeloxFrontend;
