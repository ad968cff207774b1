//! Core business logic for EMR Adopt.

pub mod services;

pub use services::*;
