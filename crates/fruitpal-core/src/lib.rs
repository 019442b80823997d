//! Core types for Fruitpal.
//!
//! Holds the canonical trade record model, the error taxonomy, the cost
//! calculator and the CLI settings shared by the other crates.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{ErrorKind, FruitpalError, Result};
