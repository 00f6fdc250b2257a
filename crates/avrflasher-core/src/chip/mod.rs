//! Target chip types and catalog
//!
//! This module provides types for describing AVR target chips and a static
//! catalog of the parts the jig knows how to program.

mod database;
mod types;

pub use database::*;
pub use types::*;
