//! Kindle Core - Foundational types for the Kindle effects engine
//!
//! This crate provides the core types that all other Kindle crates depend on:
//! - `EntityId` - Stable, never-recycled entity identifiers
//! - `Color` - RGBA tint
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{KindleError, Result};
pub use id::{EntityId, IdAllocator};
pub use types::Color;
