//! Kindle ECS - Entity store with stable IDs
//!
//! This crate wraps hecs with stable, never-recycled entity identifiers.
//! Components are plain Rust types attached to entities; systems find the
//! entities they care about by querying for component kinds.

mod world;

pub use hecs::{Component, Query, QueryBorrow, QueryMut, Ref, RefMut};
pub use world::KindleWorld;
