//! Rehydra State Management
//!
//! Provides the collaborators the persistence mediator talks to: a
//! reducer-driven state container and durable string key-value stores
//! (in-memory and sled-backed).

pub mod store;
pub mod memory;
pub mod persistent;
pub mod container;

pub use store::*;
pub use memory::*;
pub use persistent::*;
pub use container::*;
