//! Rehydra Core Library
//!
//! Core types, traits, and abstractions shared by the Rehydra crates.
//! Defines the contracts between the persistence mediator, the state
//! container it observes, and the durable store it writes to.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
