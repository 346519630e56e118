//! Rehydra Persistence Mediator
//!
//! Sits between a state container and a durable key-value store:
//! - restores persisted fields into the container on the first state change
//! - writes only the fields whose encoded value changed afterwards
//! - publishes `save` and `restore` events to registered listeners

pub mod codec;
pub mod events;
pub mod filter;
pub mod lifecycle;
pub mod logger;
pub mod mediator;
pub mod reducer;

mod restore;
mod save;

pub use codec::KeyCodec;
pub use events::{listener, EventBus, Listener};
pub use filter::KeyFilter;
pub use lifecycle::{Gate, LifecycleGate};
pub use logger::{PersistLogger, TracingLogger};
pub use mediator::{persist_store, Mediator};
pub use reducer::rehydrating;
