//! Session message broadcaster adapters.
//!
//! - `InMemorySessionMessageBroadcaster` - In-process fan-out keyed by session

mod in_memory;

pub use in_memory::InMemorySessionMessageBroadcaster;
