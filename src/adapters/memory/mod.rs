//! In-memory log backend.
//!
//! A partitioned, append-only log held in process memory. It implements the
//! same ports as the librdkafka adapters so the server can run without a
//! cluster (`KAFKA_OBSERVATORY__KAFKA__BACKEND=memory`) and so tests can
//! drive real consumption end to end.

mod consumer;
mod log;

pub use consumer::InMemoryConsumer;
pub use log::InMemoryLog;
