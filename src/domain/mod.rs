//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `consume` - Consume sessions, their lifecycle and buffered records
//! - `cluster` - Broker/topic metadata and produce records

pub mod cluster;
pub mod consume;
pub mod foundation;
