//! Kafka Observatory - Web-based observability for Apache Kafka clusters
//!
//! This crate manages browser-driven consume sessions: each session owns a
//! consumer-group member, a bounded buffer of recent records and a set of
//! live WebSocket viewers. It also exposes cluster metadata, topic listing
//! and single-record produce over REST.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
