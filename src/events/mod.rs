//! Event server access
//!
//! The event server is an external collaborator reached only through its
//! HTTP surface: a health probe and a JSON ingestion endpoint.

mod client;
mod event;

pub use client::EventServer;
pub use event::{iso_timestamp, EventPayload, TestEvent};
