//! Data Transfer Objects for broker communication
//!
//! DTOs are the wire shapes exchanged with the broker. Job variables travel
//! as JSON text and are only decoded into domain types by the worker.

pub mod job;
