//! Tether Core
//!
//! Core types shared by the Tether broker client and job worker.
//!
//! This crate contains:
//! - Domain types: jobs, task types, handler results and job outcomes
//! - DTOs: wire representations exchanged with the broker

pub mod domain;
pub mod dto;
