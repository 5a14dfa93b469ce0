//! Integration tests for the plan server.
//!
//! Engine-level tests drive `PlanProvider` directly over the in-memory store;
//! HTTP tests run the full router on a local socket and talk to it with
//! `reqwest`.

pub mod concurrency;
pub mod conditional_operations;
