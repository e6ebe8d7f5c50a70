//! Process Mining Client
//!
//! This library provides the client side of the process-mining graph service:
//! it submits graph and statistics jobs to the backend, polls the job state
//! until the backend reports completion, and fetches the finished result
//! (a DOT graph description plus per-category session counts).

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
