//! State module for tracking worker progress
//!
//! # Components
//!
//! - `WorkerState`: Lifecycle of a single crawl worker (created, running, done, failed)

mod worker_state;

pub use worker_state::WorkerState;
