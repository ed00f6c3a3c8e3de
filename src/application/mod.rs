//! Application layer containing the order dispatch orchestration.
//!
//! This module defines the `DispatchEngine`, which accepts orders and runs the worker pool
//! that selects, claims and processes them, along with the wake-up signal it coordinates
//! through, the outcome simulator, and the periodic status `Reporter`.

pub mod engine;
pub mod reporter;
pub mod signal;
pub mod simulator;
