//! Order entity, selection policy and the storage port the engine depends on.

pub mod order;
pub mod ports;
