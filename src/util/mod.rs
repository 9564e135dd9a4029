//! Utility modules.

pub mod timeout;

pub use timeout::{with_deadline, Deadline};
