//! Request handler module
//!
//! Routes inbound requests to the task operations, which proxy to the remote
//! task service and render the result.

pub mod form;
pub mod router;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main entry point
pub use router::handle_request;
