//! Shared test utilities for the lifecycle provider
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique test resource names
//! - [`events`]: Lifecycle event fixtures

pub mod aws;
pub mod events;

pub use aws::{get_test_region, test_resource_name, test_run_id};
pub use events::{create_event, delete_event, poll_event, properties};
