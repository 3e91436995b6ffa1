//! Business logic services.
//!
//! Reviewer selection and the PR lifecycle are independent of the HTTP
//! layer; `api` and `server` expose them over REST.

pub mod api;
pub mod assignment;
pub mod pr_lifecycle;
pub mod roster;
pub mod server;

pub use pr_lifecycle::NewPullRequest;
pub use server::{build_router, start_server, ServerHandle};
