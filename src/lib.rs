//! PR Reviewer - pull request tracking with automatic reviewer assignment.
//!
//! Pull requests are opened against a team; up to two active teammates of
//! the author with the fewest open review assignments are attached as
//! reviewers. Reviewers can be swapped on open PRs, and merging is a
//! one-way, idempotent transition.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::AppError;
