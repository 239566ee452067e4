//! Shared test utilities for the Lumilio storage workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`repo`] - [`TestRepo`](repo::TestRepo) builder for repository roots on disk

pub mod repo;

pub use repo::TestRepo;
