//! Build Inspector: stage ordering, status rollups and dashboard summaries
//! for CI/CD pipelines fetched from GitLab or loaded from JSON snapshots.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod inspect;
pub mod model;
pub mod output;
pub mod providers;
pub mod snapshot;
pub mod source;
