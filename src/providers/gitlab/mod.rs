pub mod ci_config;
mod client;
mod provider;

pub use client::GitLabClient;
pub use provider::GitLabProvider;
