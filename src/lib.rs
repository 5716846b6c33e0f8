//! commit-relay: GitHub push webhooks in, Discord notifications out, with an
//! authorization-gated revert action writing back to GitHub.

pub mod auth;
pub mod config;
pub mod discord;
pub mod github;
pub mod http_server;
pub mod notify;
pub mod relay;
pub mod revert;
pub mod store;
pub mod types;
pub mod verification;
