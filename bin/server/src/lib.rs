//! factnotes HTTP API server.
//!
//! Wires the platform-access and moderation libraries to Postgres, the
//! Facebook identity provider and an HTTP summarizer, and exposes them as
//! a JSON API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod summarizer;
