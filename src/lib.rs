//! forgehook - a webhook receiver for source-control forges.
//!
//! This library accepts signed event deliveries over HTTP, authenticates them
//! against a shared secret, parses the provider envelope, and fans each event
//! out to subscribers registered under composite string keys.

pub mod config;
pub mod request;
pub mod router;
pub mod secret;
pub mod server;
pub mod webhooks;
