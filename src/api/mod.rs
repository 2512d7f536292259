//! Corral API interaction module
//!
//! This module provides the core functionality for talking to the Corral
//! service: authentication, the HTTP client, and endpoint URL handling.
//!
//! # Module Structure
//!
//! - [`auth`] - Token resolution and caching
//! - [`client`] - Main client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use corral::api::auth::Credentials;
//! use corral::api::client::Client;
//!
//! async fn example() -> corral::error::Result<()> {
//!     let credentials = Credentials::from_token("secret");
//!     let client = Client::new("https://corral.example.net", credentials)?;
//!     let nodes = client.get("nodes").await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
