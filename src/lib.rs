//! Corral client SDK
//!
//! Library surface behind the `corral` CLI: an authenticated HTTP client
//! for the Corral device-fleet management service and a generic
//! CRUD+list resource manager over its collections.
//!
//! # Example
//!
//! ```ignore
//! use corral::api::auth::Credentials;
//! use corral::api::client::Client;
//! use corral::resource::{ListOpts, ResourceManager};
//!
//! async fn example() -> corral::error::Result<()> {
//!     let credentials = Credentials::from_token("secret");
//!     let client = Client::new("https://corral.example.net", credentials)?;
//!     let nodes = ResourceManager::new(&client, "nodes")?;
//!     let all = nodes.list(&ListOpts { limit: Some(0), ..Default::default() }).await?;
//!     println!("{} nodes registered", all.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod resource;
