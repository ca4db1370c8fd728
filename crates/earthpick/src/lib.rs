//! Async client for the earthpick country dataset.
//!
//! The dataset is a single JSON document fetched once at startup. This crate
//! fetches it, validates it and turns it into [`CountryRecord`]s ready for
//! the picking and label systems. It works on native (Tokio + rustls) and in
//! the browser (reqwest over `fetch`).
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> earthpick::Result<()> {
//! let client = earthpick::Client::new();
//! let records = client.fetch_records(0.5).await?;
//! println!("{} countries", records.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::Client;
pub use earthpick_core::{CountryInfo, CountryRecord};
pub use error::{Error, Result};
