//! # Academic Papers Search
//!
//! A cached front-end for the CORE academic paper search API.
//!
//! Search filters compile into a deterministic canonical query and cache key.
//! Repeated searches with identical filters are served from a time-bounded
//! cache instead of hitting the upstream service again.
//!
//! ## Architecture
//!
//! - [`models`]: Filter criteria, decoded papers, and the flexible date codec
//! - [`query`]: Query compiler and cache key deriver
//! - [`sources`]: The CORE search client and its error type
//! - [`utils`]: Result cache, HTTP transport, single-flight coalescing
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```rust,no_run
//! use academic_papers_search::config::get_config;
//! use academic_papers_search::models::FilterCriteria;
//! use academic_papers_search::sources::CoreClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CoreClient::from_config(&get_config()?).await?;
//! let criteria = FilterCriteria::new()
//!     .abstract_text("machine learning")
//!     .authors(["David", "Peter"])
//!     .limit(10);
//!
//! for paper in client.search(&criteria).await? {
//!     println!("{}", paper.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod query;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{FilterCriteria, FlexibleDate, PaperResult};
pub use sources::{CoreClient, SearchError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
