//! # vrops-core
//!
//! Request construction and execution for the vRealize Operations REST API.
//!
//! A request is built in three steps: filters bound in a [`query::FilterSpec`] are
//! collected into ordered key/value pairs, the pairs are rendered onto a query string, and
//! the resulting URL is combined with headers, credential and body into an immutable
//! [`request::RequestDescriptor`]. Executing the descriptor is delegated to a
//! [`executor::RequestExecutor`].
//!
//! ## Modules
//!
//! - [`error`] - Error type shared by all vROps crates
//! - [`query`] - Filter collection and query string building
//! - [`request`] - Request assembly and validation
//! - [`executor`] - Execution seam and the default `reqwest` executor
//! - [`config`] - Client configuration
//! - [`client`] - HTTP connection settings

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod request;

// Re-export commonly used types
pub use config::{OpsConfig, ResponseFormat};
pub use error::{Error, Result};
pub use executor::{HttpExecutor, RequestExecutor, ResponseBody};
pub use query::{append_query, FilterSpec, FilterValue, QueryEncoding, QueryParams};
pub use request::{Credential, RequestBuilder, RequestDescriptor};
