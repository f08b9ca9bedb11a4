//! Resource listing for the vRealize Operations REST API.
//!
//! Turns a [`ResourceQuery`] (filters, paging, optional output file) into a request
//! against `/suite-api/api/resources`, executes it, and unwraps the `resourceList`.

#![deny(missing_docs)]

pub mod client;
pub mod models;
mod xml;

pub use client::{ResourcesClient, ResourcesClientBuilder, RESOURCES_PATH};
pub use models::{
    Badge, IdentifierType, Link, PageInfo, Paging, RelationshipDirection, Resource,
    ResourceFilter, ResourceIdentifier, ResourceKey, ResourceList, ResourceListResponse,
    ResourceQuery, ResourceStatusState, FILTER_NAMES,
};

/// Convenient result alias that reuses the shared vROps error type.
pub type Result<T> = vrops_core::Result<T>;
