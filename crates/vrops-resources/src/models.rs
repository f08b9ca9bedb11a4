//! Resource query parameters and response models.

use crate::xml;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use vrops_core::query::{FilterSpec, QueryParams};
use vrops_core::{Error, ResponseBody, ResponseFormat};

/// Filter names accepted by the resource listing endpoint, in query order.
pub const FILTER_NAMES: [&str; 6] = [
    "name",
    "regex",
    "resourceKind",
    "adapterKind",
    "includeRelated",
    "resourceId",
];

/// Relation returned alongside each resource when `includeRelated` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationshipDirection {
    /// Parent resources.
    Parent,
    /// Child resources.
    Child,
}

impl RelationshipDirection {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
        }
    }
}

impl FromStr for RelationshipDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PARENT" => Ok(Self::Parent),
            "CHILD" => Ok(Self::Child),
            _ => Err(Error::ConfigError(format!(
                "includeRelated must be PARENT or CHILD, got `{s}`"
            ))),
        }
    }
}

impl fmt::Display for RelationshipDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters supported by `GET /suite-api/api/resources`.
///
/// Every list filter may hold several values; the API treats repeated keys as "any of".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Exact resource names.
    pub name: Vec<String>,
    /// Regular expressions matched against resource names.
    pub regex: Vec<String>,
    /// Resource kind keys (e.g. `VirtualMachine`).
    pub resource_kind: Vec<String>,
    /// Adapter kind keys (e.g. `VMWARE`).
    pub adapter_kind: Vec<String>,
    /// Also return related resource identifiers.
    pub include_related: Option<RelationshipDirection>,
    /// Resource identifiers.
    pub resource_id: Vec<String>,
}

impl ResourceFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name.push(name.into());
        self
    }

    /// Add a name regex.
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex.push(regex.into());
        self
    }

    /// Add a resource kind.
    #[must_use]
    pub fn with_resource_kind(mut self, kind: impl Into<String>) -> Self {
        self.resource_kind.push(kind.into());
        self
    }

    /// Add an adapter kind.
    #[must_use]
    pub fn with_adapter_kind(mut self, kind: impl Into<String>) -> Self {
        self.adapter_kind.push(kind.into());
        self
    }

    /// Add a resource identifier.
    #[must_use]
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id.push(id.into());
        self
    }

    /// Request related resources in the given direction.
    #[must_use]
    pub const fn include_related(mut self, direction: RelationshipDirection) -> Self {
        self.include_related = Some(direction);
        self
    }

    /// Bind every populated filter by its wire name.
    #[must_use]
    pub fn to_filter_spec(&self) -> FilterSpec {
        let lists = [
            ("name", &self.name),
            ("regex", &self.regex),
            ("resourceKind", &self.resource_kind),
            ("adapterKind", &self.adapter_kind),
            ("resourceId", &self.resource_id),
        ];

        lists
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .fold(FilterSpec::new(), |spec, (name, values)| {
                spec.bind(name, values.clone())
            })
            .bind_opt("includeRelated", self.include_related.map(|d| d.as_str()))
    }

    /// Convert the filter into ordered query pairs.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        QueryParams::collect(&FILTER_NAMES, &self.to_filter_spec())
    }
}

/// Page selection carried in the request body.
///
/// `None` means "not supplied" and is omitted; `Some(0)` is the first page and is sent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Number of resources per page.
    pub page_size: Option<u32>,
}

impl Paging {
    /// Build the JSON body, or `None` when neither value is set.
    #[must_use]
    pub fn to_body(&self) -> Option<Value> {
        let mut body = Map::new();
        if let Some(page) = self.page {
            body.insert("page".to_string(), Value::from(page));
        }
        if let Some(page_size) = self.page_size {
            body.insert("pageSize".to_string(), Value::from(page_size));
        }

        if body.is_empty() {
            None
        } else {
            Some(Value::Object(body))
        }
    }
}

/// A complete resource listing request.
#[derive(Debug, Default, Clone)]
pub struct ResourceQuery {
    /// Filters rendered into the query string.
    pub filter: ResourceFilter,
    /// Paging sent in the body.
    pub paging: Paging,
    /// File the raw response is written to.
    pub output: Option<PathBuf>,
}

impl ResourceQuery {
    /// Create a query with no filters and no paging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ResourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the page index.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.paging.page = Some(page);
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.paging.page_size = Some(page_size);
        self
    }

    /// Write the raw response to `path`.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }
}

/// Paging metadata returned with a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Total number of matching resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Page index of this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size of this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL.
    pub href: String,
    /// Relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Link name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Identifier type descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierType {
    /// Identifier name.
    pub name: String,
    /// Data type (`STRING`, `INTEGER`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Whether the identifier participates in resource uniqueness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_part_of_uniqueness: Option<bool>,
}

/// Identifier value of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    /// Identifier type.
    pub identifier_type: IdentifierType,
    /// Value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Natural key of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKey {
    /// Display name.
    pub name: String,
    /// Adapter kind key.
    pub adapter_kind_key: String,
    /// Resource kind key.
    pub resource_kind_key: String,
    /// Identifiers.
    #[serde(default)]
    pub resource_identifiers: Vec<ResourceIdentifier>,
}

/// Collection status reported by one adapter instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatusState {
    /// Adapter instance reporting this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_instance_id: Option<String>,
    /// Data receiving status (`DATA_RECEIVING`, `NO_PARENT_MONITORING`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<String>,
    /// Collection state (`STARTED`, `STOPPED`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_state: Option<String>,
    /// Free-form message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// Health, risk or efficiency badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Badge type.
    #[serde(rename = "type")]
    pub badge_type: String,
    /// Badge colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Badge score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A resource tracked by vROps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource UUID.
    pub identifier: String,
    /// Natural key.
    pub resource_key: ResourceKey,
    /// Epoch milliseconds at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    /// Health colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_health: Option<String>,
    /// Health score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_health_value: Option<f64>,
    /// Whether dynamic thresholds are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_enabled: Option<bool>,
    /// Collection interval in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_interval: Option<u32>,
    /// Per-adapter status.
    #[serde(default)]
    pub resource_status_states: Vec<ResourceStatusState>,
    /// Badges.
    #[serde(default)]
    pub badges: Vec<Badge>,
    /// Related resource identifiers, present with `includeRelated`.
    #[serde(default)]
    pub related_resources: Vec<String>,
    /// Links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// JSON body of a resource listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListResponse {
    /// Paging metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Links.
    #[serde(default)]
    pub links: Vec<Link>,
    /// The resources.
    #[serde(default)]
    pub resource_list: Vec<Resource>,
}

/// Result of a resource listing.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceList {
    /// Resources extracted from a JSON response.
    Json {
        /// The `resourceList` field.
        resources: Vec<Resource>,
        /// The `pageInfo` field.
        page_info: Option<PageInfo>,
    },
    /// Resources read from an XML response.
    Xml {
        /// The `ops:resource` elements.
        resources: Vec<Resource>,
        /// The `ops:pageInfo` element.
        page_info: Option<PageInfo>,
        /// The response document, unchanged.
        document: String,
    },
}

impl ResourceList {
    /// Unwrap a response body requested in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body does not have the listing shape, or a JSON
    /// request came back as something else.
    pub fn from_response(format: ResponseFormat, body: ResponseBody) -> Result<Self, Error> {
        match (format, body) {
            (_, ResponseBody::Json(value)) => {
                let response: ResourceListResponse = serde_json::from_value(value)
                    .map_err(|err| Error::ParseError(format!("Invalid resource listing: {err}")))?;
                Ok(Self::Json {
                    resources: response.resource_list,
                    page_info: response.page_info,
                })
            }
            (ResponseFormat::Xml, ResponseBody::Text(document)) => {
                let listing = xml::parse_listing(&document)?;
                Ok(Self::Xml {
                    resources: listing.resources,
                    page_info: listing.page_info,
                    document,
                })
            }
            (ResponseFormat::Json, ResponseBody::Text(_)) => Err(Error::ParseError(
                "Expected a JSON resource listing".to_string(),
            )),
        }
    }

    /// Parsed resources, whichever format they arrived in.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        match self {
            Self::Json { resources, .. } | Self::Xml { resources, .. } => resources,
        }
    }

    /// Paging metadata, if the server sent any.
    #[must_use]
    pub fn page_info(&self) -> Option<&PageInfo> {
        match self {
            Self::Json { page_info, .. } | Self::Xml { page_info, .. } => page_info.as_ref(),
        }
    }
}
