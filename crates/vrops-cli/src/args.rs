use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use vrops_core::{QueryEncoding, ResponseFormat};
use vrops_resources::{RelationshipDirection, ResourceFilter, ResourceQuery};

#[derive(Parser, Debug)]
#[command(name = "vrops-resources")]
#[command(version, about = "List resources from a vRealize Operations server")]
pub struct Args {
    /// vROps server host name (or full base URL)
    #[arg(short, long, env = "VROPS_SERVER")]
    pub server: String,

    /// Authentication token from the vROps token endpoint
    #[arg(short, long, env = "VROPS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Response format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the raw response body to this file
    #[arg(long, value_name = "PATH")]
    pub out_file: Option<PathBuf>,

    /// Page index (zero-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Resources per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Resource name (repeatable)
    #[arg(long)]
    pub name: Vec<String>,

    /// Resource name regex (repeatable)
    #[arg(long)]
    pub regex: Vec<String>,

    /// Resource kind, e.g. VirtualMachine (repeatable)
    #[arg(long)]
    pub resource_kind: Vec<String>,

    /// Adapter kind, e.g. VMWARE (repeatable)
    #[arg(long)]
    pub adapter_kind: Vec<String>,

    /// Include related resource identifiers
    #[arg(long, value_enum)]
    pub include_related: Option<Related>,

    /// Resource identifier (repeatable)
    #[arg(long)]
    pub resource_id: Vec<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Insert filter values into the query string without encoding
    #[arg(long)]
    pub raw_query: bool,

    /// Enable debug logging. Debug output of requests may include secrets.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
}

impl From<OutputFormat> for ResponseFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => ResponseFormat::Json,
            OutputFormat::Xml => ResponseFormat::Xml,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Related {
    Parent,
    Child,
}

impl From<Related> for RelationshipDirection {
    fn from(value: Related) -> Self {
        match value {
            Related::Parent => RelationshipDirection::Parent,
            Related::Child => RelationshipDirection::Child,
        }
    }
}

impl Args {
    pub fn query_encoding(&self) -> QueryEncoding {
        if self.raw_query {
            QueryEncoding::Raw
        } else {
            QueryEncoding::Percent
        }
    }

    pub fn to_query(&self) -> ResourceQuery {
        let filter = ResourceFilter {
            name: self.name.clone(),
            regex: self.regex.clone(),
            resource_kind: self.resource_kind.clone(),
            adapter_kind: self.adapter_kind.clone(),
            include_related: self.include_related.map(Into::into),
            resource_id: self.resource_id.clone(),
        };

        let mut query = ResourceQuery::new().with_filter(filter);
        query.paging.page = self.page;
        query.paging.page_size = self.page_size;
        query.output = self.out_file.clone();
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_filters() {
        let args = Args::try_parse_from([
            "vrops-resources",
            "--server",
            "ops.example.com",
            "--token",
            "abc",
            "--resource-kind",
            "VirtualMachine",
            "--resource-kind",
            "HostSystem",
            "--include-related",
            "child",
        ])
        .unwrap();

        let query = args.to_query();
        assert_eq!(
            query.filter.resource_kind,
            vec!["VirtualMachine".to_string(), "HostSystem".to_string()]
        );
        assert_eq!(
            query.filter.include_related,
            Some(RelationshipDirection::Child)
        );
        assert_eq!(query.paging.page, None);
    }

    #[test]
    fn page_zero_is_kept() {
        let args = Args::try_parse_from([
            "vrops-resources",
            "-s",
            "ops.example.com",
            "--page",
            "0",
            "--page-size",
            "4",
        ])
        .unwrap();

        let query = args.to_query();
        assert_eq!(query.paging.page, Some(0));
        assert_eq!(query.paging.page_size, Some(4));
    }

    #[test]
    fn empty_name_adds_no_query_pair() {
        let args = Args::try_parse_from([
            "vrops-resources",
            "-s",
            "ops.example.com",
            "--name",
            "",
            "--adapter-kind",
            "VMWARE",
        ])
        .unwrap();

        let pairs = args.to_query().filter.to_params().into_pairs();
        assert_eq!(pairs, vec![("adapterKind".to_string(), "VMWARE".to_string())]);
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["vrops-resources", "-s", "ops.example.com"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
        assert_eq!(args.query_encoding(), QueryEncoding::Percent);
        assert_eq!(args.timeout, 30);
        assert!(!args.insecure);
    }

    #[test]
    fn rejects_unknown_format() {
        let result =
            Args::try_parse_from(["vrops-resources", "-s", "ops.example.com", "-f", "yaml"]);
        assert!(result.is_err());
    }
}
