//! Query parameter collection and query string building.
//!
//! Filters are bound by name in a [`FilterSpec`]. [`QueryParams::collect`] walks a list of
//! recognised filter names in order and expands every bound value into key/value pairs, one
//! pair per element for multi-valued filters. [`append_query`] then renders those pairs onto
//! an existing query string.
//!
//! Repeated keys are kept: the API reads `?resourceKind=A&resourceKind=B` as "A or B".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::form_urlencoded;

/// A single query key/value pair.
pub type KeyValuePair = (String, String);

/// Value bound to a filter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single value.
    Scalar(String),
    /// An ordered sequence of values; each non-empty element becomes its own pair.
    Multi(Vec<String>),
}

impl FilterValue {
    /// Build a scalar value from anything printable.
    pub fn scalar<T: ToString>(value: T) -> Self {
        Self::Scalar(value.to_string())
    }

    /// Build a multi value from any sequence of printable items.
    pub fn multi<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::Multi(values.into_iter().map(|v| v.to_string()).collect())
    }

    /// Returns true when the value contributes no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_empty(),
            Self::Multi(values) => values.iter().all(String::is_empty),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::multi(values)
    }
}

/// Explicit mapping from filter name to its current value.
///
/// A name that was never bound is absent and contributes nothing to the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    bindings: HashMap<String, FilterValue>,
}

impl FilterSpec {
    /// Create an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a filter name, replacing any previous binding.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Bind a value only when it is present.
    #[must_use]
    pub fn bind_opt<V>(self, name: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<FilterValue>,
    {
        match value {
            Some(value) => self.bind(name, value),
            None => self,
        }
    }

    /// Look up the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.bindings.get(name)
    }

    /// Returns true if `name` has a binding.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<KeyValuePair>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Collect pairs for `names`, in that order, from the values bound in `filters`.
    ///
    /// Unbound and empty filters are skipped. A multi-valued filter yields one pair per
    /// non-empty element, in element order.
    #[must_use]
    pub fn collect<S: AsRef<str>>(names: &[S], filters: &FilterSpec) -> Self {
        let mut params = Self::new();
        for name in names {
            let name = name.as_ref();
            match filters.get(name) {
                Some(value) if !value.is_empty() => params.push_value(name, value),
                _ => {}
            }
        }
        params
    }

    fn push_value(&mut self, key: &str, value: &FilterValue) {
        match value {
            FilterValue::Scalar(value) => self.push(key, value),
            FilterValue::Multi(values) => {
                self.push_all(key, values.iter().filter(|value| !value.is_empty()));
            }
        }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &str, value: T)
    where
        T: ToString,
    {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    /// Append one pair per element, repeating `key`.
    pub fn push_all<I, T>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        for value in values {
            self.push(key, value);
        }
    }

    /// Append every pair collected by another builder.
    pub fn extend(&mut self, other: Self) {
        self.pairs.extend(other.pairs);
    }

    /// Borrow the collected pairs.
    #[must_use]
    pub fn pairs(&self) -> &[KeyValuePair] {
        &self.pairs
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<KeyValuePair> {
        self.pairs
    }

    /// Number of collected pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// How keys and values are written into a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryEncoding {
    /// Insert keys and values verbatim.
    ///
    /// A value containing `&`, `=` or `#` will split into extra parameters or truncate the
    /// query. Only use this when byte-exact output matters.
    Raw,
    /// Form-encode keys and values.
    #[default]
    Percent,
}

impl QueryEncoding {
    fn render(self, input: &str) -> String {
        match self {
            Self::Raw => input.to_string(),
            Self::Percent => form_urlencoded::byte_serialize(input.as_bytes()).collect(),
        }
    }
}

/// Append `pairs` to an existing query string.
///
/// An empty `existing` gains a leading `?` once the first pair is written; later pairs are
/// joined with `&`. An `existing` ending in `?` or `&` is continued without another
/// separator. With no pairs the input is returned unchanged. Calling this twice with
/// two batches gives the same string as calling it once with both batches concatenated.
#[must_use]
pub fn append_query(existing: &str, pairs: &[KeyValuePair], encoding: QueryEncoding) -> String {
    let mut query = existing.to_string();
    for (key, value) in pairs {
        if query.is_empty() {
            query.push('?');
        } else if !query.ends_with(['?', '&']) {
            query.push('&');
        }
        query.push_str(&encoding.render(key));
        query.push('=');
        query.push_str(&encoding.render(value));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> KeyValuePair {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn push_opt_skips_none() {
        let mut params = QueryParams::new();
        params.push_opt("name", Option::<String>::None);
        assert!(params.is_empty());
    }

    #[test]
    fn collect_all_absent_is_empty() {
        let names = ["name", "regex", "resourceKind"];
        let params = QueryParams::collect(&names, &FilterSpec::new());
        assert!(params.is_empty());
        assert_eq!(append_query("", params.pairs(), QueryEncoding::Raw), "");
        assert_eq!(
            append_query("?a=1", params.pairs(), QueryEncoding::Raw),
            "?a=1"
        );
    }

    #[test]
    fn collect_skips_empty_values() {
        let filters = FilterSpec::new()
            .bind("name", "")
            .bind("resourceKind", Vec::<String>::new());
        let params = QueryParams::collect(&["name", "resourceKind"], &filters);
        assert!(params.is_empty());
    }

    #[test]
    fn collect_skips_multi_of_empty_strings() {
        let filters = FilterSpec::new()
            .bind("name", vec![""])
            .bind("resourceKind", "VirtualMachine");
        let params = QueryParams::collect(&["name", "resourceKind"], &filters);
        assert_eq!(
            params.into_pairs(),
            vec![pair("resourceKind", "VirtualMachine")]
        );
    }

    #[test]
    fn collect_drops_empty_elements_of_multi() {
        let filters = FilterSpec::new().bind("resourceId", vec!["", "id-1", ""]);
        let params = QueryParams::collect(&["resourceId"], &filters);
        assert_eq!(params.into_pairs(), vec![pair("resourceId", "id-1")]);
    }

    #[test]
    fn filter_value_emptiness() {
        assert!(FilterValue::from("").is_empty());
        assert!(FilterValue::from(vec!["", ""]).is_empty());
        assert!(!FilterValue::from(vec!["", "a"]).is_empty());
    }

    #[test]
    fn collect_expands_multi_values_in_order() {
        let filters = FilterSpec::new().bind(
            "resourceKind",
            vec!["VirtualMachine", "HostSystem", "Datastore"],
        );
        let params = QueryParams::collect(&["resourceKind"], &filters);

        assert_eq!(params.len(), 3);
        assert_eq!(
            params.into_pairs(),
            vec![
                pair("resourceKind", "VirtualMachine"),
                pair("resourceKind", "HostSystem"),
                pair("resourceKind", "Datastore"),
            ]
        );
    }

    #[test]
    fn collect_follows_name_order_not_binding_order() {
        let filters = FilterSpec::new()
            .bind("includeRelated", "CHILD")
            .bind("name", "vm-01");
        let params = QueryParams::collect(&["name", "includeRelated"], &filters);
        assert_eq!(
            params.into_pairs(),
            vec![pair("name", "vm-01"), pair("includeRelated", "CHILD")]
        );
    }

    #[test]
    fn collect_ignores_unlisted_bindings() {
        let filters = FilterSpec::new()
            .bind("adapterKind", "VMWARE")
            .bind("other", "x");
        let params = QueryParams::collect(&["adapterKind"], &filters);
        assert_eq!(params.into_pairs(), vec![pair("adapterKind", "VMWARE")]);
    }

    #[test]
    fn bind_opt_leaves_none_unbound() {
        let filters = FilterSpec::new()
            .bind_opt("name", Option::<String>::None)
            .bind_opt("regex", Some("^vm-.*"));
        assert!(!filters.is_bound("name"));
        assert!(filters.is_bound("regex"));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn filter_value_scalar_stringifies() {
        assert_eq!(FilterValue::scalar(4), FilterValue::Scalar("4".to_string()));
        assert_eq!(
            FilterValue::multi([1, 2]),
            FilterValue::Multi(vec!["1".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn append_query_is_associative() {
        let first = append_query("", &[pair("a", "1")], QueryEncoding::Raw);
        let twice = append_query(&first, &[pair("b", "2")], QueryEncoding::Raw);
        let once = append_query("", &[pair("a", "1"), pair("b", "2")], QueryEncoding::Raw);

        assert_eq!(twice, "?a=1&b=2");
        assert_eq!(twice, once);
    }

    #[test]
    fn append_query_after_bare_question_mark() {
        assert_eq!(
            append_query("?", &[pair("a", "1")], QueryEncoding::Raw),
            "?a=1"
        );
    }

    #[test]
    fn append_query_after_trailing_ampersand() {
        assert_eq!(
            append_query("?a=1&", &[pair("b", "2")], QueryEncoding::Raw),
            "?a=1&b=2"
        );
    }

    #[test]
    fn append_query_keeps_repeated_keys() {
        let query = append_query(
            "",
            &[pair("resourceId", "1"), pair("resourceId", "2")],
            QueryEncoding::Raw,
        );
        assert_eq!(query, "?resourceId=1&resourceId=2");
    }

    #[test]
    fn raw_encoding_inserts_reserved_characters_verbatim() {
        let query = append_query("", &[pair("name", "a&b=c")], QueryEncoding::Raw);
        assert_eq!(query, "?name=a&b=c");
    }

    #[test]
    fn percent_encoding_escapes_reserved_characters() {
        let query = append_query("", &[pair("name", "a&b=c")], QueryEncoding::Percent);
        assert_eq!(query, "?name=a%26b%3Dc");

        let query = append_query("", &[pair("regex", "^vm .*$")], QueryEncoding::Percent);
        assert_eq!(query, "?regex=%5Evm+.*%24");
    }
}
