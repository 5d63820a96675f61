//! Shared types used across the Prospect workspace.
//!
//! This module defines the structured query, the post-extraction filter set,
//! and the raw record variants produced by extraction.

use crate::error::ProspectError;
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The fixed set of keys a structured query may carry.
///
/// The declaration order is the order keys are emitted in a compiled locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    /// Main search terms
    Keywords,
    /// Job titles or positions
    Title,
    /// Geographic location
    Location,
    /// Industry sector
    Industry,
    /// Company name
    Company,
}

impl QueryField {
    /// All fields in canonical emission order.
    pub const ALL: [QueryField; 5] = [
        Self::Keywords,
        Self::Title,
        Self::Location,
        Self::Industry,
        Self::Company,
    ];

    /// Parameter name used in locators and wire formats.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keywords => "keywords",
            Self::Title => "title",
            Self::Location => "location",
            Self::Industry => "industry",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryField {
    type Err = ProspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| ProspectError::Validation(format!("unknown query field '{s}'")))
    }
}

/// A structured people-search query.
///
/// Every key is optional. Blank values are kept as given but treated as
/// absent by [`Query::value`] and everything built on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Query {
    /// Create an all-blank query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field, returning the updated query.
    #[must_use]
    pub fn with(mut self, field: QueryField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set one field in place.
    pub fn set(&mut self, field: QueryField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Non-blank value for a field, untrimmed.
    #[must_use]
    pub fn value(&self, field: QueryField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Fields with a non-blank value, in canonical order.
    pub fn present_fields(&self) -> impl Iterator<Item = (QueryField, &str)> {
        QueryField::ALL
            .into_iter()
            .filter_map(|field| self.value(field).map(|value| (field, value)))
    }

    /// True when no field carries a non-blank value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.present_fields().next().is_none()
    }

    fn slot(&self, field: QueryField) -> &Option<String> {
        match field {
            QueryField::Keywords => &self.keywords,
            QueryField::Title => &self.title,
            QueryField::Location => &self.location,
            QueryField::Industry => &self.industry,
            QueryField::Company => &self.company,
        }
    }

    fn slot_mut(&mut self, field: QueryField) -> &mut Option<String> {
        match field {
            QueryField::Keywords => &mut self.keywords,
            QueryField::Title => &mut self.title,
            QueryField::Location => &mut self.location,
            QueryField::Industry => &mut self.industry,
            QueryField::Company => &mut self.company,
        }
    }
}

/// A single filter value: free text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Text value, matched as a case-insensitive substring
    Text(String),
    /// Numeric value, matched against its decimal rendering
    Number(serde_json::Number),
}

impl FilterValue {
    /// Textual form used for both locator encoding and matching.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }

    /// True for empty or whitespace-only text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// Caller-supplied filters, kept in the order the caller gave them.
///
/// Serialized as a JSON/TOML map; a repeated key keeps its first position
/// and its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    /// Create an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter, returning the updated set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a filter in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a filter by key.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Entries in caller order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilterSetVisitor;

        impl<'de> Visitor<'de> for FilterSetVisitor {
            type Value = FilterSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter keys to string or number values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterSet, A::Error> {
                let mut filters = FilterSet::new();
                while let Some((key, value)) = access.next_entry::<String, FilterValue>()? {
                    filters.insert(key, value);
                }
                Ok(filters)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<FilterSet, E> {
                Ok(FilterSet::new())
            }
        }

        deserializer.deserialize_any(FilterSetVisitor)
    }
}

/// Which record variant a run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// People-search results
    Profile,
    /// Comments on one post
    Comment,
}

impl RecordKind {
    /// Plural label used in file names and messages.
    #[must_use]
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Comment => "comments",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// One people-search result. Any field may be absent if it could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
}

/// One comment on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub timestamp: Option<String>,
    /// Reaction count; 0 when the counter was missing or unreadable
    pub likes: u64,
}

/// A record as produced by extraction, before compliance shaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    /// People-search result
    Profile(ProfileRecord),
    /// Post comment
    Comment(CommentRecord),
}

impl RawRecord {
    /// Variant of this record.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Profile(_) => RecordKind::Profile,
            Self::Comment(_) => RecordKind::Comment,
        }
    }

    /// Deduplication key: locator (or comment text) paired with the name.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        match self {
            Self::Profile(profile) => IdentityKey {
                locator: profile.profile_url.clone().unwrap_or_default(),
                name: profile.name.clone().unwrap_or_default(),
            },
            Self::Comment(comment) => IdentityKey {
                locator: comment.comment.clone().unwrap_or_default(),
                name: comment.name.clone().unwrap_or_default(),
            },
        }
    }

    /// Value of a named field, as text. `None` when the field is absent or unknown.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<String> {
        match self {
            Self::Profile(profile) => match key {
                "name" => profile.name.clone(),
                "title" => profile.title.clone(),
                "location" => profile.location.clone(),
                "profile_url" | "url" => profile.profile_url.clone(),
                _ => None,
            },
            Self::Comment(comment) => match key {
                "name" => comment.name.clone(),
                "comment" => comment.comment.clone(),
                "timestamp" => comment.timestamp.clone(),
                "likes" => Some(comment.likes.to_string()),
                _ => None,
            },
        }
    }

    /// Display name, if extracted.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Profile(profile) => profile.name.as_deref(),
            Self::Comment(comment) => comment.name.as_deref(),
        }
    }
}

impl From<ProfileRecord> for RawRecord {
    fn from(record: ProfileRecord) -> Self {
        Self::Profile(record)
    }
}

impl From<CommentRecord> for RawRecord {
    fn from(record: CommentRecord) -> Self {
        Self::Comment(record)
    }
}

/// The `(locator-or-equivalent, name)` tuple records are deduplicated by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    /// Profile locator, or comment text for comments
    pub locator: String,
    /// Display name
    pub name: String,
}

/// Opaque, pre-obtained authentication credential.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken(String);

impl CredentialToken {
    /// Wrap a credential.
    ///
    /// # Errors
    /// Returns error if the credential is empty or whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, ProspectError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProspectError::Validation(
                "credential token cannot be empty".to_string(),
            ));
        }
        Ok(Self(token))
    }

    /// The raw credential, for injection into the session.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialToken(<{} chars>)", self.0.len())
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, ProspectError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ProspectError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// Source label attached to every exported record.
pub const DATA_SOURCE: &str = "LinkedIn Public Profile";

/// Legal basis recorded for collection.
pub const LEGAL_BASIS: &str = "Legitimate Interest";

/// How long collected records may be kept.
pub const RETENTION_PERIOD: &str = "30 days";

/// A post-processed record annotated with collection provenance.
///
/// This is the shape handed to sinks and serializers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub data_source: String,
    /// RFC3339 collection time
    pub collection_date: String,
    pub legal_basis: String,
    pub retention_period: String,
    pub record: RawRecord,
}

impl ComplianceRecord {
    /// Annotate a record collected at `collected_at`.
    #[must_use]
    pub fn new(record: RawRecord, collected_at: Timestamp) -> Self {
        Self {
            data_source: DATA_SOURCE.to_string(),
            collection_date: collected_at.to_rfc3339(),
            legal_basis: LEGAL_BASIS.to_string(),
            retention_period: RETENTION_PERIOD.to_string(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_field_order_and_parse() {
        let names: Vec<_> = QueryField::ALL.iter().map(QueryField::as_str).collect();
        assert_eq!(
            names,
            vec!["keywords", "title", "location", "industry", "company"]
        );
        assert_eq!(
            " Company ".parse::<QueryField>().expect("parse field"),
            QueryField::Company
        );
        assert!("filters".parse::<QueryField>().is_err());
    }

    #[test]
    fn test_query_blank_values_are_absent() {
        let query = Query::new()
            .with(QueryField::Keywords, "   ")
            .with(QueryField::Company, "");
        assert!(query.is_blank());
        assert_eq!(query.value(QueryField::Keywords), None);
    }

    #[test]
    fn test_query_present_fields_in_canonical_order() {
        let query = Query::new()
            .with(QueryField::Company, "Google")
            .with(QueryField::Keywords, "rust");
        let fields: Vec<_> = query.present_fields().collect();
        assert_eq!(
            fields,
            vec![(QueryField::Keywords, "rust"), (QueryField::Company, "Google")]
        );
    }

    #[test]
    fn test_query_deserialize_ignores_unknown_keys() {
        let query: Query =
            serde_json::from_str(r#"{"title": "CTO", "filters": "size: 1-200", "location": null}"#)
                .expect("deserialize query");
        assert_eq!(query.value(QueryField::Title), Some("CTO"));
        assert_eq!(query.location, None);
    }

    #[test]
    fn test_filter_set_preserves_caller_order() {
        let filters: FilterSet =
            serde_json::from_str(r#"{"title": "manager", "connections": 2, "location": "NYC"}"#)
                .expect("deserialize filters");
        let keys: Vec<_> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "connections", "location"]);
        assert_eq!(
            filters.iter().nth(1).map(|(_, v)| v.as_text()),
            Some("2".to_string())
        );
    }

    #[test]
    fn test_filter_set_insert_replaces_in_place() {
        let mut filters = FilterSet::new().with("a", "1").with("b", "2");
        filters.insert("a", "3");
        let entries: Vec<_> = filters.iter().map(|(k, v)| (k, v.as_text())).collect();
        assert_eq!(entries, vec![("a", "3".to_string()), ("b", "2".to_string())]);
        assert_eq!(filters.remove("a"), Some(FilterValue::from("3")));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_filter_set_null_is_empty() {
        let filters: FilterSet = serde_json::from_str("null").expect("deserialize null");
        assert!(filters.is_empty());
    }

    #[test]
    fn test_identity_key_ignores_other_fields() {
        let a = RawRecord::Profile(ProfileRecord {
            name: Some("Ada".to_string()),
            title: Some("Engineer".to_string()),
            location: None,
            profile_url: Some("https://example.com/in/ada".to_string()),
        });
        let b = RawRecord::Profile(ProfileRecord {
            name: Some("Ada".to_string()),
            title: Some("Director".to_string()),
            location: Some("London".to_string()),
            profile_url: Some("https://example.com/in/ada".to_string()),
        });
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_comment_fields() {
        let record = RawRecord::Comment(CommentRecord {
            name: Some("Grace".to_string()),
            comment: Some("Great post".to_string()),
            timestamp: Some("2d".to_string()),
            likes: 12,
        });
        assert_eq!(record.kind(), RecordKind::Comment);
        assert_eq!(record.field("likes").as_deref(), Some("12"));
        assert_eq!(record.field("title"), None);
        assert_eq!(record.identity_key().locator, "Great post");
    }

    #[test]
    fn test_raw_record_serialization_is_tagged() {
        let record = RawRecord::Profile(ProfileRecord {
            name: Some("Ada".to_string()),
            ..ProfileRecord::default()
        });
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["kind"], "profile");
        assert_eq!(json["name"], "Ada");
    }

    #[test]
    fn test_credential_token_redacted() {
        let token = CredentialToken::new("AQEDAR-secret").expect("valid token");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(token.expose(), "AQEDAR-secret");
        assert!(CredentialToken::new("  ").is_err());
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let parsed = Timestamp::from_rfc3339(&ts.to_rfc3339()).expect("parse RFC3339 timestamp");
        assert_eq!(ts.timestamp(), parsed.timestamp());
    }

    #[test]
    fn test_compliance_record_annotations() {
        let record = RawRecord::from(ProfileRecord {
            name: Some("Ada".to_string()),
            ..ProfileRecord::default()
        });
        let ts = Timestamp::from_rfc3339("2024-03-01T12:00:00Z").expect("parse timestamp");
        let compliance = ComplianceRecord::new(record.clone(), ts);

        assert_eq!(compliance.data_source, "LinkedIn Public Profile");
        assert_eq!(compliance.legal_basis, "Legitimate Interest");
        assert_eq!(compliance.retention_period, "30 days");
        assert_eq!(compliance.collection_date, ts.to_rfc3339());
        assert_eq!(compliance.record, record);
    }
}
