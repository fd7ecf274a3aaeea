//! Search response model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One package returned by the search service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageCandidate {
    /// Package identifier, e.g. `Newtonsoft.Json`. Missing or null decodes
    /// as empty so the entry can be skipped instead of failing the page.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    /// Latest version reported by the registry
    #[serde(default, deserialize_with = "null_as_empty")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    /// The registry sends either a single string or a list
    #[serde(default, deserialize_with = "one_or_many")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub owners: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_downloads: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
}

impl PackageCandidate {
    /// Candidate with only an identifier set
    pub fn new(id: impl Into<String>) -> Self {
        PackageCandidate {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Title if the registry supplied one, otherwise the identifier
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

/// Body of `GET /query`
///
/// `data` is kept as raw values so one malformed entry does not reject the
/// whole page; see [`SearchResponse::candidates`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "totalHits", default)]
    pub total_hits: u64,
    pub data: Vec<Value>,
}

impl SearchResponse {
    /// Decode every entry that forms a candidate, in registry order
    pub fn candidates(self) -> impl Iterator<Item = PackageCandidate> {
        self.data
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    warn!("Skipping malformed search result #{}: {}", index, err);
                    None
                }
            })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_from_registry_json() {
        let json = r#"{
            "id": "Newtonsoft.Json",
            "version": "13.0.3",
            "title": "Json.NET",
            "description": "Json.NET is a popular high-performance JSON framework for .NET",
            "iconUrl": "https://api.nuget.org/v3-flatcontainer/newtonsoft.json/13.0.3/icon",
            "authors": ["James Newton-King"],
            "owners": "dotnetfoundation",
            "totalDownloads": 4123456789,
            "verified": true,
            "packageTypes": [{"name": "Dependency"}]
        }"#;

        let candidate: PackageCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.id, "Newtonsoft.Json");
        assert_eq!(candidate.display_title(), "Json.NET");
        assert_eq!(candidate.authors, vec!["James Newton-King".to_string()]);
        assert_eq!(candidate.owners, vec!["dotnetfoundation".to_string()]);
        assert_eq!(candidate.total_downloads, 4_123_456_789);
        assert!(candidate.verified);
        assert!(candidate.license_url.is_none());
    }

    #[test]
    fn test_candidate_minimal_fields() {
        let candidate: PackageCandidate =
            serde_json::from_str(r#"{"id": "Dapper", "authors": null}"#).unwrap();
        assert_eq!(candidate, PackageCandidate::new("Dapper"));
        assert_eq!(candidate.display_title(), "Dapper");
    }

    #[test]
    fn test_null_text_fields_decode_as_empty() {
        let candidate: PackageCandidate = serde_json::from_str(
            r#"{"id": "Other", "title": null, "description": null, "summary": null, "version": null}"#,
        )
        .unwrap();
        assert_eq!(candidate, PackageCandidate::new("Other"));
        assert_eq!(candidate.display_title(), "Other");
    }

    #[test]
    fn test_missing_id_decodes_as_empty() {
        let candidate: PackageCandidate = serde_json::from_str(r#"{"title": "no id"}"#).unwrap();
        assert!(candidate.id.is_empty());
        assert_eq!(candidate.title, "no id");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"data": [{"id": "Good"}, {"id": 42}, "junk", {"id": "Later"}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = response.candidates().map(|c| c.id).collect();
        assert_eq!(ids, vec!["Good".to_string(), "Later".to_string()]);
    }

    #[test]
    fn test_response_requires_data() {
        let result: Result<SearchResponse, _> = serde_json::from_str(r#"{"totalHits": 3}"#);
        assert!(result.is_err());
    }
}
