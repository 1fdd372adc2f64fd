//! Paper model decoded from the CORE works search endpoint.

use serde::{Deserialize, Deserializer, Serialize};

use super::FlexibleDate;

/// Treat an explicit JSON `null` the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A research output as returned by CORE.
///
/// Every date field goes through [`FlexibleDate`], so an absent, empty or
/// `null` value becomes the sentinel rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, rename = "abstract", deserialize_with = "null_as_default")]
    pub abstract_text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub publisher: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<Author>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub contributors: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<Reference>,

    #[serde(default)]
    pub accepted_date: FlexibleDate,

    #[serde(default)]
    pub created_date: FlexibleDate,

    #[serde(default)]
    pub deposited_date: FlexibleDate,

    #[serde(default)]
    pub last_update: FlexibleDate,

    #[serde(default)]
    pub published_date: FlexibleDate,

    #[serde(default)]
    pub updated_date: FlexibleDate,

    /// Deletion status as reported by CORE (e.g. "ALLOWED", "DELETED")
    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub download_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub full_text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub full_text_status: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub license: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub source_full_text_urls: Vec<String>,

    #[serde(default)]
    pub year_published: Option<i32>,
}

impl PaperResult {
    /// Author names in upstream order
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn has_download(&self) -> bool {
        !self.download_url.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// An entry of a paper's bibliography
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,

    /// Free-form date as printed in the citation; not normalized
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,

    /// Raw citation text
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cites: Vec<String>,
}

/// Response envelope of the works search endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_hits: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<PaperResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"{
        "totalHits": 2,
        "limit": 10,
        "offset": 0,
        "results": [
            {
                "id": 42,
                "title": "Deep Nets",
                "abstract": "We study nets.",
                "publisher": "ACME",
                "authors": [{"name": "David"}, {"name": "Peter"}],
                "references": [{"title": "Prior", "authors": ["Ann"], "date": "1999", "raw": "Ann. Prior. 1999."}],
                "acceptedDate": "",
                "createdDate": "2020-05-01",
                "depositedDate": null,
                "publishedDate": "2020-06-01T00:00:00",
                "updatedDate": "2021-01-02T03:04:05Z",
                "lastUpdate": "2021-01-02T03:04:05+01:00",
                "deleted": "ALLOWED",
                "disabled": false,
                "yearPublished": 2020
            },
            {"id": 43, "title": "Sparse", "abstract": null, "authors": null, "unknownField": [1, 2, 3]}
        ]
    }"#;

    #[test]
    fn test_decode_envelope() {
        let envelope: SearchEnvelope = serde_json::from_str(ENVELOPE).unwrap();
        assert_eq!(envelope.total_hits, 2);
        assert_eq!(envelope.results.len(), 2);

        let paper = &envelope.results[0];
        assert_eq!(paper.author_names(), vec!["David", "Peter"]);
        assert!(paper.accepted_date.is_none());
        assert!(paper.deposited_date.is_none());
        assert_eq!(paper.created_date.format_calendar(), "2020-05-01");
        assert_eq!(paper.published_date.format_calendar(), "2020-06-01");
        assert_eq!(paper.last_update.format_calendar(), "2021-01-02");
        assert_eq!(paper.references[0].raw, "Ann. Prior. 1999.");
        assert_eq!(paper.year_published, Some(2020));

        let sparse = &envelope.results[1];
        assert!(sparse.authors.is_empty());
        assert!(sparse.updated_date.is_none());
        assert!(!sparse.has_download());
    }

    #[test]
    fn test_bad_date_fails_decode() {
        let body = r#"{"results": [{"createdDate": "01/05/2020"}]}"#;
        let err = serde_json::from_str::<SearchEnvelope>(body).unwrap_err();
        assert!(err.to_string().contains("01/05/2020"));
    }

    #[test]
    fn test_serialized_results_decode_identically() {
        let envelope: SearchEnvelope = serde_json::from_str(ENVELOPE).unwrap();
        let bytes = serde_json::to_vec(&envelope.results).unwrap();
        let back: Vec<PaperResult> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, envelope.results);
    }
}
