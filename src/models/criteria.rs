//! Search filter criteria.

use serde::{Deserialize, Serialize};

use super::FlexibleDate;

/// Filters for a CORE works search.
///
/// Every field is optional. An empty string, zero, an empty list and
/// [`FlexibleDate::NONE`] all mean "not specified" and never reach the
/// compiled query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[serde(default)]
    pub accepted_date: FlexibleDate,

    /// arXiv identifier
    #[serde(default)]
    pub arxiv_id: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub citation_count: u64,

    #[serde(default)]
    pub contributors: Vec<String>,

    #[serde(default)]
    pub created_date: FlexibleDate,

    #[serde(default)]
    pub document_type: String,

    #[serde(default)]
    pub doi: String,

    #[serde(default)]
    pub full_text: String,

    /// CORE internal work id
    #[serde(default)]
    pub id: u64,

    /// Microsoft Academic Graph identifier
    #[serde(default)]
    pub mag_id: String,

    #[serde(default)]
    pub publisher: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub year_published: String,

    /// Page size; zero means the upstream default
    #[serde(default)]
    pub limit: u32,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a comma-separated list, trimming whitespace around each entry
    pub fn split_list(raw: &str) -> Vec<String> {
        raw.split(',').map(|s| s.trim().to_string()).collect()
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = text.into();
        self
    }

    pub fn accepted_date(mut self, date: FlexibleDate) -> Self {
        self.accepted_date = date;
        self
    }

    pub fn arxiv_id(mut self, id: impl Into<String>) -> Self {
        self.arxiv_id = id.into();
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn citation_count(mut self, count: u64) -> Self {
        self.citation_count = count;
        self
    }

    pub fn contributors<I, S>(mut self, contributors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contributors = contributors.into_iter().map(Into::into).collect();
        self
    }

    pub fn created_date(mut self, date: FlexibleDate) -> Self {
        self.created_date = date;
        self
    }

    pub fn document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = doi.into();
        self
    }

    pub fn full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = text.into();
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn mag_id(mut self, id: impl Into<String>) -> Self {
        self.mag_id = id.into();
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn year_published(mut self, year: impl Into<String>) -> Self {
        self.year_published = year.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}
