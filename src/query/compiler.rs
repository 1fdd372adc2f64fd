//! Filter criteria to canonical query string.

use std::fmt;

use crate::models::{FilterCriteria, FlexibleDate};

/// Joins clauses in the canonical query
pub const CLAUSE_SEPARATOR: &str = " AND ";

/// One `field:value` fragment of the canonical query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryClause {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for QueryClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

/// Output of [`compile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub clauses: Vec<QueryClause>,
    /// Clauses joined with [`CLAUSE_SEPARATOR`]; empty when no filter is set
    pub canonical: String,
    /// Page size, carried separately from the query
    pub limit: u32,
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// A filterable field: its upstream name and how to render it when set.
struct FieldRule {
    name: &'static str,
    render: fn(&FilterCriteria) -> Option<String>,
}

const fn rule(name: &'static str, render: fn(&FilterCriteria) -> Option<String>) -> FieldRule {
    FieldRule { name, render }
}

fn text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn list(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(","))
}

fn number(value: u64) -> Option<String> {
    (value != 0).then(|| value.to_string())
}

fn date(value: &FlexibleDate) -> Option<String> {
    value.is_some().then(|| value.format_calendar())
}

// Each field appears exactly once. The order is part of the cache key contract.
static RULES: [FieldRule; 15] = [
    rule("abstract", |c| text(&c.abstract_text)),
    rule("acceptedDate", |c| date(&c.accepted_date)),
    rule("arxivId", |c| text(&c.arxiv_id)),
    rule("citationCount", |c| number(c.citation_count)),
    rule("contributors", |c| list(&c.contributors)),
    rule("createdDate", |c| date(&c.created_date)),
    rule("documentType", |c| text(&c.document_type)),
    rule("doi", |c| text(&c.doi)),
    rule("fullText", |c| text(&c.full_text)),
    rule("id", |c| number(c.id)),
    rule("magId", |c| text(&c.mag_id)),
    rule("publisher", |c| text(&c.publisher)),
    rule("title", |c| text(&c.title)),
    rule("yearPublished", |c| text(&c.year_published)),
    rule("authors", |c| list(&c.authors)),
];

/// Upstream field names in clause order
pub fn field_order() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|rule| rule.name)
}

/// Compile criteria into ordered clauses and the canonical query string.
///
/// Pure and deterministic: the same criteria always produce the same output.
pub fn compile(criteria: &FilterCriteria) -> CompiledQuery {
    let clauses: Vec<QueryClause> = RULES
        .iter()
        .filter_map(|rule| {
            (rule.render)(criteria).map(|value| QueryClause {
                field: rule.name,
                value,
            })
        })
        .collect();

    let canonical = clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(CLAUSE_SEPARATOR);

    CompiledQuery {
        clauses,
        canonical,
        limit: criteria.limit,
    }
}
