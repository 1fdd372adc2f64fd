//! Cache key derivation.

use std::fmt;

use super::QueryClause;

/// Prefix of every key this service writes
pub const KEY_NAMESPACE: &str = "coreapi:";

/// Page size CORE applies when no limit is sent
pub const DEFAULT_LIMIT: u32 = 10;

/// Opaque key addressing one compiled query and page size
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Zero means "upstream default"
pub fn effective_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit
    }
}

/// Derive the cache key for compiled clauses and a page size.
///
/// Each clause is percent-encoded before joining with `&`, so no clause
/// value can produce a separator. The limit suffix is always present and
/// uses the effective page size.
pub fn derive_key(clauses: &[QueryClause], limit: u32) -> CacheKey {
    let body = clauses
        .iter()
        .map(|clause| urlencoding::encode(&clause.to_string()).into_owned())
        .collect::<Vec<_>>()
        .join("&");

    CacheKey(format!(
        "{}{}#limit={}",
        KEY_NAMESPACE,
        body,
        effective_limit(limit)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterCriteria;
    use crate::query::compile;

    fn key_for(criteria: &FilterCriteria) -> CacheKey {
        let compiled = compile(criteria);
        derive_key(&compiled.clauses, compiled.limit)
    }

    #[test]
    fn test_key_shape() {
        let key = key_for(
            &FilterCriteria::new()
                .abstract_text("machine learning")
                .authors(["David", "Peter"])
                .limit(10),
        );
        assert_eq!(
            key.as_str(),
            "coreapi:abstract%3Amachine%20learning&authors%3ADavid%2CPeter#limit=10"
        );
    }

    #[test]
    fn test_limit_changes_key() {
        let base = FilterCriteria::new()
            .abstract_text("machine learning")
            .authors(["David", "Peter"]);

        assert_ne!(
            key_for(&base.clone().limit(10)),
            key_for(&base.clone().limit(20))
        );
    }

    #[test]
    fn test_default_limit_shares_key_with_explicit_default() {
        let base = FilterCriteria::new().title("graphs");
        assert_eq!(
            key_for(&base.clone().limit(0)),
            key_for(&base.clone().limit(DEFAULT_LIMIT))
        );
    }

    #[test]
    fn test_empty_query_still_namespaced() {
        let key = key_for(&FilterCriteria::new());
        assert_eq!(key.as_str(), "coreapi:#limit=10");
    }

    #[test]
    fn test_separator_cannot_be_forged() {
        let split = FilterCriteria::new().abstract_text("a").title("b");
        let plus = FilterCriteria::new().abstract_text("a+title:b");
        let amp = FilterCriteria::new().abstract_text("a&title:b");

        let keys = [key_for(&split), key_for(&plus), key_for(&amp)];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
    }

    #[test]
    fn test_distinct_criteria_distinct_keys() {
        let variants = vec![
            FilterCriteria::new(),
            FilterCriteria::new().title("x"),
            FilterCriteria::new().publisher("x"),
            FilterCriteria::new().title("x").publisher("x"),
            FilterCriteria::new().authors(["x"]),
            FilterCriteria::new().contributors(["x"]),
            FilterCriteria::new().authors(["x", "y"]),
            FilterCriteria::new().authors(["x,y"]).title("z"),
            FilterCriteria::new().id(1),
            FilterCriteria::new().citation_count(1),
            FilterCriteria::new().doi("10.1/x"),
        ];

        let mut keys: Vec<CacheKey> = variants.iter().map(key_for).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_derive_is_pure() {
        let criteria = FilterCriteria::new().full_text("proteins").limit(3);
        assert_eq!(key_for(&criteria), key_for(&criteria));
    }
}
