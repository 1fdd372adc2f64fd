//! Query compilation and cache key derivation.
//!
//! A [`FilterCriteria`](crate::models::FilterCriteria) compiles into an ordered
//! list of `field:value` clauses. The clauses form the canonical query sent
//! upstream and, together with the page size, the cache key.

mod compiler;
mod key;

pub use compiler::{compile, field_order, CompiledQuery, QueryClause, CLAUSE_SEPARATOR};
pub use key::{derive_key, effective_limit, CacheKey, DEFAULT_LIMIT, KEY_NAMESPACE};
