//! Core data models: filter criteria, decoded papers, and the flexible date type.

mod criteria;
mod date;
mod paper;

pub use criteria::FilterCriteria;
pub use date::{DateFormatError, FlexibleDate, CALENDAR_FORMAT};
pub use paper::{Author, PaperResult, Reference, SearchEnvelope};
