//! Structured extraction: parsing strategies, scoring, normalization
//! and temperature grouping.

pub mod group;
pub mod normalize;
pub mod parser;
pub mod rules;
pub mod score;

pub use group::{TemperatureGroup, group_by_temperature};
pub use normalize::normalize;
pub use parser::{MsdsFields, SpecificationFields, merge, parse_invoice, parse_msds, parse_specification};
pub use score::{CandidateScorer, ScoredCandidate};
