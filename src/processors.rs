pub mod aggregators;
pub mod extractors;
pub mod filters;

pub use aggregators::{Aggregator, AggregatorKind, CountAggregator, UniquesAggregator};
pub use extractors::{Extractor, ExtractorChain, FieldExtractor};
pub use filters::{AddressField, Direction, Filter, FilterChain, Predicate};
