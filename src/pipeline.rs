pub mod aggregate;
pub mod config;
pub mod context;
pub mod definition;
pub mod extract;
pub mod filter;
pub mod stream;

pub use aggregate::AggregatorPipeline;
pub use extract::ExtractorPipeline;
pub use filter::FilterPipeline;
pub use stream::Pipeline;
