//! Pipelines.
//!
//! The [tree] pipeline builds the category tree and its subcategory map,
//! the [corpus] pipeline uses that map to collect a labeled bilingual corpus.
//! Both implement the light [pipeline::Pipeline] trait.
pub mod corpus;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod tree;

pub use corpus::{CorpusAssembler, CorpusOutput, CorpusParams, PartitionOrder};
pub use pipeline::Pipeline;
pub use tree::{Resume, TreePipeline};
