/*! Corpus documents and labels

Collected pages are kept as [Document]s grouped by partition ([PartitionDocs]).
Their categories are turned into integer labels through a single [LabelSpace],
rare labels are dropped, and the result is laid out per language ([LanguageCorpus]).
!*/
mod document;
mod labels;
mod rarity;
mod reader;
mod structure;

pub use document::{Document, PartitionDocs};
pub use labels::{assign_labels, compact_labels, LabelSpace};
pub use rarity::{drop_rare_labels, label_weights};
pub use reader::{ClusterTypes, CorpusReader, Entry};
pub use structure::{restructure, LanguageCorpus};
