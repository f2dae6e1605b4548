/*!
# IO utilities

Every persisted structure is a flat JSON file.
[json] saves and loads them, [layout] names them after the run (tree name, corpus id and language pair).
!*/
pub mod json;
pub mod layout;

pub use layout::{DatasetLayout, TreeLayout};
