/*! Category tree

The category graph is crawled breadth-first from one or more roots by a [TreeBuilder],
which classifies each discovered category (see [Classification]).
A [SubcategoryMapper] then projects every node of the resulting [CategoryTree] onto its ancestor at a chosen level,
giving the [SubcatMap] used to resolve page categories.
!*/
mod builder;
mod category;
mod mapper;

pub use builder::{TreeBuilder, TreeParams};
pub use category::{Category, CategoryTree, Classification};
pub use mapper::{
    map_from_roots, save_mapping, ExcludedCategories, Mapping, SubcatMap, SubcategoryMapper,
};
