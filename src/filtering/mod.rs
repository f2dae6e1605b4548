/*! Filtering utilities

Filters operate on category names.

Filters implement [filter::Filter]: they do not hold state, and two successive equal inputs give two equal outputs.
See [category::NameFilter] for the relevance filter used when crawling the category graph.
! */
mod category;
mod filter;

pub use category::NameFilter;
pub use filter::Filter;
