//! Filtering traits.

/// Immutable, pure filter: two successive equal inputs give two equal outputs.
///
/// [Filter::detect] returns `true` for items that are kept.
pub trait Filter<T>: Default {
    fn detect(&self, item: T) -> bool;
}
