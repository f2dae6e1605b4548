//! Names, markers and defaults shared across the crate.
use std::collections::HashSet;

use lazy_static::lazy_static;

/// Category names containing one of these, surrounded by spaces, are not significant.
pub const REMOVE_PREPOSITIONS: [&str; 6] = ["by", "in", "from", "about", "and", "after"];

/// Category names containing one of these substrings are not significant.
pub const REMOVE_WORDS: [&str; 14] = [
    "list",
    "lists",
    "awards",
    "award",
    "images",
    "image",
    "quotation",
    "quotations",
    "event",
    "events",
    "outline",
    "people",
    "redirects",
    "redirect",
];

pub const SGFNT_CAT_NAME: &str = "SGFNT";
pub const INSGFNT_CAT_NAME: &str = "INSGFNT";
pub const AMBIGUOUS_CAT_NAME: &str = "AMBIGUOUS";
pub const GLOB_CAT_NAME: &str = "GLOB";
pub const BAD_CAT_NAME: &str = "bad cat";

/// Mapped value of a category that the subcategory map does not know.
pub const UNMAPPED_CAT_NAME: &str = "none";

pub const ROOT_CATEGORY: &str = "Main topic classifications";

/// Maximum number of members asked for in a single category listing.
pub const MEMBER_LIMIT: usize = 500;

pub const COMMON_PARTITION: &str = "common";

lazy_static! {
    /// Marker categories that never stand for a topic.
    pub static ref EXCLUDED_CATS: HashSet<&'static str> = {
        let mut m = HashSet::new();
        m.insert(INSGFNT_CAT_NAME);
        m.insert(AMBIGUOUS_CAT_NAME);
        m.insert(BAD_CAT_NAME);
        m.insert(GLOB_CAT_NAME);
        m
    };
}

/// Name of the partition holding categories only present in `lang`.
pub fn monolingual_partition(lang: &str) -> String {
    format!("only_{}", lang)
}
