pub mod constants;
pub mod corpus;
pub mod error;
pub mod fetch;
pub mod filtering;
pub mod finder;
pub mod io;
pub mod pipelines;
pub mod selection;
pub mod tree;
