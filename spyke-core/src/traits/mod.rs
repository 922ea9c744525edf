//! Seams to the external sorting/analysis collaborator.

pub mod sorting;

pub use sorting::{ISortingMutator, ISortingSource};
