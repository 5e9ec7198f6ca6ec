//! Support types shared by the embedtweet crates: screen geometry used to
//! anchor popups, and the identifiers embedded blocks carry in a document.

pub mod geometry;
pub mod ids;

pub use geometry::*;
pub use ids::*;
