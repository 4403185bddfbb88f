//! Core data types.

mod item;
mod review;

pub use item::{StudyItem, DEFAULT_EASE_FACTOR};
pub use review::{Quality, ReviewLog};
