//! Revenue domain
pub mod aggregates;
pub mod value_objects;
