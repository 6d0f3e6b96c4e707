pub mod catalog;
pub mod plan;
pub mod summary;
pub mod yields;
