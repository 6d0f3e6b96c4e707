pub mod allocation;
pub mod plan;
pub mod planner;
pub mod security;
pub mod summary;
pub mod yield_adjuster;
