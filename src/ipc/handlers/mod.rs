pub mod core;
pub mod courses;
pub mod exchange;
pub mod schedule;
pub mod stats;
pub mod students;
