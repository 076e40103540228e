pub mod core;
pub mod criteria;
pub mod exports;
pub mod reports;
pub mod teachers;
