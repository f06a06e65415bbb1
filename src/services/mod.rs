//! External collaborators of the pipeline

pub mod cache;
pub mod report_source;
