//! Background tasks

pub mod refresh;
