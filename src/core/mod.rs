//! Core execution engine

pub mod batch;
