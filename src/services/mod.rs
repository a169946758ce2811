//! Domain services built on the batch engine

pub mod bulk;
