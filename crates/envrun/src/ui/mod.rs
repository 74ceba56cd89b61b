//! Terminal and JSON rendering of command results

pub mod summary;
