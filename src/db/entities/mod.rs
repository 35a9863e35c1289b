//! Database entities

pub mod subscribers;
