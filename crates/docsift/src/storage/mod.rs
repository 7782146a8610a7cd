//! Persistent storage for assembled document records.

pub mod database;

pub use database::DocumentDb;
