//! Property-based testing for ProxDB.
//!
//! Uses proptest to check the database invariants over random datasets
//! and random insert/delete sequences.

pub mod properties;
