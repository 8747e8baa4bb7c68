//! Ranking and resolution: similarity, scoring, deduplication, URL
//! canonicalisation, and the resolution strategy built on top of them.
//!
//! The crawler and the external search adapter share the same scorer and
//! deduplicator so that a candidate ranks the same way wherever it was
//! found.

pub mod dedup;
pub mod resolve;
pub mod scoring;
pub mod similarity;
pub mod url_normalize;
