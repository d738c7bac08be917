//! Deterministic counters for decode runs.

pub mod counters;

pub use counters::DecodeCounters;
