/// Shared formatting helpers (durations, labels).
pub mod formatting;
/// Offset/limit pagination helpers.
pub mod pagination;
/// Pure parser helpers.
pub mod parse;
/// Strength-training arithmetic (load, one-rep-max estimates).
pub mod strength;
/// Shared time helpers.
pub mod time;
