//! Optimistic operation registry and its time/id sources.

/// Clock and operation id sources.
pub mod clock;
/// Helper index aliases.
pub mod indices;
/// Registry of pending optimistic operations.
pub mod manager;
