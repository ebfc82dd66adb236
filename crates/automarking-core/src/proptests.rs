//! Property-based tests for spec matching.
