//! Unit tests for the release context.
