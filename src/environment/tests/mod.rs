//! Unit tests for the environment context.
