//! Integration tests: full analysis runs over an in-memory provider.

mod fake_provider;
mod pipeline;
