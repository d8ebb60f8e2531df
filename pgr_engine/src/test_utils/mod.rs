//! Helpers for tests that need a real database or gateway messages. Enabled with the `test_utils` feature.
pub mod gateway_sim;
pub mod prepare_env;
