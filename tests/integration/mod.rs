//! Integration tests

mod test_utils;

mod config_integration;
mod convergence;
mod error_isolation;
