//! Unit tests for individual components

mod builders_test;
mod config_test;
mod error_test;
