//! Engine integration tests

mod engine_tests;
