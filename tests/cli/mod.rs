//! Tests that run the compiled binary.

mod headless_test;
