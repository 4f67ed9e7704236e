//! Library-level integration tests.

mod agent_test;
mod factory_test;
mod loop_test;
mod postgres_test;
