//! Shared harness for the presence engine integration tests.

pub mod containers;
pub mod mocks;
pub mod setup;
