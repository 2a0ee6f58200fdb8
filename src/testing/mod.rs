//! Testing utilities and mock implementations
//!
//! Lets the normalizer be exercised without real serializers, listeners or a global
//! tracing subscriber.

pub mod mocks;

pub use mocks::*;
