//! Test utilities shared across crate-level unit tests.

pub mod fake_store;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;

pub use fake_store::FakeStore;
#[cfg(not(target_arch = "wasm32"))]
pub use http::start_mock_server;
