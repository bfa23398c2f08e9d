use httpmock::MockServer;

/// Starts a fresh mock server. Panics when no local port can be bound, so
/// callers wrap it in `catch_unwind` and skip.
pub fn start_mock_server() -> MockServer {
    MockServer::start()
}
