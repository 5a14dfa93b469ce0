//! Running the router on an ephemeral port.

use plan_server::config::{AuthConfig, ServerConfig};
use plan_server::server::{AppState, build_router};
use plan_server::storage::StorageProvider;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "test-token";

/// A router serving on 127.0.0.1 in a background task.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve `storage` with a single static bearer token.
    pub async fn start<S: StorageProvider + 'static>(storage: S) -> Self {
        Self::start_with(storage, Duration::from_secs(5)).await
    }

    pub async fn start_with<S: StorageProvider + 'static>(
        storage: S,
        store_timeout: Duration,
    ) -> Self {
        let config = ServerConfig::builder()
            .with_store_timeout(store_timeout)
            .with_auth(AuthConfig::StaticTokens(vec![TEST_TOKEN.to_string()]))
            .build()
            .expect("test config must be valid");
        let state = AppState::from_config(&config, storage).expect("state must build");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, build_router(state)).await;
        });

        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A request builder with the test bearer token attached.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(TEST_TOKEN)
    }
}
