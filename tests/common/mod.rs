#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

use tierlink::application::services::RateLimitPolicy;
use tierlink::domain::entities::AccessEvent;
use tierlink::domain::tier::Tier;
use tierlink::infrastructure::memory::{MemoryCache, MemoryQueue, MemoryStore};
use tierlink::routes::base_router;
use tierlink::state::{AppState, Backends, StateOptions};
use tierlink::utils::code_encoder::CodeEncoder;

pub const TEST_SALT: &str = "integration-salt";
pub const OWNER_HEADER: &str = "X-Owner-Id";
pub const TIER_HEADER: &str = "X-Subscription-Tier";

/// Application wired over in-process backends, with handles kept for
/// inspection.
pub struct TestApp {
    pub state: AppState,
    pub events: mpsc::Receiver<AccessEvent>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub queue: Arc<MemoryQueue>,
    pub encoder: Arc<CodeEncoder>,
    pub backends: Backends,
}

impl TestApp {
    pub fn server(&self) -> TestServer {
        let app = base_router(self.state.clone()).layer(MockConnectInfoLayer);
        TestServer::new(app).unwrap()
    }

    /// Creates a short URL directly through the service.
    pub async fn create(&self, target: &str, owner: &str, tier: Tier) -> String {
        self.state
            .link_service
            .create_short_url(target, owner, tier)
            .await
            .unwrap()
            .code
    }

    pub fn drain_events(&mut self) -> Vec<AccessEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(RateLimitPolicy::default())
}

pub fn create_test_app_with(rate_limit: RateLimitPolicy) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let queue = Arc::new(MemoryQueue::new());
    let encoder = Arc::new(CodeEncoder::new(TEST_SALT, 7).unwrap());

    let backends = Backends {
        short_urls: store.clone(),
        metrics: store.clone(),
        cache: cache.clone(),
        counter: cache.clone(),
        rate_windows: cache.clone(),
        queue: queue.clone(),
    };

    let (state, events) = AppState::build(
        &backends,
        StateOptions {
            encoder: encoder.clone(),
            cache_ttl_seconds: 600,
            rate_limit,
            event_buffer_capacity: 100,
            behind_proxy: false,
        },
    );

    TestApp {
        state,
        events,
        store,
        cache,
        queue,
        encoder,
        backends,
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
