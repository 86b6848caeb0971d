#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum_test::TestServer;

use snaplink::application::services::LinkService;
use snaplink::domain::click_queue::{ClickReceiver, click_queue};
use snaplink::infrastructure::persistence::{MemoryClickRepository, MemoryLinkRepository};
use snaplink::routes::app_router;
use snaplink::state::AppState;

pub const TEST_BASE_URL: &str = "http://localhost:8080";

/// Everything a handler test needs: the wired state plus direct handles to
/// the in-memory stores and the consumer side of the click queue.
pub struct TestApp {
    pub state: AppState,
    pub links: Arc<MemoryLinkRepository>,
    pub clicks: Arc<MemoryClickRepository>,
    pub receiver: ClickReceiver,
}

/// Builds an [`AppState`] over in-memory repositories.
pub fn create_test_app(queue_capacity: usize) -> TestApp {
    let links = Arc::new(MemoryLinkRepository::new());
    let clicks = Arc::new(MemoryClickRepository::new());

    let link_service = Arc::new(LinkService::new(links.clone(), clicks.clone(), 6, 5));
    let (click_sender, receiver) = click_queue(queue_capacity);

    let state = AppState {
        link_service,
        click_sender,
        base_url: TEST_BASE_URL.to_string(),
    };

    TestApp {
        state,
        links,
        clicks,
        receiver,
    }
}

/// Builds a test server over the full application router.
///
/// The router's redirect handler extracts `ConnectInfo`; the mock layer
/// injects a fixed peer address since `axum-test` drives the router without
/// a real socket.
pub fn test_server(state: AppState) -> TestServer {
    let app = app_router(state).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
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
