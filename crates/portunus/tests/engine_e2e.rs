//! End-to-end engine tests.
//!
//! These tests drive the full flow an embedding transport would: build a
//! router with domains, services, gates, and a session store, hand it
//! parsed requests, and observe the finalized responses — including the
//! session round-trip through a cookie and the background expiry sweep.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};

use portunus::prelude::*;

fn addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

fn make_request(method: Method, host: &str, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::HOST, host)
        .body(Full::<Bytes>::default())
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let collected = response.into_body().collect().await.unwrap();
    String::from_utf8(collected.to_bytes().to_vec()).unwrap()
}

/// A counter service backed by the session store: every hit increments a
/// per-session counter and replies with the new value.
fn counter_service(store: Arc<SessionStore>) -> Service {
    Service::builder()
        .path("/count/{sid}")
        .handler(handler_fn("count", move |ctx, _request| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                let sid = ctx.param("sid").unwrap_or_default().to_string();
                let mut session = match store.read(&sid).map_err(PortunusError::from)? {
                    Some(session) => session,
                    None => store.create(&sid).map_err(PortunusError::from)?,
                };
                let hits: u64 = session
                    .get("hits")
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(0)
                    + 1;
                session.set("hits", hits.to_string());
                store.write(&session).map_err(PortunusError::from)?;

                let cookie = Cookie::new("sid", session.id())
                    .with_path("/")
                    .with_http_only(true);
                ctx.response_mut()
                    .header("set-cookie", &cookie.to_set_cookie());
                ctx.response_mut().body_text(&hits.to_string());
                Ok(Flow::Done)
            })
        }))
        .build()
        .unwrap()
}

fn engine_router(store: Arc<SessionStore>) -> Router {
    Router::builder()
        .domain(
            Domain::builder(addr())
                .name("app.example")
                .service(counter_service(store))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_session_counter_round_trip() {
    let store = Arc::new(SessionStore::new(
        Arc::new(MemoryCodec::new()),
        SessionConfig::default(),
    ));
    let router = engine_router(Arc::clone(&store));

    let first = router
        .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(first
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("sid=k1"));
    assert_eq!(body_text(first).await, "1");

    let second = router
        .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
        .await;
    assert_eq!(body_text(second).await, "2");

    // Another session counts independently.
    let other = router
        .handle(&make_request(Method::GET, "app.example", "/count/k2"), addr())
        .await;
    assert_eq!(body_text(other).await, "1");
}

#[tokio::test]
async fn test_sessions_survive_a_file_backed_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Arc::new(SessionStore::new(
            Arc::new(FileCodec::open(dir.path()).unwrap()),
            SessionConfig::default(),
        ));
        let router = engine_router(Arc::clone(&store));
        let response = router
            .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
            .await;
        assert_eq!(body_text(response).await, "1");
    }

    // A fresh store over the same directory sees the persisted session.
    let store = Arc::new(SessionStore::new(
        Arc::new(FileCodec::open(dir.path()).unwrap()),
        SessionConfig::default(),
    ));
    let router = engine_router(Arc::clone(&store));
    let response = router
        .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
        .await;
    assert_eq!(body_text(response).await, "2");
}

#[tokio::test]
async fn test_sweeper_expires_idle_sessions_end_to_end() {
    let codec = Arc::new(MemoryCodec::new());
    let store = Arc::new(SessionStore::new(
        Arc::clone(&codec) as Arc<dyn Codec>,
        SessionConfig::new()
            .with_duration(Duration::from_millis(50))
            .with_sweep_interval(Duration::from_millis(25)),
    ));
    let executor = Executor::new(
        ExecutorConfig::new()
            .with_workers(1)
            .with_queue(QueuePolicy::Bounded(1))
            .with_keep_alive(Duration::from_millis(500)),
    );
    store.start_sweeper(&executor).await.unwrap();

    let router = engine_router(Arc::clone(&store));
    let first = router
        .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
        .await;
    assert_eq!(body_text(first).await, "1");

    // Idle well past the duration; the sweep reclaims the session and the
    // next hit starts from scratch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(codec.read("k1").unwrap().is_none());

    let after = router
        .handle(&make_request(Method::GET, "app.example", "/count/k1"), addr())
        .await;
    assert_eq!(body_text(after).await, "1");

    store.close();
    let report = executor.shutdown().await;
    assert!(report.abandoned.is_empty());
}

#[tokio::test]
async fn test_gated_service_with_decorator_introspection() {
    let gate = SecurityDomain::new("ops").gate(handler_fn("deny-all", |_ctx, _request| {
        Box::pin(async {
            Err(PortunusError::http(
                StatusCode::FORBIDDEN,
                "operators only",
            ))
        })
    }));
    let inner = Service::builder()
        .path("/ops")
        .security_domain(gate)
        .handler(handler_fn("ops", |ctx, _request| {
            Box::pin(async move {
                ctx.response_mut().body_text("ops");
                Ok(Flow::Done)
            })
        }))
        .build()
        .unwrap();
    let decorated: Arc<dyn ServiceUnit> = Arc::new(DecoratingService::prepend(
        Arc::new(inner),
        handler_fn("audit", |_ctx, _request| {
            Box::pin(async { Ok(Flow::Continue) })
        }),
    ));

    // The decorator stays introspectable back to the built service, and
    // forwards its security domain.
    assert!(decorated.find_as::<Service>().is_some());
    assert_eq!(decorated.security_domain().unwrap().realm(), "ops");

    let router = Router::builder()
        .domain(
            Domain::builder(addr())
                .name("app.example")
                .service_unit(decorated)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let response = router
        .handle(&make_request(Method::GET, "app.example", "/ops"), addr())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("operators only"));
}
