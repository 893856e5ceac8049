//! In-process mock sites for integration tests
#![allow(dead_code)]

use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use url::Url;
use webprobe_core::{AttackSurface, Target};
use webprobe_webapp::ScanConfig;

/// Serve `app` on an ephemeral loopback port and return its base URL
/// (no trailing slash)
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve an unrelated host that answers everything and counts the
/// requests it receives
pub async fn spawn_bystander() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            "ok"
        }
    });
    (spawn(app).await, hits)
}

/// Target for a loopback test server; the validator would reject it
pub fn target(url: &str) -> Target {
    Target::unchecked(Url::parse(url).unwrap())
}

pub fn config() -> ScanConfig {
    ScanConfig::default()
        .with_request_timeout_seconds(5)
        .with_timeout_seconds(30)
}

pub fn surface(urls: &[String]) -> AttackSurface {
    let mut surface = AttackSurface::new();
    for url in urls {
        surface.add_url(url.clone());
    }
    surface
}
