mod common;

use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use webprobe_core::{Detector, Form, FormMethod};
use webprobe_webapp::{discover, SqlInjectionDetector, XssReflectionDetector};

fn site() -> Router {
    Router::new()
        .route(
            "/",
            get(|| async {
                Html(
                    r#"<html><body>
                    <a href="/a">A</a>
                    <a href="/b#top">B</a>
                    <a href="http://other.example/offsite">elsewhere</a>
                    <a href="mailto:admin@example.com">mail</a>
                    </body></html>"#,
                )
            }),
        )
        .route(
            "/a",
            get(|| async { Html(r#"<a href="/c">C</a><a href="/">home</a>"#) }),
        )
        .route(
            "/b",
            get(|| async {
                Html(
                    r#"<form action="/search" method="get">
                        <input name="q" type="search">
                        <input type="submit" value="Go">
                    </form>"#,
                )
            }),
        )
        .route("/c", get(|| async { Html("deep") }))
}

#[tokio::test]
async fn test_crawl_respects_depth_and_origin() {
    let base = common::spawn(site()).await;
    let target = common::target(&format!("{}/", base));
    let deadline = Instant::now() + Duration::from_secs(30);

    let surface = discover(&target, 1, deadline, &common::config()).await.unwrap();

    let urls: Vec<String> = surface.urls.iter().cloned().collect();
    assert_eq!(
        urls,
        vec![format!("{}/", base), format!("{}/a", base), format!("{}/b", base)]
    );

    assert_eq!(surface.forms.len(), 1);
    let form = &surface.forms[0];
    assert_eq!(form.action, format!("{}/search", base));
    assert_eq!(form.method, FormMethod::Get);
    assert_eq!(form.inputs.len(), 2);
    assert_eq!(form.found_on, format!("{}/b", base));
}

#[tokio::test]
async fn test_depth_zero_fetches_only_target() {
    let base = common::spawn(site()).await;
    let target = common::target(&format!("{}/", base));
    let deadline = Instant::now() + Duration::from_secs(30);

    let surface = discover(&target, 0, deadline, &common::config()).await.unwrap();
    assert_eq!(surface.urls.len(), 1);
    assert!(surface.forms.is_empty());
}

#[tokio::test]
async fn test_depth_two_reaches_nested_page() {
    let base = common::spawn(site()).await;
    let target = common::target(&format!("{}/", base));
    let deadline = Instant::now() + Duration::from_secs(30);

    let surface = discover(&target, 2, deadline, &common::config()).await.unwrap();
    assert!(surface.urls.contains(&format!("{}/c", base)));
    assert!(!surface.urls.iter().any(|u| u.contains("other.example")));
}

#[tokio::test]
async fn test_expired_deadline_fetches_nothing() {
    let base = common::spawn(site()).await;
    let target = common::target(&format!("{}/", base));

    let surface = discover(&target, 3, Instant::now(), &common::config()).await.unwrap();
    assert!(surface.is_empty());
}

#[tokio::test]
async fn test_unreachable_target_yields_empty_surface() {
    let target = common::target("http://127.0.0.1:9/");
    let deadline = Instant::now() + Duration::from_secs(30);

    let surface = discover(&target, 2, deadline, &common::config()).await.unwrap();
    assert!(surface.is_empty());
}

#[tokio::test]
async fn test_off_origin_form_never_receives_payloads() {
    let (elsewhere, hits) = common::spawn_bystander().await;
    let page = format!(
        r#"<form action="{}/collect" method="post"><input name="q"></form>"#,
        elsewhere
    );
    let app = Router::new().route("/", get(move || async move { Html(page) }));
    let base = common::spawn(app).await;
    let target = common::target(&format!("{}/", base));
    let deadline = Instant::now() + Duration::from_secs(30);

    let mut surface = discover(&target, 1, deadline, &common::config()).await.unwrap();
    assert_eq!(surface.urls.len(), 1);
    assert!(surface.forms.is_empty());

    // A surface assembled elsewhere may still carry the foreign form
    surface.add_form(
        Form::new(format!("{}/collect", elsewhere), FormMethod::Post).with_input("q", "text"),
    );
    let config = common::config();
    assert!(XssReflectionDetector::new(&config).check(&target, &surface).await.is_empty());
    assert!(SqlInjectionDetector::new(&config).check(&target, &surface).await.is_empty());

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_redirects_stay_on_origin() {
    let (elsewhere, hits) = common::spawn_bystander().await;
    let away = format!("{}/landing", elsewhere);
    let app = Router::new()
        .route(
            "/",
            get(|| async { Html(r#"<a href="/moved">moved</a><a href="/away">away</a>"#) }),
        )
        .route("/moved", get(|| async { Redirect::temporary("/landing") }))
        .route("/away", get(move || async move { Redirect::temporary(&away) }))
        .route(
            "/landing",
            get(|| async { Html(r#"<form action="/search"><input name="q"></form>"#) }),
        );
    let base = common::spawn(app).await;
    let target = common::target(&format!("{}/", base));
    let deadline = Instant::now() + Duration::from_secs(30);

    let surface = discover(&target, 1, deadline, &common::config()).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(surface.urls.contains(&format!("{}/landing", base)));
    let origin = format!("{}/", base);
    assert!(surface.urls.iter().all(|u| u.starts_with(&origin)));
    assert_eq!(surface.forms.len(), 1);
    assert_eq!(surface.forms[0].action, format!("{}/search", base));
    assert_eq!(surface.forms[0].found_on, format!("{}/landing", base));
}
