//! Dispatch, caching and invalidation behaviour of the router.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{get, request, router, router_with, LogBuffer};
use tube::routing::{RouteKind, Tier};
use tube::{LogLevel, RequestContext, RouterConfig};

fn reply(body: &'static str) -> impl Fn(&mut RequestContext<'_>) + Send + Sync {
    move |ctx: &mut RequestContext<'_>| ctx.write(body)
}

fn counting(hits: &Arc<AtomicUsize>) -> impl Fn(&mut RequestContext<'_>) + Send + Sync {
    let hits = hits.clone();
    move |ctx: &mut RequestContext<'_>| {
        hits.fetch_add(1, Ordering::SeqCst);
        ctx.write("counted");
    }
}

#[test]
fn test_named_parameter_extraction() {
    let router = router();
    router
        .get("/users/@name/posts/@id", |ctx: &mut RequestContext<'_>| {
            let body = format!("{}:{}", ctx.param("name"), ctx.param("id"));
            ctx.write(body);
        })
        .unwrap();

    let response = get(&router, "/users/doug/posts/42");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body_text(), "doug:42");

    // a single-segment parameter never spans a slash
    assert_eq!(get(&router, "/users/doug/extra/posts/42").status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_multi_segment_parameter() {
    let router = router();
    router
        .get("/files/@@path", |ctx: &mut RequestContext<'_>| {
            let body = ctx.param("path").to_string();
            ctx.write(body);
        })
        .unwrap();

    assert_eq!(get(&router, "/files/a/b/c.txt").body_text(), "a/b/c.txt");
    assert_eq!(get(&router, "/files/a%20b").body_text(), "a b");
}

#[test]
fn test_registration_order_wins() {
    let router = router();
    router.get("/users/@name", reply("pattern")).unwrap();
    router.get("/users/doug", reply("literal")).unwrap();

    assert_eq!(get(&router, "/users/doug").body_text(), "pattern");
}

#[test]
fn test_late_tier_after_primary() {
    let router = router();
    router.late_route(Method::GET, "/@@rest", reply("late")).unwrap();
    router.get("/special", reply("primary")).unwrap();

    assert_eq!(router.table().len(Tier::Primary), 1);
    assert_eq!(router.table().len(Tier::Late), 1);
    assert_eq!(get(&router, "/special").body_text(), "primary");
    assert_eq!(get(&router, "/anything/else").body_text(), "late");
}

#[test]
fn test_method_must_match() {
    let router = router();
    router.post("/submit", reply("posted")).unwrap();

    assert_eq!(get(&router, "/submit").status(), StatusCode::NOT_FOUND);
    let response = router.serve(request(Method::POST, "/submit"));
    assert_eq!(response.body_text(), "posted");
}

#[test]
fn test_path_is_normalized_before_matching() {
    let router = router();
    router.get("/users/@name", reply("user")).unwrap();

    assert_eq!(get(&router, "/a/../users//doug/").body_text(), "user");
    assert_eq!(get(&router, "/users/./doug").body_text(), "user");
}

#[test]
fn test_repeat_request_uses_cache() {
    let router = router();
    let hits = Arc::new(AtomicUsize::new(0));
    router.get("/a", counting(&hits)).unwrap();

    assert!(!router.resolve(&Method::GET, "/a").cached);
    assert!(router.resolve(&Method::GET, "/a").cached);

    let scans = router.table().scans();
    get(&router, "/a");
    get(&router, "/a");
    assert_eq!(router.table().scans(), scans);
    // the handler still runs on every request
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_no_cache_scans_every_time() {
    let router = router_with(
        RouterConfig {
            no_cache: true,
            ..RouterConfig::default()
        },
        &[],
    );
    router.get("/a", reply("a")).unwrap();

    get(&router, "/a");
    get(&router, "/a");
    assert_eq!(router.table().scans(), 2);
    assert!(router.request_cache().is_empty());
}

#[test]
fn test_not_found_is_cached() {
    let router = router();
    router.get("/known", reply("known")).unwrap();

    assert_eq!(get(&router, "/missing").status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/missing").body_text(), "404 file not found");
    assert_eq!(router.table().scans(), 1);

    let resolved = router.resolve(&Method::GET, "/missing");
    assert!(resolved.cached);
    assert_eq!(resolved.route.kind(), RouteKind::NotFound);
}

#[test]
fn test_route_added_after_404_needs_invalidation() {
    let router = router();
    assert_eq!(get(&router, "/later").status(), StatusCode::NOT_FOUND);

    router.get("/later", reply("now here")).unwrap();
    assert_eq!(get(&router, "/later").status(), StatusCode::NOT_FOUND);

    router.invalidate("/later").unwrap();
    assert_eq!(get(&router, "/later").body_text(), "now here");
}

#[test]
fn test_invalidate_by_pattern() {
    let router = router();
    router.get("/users/@@rest", reply("user")).unwrap();

    get(&router, "/users/doug");
    get(&router, "/users/doug/extra");
    router.serve(request(Method::HEAD, "/users/doug"));
    assert_eq!(router.request_cache().len(), 3);

    router.invalidate("/users/@name").unwrap();

    let cache = router.request_cache();
    assert!(!cache.contains("GET /users/doug"));
    assert!(!cache.contains("HEAD /users/doug"));
    assert!(cache.contains("GET /users/doug/extra"));
}

#[test]
fn test_invalidate_root() {
    let router = router();
    router.get("/", reply("home")).unwrap();
    router.get("/about", reply("about")).unwrap();

    get(&router, "/");
    get(&router, "/about");
    router.invalidate("/").unwrap();

    assert!(!router.request_cache().contains("GET /"));
    assert!(router.request_cache().contains("GET /about"));
}

#[test]
fn test_invalid_invalidation_pattern() {
    let router = router();
    assert!(router.invalidate("/broken/(").is_err());
}

#[test]
fn test_empty_cache() {
    let router = router();
    router.get("/a", reply("a")).unwrap();
    get(&router, "/a");
    get(&router, "/b");
    assert_eq!(router.request_cache().len(), 2);

    router.empty_cache();
    assert!(router.request_cache().is_empty());
    assert!(router.document_cache().is_empty());
    assert!(!router.resolve(&Method::GET, "/a").cached);
}

#[test]
fn test_remove_route() {
    let router = router();
    router.get("/users/@name", reply("pattern")).unwrap();
    router.get("/users/doug", reply("literal")).unwrap();
    router.get("/other", reply("other")).unwrap();
    get(&router, "/users/doug");
    get(&router, "/other");
    router.serve(request(Method::POST, "/users/doug"));
    router.serve(request(Method::HEAD, "/users/doug"));
    assert!(router.request_cache().contains("POST /users/doug"));

    assert_eq!(router.remove_route("/users/doug").unwrap(), 2);
    assert_eq!(router.table().len(Tier::Primary), 1);
    let cache = router.request_cache();
    assert!(!cache.contains("GET /users/doug"));
    assert!(!cache.contains("POST /users/doug"));
    assert!(!cache.contains("HEAD /users/doug"));
    assert!(cache.contains("GET /other"));
    assert_eq!(get(&router, "/users/doug").status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/other").body_text(), "other");

    assert_eq!(router.remove_route("/nothing").unwrap(), 0);
}

#[test]
fn test_remove_route_leaves_late_tier() {
    let router = router();
    router.late_route(Method::GET, "/fallback", reply("late")).unwrap();

    assert_eq!(router.remove_route("/fallback").unwrap(), 0);
    assert_eq!(get(&router, "/fallback").body_text(), "late");
}

#[test]
fn test_custom_fallbacks_get_forced_status() {
    let router = router();
    router.set_not_found(|ctx: &mut RequestContext<'_>| ctx.write("nothing here"));
    router.set_server_error(|ctx: &mut RequestContext<'_>| ctx.write("oops"));
    router
        .get("/fail", |ctx: &mut RequestContext<'_>| ctx.error("disk on fire"))
        .unwrap();

    let missing = get(&router, "/nope");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.body_text(), "nothing here");

    let failed = get(&router, "/fail");
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failed.body_text(), "oops");
}

#[test]
fn test_handler_not_found_is_cached() {
    let router = router();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    router
        .get("/maybe/@id", move |ctx: &mut RequestContext<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.not_found();
        })
        .unwrap();

    assert_eq!(get(&router, "/maybe/1").status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/maybe/1").status(), StatusCode::NOT_FOUND);
    // the second request went straight to the fallback
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_error_is_not_cached() {
    let router = router();
    router
        .get("/fail", |ctx: &mut RequestContext<'_>| ctx.error("disk on fire"))
        .unwrap();

    let response = get(&router, "/fail");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body_text(), "500 internal server error");

    let resolved = router.resolve(&Method::GET, "/fail");
    assert_eq!(resolved.route.kind(), RouteKind::Normal);
}

#[test]
fn test_first_status_wins() {
    let router = router();
    router
        .get("/created", |ctx: &mut RequestContext<'_>| {
            ctx.status(StatusCode::CREATED);
            ctx.write("made");
            ctx.status(StatusCode::ACCEPTED);
        })
        .unwrap();

    let response = get(&router, "/created");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body_text(), "made");
}

#[test]
fn test_handler_markup_is_preprocessed() {
    let router = router_with(RouterConfig::default(), &[("BETA", "1")]);
    router
        .get("/page", |ctx: &mut RequestContext<'_>| {
            ctx.set_markup("<p><!-- if $BETA { beta } --><!-- if !$BETA { stable } --></p>");
        })
        .unwrap();

    let response = get(&router, "/page");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body_text(), "<p>beta</p>");
    assert!(router.document_cache().is_empty());
}

#[test]
fn test_invalid_route_is_rejected() {
    let router = router();
    assert!(router.get("/users/(", reply("x")).is_err());
    assert!(router.get("/users/(admin|root)", reply("x")).is_err());
    assert_eq!(router.table().len(Tier::Primary), 0);
}

#[test]
fn test_log_sink_receives_request_lines() {
    let router = router();
    let logs = LogBuffer::default();
    router.set_log_sink(logs.dispatch());
    router.get("/quiet", reply("q")).unwrap();
    router
        .get("/fail", |ctx: &mut RequestContext<'_>| ctx.error("disk on fire"))
        .unwrap();

    // errors are logged at every level
    get(&router, "/quiet");
    get(&router, "/fail");
    let output = logs.contents();
    assert!(!output.contains("/quiet"));
    assert!(output.contains("disk on fire"));

    router.set_log_level(LogLevel::Info);
    assert_eq!(router.log_level(), LogLevel::Info);
    get(&router, "/quiet");
    let output = logs.contents();
    assert!(output.contains("/quiet"));
    assert!(output.contains("status=200"));
}

#[test]
fn test_log_sink_receives_router_diagnostics() {
    let router = router();
    let logs = LogBuffer::default();
    router.set_log_sink(logs.dispatch());
    router.set_log_level(LogLevel::Debug);
    router
        .get("/twice", |ctx: &mut RequestContext<'_>| {
            ctx.status(StatusCode::CREATED);
            ctx.status(StatusCode::ACCEPTED);
        })
        .unwrap();

    assert_eq!(get(&router, "/twice").status(), StatusCode::CREATED);
    let output = logs.contents();
    assert!(output.contains("Log sink installed"));
    assert!(output.contains("no_cache=false"));
    assert!(output.contains("Creating route"));
    assert!(output.contains("Superfluous status write"));
    assert!(output.contains("ignored=202"));
}

#[test]
fn test_concurrent_dispatch() {
    let router = Arc::new(router());
    router
        .get("/n/@id", |ctx: &mut RequestContext<'_>| {
            let body = ctx.param("id").to_string();
            ctx.write(body);
        })
        .unwrap();

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let router = router.clone();
            std::thread::spawn(move || {
                for j in 0..50 {
                    let id = format!("{}", i * 100 + j % 5);
                    let response = get(&router, &format!("/n/{}", id));
                    assert_eq!(response.body_text(), id);
                    if j % 10 == 0 {
                        router.invalidate("/n/@id").unwrap();
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
