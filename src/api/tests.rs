#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use super::*;
use crate::{
    api::state::AppState,
    config::AppConfig,
    errors::Result,
    services::{CacheHandle, DisabledModel, LlmHandle, MemoryReplyCache},
    test_utils::{init_test_tracing, setup_test_db},
};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

async fn test_app() -> Result<Router> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let state = AppState::from_parts(
        db,
        CacheHandle::new(MemoryReplyCache::default()),
        LlmHandle::new(DisabledModel),
        AppConfig::default(),
    );
    Ok(router(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-id", user);
    }
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn sign_up(app: &Router, id: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/users/sync",
        Some(id),
        Some(json!({ "email": format!("{id}@example.com"), "name": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn publish_course(app: &Router, instructor: &str, title: &str, price: f64) -> i64 {
    let (status, course) = send(
        app,
        "POST",
        "/api/instructor/courses",
        Some(instructor),
        Some(json!({
            "title": title,
            "description": format!("All about {title}"),
            "category": "Programming",
            "level": "beginner",
            "price": price,
            "is_published": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    course["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_authentication_required() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(&app, "GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");

    // A subject that never synced a profile is not a user yet
    let (status, _) = send(&app, "GET", "/api/users/me", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    sign_up(&app, "ghost").await;
    let (status, me) = send(&app, "GET", "/api/users/me", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "student");
    Ok(())
}

#[tokio::test]
async fn test_students_cannot_author_courses() -> Result<()> {
    let app = test_app().await?;
    sign_up(&app, "student").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/instructor/courses",
        Some("student"),
        Some(json!({ "title": "Rust", "category": "programming", "level": "beginner", "price": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/instructor/dashboard", Some("student"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The role is checked before the target is looked up or the body is read
    let title = json!({ "title": "Intro" });
    let lesson = json!({ "title": "Intro", "duration_seconds": 60 });
    let course = json!({ "title": "Rust", "category": "programming", "level": "beginner", "price": 10.0 });
    let coupon = json!({ "code": "X", "discount_type": "fixed", "value": 1.0 });
    let cases = [
        ("GET", "/api/instructor/courses", None),
        ("PUT", "/api/instructor/courses/999", Some(course)),
        ("DELETE", "/api/instructor/courses/999", None),
        ("POST", "/api/instructor/courses/999/modules", Some(title.clone())),
        ("PUT", "/api/instructor/modules/999", Some(title)),
        ("DELETE", "/api/instructor/modules/999", None),
        ("POST", "/api/instructor/modules/999/lessons", Some(lesson.clone())),
        ("PUT", "/api/instructor/lessons/999", Some(lesson)),
        ("DELETE", "/api/instructor/lessons/999", None),
        ("POST", "/api/instructor/coupons", Some(coupon)),
        ("GET", "/api/instructor/coupons", None),
        ("POST", "/api/instructor/courses", Some(json!({}))),
    ];
    for (method, uri, body) in cases {
        let (status, _) = send(&app, method, uri, Some("student"), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn test_purchase_flow() -> Result<()> {
    let app = test_app().await?;
    sign_up(&app, "mentor").await;
    sign_up(&app, "learner").await;
    let (status, promoted) =
        send(&app, "POST", "/api/instructor/register", Some("mentor"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "instructor");

    let rust = publish_course(&app, "mentor", "Rust", 40.0).await;
    let go = publish_course(&app, "mentor", "Go", 60.0).await;

    let (status, coupon) = send(
        &app,
        "POST",
        "/api/instructor/coupons",
        Some("mentor"),
        Some(json!({ "code": "save10", "discount_type": "percent", "value": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(coupon["code"], "SAVE10");

    let (status, catalogue) = send(&app, "GET", "/api/courses?sort=price_desc", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalogue[0]["title"], "Go");

    for id in [rust, go] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/cart",
            Some("learner"),
            Some(json!({ "course_id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(
        &app,
        "POST",
        "/api/cart",
        Some("learner"),
        Some(json!({ "course_id": rust })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cart) = send(&app, "GET", "/api/cart?coupon=save10", Some("learner"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotal"], 100.0);
    assert_eq!(cart["discount"], 10.0);
    assert_eq!(cart["total"], 90.0);

    let (status, order) = send(
        &app,
        "POST",
        "/api/checkout",
        Some("learner"),
        Some(json!({ "coupon": "SAVE10" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], 90.0);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let (_, cart) = send(&app, "GET", "/api/cart", Some("learner"), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "POST", "/api/checkout", Some("learner"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, enrollments) = send(&app, "GET", "/api/enrollments", Some("learner"), None).await;
    assert_eq!(enrollments.as_array().unwrap().len(), 2);

    let (_, board) = send(&app, "GET", "/api/instructor/dashboard", Some("mentor"), None).await;
    assert_eq!(board["total_students"], 1);
    assert_eq!(board["total_revenue"], 100.0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/instructor/courses/{rust}"),
        Some("mentor"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

async fn send_raw(app: &Router, uri: &str, user: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_checkout_body_is_parsed_strictly() -> Result<()> {
    let app = test_app().await?;
    sign_up(&app, "mentor").await;
    sign_up(&app, "learner").await;
    send(&app, "POST", "/api/instructor/register", Some("mentor"), None).await;
    let course = publish_course(&app, "mentor", "Rust", 100.0).await;
    send(
        &app,
        "POST",
        "/api/instructor/coupons",
        Some("mentor"),
        Some(json!({ "code": "HALF", "discount_type": "percent", "value": 50.0 })),
    )
    .await;
    send(&app, "POST", "/api/cart", Some("learner"), Some(json!({ "course_id": course }))).await;

    for bad in [r#"{"coupon": 5}"#, r#"{"coupon": "HALF""#, "not json"] {
        let (status, body) = send_raw(&app, "/api/checkout", "learner", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert!(body["error"].is_string());
    }
    let (_, orders) = send(&app, "GET", "/api/orders", Some("learner"), None).await;
    assert!(orders.as_array().unwrap().is_empty());

    // A well-formed body is honoured even without a content type
    let (status, order) = send_raw(&app, "/api/checkout", "learner", r#"{"coupon":"HALF"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["coupon_code"], "HALF");
    assert_eq!(order["total"], 50.0);
    Ok(())
}

#[tokio::test]
async fn test_client_errors_use_json_bodies() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(&app, "GET", "/api/courses/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, body) = send(&app, "GET", "/api/courses/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({ "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/coupon/validate",
        None,
        Some(json!({ "code": "NOPE", "subtotal": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_blog_comments() -> Result<()> {
    let app = test_app().await?;
    sign_up(&app, "writer").await;
    sign_up(&app, "reader").await;

    let (status, post) = send(
        &app,
        "POST",
        "/api/blog",
        Some("writer"),
        Some(json!({ "title": "Why Rust?", "content": "Because." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["slug"], "why-rust");

    let (status, top) = send(
        &app,
        "POST",
        "/api/blog/why-rust/comments",
        Some("reader"),
        Some(json!({ "content": "Agreed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    send(
        &app,
        "POST",
        "/api/blog/why-rust/comments",
        Some("writer"),
        Some(json!({ "content": "Thanks", "parent_id": top["id"] })),
    )
    .await;

    let (status, tree) = send(&app, "GET", "/api/blog/why-rust/comments", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["replies"][0]["content"], "Thanks");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/blog/comments/{}", top["id"]),
        Some("writer"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_chat_endpoint() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(&app, "POST", "/api/chat", None, Some(json!({ "message": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/chat",
        None,
        Some(json!({ "message": "Hello!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["intent"], "greeting");
    assert_eq!(reply["cached"], false);
    assert!(!reply["reply"].as_str().unwrap().is_empty());
    Ok(())
}
