mod common;

use std::time::Duration;

use axum::http::StatusCode;
use bookworm_authz::TokenService;
use bookworm_db::{BookId, UserId};
use chrono::TimeDelta;
use common::TestApp;
use rstest::rstest;
use serde_json::json;

/// Ways a bearer credential can fail the session check.
#[derive(Debug, Clone, Copy)]
enum BadCredential {
    Missing,
    Tampered,
    Expired,
    UnknownUser,
}

impl BadCredential {
    /// Derive the bad credential from a working `token`.
    fn token(self, app: &TestApp, token: &str) -> Option<String> {
        match self {
            BadCredential::Missing => None,
            BadCredential::Tampered => Some(format!("{token}x")),
            BadCredential::Expired => {
                let user_id = app.services.tokens.verify(token).unwrap();
                let expired = TokenService::new(common::SECRET, TimeDelta::days(-1));
                Some(expired.issue(&user_id).unwrap())
            }
            BadCredential::UnknownUser => {
                Some(app.services.tokens.issue(&UserId::generate()).unwrap())
            }
        }
    }

    fn message(self) -> &'static str {
        match self {
            BadCredential::Missing | BadCredential::UnknownUser => "Unauthorized access",
            BadCredential::Tampered | BadCredential::Expired => "Token is not valid",
        }
    }
}

#[rstest]
#[case("/api/books")]
#[case("/api/books/user")]
#[tokio::test]
async fn book_routes_require_a_session(#[case] uri: &str) {
    let app = TestApp::new();

    let response = app.get(uri, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Unauthorized access");
}

#[tokio::test]
async fn tampered_token_is_not_valid() {
    let app = TestApp::new();
    let token = app.register("abc").await;

    let response = app.get("/api/books", Some(&format!("{token}x"))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Token is not valid");
}

#[rstest]
#[tokio::test]
async fn create_rejects_bad_session_before_upload(
    #[values(
        BadCredential::Missing,
        BadCredential::Tampered,
        BadCredential::Expired,
        BadCredential::UnknownUser
    )]
    credential: BadCredential,
) {
    let app = TestApp::new();
    let token = app.register("abc").await;
    let bad = credential.token(&app, &token);

    let response = app
        .post(
            "/api/books",
            bad.as_deref(),
            json!({"title": "Dune", "caption": "Spice", "image": "data:image/png;base64,AA==", "rating": 5}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], credential.message());
    assert!(app.media.is_empty().await);
    assert_eq!(app.services.books.count().await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn delete_rejects_bad_session_and_keeps_book(
    #[values(
        BadCredential::Missing,
        BadCredential::Tampered,
        BadCredential::Expired,
        BadCredential::UnknownUser
    )]
    credential: BadCredential,
) {
    let app = TestApp::new();
    let token = app.register("abc").await;
    let id = app.create_book(&token, "Dune").await;
    let bad = credential.token(&app, &token);

    let response = app
        .delete(&format!("/api/books/{id}"), bad.as_deref())
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], credential.message());
    let id: BookId = id.parse().unwrap();
    assert!(app.services.books.find_by_id(&id).await.unwrap().is_some());
    assert_eq!(app.media.len().await, 1);
}

#[tokio::test]
async fn create_stores_hosted_url_and_owner() {
    let app = TestApp::new();
    let token = app.register("abc").await;
    let payload = "data:image/png;base64,iVBORw0KGgo=";

    let response = app
        .post(
            "/api/books",
            Some(&token),
            json!({"title": "Dune", "caption": "Spice", "image": payload, "rating": 5}),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let image = response.body["image"].as_str().unwrap();
    assert_ne!(image, payload);
    assert!(app.media.contains(image).await);
    assert_eq!(response.body["rating"], 5);

    let owner = app.services.tokens.verify(&token).unwrap();
    assert_eq!(response.body["user"], owner.to_string());
}

#[rstest]
#[case(json!({"caption": "c", "image": "i", "rating": 3}), "All fields are required")]
#[case(json!({"title": "t", "caption": "c", "image": "i", "rating": 0}), "All fields are required")]
#[case(json!({"title": "t", "caption": "c", "image": "", "rating": 3}), "All fields are required")]
#[case(json!({"title": "t", "caption": "c", "image": "i", "rating": 6}), "Rating must be between 1 and 5")]
#[case(json!({"title": "t", "caption": "c", "image": "i", "rating": -2}), "Rating must be between 1 and 5")]
#[tokio::test]
async fn create_validates_before_upload(#[case] body: serde_json::Value, #[case] message: &str) {
    let app = TestApp::new();
    let token = app.register("abc").await;

    let response = app.post("/api/books", Some(&token), body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], message);
    assert!(app.media.is_empty().await);
}

#[tokio::test]
async fn feed_is_paged_newest_first_with_owner() {
    let app = TestApp::new();
    let token = app.register("abc").await;
    for n in 1..=5 {
        app.create_book(&token, &format!("book-{n}")).await;
    }

    let response = app.get("/api/books?page=2&limit=2", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["currentPage"], 2);
    assert_eq!(response.body["totalBooks"], 5);
    assert_eq!(response.body["totalPages"], 3);

    let books = response.body["books"].as_array().unwrap();
    let titles: Vec<_> = books.iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["book-3", "book-2"]);
    assert_eq!(books[0]["user"]["username"], "abc");
    assert!(books[0]["user"]["profileImage"].is_string());
    assert!(books[0]["user"].get("email").is_none());
}

#[tokio::test]
async fn feed_defaults_and_tolerates_junk_paging() {
    let app = TestApp::new();
    let token = app.register("abc").await;
    app.create_book(&token, "only").await;

    let response = app
        .get("/api/books?page=abc&limit=-3", Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["currentPage"], 1);
    assert_eq!(response.body["totalPages"], 1);
    assert_eq!(response.body["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn my_books_only_lists_callers_books() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    app.create_book(&alice, "first").await;
    app.create_book(&bob, "other").await;
    app.create_book(&alice, "second").await;

    let response = app.get("/api/books/user", Some(&alice)).await;

    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<_> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["second", "first"]);
}

#[tokio::test]
async fn owner_deletes_book_and_its_image() {
    let app = TestApp::new();
    let token = app.register("abc").await;
    let id = app.create_book(&token, "Dune").await;

    let response = app.delete(&format!("/api/books/{id}"), Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Book deleted successfully");
    assert!(app.media.is_empty().await);
    let id: BookId = id.parse().unwrap();
    assert!(app.services.books.find_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn non_owner_cannot_delete() {
    let app = TestApp::new();
    let owner = app.register("alice").await;
    let intruder = app.register("mallory").await;
    let id = app.create_book(&owner, "Dune").await;

    let response = app.delete(&format!("/api/books/{id}"), Some(&intruder)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body["message"],
        "You are not authorized to delete this book"
    );
    let id: BookId = id.parse().unwrap();
    assert!(app.services.books.find_by_id(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_image_cleanup_keeps_the_book() {
    let app = TestApp::new();
    let token = app.register("abc").await;
    let id = app.create_book(&token, "Dune").await;
    app.media.set_fail_deletes(true);

    let response = app.delete(&format!("/api/books/{id}"), Some(&token)).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body["message"],
        "Error deleting image from Cloudinary"
    );
    let id: BookId = id.parse().unwrap();
    assert!(app.services.books.find_by_id(&id).await.unwrap().is_some());
    assert_eq!(app.media.len().await, 1);
}

#[rstest]
#[case("not-a-book-id")]
#[case("%FF")]
#[case("0190f5a4-2b7c-7d3e-9a41-1c2d3e4f5a6b")]
#[tokio::test]
async fn deleting_unknown_book_is_not_found(#[case] id: &str) {
    let app = TestApp::new();
    let token = app.register("abc").await;

    let response = app.delete(&format!("/api/books/{id}"), Some(&token)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Book not found");
}

#[tokio::test]
async fn slow_upload_times_out_with_json_message() {
    let app = TestApp::with_slow_uploads(Duration::from_secs(2), 200);
    let token = app.register("abc").await;

    let response = app
        .post(
            "/api/books",
            Some(&token),
            json!({"title": "Dune", "caption": "Spice", "image": "data:image/png;base64,AA==", "rating": 5}),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!({"message": "Internal server error"}));
    assert_eq!(app.services.books.count().await.unwrap(), 0);
}

#[tokio::test]
async fn openapi_document_lists_mounted_routes() {
    let app = TestApp::new();

    let response = app.get("/docs/openapi.json", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let paths = response.body["paths"].as_object().unwrap();
    for path in [
        "/api/auth/register",
        "/api/auth/login",
        "/api/books",
        "/api/books/user",
        "/api/books/{id}",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
