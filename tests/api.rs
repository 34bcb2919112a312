mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{encode_image, TestEnv};
use http_body_util::BodyExt;
use image::ImageFormat;
use imagely_api::{create_app, services::auth::AuthService};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "imagely-test-boundary";

fn app(env: &TestEnv) -> Router {
    create_app(env.app_state())
}

fn bearer(env: &TestEnv, user_id: i32) -> String {
    let token = AuthService::create_access_token(user_id, "tester", &env.config().jwt).unwrap();
    format!("Bearer {token}")
}

fn multipart_body(name: &str, image: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, value) in [("status", "true"), ("name", name), ("description", "Urlaub")] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"teaser.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn create_request(env: &TestEnv, user_id: i32, name: &str) -> Request<Body> {
    Request::post("/v2/galleries")
        .header(header::AUTHORIZATION, bearer(env, user_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            name,
            &encode_image(80, 40, ImageFormat::Png),
        )))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_gallery_list() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(Request::get("/v2/galleries").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn create_requires_login() {
    let env = TestEnv::new().await;
    let mut request = create_request(&env, 1, "Ohne Login");
    request.headers_mut().remove(header::AUTHORIZATION);

    let response = app(&env).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_fetch_gallery() {
    let env = TestEnv::new().await;

    let response = app(&env)
        .oneshot(create_request(&env, 4, "Berge & Seen"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = json_body(response).await;
    assert_eq!(created["author"], 4);
    assert_eq!(created["name"], "Berge & Seen");
    let id = created["id"].as_i64().unwrap();
    assert_eq!(
        created["teaserImageThumbnail1"],
        format!("/data/media/gallery/4/{id}/teaserImage.small.thumb.png")
    );

    let response = app(&env)
        .oneshot(
            Request::get(format!("/v2/galleries/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["description"], "Urlaub");
}

#[tokio::test]
async fn missing_gallery_returns_404() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(Request::get("/v2/galleries/999").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ownership_redirects_strangers() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(create_request(&env, 1, "Privat"))
        .await
        .unwrap();
    let id = json_body(response).await["id"].as_i64().unwrap();
    let uri = format!("/v2/galleries/{id}/ownership?redirect=/login");

    let anonymous = app(&env)
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.headers()[header::LOCATION], "/login");

    let stranger = app(&env)
        .oneshot(
            Request::get(&uri)
                .header(header::AUTHORIZATION, bearer(&env, 2))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stranger.status(), StatusCode::SEE_OTHER);

    let owner = app(&env)
        .oneshot(
            Request::get(&uri)
                .header(header::AUTHORIZATION, bearer(&env, 1))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(owner.status(), StatusCode::OK);
    assert_eq!(json_body(owner).await["owned"], true);
}

#[tokio::test]
async fn only_owner_may_edit() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(create_request(&env, 1, "Alt"))
        .await
        .unwrap();
    let id = json_body(response).await["id"].as_i64().unwrap();

    let edit = |user_id: i32| {
        Request::put(format!("/v2/galleries/{id}"))
            .header(header::AUTHORIZATION, bearer(&env, user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"status":false,"name":"Neu","description":"","modified_date":1500000000}"#,
            ))
            .unwrap()
    };

    let response = app(&env).oneshot(edit(2)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&env).oneshot(edit(1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Neu");
    assert_eq!(body["status"], false);
    assert_eq!(body["modifiedDate"], "14.07.2017 02:40");
}

#[tokio::test]
async fn users_delete_only_their_own_galleries() {
    let env = TestEnv::new().await;
    app(&env)
        .oneshot(create_request(&env, 1, "eins"))
        .await
        .unwrap();

    let delete = |as_user: i32| {
        Request::delete("/v2/users/1/galleries")
            .header(header::AUTHORIZATION, bearer(&env, as_user))
            .body(Body::empty())
            .unwrap()
    };

    let response = app(&env).oneshot(delete(2)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&env).oneshot(delete(1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], 1);
}

#[tokio::test]
async fn luminance_rejects_zero_samples() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(create_request(&env, 1, "hell"))
        .await
        .unwrap();
    let id = json_body(response).await["id"].as_i64().unwrap();

    let response = app(&env)
        .oneshot(
            Request::get(format!("/v2/galleries/{id}/teaser/luminance?samples=0"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&env)
        .oneshot(
            Request::get(format!("/v2/galleries/{id}/teaser/luminance"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["luminance"].as_f64().is_some());
}

#[tokio::test]
async fn ownership_refuses_foreign_redirect_targets() {
    let env = TestEnv::new().await;
    let response = app(&env)
        .oneshot(create_request(&env, 1, "Privat"))
        .await
        .unwrap();
    let id = json_body(response).await["id"].as_i64().unwrap();

    for redirect in [
        "https://evil.example/phish",
        "//evil.example/phish",
        "/%5Cevil.example",
        "/a%0d%0aSet-Cookie:x=1",
    ] {
        let response = app(&env)
            .oneshot(
                Request::get(format!("/v2/galleries/{id}/ownership?redirect={redirect}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{redirect}");
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}

#[tokio::test]
async fn create_rejects_overlong_name() {
    let env = TestEnv::new().await;

    let response = app(&env)
        .oneshot(create_request(&env, 1, &"x".repeat(256)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&env)
        .oneshot(create_request(&env, 1, &"&".repeat(100)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&env)
        .oneshot(Request::get("/v2/galleries").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(response).await, serde_json::json!([]));
}
