//! End-to-end flows against a running server (`cargo run` or `spin up`).
//! Run with `cargo test --test integration -- --ignored`.

use serde_json::{json, Value};
use std::sync::Mutex;

const BASE_URL: &str = "http://127.0.0.1:3000";
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn lock_test() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

async fn signup_and_login(client: &reqwest::Client, prefix: &str) -> (String, String) {
    let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[0..8]);
    let creds = json!({ "username": username, "password": "test" });

    let user_resp = client
        .post(format!("{}/users", BASE_URL))
        .json(&creds)
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(user_resp.status(), 201);
    let user = user_resp.json::<Value>().await.unwrap();
    let user_id = user["data"]["id"].as_str().unwrap().to_string();

    let login_resp = client
        .post(format!("{}/login", BASE_URL))
        .json(&creds)
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(login_resp.status(), 200);
    let token_data = login_resp.json::<Value>().await.unwrap();
    let token = token_data["data"]["token"].as_str().unwrap().to_string();

    (user_id, token)
}

async fn send(
    client: &reqwest::Client,
    method: reqwest::Method,
    path: &str,
    token: &str,
    body: Value,
) -> (u16, Value) {
    let resp = client
        .request(method, format!("{}{}", BASE_URL, path))
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status().as_u16();
    (status, resp.json::<Value>().await.unwrap())
}

#[ignore]
#[tokio::test]
async fn test_delete_post_cascade_flow() {
    let _lock = lock_test();
    let client = reqwest::Client::new();
    let (author_id, author) = signup_and_login(&client, "author").await;
    let (_, reader) = signup_and_login(&client, "reader").await;

    // 1. Author publishes
    let (status, post) = send(&client, reqwest::Method::POST, "/posts", &author, json!({
        "content": "Cascade test post",
        "images": ["cloud://a.png"],
        "tags": ["test"]
    })).await;
    assert_eq!(status, 201);
    assert_eq!(post["data"]["user_id"], author_id);
    let post_id = post["data"]["id"].as_str().unwrap().to_string();

    // 2. Reader comments, likes the post and the comment
    let (status, comment) = send(&client, reqwest::Method::POST, &format!("/posts/{}/comments", post_id), &reader, json!({
        "content": "Nice one"
    })).await;
    assert_eq!(status, 201);
    let comment_id = comment["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&client, reqwest::Method::POST, &format!("/posts/{}/like", post_id), &reader, json!({})).await;
    assert_eq!(status, 200);
    let (status, liked) = send(&client, reqwest::Method::POST, &format!("/comments/{}/like", comment_id), &reader, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(liked["data"]["like_count"], 1);

    // 3. Reader cannot delete
    let (status, denied) = send(&client, reqwest::Method::DELETE, &format!("/posts/{}", post_id), &reader, json!({})).await;
    assert_eq!(status, 403);
    assert_eq!(denied["success"], false);

    // 4. Author deletes, twice
    let (status, deleted) = send(&client, reqwest::Method::DELETE, &format!("/posts/{}", post_id), &author, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(deleted["data"]["cascade"]["post_likes"]["affected"], 1);
    assert_eq!(deleted["data"]["cascade"]["comment_likes"]["affected"], 1);

    let (status, again) = send(&client, reqwest::Method::DELETE, &format!("/posts/{}", post_id), &author, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(again["data"]["already_deleted"], true);

    // 5. Post reads back emptied with no likes
    let (status, fetched) = send(&client, reqwest::Method::GET, &format!("/posts/{}", post_id), &author, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["data"]["is_deleted"], true);
    assert_eq!(fetched["data"]["content"], "");
    assert_eq!(fetched["data"]["images"], json!([]));
    assert_eq!(fetched["data"]["like_count"], 0);
}

#[ignore]
#[tokio::test]
async fn test_comment_unlike_is_idempotent() {
    let _lock = lock_test();
    let client = reqwest::Client::new();
    let (_, author) = signup_and_login(&client, "unlike_author").await;

    let (_, post) = send(&client, reqwest::Method::POST, "/posts", &author, json!({ "content": "Unlike me" })).await;
    let post_id = post["data"]["id"].as_str().unwrap().to_string();
    let (_, comment) = send(&client, reqwest::Method::POST, &format!("/posts/{}/comments", post_id), &author, json!({
        "content": "self comment"
    })).await;
    let comment_id = comment["data"]["id"].as_str().unwrap().to_string();
    let like_path = format!("/comments/{}/like", comment_id);

    let (status, _) = send(&client, reqwest::Method::POST, &like_path, &author, json!({})).await;
    assert_eq!(status, 200);

    for _ in 0..2 {
        let (status, unliked) = send(&client, reqwest::Method::DELETE, &like_path, &author, json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(unliked["data"], json!({ "is_liked": false, "like_count": 0 }));
    }
}

#[ignore]
#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("{}/posts/{}", BASE_URL, uuid::Uuid::new_v4()))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 401);

    let body = resp.json::<Value>().await.unwrap();
    assert_eq!(body["success"], false);
}
