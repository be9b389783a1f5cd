use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use popsicle_api::{router, ApiState, App};
use popsicle_core::{
    InMemoryPopsicleRepository, Popsicle, PopsicleId, PopsicleRepository, RepoError, RepoResult,
    SharedRepository,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE: &str = "/PopsicleInventory";

fn app() -> App {
    app_with(Arc::new(InMemoryPopsicleRepository::seeded()))
}

fn app_with(repo: SharedRepository) -> App {
    router(ApiState::new(repo, BASE))
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

async fn call(app: &App, method: Method, uri: &str, body: Option<&str>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        headers,
        body: body.to_vec(),
    }
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn list_returns_seeded_inventory() {
    let app = app();
    let reply = call(&app, Method::GET, BASE, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(ids(&body), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        body[0],
        json!({
            "id": 1,
            "name": "Nicollete path hole",
            "flavour": "Chocolate",
            "price": 15,
            "quantity": 15
        })
    );
}

#[tokio::test]
async fn get_by_id_and_missing_id() {
    let app = app();

    let found = call(&app, Method::GET, &format!("{BASE}/3"), None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.json()["name"], "Duval style");

    let missing = call(&app, Method::GET, &format!("{BASE}/999"), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body.is_empty());
}

#[tokio::test]
async fn non_numeric_id_does_not_match() {
    let app = app();

    let get = call(&app, Method::GET, &format!("{BASE}/abc"), None).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert!(get.body.is_empty());

    let put = call(
        &app,
        Method::PUT,
        &format!("{BASE}/1.5"),
        Some(r#"{"id":1,"name":"x","flavour":"y","price":1,"quantity":1}"#),
    )
    .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);

    let delete = call(&app, Method::DELETE, &format!("{BASE}/abc"), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trailing_slash_routes_like_bare_path() {
    let app = app();

    let list = call(&app, Method::GET, &format!("{BASE}/"), None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(ids(&list.json()), vec![1, 2, 3, 4, 5]);

    let created = call(
        &app,
        Method::POST,
        &format!("{BASE}/"),
        Some(r#"{"id":8,"name":"Peach Swirl","flavour":"Peach","price":9,"quantity":3}"#),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["id"], 6);

    let fetched = call(&app, Method::GET, &format!("{BASE}/1/"), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json()["flavour"], "Chocolate");

    let searched = call(&app, Method::GET, &format!("{BASE}/search/vanilla/"), None).await;
    assert_eq!(searched.status, StatusCode::OK);
    assert_eq!(ids(&searched.json()), vec![2]);
}

#[tokio::test]
async fn create_assigns_next_id_and_sets_location() {
    let app = app();
    let reply = call(
        &app,
        Method::POST,
        BASE,
        Some(r#"{"id":42,"name":"Mint Chip","flavour":"Mint","price":12,"quantity":7}"#),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        reply.headers.get(header::LOCATION).unwrap(),
        "/PopsicleInventory/6"
    );
    assert_eq!(
        reply.json(),
        json!({"id": 6, "name": "Mint Chip", "flavour": "Mint", "price": 12, "quantity": 7})
    );

    let fetched = call(&app, Method::GET, &format!("{BASE}/6"), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json()["flavour"], "Mint");
}

#[tokio::test]
async fn create_without_body_is_bad_request() {
    let app = app();

    for body in [None, Some("null")] {
        let reply = call(&app, Method::POST, BASE, body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.text(), "Popsicle data is required");
    }
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = app();
    let reply = call(&app, Method::POST, BASE, Some("{\"id\": 7,")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.text().starts_with("Malformed popsicle JSON"));
}

#[tokio::test]
async fn create_with_invalid_fields_lists_every_failure() {
    let app = app();
    let reply = call(
        &app,
        Method::POST,
        BASE,
        Some(r#"{"id":0,"name":"  ","flavour":"","price":51,"quantity":1}"#),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let body = reply.json();
    let properties: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|failure| failure["propertyName"].as_str().unwrap())
        .collect();
    assert_eq!(properties, vec!["Id", "Name", "Price", "Flavour"]);
    assert_eq!(body[2]["errorMessage"], "'Price' must be between 0 and 50. You entered 51.");
    assert_eq!(body[2]["attemptedValue"], 51);

    let list = call(&app, Method::GET, BASE, None).await;
    assert_eq!(ids(&list.json()).len(), 5);
}

#[tokio::test]
async fn create_with_taken_id_conflicts() {
    let app = app();
    let reply = call(
        &app,
        Method::POST,
        BASE,
        Some(r#"{"id":1,"name":"Copy","flavour":"Chocolate","price":15,"quantity":1}"#),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.text(), "Popsicle with ID 1 already exists.");
}

#[tokio::test]
async fn search_matches_name_or_flavour_ignoring_case() {
    let app = app();

    let flavour = call(&app, Method::GET, &format!("{BASE}/search/chocolate"), None).await;
    assert_eq!(flavour.status, StatusCode::OK);
    assert_eq!(ids(&flavour.json()), vec![1]);

    let name = call(&app, Method::GET, &format!("{BASE}/search/STYLE"), None).await;
    assert_eq!(name.status, StatusCode::OK);
    assert_eq!(ids(&name.json()), vec![2, 3, 4, 5]);
}

#[tokio::test]
async fn search_without_hits_is_not_found() {
    let app = app();
    let reply = call(&app, Method::GET, &format!("{BASE}/search/pistachio"), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_without_term_is_bad_request() {
    let app = app();

    for uri in [format!("{BASE}/search"), format!("{BASE}/search/")] {
        let reply = call(&app, Method::GET, &uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "uri={uri}");
        assert_eq!(reply.text(), "Search item cannot be null or empty");
    }
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = app();
    let reply = call(
        &app,
        Method::PUT,
        &format!("{BASE}/2"),
        Some(r#"{"id":2,"name":"Durham classic","flavour":"Vanilla Bean","price":11,"quantity":4}"#),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"id": 2, "name": "Durham classic", "flavour": "Vanilla Bean", "price": 11, "quantity": 4})
    );

    let fetched = call(&app, Method::GET, &format!("{BASE}/2"), None).await;
    assert_eq!(fetched.json()["quantity"], 4);
}

#[tokio::test]
async fn update_with_mismatched_or_missing_body_is_bad_request() {
    let app = app();

    let mismatch = call(
        &app,
        Method::PUT,
        &format!("{BASE}/2"),
        Some(r#"{"id":3,"name":"Other","flavour":"Vanilla","price":10,"quantity":1}"#),
    )
    .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.text(), "Invalid popsicle data");

    let missing = call(&app, Method::PUT, &format!("{BASE}/2"), None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.text(), "Invalid popsicle data");
}

#[tokio::test]
async fn update_checks_validation_before_existence() {
    let app = app();

    let invalid = call(
        &app,
        Method::PUT,
        &format!("{BASE}/77"),
        Some(r#"{"id":77,"name":"","flavour":"Lime","price":5,"quantity":1}"#),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json()[0]["propertyName"], "Name");

    let absent = call(
        &app,
        Method::PUT,
        &format!("{BASE}/77"),
        Some(r#"{"id":77,"name":"Lime","flavour":"Lime","price":5,"quantity":1}"#),
    )
    .await;
    assert_eq!(absent.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_record_once() {
    let app = app();

    let first = call(&app, Method::DELETE, &format!("{BASE}/4"), None).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert!(first.body.is_empty());

    let second = call(&app, Method::DELETE, &format!("{BASE}/4"), None).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);

    let list = call(&app, Method::GET, BASE, None).await;
    assert_eq!(ids(&list.json()), vec![1, 2, 3, 5]);
}

#[tokio::test]
async fn error_route_returns_problem_document() {
    let app = app();
    let reply = call(&app, Method::GET, "/error", None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(
        reply.json(),
        json!({
            "type": "https://tools.ietf.org/html/rfc9110#section-15.6.1",
            "title": "An unknown error",
            "status": 500
        })
    );
}

#[tokio::test]
async fn routes_mount_at_root_when_base_path_is_empty() {
    let app = router(ApiState::new(
        Arc::new(InMemoryPopsicleRepository::seeded()),
        "/",
    ));

    let list = call(&app, Method::GET, "/", None).await;
    assert_eq!(list.status, StatusCode::OK);

    let created = call(
        &app,
        Method::POST,
        "/",
        Some(r#"{"id":9,"name":"Lemon","flavour":"Lemon","price":3,"quantity":2}"#),
    )
    .await;
    assert_eq!(created.headers.get(header::LOCATION).unwrap(), "/6");

    let unmounted = call(&app, Method::GET, BASE, None).await;
    assert_eq!(unmounted.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let app = app();
    let reply = call(&app, Method::GET, "/Inventory", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

/// Store whose reads fail or panic, for exercising the 500 paths.
struct BrokenRepository {
    panic: bool,
}

impl BrokenRepository {
    fn fail(&self) -> RepoError {
        if self.panic {
            panic!("storage exploded at row 3");
        }
        RepoError::Poisoned("test store")
    }
}

impl PopsicleRepository for BrokenRepository {
    fn search_popsicles(&self, _term: &str) -> RepoResult<Vec<Popsicle>> {
        Err(self.fail())
    }

    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>> {
        Err(self.fail())
    }

    fn get_popsicle(&self, _id: PopsicleId) -> RepoResult<Option<Popsicle>> {
        Err(self.fail())
    }

    fn create_popsicle(&self, _popsicle: &Popsicle) -> RepoResult<Popsicle> {
        Err(self.fail())
    }

    fn update_popsicle(&self, _popsicle: &Popsicle) -> RepoResult<Popsicle> {
        Err(self.fail())
    }

    fn delete_popsicle(&self, _id: PopsicleId) -> RepoResult<bool> {
        Err(self.fail())
    }
}

#[tokio::test]
async fn storage_failure_is_internal_error_with_message() {
    let app = app_with(Arc::new(BrokenRepository { panic: false }));
    let reply = call(&app, Method::GET, BASE, None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.text(),
        "Internal server error: test store lock poisoned by an earlier panic"
    );
}

#[tokio::test]
async fn handler_panic_becomes_problem_document() {
    let app = app_with(Arc::new(BrokenRepository { panic: true }));
    let reply = call(&app, Method::GET, &format!("{BASE}/1"), None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = reply.json();
    assert_eq!(body["title"], "An error occurred while processing your request.");
    assert_eq!(body["status"], 500);
    assert_eq!(body["detail"], "storage exploded at row 3");

    // The router keeps serving after a panic.
    let again = call(&app, Method::GET, &format!("{BASE}/2"), None).await;
    assert_eq!(again.status, StatusCode::INTERNAL_SERVER_ERROR);
}
