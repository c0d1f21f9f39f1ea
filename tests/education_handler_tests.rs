
use portfolio_education::{
    api_errors::ApiError,
    entities::education::{EducationRecord, RecordId},
    settings::AppConfig,
    storage::key_value::{KeyValueStorage, MemoryStorage},
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

fn mit_body() -> Value {
    json!({ "school": "MIT", "startYM": "2020-09", "current": true })
}

#[actix_rt::test]
async fn create_offline_returns_local_record() {
    let app = TestApp::spawn(FakeEducationApi::owner().failing(ApiError::offline("unreachable"))).await;

    let response = app.client
        .post(app.url("/education/form"))
        .json(&mit_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["used_local"], true);
    assert_eq!(body["redirect_to"], "/education");
    assert_eq!(body["record"]["school"], "MIT");
    assert_eq!(body["record"]["endYear"], Value::Null);
    assert_eq!(app.local_records().len(), 1);
}

#[actix_rt::test]
async fn update_goes_to_remote_when_available() {
    let existing = EducationRecord {
        id: Some(RecordId::Number(4)),
        school: Some("Harvard".into()),
        ..Default::default()
    };
    let app = TestApp::spawn(FakeEducationApi::owner().with_records(vec![existing])).await;

    let response = app.client
        .put(app.url("/education/form/4"))
        .json(&mit_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["used_local"], false);
    assert_eq!(app.api.records.lock()[0].school.as_deref(), Some("MIT"));
    assert!(app.local_records().is_empty());
}

#[actix_rt::test]
async fn invalid_form_is_unprocessable() {
    let app = TestApp::spawn(FakeEducationApi::owner()).await;

    let response = app.client
        .post(app.url("/education/form"))
        .json(&json!({ "school": "", "startYM": "2020-09" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "School is required");
    assert_eq!(body["details"][0]["field"], "school");
    assert_eq!(app.api.write_calls(), 0);
}

#[actix_rt::test]
async fn remote_rejection_is_forwarded() {
    let app = TestApp::spawn(
        FakeEducationApi::owner().failing(ApiError::with_status(403, "403 Forbidden")),
    )
    .await;

    let response = app.client
        .post(app.url("/education/form"))
        .json(&mit_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "403 Forbidden");
    assert!(app.local_records().is_empty());
}

#[actix_rt::test]
async fn viewer_is_refused_form() {
    let app = TestApp::spawn(FakeEducationApi::default()).await;

    let response = app.client.get(app.url("/education/form")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.client.get(app.url("/education/form/1")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Adding and editing is disabled in viewer mode");
}

#[actix_rt::test]
async fn stored_owner_toggle_overrides_profile() {
    let storage = MemoryStorage::new();
    storage.set("ownerMode", "true").unwrap();
    let app = TestApp::spawn_with(test_config(), FakeEducationApi::default(), storage).await;

    let response = app.client.get(app.url("/education/form")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["editing"], false);
    assert_eq!(app.api.profile_calls(), 0);
}

#[actix_rt::test]
async fn load_missing_record_is_not_found() {
    let app = TestApp::spawn(FakeEducationApi::owner()).await;

    let response = app.client.get(app.url("/education/form/99")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Education record not found");
}

#[actix_rt::test]
async fn list_falls_back_on_missing_endpoint() {
    let app = TestApp::spawn(
        FakeEducationApi::owner().failing(ApiError::with_status(404, "404 Not Found")),
    )
    .await;
    app.client
        .post(app.url("/education/form"))
        .json(&mit_body())
        .send()
        .await
        .unwrap();

    let response = app.client.get(app.url("/education")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["used_local"], true);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn check_reports_date_conflict_and_level() {
    let app = TestApp::spawn(FakeEducationApi::default()).await;

    let response = app.client
        .post(app.url("/education/form/check"))
        .json(&json!({
            "school": "MIT",
            "degree": "MSc Robotics",
            "startYM": "2020-09",
            "endYM": "2019-06"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["date_error"], "End date must be after start date.");
    assert_eq!(body["level_suggestion"], "Master");
}

#[actix_rt::test]
async fn lookup_endpoints() {
    let app = TestApp::spawn(FakeEducationApi::default()).await;

    let level: Value = app.client
        .get(app.url("/education/level?degree=B.Sc%20Physics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(level["suggestion"], "Bachelor");

    let schools: Vec<String> = app.client
        .get(app.url("/education/suggestions?kind=school&q=harv"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(schools.iter().any(|s| s.contains("Harvard")));

    let response = app.client
        .get(app.url("/education/suggestions?kind=planet&q=ma"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let picker: Value = app.client
        .get(app.url("/education/picker"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let years: Vec<i64> = picker["years"].as_array().unwrap().iter().map(|y| y.as_i64().unwrap()).collect();
    assert_eq!(years.last(), Some(&1970));
    assert!(years.windows(2).all(|w| w[0] == w[1] + 1));
    assert_eq!(picker["months"].as_array().unwrap().len(), 12);
    assert_eq!(picker["levels"].as_array().unwrap().len(), 9);
}

#[actix_rt::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::spawn(FakeEducationApi::owner()).await;

    let response = app.client
        .post(app.url("/education/form"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("JSON payload error"));
}

#[actix_rt::test]
async fn health_reports_remote_and_cache() {
    let config = AppConfig { owner_mode: Some(true), ..test_config() };
    let app = TestApp::spawn_with(
        config,
        FakeEducationApi::default().failing(ApiError::offline("down")),
        MemoryStorage::new(),
    )
    .await;

    let body: Value = app.client
        .get(app.url("/admin/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["remote_api"], "Unreachable");
    assert_eq!(body["owner_mode"], "ForcedOn");
    assert_eq!(body["local_records"], 0);
}
