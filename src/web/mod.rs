// src/web/mod.rs

pub mod handlers;
pub mod registry;
pub mod session;
pub mod types;

pub use registry::ReviewRegistry;
pub use session::{CompanyIdentity, COMPANY_HEADER};
pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::info;

use crate::core::{ReviewApi, ServiceClient};
use crate::environment::ReviewConfig;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[get("/candidates?<search>&<status>&<sort>&<direction>&<reload>")]
pub async fn list_candidates(
    search: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
    reload: Option<bool>,
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Result<Json<DataResponse<CandidateListData>>, ApiError> {
    let params = handlers::ListParams {
        search,
        status,
        sort,
        direction,
        reload: reload.unwrap_or(false),
    };
    handlers::list_candidates_handler(params, identity, registry).await
}

#[post("/candidates/decision", data = "<body>")]
pub async fn decide(
    body: Json<DecisionBody>,
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::decide_handler(body, identity, registry).await
}

#[post("/session/logout")]
pub async fn logout(
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Json<TextResponse> {
    handlers::logout_handler(identity, registry).await
}

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    handlers::health_handler().await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "No company identity for this session".to_string(),
        "MISSING_COMPANY".to_string(),
        vec![format!("Sign in so the {} header is set", COMPANY_HEADER)],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body could not be understood".to_string(),
        "INVALID_BODY".to_string(),
        vec!["action must be approve or reject".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

pub fn build_rocket(registry: ReviewRegistry, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(registry)
        .register(
            "/api",
            catchers![bad_request, unauthorized, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![list_candidates, decide, logout, health, options],
        )
}

// Main server start function
pub async fn start_web_server(config: ReviewConfig) -> Result<()> {
    let client = ServiceClient::new(&config.services)?;
    let api: Arc<dyn ReviewApi> = Arc::new(client);
    let port = config.server.port;

    info!("Starting candidate review API server");
    info!("Listing service: {}", config.services.listing_url);
    info!("Status service: {}", config.services.status_url);
    info!("Decision service: {}", config.services.decision_url);
    info!("Server: http://0.0.0.0:{}", port);

    let registry = ReviewRegistry::new(api, config);
    let _rocket = build_rocket(registry, port)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket server failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fake::{job, record, FakeReviewApi, StatusReply};
    use crate::types::candidate::{STATUS_REJECTED, STATUS_SELECTED};
    use crate::types::RowKey;
    use rocket::http::{ContentType, Header};
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    fn fast_config() -> ReviewConfig {
        let mut config = ReviewConfig::default();
        config.retry.base_delay_ms = 1;
        config.post_write.initial_delay_ms = 1;
        config.post_write.base_delay_ms = 1;
        config
    }

    async fn client_with(api: FakeReviewApi) -> Client {
        let registry = ReviewRegistry::new(Arc::new(api), fast_config());
        Client::tracked(build_rocket(registry, 0))
            .await
            .expect("valid rocket instance")
    }

    fn acme() -> FakeReviewApi {
        let api = FakeReviewApi::with_jobs(vec![
            job(1, "Backend Engineer", "2024-04-02", &[("c1", 0), ("c2", STATUS_SELECTED)]),
            job(2, "Frontend Dev", "2024-05-10", &[("c3", 0)]),
        ]);
        api.settle(RowKey::new("c1", 1), vec![record(STATUS_REJECTED)]);
        api
    }

    #[rocket::async_test]
    async fn test_missing_company_header_is_unauthorized() {
        let client = client_with(acme()).await;
        let response = client.get("/api/candidates").dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "MISSING_COMPANY");
    }

    #[rocket::async_test]
    async fn test_lists_filtered_and_sorted_candidates() {
        let client = client_with(acme()).await;
        let response = client
            .get("/api/candidates?status=rejected&sort=postedOn&direction=desc")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["data"]["updatedCount"], 1);
        assert_eq!(body["data"]["pendingCount"], 2);

        let rows = body["data"]["rows"].as_array().unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["candidateId"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c3", "c1"]);
        assert_eq!(rows[1]["displayStatus"], "rejected");
        assert_eq!(rows[1]["manualStatus"], STATUS_REJECTED);
    }

    #[rocket::async_test]
    async fn test_overlapping_list_requests_both_see_loaded_rows() {
        let api = acme();
        api.script(RowKey::new("c3", 2), vec![StatusReply::Fail, StatusReply::Fail]);
        let client = client_with(api).await;

        let (first, second) = tokio::join!(
            client
                .get("/api/candidates")
                .header(Header::new(COMPANY_HEADER, "acme"))
                .dispatch(),
            client
                .get("/api/candidates")
                .header(Header::new(COMPANY_HEADER, "acme"))
                .dispatch(),
        );

        for response in [first, second] {
            assert_eq!(response.status(), Status::Ok);
            let body: Value = response.into_json().await.unwrap();
            assert_eq!(body["data"]["phase"]["phase"], "ready");
            assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 3);
        }
    }

    #[rocket::async_test]
    async fn test_invalid_status_filter_is_bad_request() {
        let client = client_with(acme()).await;
        let response = client
            .get("/api/candidates?status=maybe")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "INVALID_QUERY");
    }

    #[rocket::async_test]
    async fn test_decision_round_trip() {
        let client = client_with(acme()).await;
        let response = client
            .post("/api/candidates/decision")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .header(ContentType::JSON)
            .body(json!({"candidateId": "c3", "jobId": 2, "action": "approve"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["action"], "approve");

        let response = client
            .get("/api/candidates?search=c3")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["displayStatus"], "selected");
        assert_eq!(rows[0]["updated"], true);
    }

    #[rocket::async_test]
    async fn test_unknown_candidate_is_not_found() {
        let client = client_with(acme()).await;
        let response = client
            .post("/api/candidates/decision")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .header(ContentType::JSON)
            .body(json!({"candidateId": "ghost", "jobId": 2, "action": "reject"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_failed_decision_is_reported() {
        let api = acme();
        api.fail_decisions();
        let client = client_with(api).await;
        let response = client
            .post("/api/candidates/decision")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .header(ContentType::JSON)
            .body(json!({"candidateId": "c2", "jobId": 1, "action": "reject"}).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadGateway);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "DECISION_FAILED");
    }

    #[rocket::async_test]
    async fn test_listing_outage_is_bad_gateway() {
        let client = client_with(FakeReviewApi::unavailable()).await;
        let response = client
            .get("/api/candidates")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadGateway);
    }

    #[rocket::async_test]
    async fn test_logout_drops_controller() {
        let client = client_with(acme()).await;
        client
            .get("/api/candidates")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;

        let response = client
            .post("/api/session/logout")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Signed out of company acme");

        let response = client
            .post("/api/session/logout")
            .header(Header::new(COMPANY_HEADER, "acme"))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "No active session");
    }
}
