// src/web/handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::reconciler::{
    CandidateReconciler, LoadOutcome, LoadPhase, RowQuery, SortDirection, SortField, SortSpec,
    StatusFilter,
};
use crate::web::registry::ReviewRegistry;
use crate::web::session::CompanyIdentity;
use crate::web::types::*;

pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub reload: bool,
}

fn bad_query(error: anyhow::Error) -> ApiError {
    StandardErrorResponse::new(
        error.to_string(),
        "INVALID_QUERY".to_string(),
        vec![
            "status accepts all, selected or rejected".to_string(),
            "direction accepts asc or desc".to_string(),
        ],
    )
    .with_status(Status::BadRequest)
}

fn parse_query(params: &ListParams) -> Result<RowQuery, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => raw.parse::<StatusFilter>().map_err(bad_query)?,
        None => StatusFilter::All,
    };

    let sort = match params.sort.as_deref() {
        Some(raw) => {
            let field = raw.parse::<SortField>().map_err(bad_query)?;
            let direction = match params.direction.as_deref() {
                Some(raw) => raw.parse::<SortDirection>().map_err(bad_query)?,
                None => SortDirection::Asc,
            };
            Some(SortSpec { field, direction })
        }
        None => None,
    };

    Ok(RowQuery {
        search: params.search.clone().unwrap_or_default(),
        status,
        sort,
    })
}

fn registry_error(error: anyhow::Error) -> ApiError {
    StandardErrorResponse::new(
        error.to_string(),
        "SESSION_ERROR".to_string(),
        vec!["Sign in again".to_string()],
    )
    .with_status(Status::Unauthorized)
}

fn load_failed(company_id: &str) -> ApiError {
    StandardErrorResponse::new(
        format!("Failed to load candidates for company {}", company_id),
        "LOAD_FAILED".to_string(),
        vec!["Reload the page".to_string()],
    )
    .with_status(Status::BadGateway)
}

/// Bring the controller to a settled phase. A load already in flight is
/// awaited rather than restarted, unless `force` asks for a fresh one.
async fn ensure_loaded(
    controller: &CandidateReconciler,
    company_id: &str,
    force: bool,
) -> Result<(), ApiError> {
    let phase = controller.snapshot().await.phase;
    let phase = if !force && phase == LoadPhase::Loading {
        controller.settled().await
    } else if force || phase != LoadPhase::Ready {
        match controller.load().await {
            Ok(LoadOutcome::Ready) => LoadPhase::Ready,
            Ok(LoadOutcome::Superseded) => controller.settled().await,
            Err(e) => {
                app_log!(error, "Candidate load for {} failed: {:#}", company_id, e);
                return Err(load_failed(company_id));
            }
        }
    } else {
        phase
    };

    match phase {
        LoadPhase::Failed(_) => Err(load_failed(company_id)),
        _ => Ok(()),
    }
}

pub async fn list_candidates_handler(
    params: ListParams,
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Result<Json<DataResponse<CandidateListData>>, ApiError> {
    let query = parse_query(&params)?;
    let company_id = identity.company_id();

    let (controller, created) = registry
        .controller(company_id)
        .await
        .map_err(registry_error)?;

    ensure_loaded(&controller, company_id, created || params.reload).await?;

    let state = controller.snapshot().await;
    let rows = controller.view(&query).await;
    let data = CandidateListData {
        company_id: company_id.to_string(),
        phase: state.phase,
        updated_count: state.updated.len(),
        pending_count: state.pending.len(),
        rows: rows.into_iter().map(CandidateView::from).collect(),
        notification: state.notification,
    };

    Ok(Json(DataResponse::success(
        format!("{} candidates", data.rows.len()),
        data,
    )))
}

pub async fn decide_handler(
    body: Json<DecisionBody>,
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Result<Json<ActionResponse>, ApiError> {
    let company_id = identity.company_id();
    let (controller, _) = registry
        .controller(company_id)
        .await
        .map_err(registry_error)?;

    ensure_loaded(&controller, company_id, false).await?;

    let key = body.key();
    if controller.snapshot().await.find(&key).is_none() {
        return Err(StandardErrorResponse::new(
            format!(
                "Candidate {} is not listed for job {}",
                key.candidate_id, key.job_id
            ),
            "UNKNOWN_CANDIDATE".to_string(),
            vec!["Reload the candidate list".to_string()],
        )
        .with_status(Status::NotFound));
    }

    let notification = controller.decide(&key, body.action).await;
    if notification.is_success() {
        Ok(Json(ActionResponse::success(
            notification.message().to_string(),
            body.action.to_string(),
        )))
    } else {
        Err(StandardErrorResponse::new(
            notification.message().to_string(),
            "DECISION_FAILED".to_string(),
            vec!["Try the action again".to_string()],
        )
        .with_status(Status::BadGateway))
    }
}

pub async fn logout_handler(
    identity: CompanyIdentity,
    registry: &State<ReviewRegistry>,
) -> Json<TextResponse> {
    let message = if registry.logout(identity.company_id()).await {
        format!("Signed out of company {}", identity.company_id())
    } else {
        "No active session".to_string()
    };
    Json(TextResponse::success(message))
}

pub async fn health_handler() -> Json<TextResponse> {
    Json(TextResponse::success("ok".to_string()))
}
