//! Application service RPC handlers.
//!
//! ```text
//! POST /rpc/applications              {"user_id":"user123","pet_id":"pet456","application_notes":"please"}
//! GET  /rpc/applications/{id}
//! PUT  /rpc/applications/{id}/status  {"status":"APPROVED","review_notes":"looks good"}
//! GET  /rpc/users/{applicant_id}/applications?page=1&limit=10&status=PENDING_REVIEW
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;

use crate::domain::{
    Application, ApplicationStatus, ApplicationWorkflow, EntityId, NewApplication, Page,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::routes::lenient_number;

/// Body for `PUT /rpc/applications/{id}/status`.
///
/// A missing status is treated as `UNSPECIFIED` and rejected.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub review_notes: Option<String>,
}

/// Query string for the per-applicant listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

/// Submit an application.
#[post("/rpc/applications")]
pub async fn create_application(
    workflow: web::Data<ApplicationWorkflow>,
    payload: web::Json<NewApplication>,
) -> ApiResult<HttpResponse> {
    let application = workflow.create_application(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(application))
}

/// Fetch an application by id.
#[get("/rpc/applications/{id}")]
pub async fn get_application(
    workflow: web::Data<ApplicationWorkflow>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Application>> {
    let id = EntityId::parse_field("id", &path)?;
    Ok(web::Json(workflow.get_application(&id).await?))
}

/// Change an application's status.
#[put("/rpc/applications/{id}/status")]
pub async fn update_status(
    workflow: web::Data<ApplicationWorkflow>,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusRequest>,
) -> ApiResult<web::Json<Application>> {
    let id = EntityId::parse_field("id", &path)?;
    let UpdateStatusRequest {
        status,
        review_notes,
    } = payload.into_inner();
    let status = match status {
        Some(raw) => raw.parse::<ApplicationStatus>()?,
        None => ApplicationStatus::Unspecified,
    };
    Ok(web::Json(
        workflow.update_status(&id, status, review_notes).await?,
    ))
}

/// Page through one applicant's applications, newest first.
#[get("/rpc/users/{applicant_id}/applications")]
pub async fn list_by_applicant(
    workflow: web::Data<ApplicationWorkflow>,
    path: web::Path<String>,
    query: web::Query<ListApplicationsQuery>,
) -> ApiResult<web::Json<Page<Application>>> {
    let applicant_id = EntityId::parse_field("applicant_id", &path)?;
    let query = query.into_inner();
    let status = query
        .status
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.parse::<ApplicationStatus>())
        .transpose()?;
    let page = workflow
        .list_by_applicant(
            &applicant_id,
            lenient_number(query.page.as_deref()),
            lenient_number(query.limit.as_deref()),
            status,
        )
        .await?;
    Ok(web::Json(page))
}
