//! HTTP handlers.
//!
//! Handlers only translate between HTTP and the core services; all behaviour lives in
//! `clinrec-core`. The services block on store I/O and are called inline.

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use api_shared::{
    AssignLabDocumentReq, AssignLabDocumentRes, DeleteRes, ErrorRes, HealthRes, HealthService,
    InsertLabDocumentRes, InsertRecordRes, LabDocumentDetailRes, ListLabDocumentsRes,
    ListPatientsRes, ListRecordsRes, PatientLabResultsRes, PatientRes, SearchRes, StatsRes,
};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use clinrec_core::{SearchCriteria, VariantTag};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of entries returned (defaults to the configured page size).
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientQuery {
    /// Case-insensitive text matched against identifiers, family names and first given names.
    pub q: Option<String>,
}

fn parse_tag(tag: &str) -> ApiResult<VariantTag> {
    Ok(tag.parse::<VariantTag>()?)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/documents/{tag}",
    params(("tag" = String, Path, description = "Variant tag: MDM, OUL or ORU"), LimitQuery),
    responses(
        (status = 200, description = "Newest records of the variant", body = ListRecordsRes),
        (status = 400, description = "Unknown variant", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List converted records of one variant with their title and summary.
#[axum::debug_handler]
pub async fn list_documents(
    State(state): State<AppState>,
    AxumPath(tag): AxumPath<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<ListRecordsRes>> {
    let Query(query) = query?;
    let tag = parse_tag(&tag)?;
    let records = state.documents.list(tag, query.limit)?;
    Ok(Json(ListRecordsRes::new(tag, records)))
}

#[utoipa::path(
    post,
    path = "/documents/{tag}",
    params(("tag" = String, Path, description = "Variant tag or HL7 message type, e.g. ORU^R01")),
    request_body(content = Object, description = "Converted record"),
    responses(
        (status = 201, description = "Record stored", body = InsertRecordRes),
        (status = 400, description = "Unknown variant or malformed record", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Store a converted record under the variant its tag names.
#[axum::debug_handler]
pub async fn insert_document(
    State(state): State<AppState>,
    AxumPath(tag): AxumPath<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertRecordRes>)> {
    let Json(record) = payload?;
    let stored = state.documents.insert(&tag, record)?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    delete,
    path = "/documents/{tag}/{id}",
    params(
        ("tag" = String, Path, description = "Variant tag"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record deleted", body = DeleteRes),
        (status = 404, description = "No such record", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_document(
    State(state): State<AppState>,
    AxumPath((tag, id)): AxumPath<(String, String)>,
) -> ApiResult<Json<DeleteRes>> {
    let tag = parse_tag(&tag)?;
    state.documents.delete(tag, &id)?;
    Ok(Json(DeleteRes::deleted(format!("{tag} record {id}"))))
}

#[utoipa::path(
    post,
    path = "/search/{tag}",
    params(("tag" = String, Path, description = "Variant tag")),
    request_body(content = Object, description = "Criteria map; an optional `limit` sets the page size"),
    responses(
        (status = 200, description = "Matching records with highlights", body = SearchRes),
        (status = 400, description = "Empty or unsupported criteria", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Search one variant collection.
#[axum::debug_handler]
pub async fn search_documents(
    State(state): State<AppState>,
    AxumPath(tag): AxumPath<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<SearchRes>> {
    let Json(body) = payload?;
    let tag = parse_tag(&tag)?;
    let criteria = SearchCriteria::from_json(tag, &body)?;
    let outcome = state.documents.search(&criteria)?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Per-variant counts and shares", body = StatsRes)
    )
)]
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Json<StatsRes> {
    Json(state.documents.stats().into())
}

#[utoipa::path(
    get,
    path = "/lab-documents",
    params(LimitQuery),
    responses(
        (status = 200, description = "Newest raw lab documents", body = ListLabDocumentsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_lab_documents(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<ListLabDocumentsRes>> {
    let Query(query) = query?;
    Ok(Json(state.raw_lab.list(query.limit)?.into()))
}

#[utoipa::path(
    post,
    path = "/lab-documents",
    request_body(content = Object, description = "Raw lab document"),
    responses(
        (status = 201, description = "Lab document stored", body = InsertLabDocumentRes),
        (status = 400, description = "Malformed document or duplicate id", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn insert_lab_document(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertLabDocumentRes>)> {
    let Json(body) = payload?;
    let stored = state.raw_lab.insert(body)?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/lab-documents/{id}",
    params(("id" = String, Path, description = "Lab document id")),
    responses(
        (status = 200, description = "Lab document with classified results", body = LabDocumentDetailRes),
        (status = 404, description = "No such document", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_lab_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<LabDocumentDetailRes>> {
    Ok(Json(state.raw_lab.detail(&id)?.into()))
}

#[utoipa::path(
    delete,
    path = "/lab-documents/{id}",
    params(("id" = String, Path, description = "Lab document id")),
    responses(
        (status = 200, description = "Lab document deleted", body = DeleteRes),
        (status = 404, description = "No such document", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_lab_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<DeleteRes>> {
    state.raw_lab.delete(&id)?;
    Ok(Json(DeleteRes::deleted(format!("lab document {id}"))))
}

#[utoipa::path(
    post,
    path = "/lab-documents/assign",
    request_body = AssignLabDocumentReq,
    responses(
        (status = 200, description = "Document assigned", body = AssignLabDocumentRes),
        (status = 400, description = "Document has no lab results", body = ErrorRes),
        (status = 404, description = "No such document or patient", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Assign a raw lab document to a patient, classifying every result.
#[axum::debug_handler]
pub async fn assign_lab_document(
    State(state): State<AppState>,
    payload: Result<Json<AssignLabDocumentReq>, JsonRejection>,
) -> ApiResult<Json<AssignLabDocumentRes>> {
    let Json(req) = payload?;
    let outcome = state.raw_lab.assign(&req.document_id, &req.patient_id)?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(PatientQuery),
    responses(
        (status = 200, description = "Matching patients", body = ListPatientsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<PatientQuery>, QueryRejection>,
) -> ApiResult<Json<ListPatientsRes>> {
    let Query(query) = query?;
    let patients = state.patients.list(query.q.as_deref())?;
    let res = ListPatientsRes::from_patients(&patients)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body(content = Object, description = "FHIR-aligned Patient resource"),
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Invalid resource or duplicate id", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let Json(resource) = payload?;
    let patient = state.patients.create(resource)?;
    let res = PatientRes::from_patient(&patient).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<PatientRes>> {
    let patient = state.patients.get(&id)?;
    let res = PatientRes::from_patient(&patient).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(res))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted", body = DeleteRes),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<DeleteRes>> {
    state.patients.delete(&id)?;
    Ok(Json(DeleteRes::deleted(format!("patient {id}"))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/lab-results",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Lab result sets assigned to the patient", body = PatientLabResultsRes),
        (status = 404, description = "No such patient", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn patient_lab_results(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<PatientLabResultsRes>> {
    let sets = state.patients.lab_results(&id)?;
    Ok(Json(PatientLabResultsRes::new(id, sets)))
}
