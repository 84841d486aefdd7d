//! # API REST
//!
//! REST API implementation for clinrec.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status mapping, CORS)
//!
//! Uses `api-shared` for wire types and `clinrec-core` for all behaviour.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::{
    AssignLabDocumentReq, AssignLabDocumentRes, DeleteRes, ErrorRes, FieldEntry, HealthRes,
    HighlightEntry, InsertLabDocumentRes, InsertRecordRes, LabAssignmentRes, LabDocumentDetailRes,
    LabDocumentSummaryRes, LabPatientInfoRes, LabResultRes, ListLabDocumentsRes, ListPatientsRes,
    ListRecordsRes, PatientLabResultsRes, PatientRes, RecordSummaryRes, SearchHitRes, SearchRes,
    StatsRes, VariantShareRes,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use clinrec_core::{
    CoreConfig, DocumentService, DocumentStore, PatientService, RawLabService,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub documents: DocumentService,
    pub raw_lab: RawLabService,
    pub patients: PatientService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents: DocumentService::new(cfg.clone(), store.clone()),
            raw_lab: RawLabService::new(cfg.clone(), store.clone()),
            patients: PatientService::new(store),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_documents,
        handlers::insert_document,
        handlers::delete_document,
        handlers::search_documents,
        handlers::stats,
        handlers::list_lab_documents,
        handlers::insert_lab_document,
        handlers::get_lab_document,
        handlers::delete_lab_document,
        handlers::assign_lab_document,
        handlers::list_patients,
        handlers::create_patient,
        handlers::get_patient,
        handlers::delete_patient,
        handlers::patient_lab_results,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        DeleteRes,
        FieldEntry,
        HighlightEntry,
        RecordSummaryRes,
        ListRecordsRes,
        InsertRecordRes,
        SearchHitRes,
        SearchRes,
        VariantShareRes,
        StatsRes,
        LabDocumentSummaryRes,
        ListLabDocumentsRes,
        LabResultRes,
        LabPatientInfoRes,
        LabDocumentDetailRes,
        InsertLabDocumentRes,
        AssignLabDocumentReq,
        AssignLabDocumentRes,
        PatientRes,
        ListPatientsRes,
        LabAssignmentRes,
        PatientLabResultsRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/documents/:tag",
            get(handlers::list_documents).post(handlers::insert_document),
        )
        .route("/documents/:tag/:id", delete(handlers::delete_document))
        .route("/search/:tag", post(handlers::search_documents))
        .route("/stats", get(handlers::stats))
        .route(
            "/lab-documents",
            get(handlers::list_lab_documents).post(handlers::insert_lab_document),
        )
        .route("/lab-documents/assign", post(handlers::assign_lab_document))
        .route(
            "/lab-documents/:id",
            get(handlers::get_lab_document).delete(handlers::delete_lab_document),
        )
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/patients/:id",
            get(handlers::get_patient).delete(handlers::delete_patient),
        )
        .route("/patients/:id/lab-results", get(handlers::patient_lab_results))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
