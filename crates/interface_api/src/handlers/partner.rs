//! Business partner handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::instrument;
use validator::Validate;

use core_kernel::OperationMetadata;
use domain_partner::{PartnerQuery, PartnerStore};

use crate::dto::partner::*;
use crate::error::ApiError;
use crate::middleware::REQUEST_ID_HEADER;
use crate::AppState;

/// Lists active partners, optionally filtered by `?search=`
#[instrument(skip_all)]
pub async fn list_partners<S: PartnerStore>(
    State(state): State<AppState<S>>,
    params: Result<Query<ListPartnersParams>, QueryRejection>,
) -> Result<Json<ListResponse<PartnerSummaryResponse>>, ApiError> {
    let Query(params) = params?;
    let query = PartnerQuery {
        search: params.search,
    };

    let partners = state.service.list_partners(&query).await?;

    Ok(Json(ListResponse::new(
        partners.into_iter().map(PartnerSummaryResponse::from).collect(),
    )))
}

/// Lists active partner groups
pub async fn list_groups<S: PartnerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ListResponse<GroupResponse>>, ApiError> {
    let groups = state.service.list_groups().await?;
    Ok(Json(ListResponse::new(
        groups.into_iter().map(GroupResponse::from).collect(),
    )))
}

/// Creates a partner with a freshly allocated identifier
#[instrument(skip_all)]
pub async fn create_partner<S: PartnerStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Result<Json<CreatePartnerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePartnerResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let metadata = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|request_id| OperationMetadata::with_correlation_id(request_id).initiated_by("http"));

    let created = state.service.create(request.into_draft(), metadata).await?;

    Ok((StatusCode::CREATED, Json(CreatePartnerResponse::from(created))))
}
