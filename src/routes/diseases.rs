use crate::diseases::{lookup, DiseaseInfo, DISEASES};
use crate::routes::ErrorBody;
use crate::server::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct DiseaseListResponse {
    status: &'static str,
    count: usize,
    data: Vec<DiseaseSummary>,
}

#[derive(Serialize)]
pub struct DiseaseSummary {
    id: &'static str,
    name: &'static str,
    severity: &'static str,
}

pub async fn list_diseases(State(_state): State<SharedState>) -> Json<DiseaseListResponse> {
    let data = DISEASES
        .iter()
        .map(|d| DiseaseSummary {
            id: d.id,
            name: d.name,
            severity: d.severity,
        })
        .collect::<Vec<_>>();

    Json(DiseaseListResponse {
        status: "success",
        count: data.len(),
        data,
    })
}

#[derive(Serialize)]
pub struct DiseaseDetailResponse {
    status: &'static str,
    data: &'static DiseaseInfo,
}

pub async fn get_disease(
    State(_state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    match lookup(&id) {
        Some(disease) => Json(DiseaseDetailResponse {
            status: "success",
            data: disease,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new(format!("unknown disease id: {id}"))),
        )
            .into_response(),
    }
}
