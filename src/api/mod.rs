//! HTTP 接口
//!
//! 路由只做参数提取和结果包装，业务逻辑全部在 [`Registry`] 中

pub mod error;

pub use error::{ApiError, ErrorBody};

use crate::error::RegistryError;
use crate::patient::{NewPatient, PatientRecord, PatientUpdate};
use crate::registry::Registry;
use crate::storage::PatientTable;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 路由共享状态
pub type AppState = Arc<Registry>;

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// 简单消息响应
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }
}

/// 构建路由
pub fn routes(registry: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .with_state(registry)
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Patient registry API running".to_string(),
        status: Some("healthy".to_string()),
    })
}

async fn about() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Patient record service with BMI assessment",
    ))
}

/// 不带 sort_by 返回完整映射，带 sort_by 返回排序后的数组
async fn list_records(
    State(registry): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    match (query.sort_by, query.order) {
        (None, None) => {
            let table: PatientTable = tokio::task::spawn_blocking(move || registry.snapshot()).await?;
            Ok(Json(table).into_response())
        }
        (Some(field), order) => {
            let records: Vec<PatientRecord> =
                tokio::task::spawn_blocking(move || registry.sorted(&field, order.as_deref()))
                    .await??;
            Ok(Json(records).into_response())
        }
        (None, Some(_)) => Err(RegistryError::invalid_argument("order requires sort_by").into()),
    }
}

async fn get_record(
    State(registry): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    // 写操作在落盘期间持有存储锁，读操作同样放到阻塞线程
    let record = tokio::task::spawn_blocking(move || registry.get(&id)).await??;
    Ok(Json(record))
}

async fn create_record(
    State(registry): State<AppState>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientRecord>), ApiError> {
    let Json(candidate) = payload?;
    let record = tokio::task::spawn_blocking(move || registry.create(candidate)).await??;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record(
    State(registry): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<PatientRecord>, ApiError> {
    let Json(update) = payload?;
    let record = tokio::task::spawn_blocking(move || registry.update(&id, update)).await??;
    Ok(Json(record))
}

async fn delete_record(
    State(registry): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = tokio::task::spawn_blocking(move || registry.delete(&id)).await??;
    Ok(Json(MessageResponse::new(format!(
        "Patient {} deleted successfully",
        removed.id()
    ))))
}
