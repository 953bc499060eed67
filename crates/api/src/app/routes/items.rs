use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use pantry_core::ItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).delete(delete_items))
        .route(
            "/:id",
            get(get_item)
                .head(head_item)
                .put(update_item)
                .delete(delete_item),
        )
}

fn parse_id(id: &str) -> Result<ItemId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id")
    })
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.list_items(query.search.as_deref()).await {
        Ok(items) => {
            let items = items.into_iter().map(dto::item_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn delete_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.delete_items(query.search.as_deref()).await {
        Ok(_removed) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.get_item(id).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(item))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn head_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.item_exists(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::UpdateQuery>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .update_item(id, body.into_draft(), query.expire_in)
        .await
    {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(item))).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.delete_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}
