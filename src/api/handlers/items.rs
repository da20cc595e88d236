use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use super::run_blocking;
use crate::api::response::{ApiError, AppJson, AppMultipart, AppQuery, JSend};
use crate::auth::Identity;
use crate::registry::{items, ItemDraft, ItemQuery, ItemView};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ItemRequest {
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<ItemRequest> for ItemDraft {
    fn from(req: ItemRequest) -> Self {
        ItemDraft {
            price: req.price,
            title: req.title,
        }
    }
}

/// Accept a price sent either as a JSON number or as a string; the registry
/// validates the text either way.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match Option::<Price>::deserialize(deserializer)? {
        None => None,
        Some(Price::Number(n)) => Some(n.to_string()),
        Some(Price::Text(s)) => Some(s),
    })
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<ItemRequest>,
) -> Result<Json<JSend<ItemView>>, ApiError> {
    let item = run_blocking(move || items::create(&state.db, &identity, req.into())).await?;
    Ok(JSend::success(item))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<ItemQuery>,
) -> Result<Json<JSend<Vec<ItemView>>>, ApiError> {
    let items = run_blocking(move || items::list(&state.db, query)).await?;
    Ok(JSend::success(items))
}

/// `/item/:item_id` is the listing narrowed to one id: an array with the
/// match, or empty.
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<JSend<Vec<ItemView>>>, ApiError> {
    let query = ItemQuery {
        id: Some(item_id),
        ..Default::default()
    };
    let items = run_blocking(move || items::list(&state.db, query)).await?;
    Ok(JSend::success(items))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(item_id): Path<String>,
    AppJson(req): AppJson<ItemRequest>,
) -> Result<Json<JSend<ItemView>>, ApiError> {
    let item =
        run_blocking(move || items::update(&state.db, &identity, &item_id, req.into())).await?;
    Ok(JSend::success(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(item_id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    run_blocking(move || items::delete(&state.db, &state.uploads, &identity, &item_id)).await?;
    Ok(JSend::success(()))
}

/// Store the multipart `file` field and point the item at it. The stored file
/// is removed again if the item cannot be updated.
pub async fn upload_item_image(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(item_id): Path<String>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<Json<JSend<ItemView>>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let Some((file_name, bytes)) = upload.filter(|(_, bytes)| !bytes.is_empty()) else {
        return Err(ApiError::invalid("file", "Image is required"));
    };

    let item = run_blocking(move || {
        let image_ref = state.uploads.store(&bytes, file_name.as_deref())?;
        items::set_image(&state.db, &identity, &item_id, &image_ref).inspect_err(|_| {
            if let Err(e) = state.uploads.remove(&image_ref) {
                tracing::warn!(image = %image_ref, error = %e, "Failed to remove rejected upload");
            }
        })
    })
    .await?;
    Ok(JSend::success(item))
}

pub async fn clear_item_image(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(item_id): Path<String>,
) -> Result<Json<JSend<ItemView>>, ApiError> {
    let item =
        run_blocking(move || items::clear_image(&state.db, &state.uploads, &identity, &item_id))
            .await?;
    Ok(JSend::success(item))
}
