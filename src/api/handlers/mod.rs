mod items;
mod system;
mod users;

use crate::api::response::ApiError;
use crate::registry::ServiceError;

pub use items::{
    clear_item_image, create_item, delete_item, get_item, list_items, update_item,
    upload_item_image,
};
pub use system::health;
pub use users::{get_me, get_user, get_user_by_id, login, register, update_me};

/// Run a registry call on the blocking pool. Store transactions and password
/// hashing both block.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Blocking task failed");
            ApiError::internal("Internal error")
        })?
        .map_err(ApiError::from)
}
