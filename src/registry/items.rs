//! Items: owner-scoped create, update, delete and image changes, plus
//! filtered and sorted listing

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::{violations, FieldError, ServiceError};
use super::users::UserView;
use super::validation::{check_id, check_price, check_title, present};
use crate::auth::Identity;
use crate::storage::models::{Item, User};
use crate::storage::{Database, ItemFilter, Uploads};

// ============================================================================
// Types
// ============================================================================

/// Title and price as received. Used for both create (both required) and
/// update (at least one required).
#[derive(Debug, Default, Deserialize)]
pub struct ItemDraft {
    pub price: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub id: Option<String>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
    pub title: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Listing order. Unrecognized values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemSort {
    pub direction: SortDirection,
    pub field: SortField,
}

impl ItemSort {
    pub fn from_params(order_by: Option<&str>, order_type: Option<&str>) -> Self {
        let field = match order_by {
            Some("price") => SortField::Price,
            _ => SortField::CreatedAt,
        };
        let direction = match order_type {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        Self { direction, field }
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
            SortField::Price => a.price.total_cmp(&b.price).then(a.id.cmp(&b.id)),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Item projection, joined with a summary of its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub created_at: String,
    pub id: u64,
    pub image: String,
    pub price: f64,
    pub title: String,
    /// `None` if the owner record no longer resolves
    pub user: Option<UserView>,
    pub user_id: u64,
}

impl ItemView {
    pub fn new(item: &Item, owner: Option<&User>) -> Self {
        Self {
            created_at: item.created_at.to_rfc3339(),
            id: item.id,
            image: item.image.clone(),
            price: item.price,
            title: item.title.clone(),
            user: owner.map(UserView::from),
            user_id: item.owner_id,
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Create an item owned by the caller
pub fn create(
    db: &Database,
    identity: &Identity,
    draft: ItemDraft,
) -> Result<ItemView, ServiceError> {
    let (title, price) = match (
        check_title(draft.title.as_deref().unwrap_or_default()),
        check_price(draft.price.as_deref().unwrap_or_default()),
    ) {
        (Ok(title), Ok(price)) => (title, price),
        (title, price) => return Err(violations([title.err(), price.err()])),
    };

    let Some(owner) = db.get_user_by_id(identity.user_id)? else {
        return Err(ServiceError::Validation(vec![FieldError::general(
            "Owner does not exist",
        )]));
    };

    let item = db.insert_item(Item::new(title, price, &owner))?;
    tracing::debug!(item_id = item.id, user_id = owner.id, "Created item");
    Ok(ItemView::new(&item, Some(&owner)))
}

/// Delete one of the caller's items and its image file
pub fn delete(
    db: &Database,
    uploads: &Uploads,
    identity: &Identity,
    item_id: &str,
) -> Result<(), ServiceError> {
    let item = load_owned(db, identity, item_id)?;

    if !db.delete_item(item.id)? {
        return Err(ServiceError::NotFound);
    }
    tracing::debug!(item_id = item.id, "Deleted item");

    if !item.image.is_empty() {
        remove_file(uploads, item.id, &item.image);
    }
    Ok(())
}

/// Change the title and/or price of one of the caller's items
pub fn update(
    db: &Database,
    identity: &Identity,
    item_id: &str,
    draft: ItemDraft,
) -> Result<ItemView, ServiceError> {
    let id = parse_item_id(item_id)?;

    let (title, price) = match (
        present(draft.title).map(|v| check_title(&v)).transpose(),
        present(draft.price).map(|v| check_price(&v)).transpose(),
    ) {
        (Ok(title), Ok(price)) => (title, price),
        (title, price) => return Err(violations([title.err(), price.err()])),
    };
    if title.is_none() && price.is_none() {
        return Err(ServiceError::Validation(vec![FieldError::general(
            "Nothing to update",
        )]));
    }

    let mut item = load_owned_by_id(db, identity, id)?;
    if let Some(title) = title {
        item.title = title;
    }
    if let Some(price) = price {
        item.price = price;
    }

    save(db, &item)?;
    tracing::debug!(item_id = item.id, "Updated item");
    view(db, item)
}

/// Items matching the query, joined with their owners.
///
/// An `id` short-circuits the other filters and yields at most one item.
pub fn list(db: &Database, query: ItemQuery) -> Result<Vec<ItemView>, ServiceError> {
    let items = if let Some(raw) = present(query.id) {
        let id = parse_item_id(&raw)?;
        db.get_item(id)?.into_iter().collect()
    } else {
        let owner_id = match present(query.user_id) {
            Some(raw) => Some(
                check_id("user_id", &raw).map_err(|e| ServiceError::Validation(vec![e]))?,
            ),
            None => None,
        };
        let filter = ItemFilter {
            owner_id,
            title: present(query.title),
        };
        let sort = ItemSort::from_params(query.order_by.as_deref(), query.order_type.as_deref());

        let mut items = db.list_items(&filter)?;
        items.sort_by(|a, b| sort.compare(a, b));
        items
    };

    Ok(db
        .populate_owners(items)?
        .iter()
        .map(|(item, owner)| ItemView::new(item, owner.as_ref()))
        .collect())
}

/// Point one of the caller's items at a stored image
pub fn set_image(
    db: &Database,
    identity: &Identity,
    item_id: &str,
    image_ref: &str,
) -> Result<ItemView, ServiceError> {
    let mut item = load_owned(db, identity, item_id)?;
    if image_ref.trim().is_empty() {
        return Err(ServiceError::invalid("file", "Image is required"));
    }

    item.image = image_ref.to_string();
    save(db, &item)?;
    tracing::debug!(item_id = item.id, image = %item.image, "Set item image");
    view(db, item)
}

/// Clear the image of one of the caller's items, then delete the file.
///
/// The field is persisted first; if the file cannot be removed afterwards it
/// is left behind and the call still succeeds.
pub fn clear_image(
    db: &Database,
    uploads: &Uploads,
    identity: &Identity,
    item_id: &str,
) -> Result<ItemView, ServiceError> {
    let mut item = load_owned(db, identity, item_id)?;
    if item.image.is_empty() || !uploads.exists(&item.image) {
        return Err(ServiceError::NotFound);
    }

    let image_ref = std::mem::take(&mut item.image);
    save(db, &item)?;
    tracing::debug!(item_id = item.id, "Cleared item image");

    remove_file(uploads, item.id, &image_ref);
    view(db, item)
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_item_id(raw: &str) -> Result<u64, ServiceError> {
    check_id("itemId", raw).map_err(|e| ServiceError::Validation(vec![e]))
}

fn load_owned(db: &Database, identity: &Identity, item_id: &str) -> Result<Item, ServiceError> {
    let id = parse_item_id(item_id)?;
    load_owned_by_id(db, identity, id)
}

/// Existence is checked before ownership
fn load_owned_by_id(db: &Database, identity: &Identity, id: u64) -> Result<Item, ServiceError> {
    let item = db.get_item(id)?.ok_or(ServiceError::NotFound)?;
    if item.owner_id != identity.user_id {
        tracing::debug!(item_id = id, user_id = identity.user_id, "Rejected change by non-owner");
        return Err(ServiceError::Forbidden);
    }
    Ok(item)
}

fn save(db: &Database, item: &Item) -> Result<(), ServiceError> {
    if db.put_item(item)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound)
    }
}

fn view(db: &Database, item: Item) -> Result<ItemView, ServiceError> {
    let owner = db.get_user(&item.owner_ref)?;
    Ok(ItemView::new(&item, owner.as_ref()))
}

fn remove_file(uploads: &Uploads, item_id: u64, image_ref: &str) {
    if let Err(e) = uploads.remove(image_ref) {
        tracing::warn!(item_id, image = %image_ref, error = %e, "Failed to remove image file");
    }
}
