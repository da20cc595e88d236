use std::collections::HashMap;

use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{Item, User};
use super::sequences::{bump_sequence, ITEMS_SEQUENCE};
use super::tables::*;

/// Equality filters for item scans. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub owner_id: Option<u64>,
    pub title: Option<String>,
}

impl ItemFilter {
    fn matches(&self, item: &Item) -> bool {
        self.owner_id.map_or(true, |id| item.owner_id == id)
            && self.title.as_deref().map_or(true, |t| item.title == t)
    }
}

impl Database {
    // ========================================================================
    // Item operations
    // ========================================================================

    /// Insert a new item, assigning its public id from the "items" sequence.
    pub fn insert_item(&self, mut item: Item) -> Result<Item, DatabaseError> {
        debug_assert!(!item.owner_ref.is_empty(), "item owner_ref must not be empty");

        let write_txn = self.begin_write()?;
        item.id = bump_sequence(&write_txn, ITEMS_SEQUENCE)?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            let data = rmp_serde::to_vec_named(&item)?;
            table.insert(item.id, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(item)
    }

    /// Overwrite an existing item. Returns `false` if it no longer exists.
    pub fn put_item(&self, item: &Item) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let exists = {
            let mut table = write_txn.open_table(ITEMS)?;
            let exists = table.get(item.id)?.is_some();
            if exists {
                let data = rmp_serde::to_vec_named(item)?;
                table.insert(item.id, data.as_slice())?;
            }
            exists
        };
        write_txn.commit()?;
        Ok(exists)
    }

    /// Get an item by public id
    pub fn get_item(&self, id: u64) -> Result<Option<Item>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;

        let result = table.get(id)?;
        match result {
            Some(data) => {
                let item: Item = rmp_serde::from_slice(data.value())?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Delete an item
    pub fn delete_item(&self, id: u64) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(ITEMS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// All items matching the filter, in id order
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;

        let mut items = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let item: Item = rmp_serde::from_slice(value.value())?;
            if filter.matches(&item) {
                items.push(item);
            }
        }

        Ok(items)
    }

    /// Pair each item with its owner, resolved through `owner_ref` in a single
    /// read transaction. Owners that no longer exist come back as `None`.
    pub fn populate_owners(
        &self,
        items: Vec<Item>,
    ) -> Result<Vec<(Item, Option<User>)>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let users = read_txn.open_table(USERS)?;

        let mut owners: HashMap<String, Option<User>> = HashMap::new();
        let mut populated = Vec::with_capacity(items.len());
        for item in items {
            if !owners.contains_key(&item.owner_ref) {
                let owner: Option<User> = match users.get(item.owner_ref.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };
                owners.insert(item.owner_ref.clone(), owner);
            }
            let owner = owners.get(&item.owner_ref).cloned().flatten();
            populated.push((item, owner));
        }

        Ok(populated)
    }
}
