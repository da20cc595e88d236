use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::User;
use super::sequences::{bump_sequence, USERS_SEQUENCE};
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a new user, assigning its public id from the "users" sequence.
    ///
    /// Fails with [`DatabaseError::Conflict`] when the email is already
    /// registered; in that case nothing is written and the counter is not
    /// advanced.
    pub fn insert_user(&self, mut user: User) -> Result<User, DatabaseError> {
        debug_assert!(!user.internal_id.is_empty(), "user internal_id must not be empty");
        debug_assert!(!user.password_hash.is_empty(), "user password must be set before insert");

        let write_txn = self.begin_write()?;

        let email_taken = {
            let emails = write_txn.open_table(USER_EMAILS)?;
            let taken = emails.get(user.email.as_str())?.is_some();
            taken
        };
        if email_taken {
            write_txn.abort()?;
            return Err(DatabaseError::Conflict { field: "email" });
        }

        user.id = bump_sequence(&write_txn, USERS_SEQUENCE)?;
        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(&user)?;
            table.insert(user.internal_id.as_str(), data.as_slice())?;

            let mut id_table = write_txn.open_table(USER_IDS)?;
            id_table.insert(user.id, user.internal_id.as_str())?;

            let mut email_table = write_txn.open_table(USER_EMAILS)?;
            email_table.insert(user.email.as_str(), user.internal_id.as_str())?;
        }
        write_txn.commit()?;
        Ok(user)
    }

    /// Save changes to an existing user, keeping the email index in step.
    ///
    /// Returns `false` if the user no longer exists. The stored record is
    /// replaced as given; the password digest is whatever the caller holds.
    pub fn update_user(&self, user: &User) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<User> = {
            let table = write_txn.open_table(USERS)?;
            let result = table.get(user.internal_id.as_str())?;
            match result {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            }
        };

        let Some(existing) = existing else {
            write_txn.abort()?;
            return Ok(false);
        };

        if existing.email != user.email {
            let owner: Option<String> = {
                let emails = write_txn.open_table(USER_EMAILS)?;
                let result = emails.get(user.email.as_str())?;
                result.map(|v| v.value().to_string())
            };
            if owner.is_some_and(|owner| owner != user.internal_id) {
                write_txn.abort()?;
                return Err(DatabaseError::Conflict { field: "email" });
            }

            let mut emails = write_txn.open_table(USER_EMAILS)?;
            emails.remove(existing.email.as_str())?;
            emails.insert(user.email.as_str(), user.internal_id.as_str())?;
        }

        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.internal_id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Get a user by internal id
    pub fn get_user(&self, internal_id: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let result = table.get(internal_id)?;
        match result {
            Some(data) => {
                let user: User = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Get a user by public id (resolves id -> internal id -> user)
    pub fn get_user_by_id(&self, id: u64) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let id_table = read_txn.open_table(USER_IDS)?;
        let users = read_txn.open_table(USERS)?;

        let internal_id = match id_table.get(id)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let result = users.get(internal_id.as_str())?;
        match result {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Get a user by exact email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let users = read_txn.open_table(USERS)?;

        let internal_id = match emails.get(email)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let result = users.get(internal_id.as_str())?;
        match result {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// First user (lowest public id) matching every given criterion
    pub fn find_user(
        &self,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DatabaseError> {
        if let Some(email) = email {
            let user = self.get_user_by_email(email)?;
            return Ok(user.filter(|u| name.map_or(true, |name| u.name == name)));
        }

        let read_txn = self.begin_read()?;
        let id_table = read_txn.open_table(USER_IDS)?;
        let users = read_txn.open_table(USERS)?;

        for entry in id_table.iter()? {
            let (_, internal_id) = entry?;
            if let Some(data) = users.get(internal_id.value())? {
                let user: User = rmp_serde::from_slice(data.value())?;
                if name.map_or(true, |name| user.name == name) {
                    return Ok(Some(user));
                }
            };
        }

        Ok(None)
    }
}
