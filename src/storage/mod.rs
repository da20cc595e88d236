pub mod db;
mod items;
pub mod models;
mod sequences;
mod tables;
pub mod uploads;
mod users;

pub use db::{Database, DatabaseError};
pub use items::ItemFilter;
pub use sequences::{ITEMS_SEQUENCE, USERS_SEQUENCE};
pub use tables::*;
pub use uploads::Uploads;
