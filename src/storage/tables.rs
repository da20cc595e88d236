use redb::TableDefinition;

/// Users: internal_id -> User (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Secondary index: public user id -> internal_id
pub const USER_IDS: TableDefinition<u64, &str> = TableDefinition::new("user_ids");

/// Unique index: email -> internal_id
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Items: public item id -> Item (msgpack)
pub const ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("items");

/// Named counters: sequence name -> last issued value
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
