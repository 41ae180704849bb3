//! Session entity model for Sea-ORM database interaction.
//!
//! Maps to the `user_sessions` table created by the crate's migration.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one login session.
///
/// # Database Schema
///
/// | Column         | Type                 | Description                          |
/// |----------------|----------------------|--------------------------------------|
/// | session_id     | TEXT (Primary Key)   | Opaque token handed to the client    |
/// | user_id        | TEXT                 | Owning principal                     |
/// | created_at     | TIMESTAMPTZ          | Issue time                           |
/// | expires_at     | TIMESTAMPTZ          | Absolute expiry                      |
/// | ip_address     | TEXT NULL            | Address the session was issued to    |
/// | user_agent     | TEXT NULL            | User agent the session was issued to |
/// | is_active      | BOOLEAN              | Cleared on logout or expiry          |
/// | invalidated_at | TIMESTAMPTZ NULL     | When `is_active` was cleared         |
///
/// Rows are only ever moved from active to inactive by this crate. A row that
/// is flipped back by hand is still rejected while its id sits in the
/// revocation list, and always rejected once `expires_at` has passed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub session_id: String,

    #[sea_orm(column_type = "Text", indexed)]
    pub user_id: String,

    pub created_at: DateTimeWithTimeZone,

    pub expires_at: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text", nullable)]
    pub ip_address: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,

    pub is_active: bool,

    #[sea_orm(nullable)]
    pub invalidated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
