//! Database entity models.
//!
//! The `session` entity backs [`DatabaseStore`](crate::store::DatabaseStore).
//! It is public so operators and tests can inspect or repair rows directly.

/// Sea-ORM entity for the `user_sessions` table.
pub mod session;
