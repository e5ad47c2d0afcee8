use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::security::SecuritySettings;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state shared by every request handler.
///
/// Holds only the connection pool and immutable settings; nothing here is
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub security: Arc<SecuritySettings>,
}

impl AppState {
    pub fn new(db: DbConn, security: SecuritySettings) -> Self {
        Self {
            db,
            security: Arc::new(security),
        }
    }
}
