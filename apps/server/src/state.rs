//! Shared application state.

use vastra_db::Database;

/// State handed to every handler.
///
/// `Database` is a pool handle, so cloning per request is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,

    /// Request body limit, applied router-wide.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: Database, max_upload_bytes: usize) -> Self {
        AppState {
            db,
            max_upload_bytes,
        }
    }
}
