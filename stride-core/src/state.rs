use stride_database::Database;

use crate::auth::TokenSigner;
use crate::chat::ChatHub;

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenSigner,
    pub chat: ChatHub,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenSigner) -> Self {
        Self {
            db,
            tokens,
            chat: ChatHub::default(),
        }
    }
}
