//! In-process save store.

use std::collections::HashMap;

use async_trait::async_trait;
use tianji_domain::{SaveState, SessionId};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{PersistenceError, SaveStorePort};

/// Keeps whole save trees keyed by session. Saves replace, never merge.
#[derive(Default)]
pub struct InMemorySaveStore {
    saves: RwLock<HashMap<SessionId, SaveState>>,
}

impl InMemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.saves.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.saves.read().await.is_empty()
    }
}

#[async_trait]
impl SaveStorePort for InMemorySaveStore {
    async fn load(&self, session: SessionId) -> Result<SaveState, PersistenceError> {
        self.saves
            .read()
            .await
            .get(&session)
            .cloned()
            .ok_or(PersistenceError::NotFound(session))
    }

    async fn save(&self, session: SessionId, state: &SaveState) -> Result<(), PersistenceError> {
        self.saves.write().await.insert(session, state.clone());
        tracing::debug!(session = %session, "Save stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn load_returns_the_last_save() {
        let store = InMemorySaveStore::new();
        let session = SessionId::new();
        let first = SaveState::from_value(json!({"gameTime": {"year": 1000, "month": 1, "day": 1}})).unwrap();
        let second = SaveState::from_value(json!({"gameTime": {"year": 1001, "month": 1, "day": 1}})).unwrap();

        store.save(session, &first).await.unwrap();
        store.save(session, &second).await.unwrap();

        assert_eq!(store.load(session).await.unwrap(), second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = InMemorySaveStore::new();
        let session = SessionId::new();
        assert_eq!(store.load(session).await, Err(PersistenceError::NotFound(session)));
    }
}
