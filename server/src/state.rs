// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use taskbuddy_common::{Board, BoardError, TaskStore};
use tokio::sync::Mutex;
use tracing::info;

pub type SharedBoard = Arc<Mutex<Board>>;

/// Number of boards kept in memory when no limit is configured.
pub const DEFAULT_MAX_BOARDS: usize = 1024;

struct CachedBoard {
    board: SharedBoard,
    last_used: AtomicU64,
}

/// Shared application state: the task store and one board per user.
///
/// Each board is behind its own async mutex, so operations on one user's
/// board are serialized while different users proceed independently.
/// At most `max_boards` boards are cached; loading one more evicts the
/// least recently used. An evicted board is reloaded from the store on its
/// next request, losing its selection and undrained notices.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TaskStore>,
    boards: Arc<RwLock<HashMap<String, CachedBoard>>>,
    clock: Arc<AtomicU64>,
    max_boards: Option<usize>,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            boards: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(AtomicU64::new(0)),
            max_boards: Some(DEFAULT_MAX_BOARDS),
        }
    }

    /// Sets the cache bound. `None` keeps every board ever loaded.
    pub fn with_board_limit(mut self, max_boards: Option<usize>) -> Self {
        self.max_boards = max_boards.map(|max| max.max(1));
        self
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the board of `user_id`, loading it from the store on first use.
    pub async fn board(&self, user_id: &str) -> Result<SharedBoard, BoardError> {
        let cached = self.boards.read().get(user_id).map(|entry| {
            entry.last_used.store(self.tick(), Ordering::Relaxed);
            entry.board.clone()
        });
        if let Some(board) = cached {
            return Ok(board);
        }

        let loaded = Board::load(self.store(), user_id).await?;
        let now = self.tick();
        let mut boards = self.boards.write();
        // Another request may have loaded it in the meantime; keep that one.
        if let Some(entry) = boards.get(user_id) {
            entry.last_used.store(now, Ordering::Relaxed);
            return Ok(entry.board.clone());
        }

        if let Some(max) = self.max_boards {
            while boards.len() >= max {
                let oldest = boards
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                    .map(|(id, _)| id.clone());
                let Some(oldest) = oldest else { break };
                boards.remove(&oldest);
                info!("Board of user {} was evicted from the cache.", oldest);
            }
        }

        let board = Arc::new(Mutex::new(loaded));
        boards.insert(
            user_id.to_string(),
            CachedBoard {
                board: board.clone(),
                last_used: AtomicU64::new(now),
            },
        );
        info!("Board of user {} is now cached.", user_id);
        Ok(board)
    }

    pub fn cached_boards(&self) -> usize {
        self.boards.read().len()
    }

    pub fn is_cached(&self, user_id: &str) -> bool {
        self.boards.read().contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbuddy_common::{MemoryStore, StoreCall};

    #[tokio::test]
    async fn test_board_is_loaded_once() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone());

        let first = state.board("u1").await.unwrap();
        let second = state.board("u1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.calls(), vec![StoreCall::Fetch("u1".to_string())]);
        assert_eq!(state.cached_boards(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let state = AppState::new(store.clone());

        assert!(state.board("u1").await.is_err());
        assert_eq!(state.cached_boards(), 0);

        store.set_unavailable(false);
        assert!(state.board("u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_least_recently_used_board_is_evicted() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone()).with_board_limit(Some(2));
        state.board("u1").await.unwrap();
        state.board("u2").await.unwrap();
        state.board("u1").await.unwrap();

        // Act
        state.board("u3").await.unwrap();

        // Assert
        assert_eq!(state.cached_boards(), 2);
        assert!(state.is_cached("u1"));
        assert!(!state.is_cached("u2"));
        assert!(state.is_cached("u3"));
    }

    #[tokio::test]
    async fn test_evicted_board_is_reloaded() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone()).with_board_limit(Some(1));

        let first = state.board("u1").await.unwrap();
        state.board("u2").await.unwrap();
        let again = state.board("u1").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(state.cached_boards(), 1);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Fetch("u1".to_string()),
                StoreCall::Fetch("u2".to_string()),
                StoreCall::Fetch("u1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unbounded_cache_keeps_every_board() {
        let state = AppState::new(Arc::new(MemoryStore::new())).with_board_limit(None);

        for user in ["u1", "u2", "u3", "u4"] {
            state.board(user).await.unwrap();
        }

        assert_eq!(state.cached_boards(), 4);
    }
}
