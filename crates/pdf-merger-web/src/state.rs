use anyhow::Result;
use pdf_merger_core::{AppConfig, PdfMerger};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::preview_store::PreviewStore;

/// Session data for one merge workspace
pub struct Session {
    pub merger: PdfMerger,
    /// Disk-backed cache of rendered page previews
    pub preview_store: PreviewStore,
    pub created_at: std::time::Instant,
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Base configuration
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a new, empty merge session.
    ///
    /// Returns the session ID as a string (for URL embedding).
    /// Returns an error if the preview store cannot be created.
    pub async fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4();

        let preview_store = PreviewStore::new(self.config.preview_format)
            .map_err(|e| anyhow::anyhow!("Failed to create preview store: {e}"))?;

        let session = Session {
            merger: PdfMerger::new(self.config.clone()),
            preview_store,
            created_at: std::time::Instant::now(),
        };

        self.sessions.write().await.insert(id, session);
        Ok(id.to_string())
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Cleanup old sessions (older than 1 hour)
    pub async fn cleanup_old_sessions(&self) {
        let mut sessions = self.sessions.write().await;
        let now = std::time::Instant::now();
        let max_age = std::time::Duration::from_secs(3600);

        sessions.retain(|_, session| {
            now.duration_since(session.created_at) < max_age
        });
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// # Why This Pattern?
///
/// In async Rust, holding a lock guard (like `RwLockReadGuard`) across an
/// `.await` point is problematic - it can cause deadlocks and the guard
/// isn't `Send`. This pattern solves that by:
///
/// 1. Storing only the session ID and a reference to the state
/// 2. Acquiring locks only within synchronous closures
/// 3. Releasing locks before any `.await` points
///
/// Parsing uploads and assembling the output both run on blocking threads
/// *between* lock acquisitions: the closures only snapshot or merge fully
/// completed work, so sequence mutations never interleave with either.
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    ///
    /// The closure runs synchronously while holding a read lock.
    /// The lock is released before this method returns.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    ///
    /// The closure runs synchronously while holding a write lock.
    /// The lock is released before this method returns.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
