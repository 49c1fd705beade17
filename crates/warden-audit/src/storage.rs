//! Audit storage backends.

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::logger::AuditFilter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;
use warden_core::config::{AuditConfig, StorageBackend};

/// Trait for audit storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Store an audit event.
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Query audit events with filters.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;

    /// Get an audit event by ID.
    async fn get(&self, event_id: Uuid) -> Result<Option<AuditEvent>, AuditError>;
}

/// Create a storage backend based on configuration.
pub fn create_storage(config: &AuditConfig) -> Result<Box<dyn AuditStorage>, AuditError> {
    if !config.enabled {
        return Ok(Box::new(NullStorage));
    }

    match config.storage.backend {
        StorageBackend::Console => Ok(Box::new(ConsoleStorage)),
        StorageBackend::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageBackend::File => {
            let path = config.storage.file_path.as_deref().ok_or_else(|| {
                AuditError::InitializationFailed(
                    "file backend requires audit.storage.file_path".to_string(),
                )
            })?;
            Ok(Box::new(FileStorage::new(path)))
        }
    }
}

/// Console storage (JSON lines on stdout).
pub struct ConsoleStorage;

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;
        println!("{}", json);
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        // Console storage doesn't support querying
        Ok(vec![])
    }

    async fn get(&self, _event_id: Uuid) -> Result<Option<AuditEvent>, AuditError> {
        Ok(None)
    }
}

/// Discards everything.
pub struct NullStorage;

#[async_trait]
impl AuditStorage for NullStorage {
    async fn store(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }

    async fn get(&self, _event_id: Uuid) -> Result<Option<AuditEvent>, AuditError> {
        Ok(None)
    }
}

/// In-memory storage. Unbounded unless built with [`MemoryStorage::bounded`].
#[derive(Default)]
pub struct MemoryStorage {
    events: RwLock<VecDeque<AuditEvent>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` events, dropping the oldest first.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            capacity: Some(capacity),
        }
    }

    /// Snapshot of everything stored so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .read()
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn push(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut events = self.events.write().map_err(|e| {
            AuditError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Ok(());
            }
            while events.len() >= capacity {
                events.pop_front();
            }
        }
        events.push_back(event);
        Ok(())
    }

    fn filtered(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events.read().map_err(|e| {
            AuditError::StorageError(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(filter.apply(events.iter()))
    }

    fn find(&self, event_id: Uuid) -> Result<Option<AuditEvent>, AuditError> {
        let events = self.events.read().map_err(|e| {
            AuditError::StorageError(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(events.iter().find(|e| e.event_id == event_id).cloned())
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.push(event)
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.filtered(&filter)
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<AuditEvent>, AuditError> {
        self.find(event_id)
    }
}

/// File storage (appends JSON lines to a log file).
pub struct FileStorage {
    path: PathBuf,
    // Most recent events written by this process, for querying without
    // re-reading the file
    cache: MemoryStorage,
}

impl FileStorage {
    /// Events kept in the query cache unless configured otherwise.
    pub const DEFAULT_CACHE_SIZE: usize = 1000;

    /// Create a new file storage.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_cache_size(path, Self::DEFAULT_CACHE_SIZE)
    }

    /// Create a file storage whose query cache holds at most `max_cache_size`
    /// events. The file itself keeps everything.
    pub fn with_cache_size(path: impl Into<PathBuf>, max_cache_size: usize) -> Self {
        Self {
            path: path.into(),
            cache: MemoryStorage::bounded(max_cache_size),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;

        self.cache.push(event)
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.cache.filtered(&filter)
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<AuditEvent>, AuditError> {
        self.cache.find(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AuditEventType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_console_storage() {
        let storage = ConsoleStorage;
        let event = AuditEvent::new(AuditEventType::PolicyRead, "LIST");

        // Should not error
        storage.store(event).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_storage_query() {
        let storage = MemoryStorage::new();

        let event1 = AuditEvent::builder(AuditEventType::MutationExecuted, "CREATE")
            .caller("alice@example.com")
            .build();
        let event2 = AuditEvent::builder(AuditEventType::PermissionDenied, "CREATE")
            .caller("bob@example.com")
            .build();
        let id = event1.event_id;

        storage.store(event1).await.unwrap();
        storage.store(event2).await.unwrap();

        let filter = AuditFilter {
            caller: Some("bob@example.com".to_string()),
            ..Default::default()
        };
        let results = storage.query(filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_type, AuditEventType::PermissionDenied);

        assert!(storage.get(id).await.unwrap().is_some());
        assert_eq!(storage.events().len(), 2);
    }

    #[tokio::test]
    async fn test_file_storage_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        let storage = FileStorage::new(&path);

        storage
            .store(AuditEvent::new(AuditEventType::PreviewIssued, "CREATE"))
            .await
            .unwrap();
        storage
            .store(AuditEvent::new(AuditEventType::MutationExecuted, "CREATE"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.event_type, AuditEventType::PreviewIssued);

        let executed = storage
            .query(AuditFilter {
                event_type: Some(AuditEventType::MutationExecuted),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(executed.len(), 1);
    }

    #[tokio::test]
    async fn test_file_storage_cache_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        let storage = FileStorage::with_cache_size(&path, 2);

        let events: Vec<AuditEvent> = ["CREATE", "UPDATE", "DELETE"]
            .into_iter()
            .map(|action| AuditEvent::new(AuditEventType::MutationExecuted, action))
            .collect();
        let oldest = events[0].event_id;
        for event in events {
            storage.store(event).await.unwrap();
        }

        let cached = storage.query(AuditFilter::default()).await.unwrap();
        let actions: Vec<&str> = cached.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["UPDATE", "DELETE"]);
        assert!(storage.get(oldest).await.unwrap().is_none());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_create_storage_file_requires_path() {
        let mut config = AuditConfig::default();
        config.storage.backend = StorageBackend::File;
        assert!(matches!(
            create_storage(&config),
            Err(AuditError::InitializationFailed(_))
        ));
    }
}
