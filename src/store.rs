// Task store: per-user view over a shared backing collection

use crate::error::{StoreError, StoreResult, ValidationError};
use crate::filter::TaskQuery;
use crate::identity::IdentityProvider;
use crate::models::{Task, TaskCounts, TaskDraft, TaskPatch};
use crate::provider::PersistenceProvider;
use crate::record::{Record, Stored};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Owns the task collection and answers queries for the current user
///
/// The backing collection holds every user's records. Only tasks owned by
/// the authenticated user are visible through this store, but every write
/// sends the whole backing collection to the provider so other users' data
/// is carried along untouched.
pub struct TaskStore<P, I> {
    provider: P,
    identity: I,
    records: Vec<Stored<Task>>,
    clock: Clock,
}

impl<P: PersistenceProvider, I: IdentityProvider> TaskStore<P, I> {
    /// Create a store and load the backing collection from the provider
    ///
    /// A provider that has never been written to yields an empty store.
    pub fn open(provider: P, identity: I) -> StoreResult<Self> {
        let mut store = Self {
            provider,
            identity,
            records: Vec::new(),
            clock: Box::new(Utc::now),
        };
        store.load()?;
        Ok(store)
    }

    /// Replace the source of `created_at` timestamps
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Reload the backing collection from the provider
    ///
    /// Returns the number of tasks visible to the current user. On a read
    /// failure the in-memory collection is left as it was.
    pub fn load(&mut self) -> StoreResult<usize> {
        let collection = Task::collection_name();
        let values = self.provider.read_all(collection)?;

        self.records = values.into_iter().map(Stored::decode).collect();

        let undecoded = self.records.iter().filter(|r| r.as_decoded().is_none()).count();
        if undecoded > 0 {
            warn!(collection, undecoded, "Backing collection holds records that are not tasks");
        }

        let visible = self.tasks().count();
        info!(
            collection,
            total = self.records.len(),
            visible,
            authenticated = self.identity.is_authenticated(),
            "Loaded task collection"
        );
        Ok(visible)
    }

    /// Write the entire backing collection to the provider
    pub fn persist(&mut self) -> StoreResult<()> {
        let collection = Task::collection_name();
        let values = self
            .records
            .iter()
            .map(Stored::encode)
            .collect::<Result<Vec<Value>, _>>()?;

        self.provider.write_all(collection, &values)?;
        debug!(collection, count = values.len(), "Persisted task collection");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task owned by the current user
    pub fn create(&mut self, draft: TaskDraft) -> StoreResult<Task> {
        if !self.identity.is_authenticated() {
            return Err(ValidationError::Unauthenticated.into());
        }

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let task = Task {
            id: self.fresh_id(),
            title: title.to_string(),
            description: draft.description.as_deref().map(str::trim).unwrap_or_default().to_string(),
            category: draft.category.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date,
            completed: false,
            created_at: (self.clock)(),
            user_id: self.identity.current_user_id(),
        };

        debug!(id = %task.id, user = %task.user_id, "Creating task");
        self.records.push(Stored::Decoded(task.clone()));
        self.persist()?;
        Ok(task)
    }

    /// Merge a patch into one of the current user's tasks
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> StoreResult<Task> {
        let index = self.position(id)?;

        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::EmptyTitle.into());
        }

        let task = self.records[index]
            .as_decoded_mut()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(task);
        let updated = task.clone();

        debug!(id, "Updated task");
        self.persist()?;
        Ok(updated)
    }

    /// Remove one of the current user's tasks
    pub fn delete(&mut self, id: &str) -> StoreResult<()> {
        let index = self.position(id)?;
        self.records.remove(index);

        debug!(id, "Deleted task");
        self.persist()
    }

    /// Flip the completion flag of one of the current user's tasks
    pub fn toggle_completion(&mut self, id: &str) -> StoreResult<Task> {
        let completed = self.get(id)?.completed;
        self.update(id, TaskPatch::completed(!completed))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The current user's tasks in insertion order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        let user = self.current_user();
        self.records
            .iter()
            .filter_map(Stored::as_decoded)
            .filter(move |task| user.as_deref() == Some(task.owner()))
    }

    pub fn get(&self, id: &str) -> StoreResult<Task> {
        self.tasks()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Matching tasks of the current user, newest-created first
    pub fn query(&self, query: &TaskQuery) -> Vec<Task> {
        query.apply(self.tasks())
    }

    pub fn counts(&self) -> TaskCounts {
        let (total, completed) = self
            .tasks()
            .fold((0, 0), |(total, done), task| (total + 1, done + usize::from(task.completed)));

        TaskCounts {
            total,
            completed,
            pending: total - completed,
        }
    }

    /// Number of records in the backing collection, all users included
    pub fn backing_len(&self) -> usize {
        self.records.len()
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn current_user(&self) -> Option<String> {
        self.identity
            .is_authenticated()
            .then(|| self.identity.current_user_id())
    }

    /// Index into `records` of a task visible to the current user
    fn position(&self, id: &str) -> StoreResult<usize> {
        let user = self.current_user();
        self.records
            .iter()
            .position(|r| {
                r.as_decoded()
                    .is_some_and(|task| task.id == id && user.as_deref() == Some(task.owner()))
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Id not used by any record in the backing collection
    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::now_v7().to_string();
            if !self.records.iter().any(|r| r.id() == Some(id.as_str())) {
                return id;
            }
        }
    }
}
