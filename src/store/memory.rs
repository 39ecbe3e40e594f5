use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::TodoStore;
use crate::models::{NewTodo, Todo, TodoChanges};

/// Number of times each gateway operation was invoked
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub update: usize,
    pub find_by_id: usize,
    pub delete: usize,
}

/// Gateway operations that can be made to fail individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Update,
    FindById,
    Delete,
    HealthCheck,
}

#[derive(Default)]
struct Counters {
    create: AtomicUsize,
    update: AtomicUsize,
    find_by_id: AtomicUsize,
    delete: AtomicUsize,
}

/// In-process store backed by a `HashMap`
///
/// Cloning shares the underlying table. `set_failing(true)` makes every call
/// return an error, which stands in for an unreachable backend. `fail_on`
/// does the same for a single operation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    todos: Arc<RwLock<HashMap<String, Todo>>>,
    counters: Arc<Counters>,
    failing: Arc<AtomicBool>,
    failing_ops: Arc<Mutex<HashSet<Op>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_on(&self, op: Op) {
        self.failing_ops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(op);
    }

    #[cfg(test)]
    pub fn clear_failures(&self) {
        self.failing.store(false, Ordering::SeqCst);
        self.failing_ops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    #[cfg(test)]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            create: self.counters.create.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            find_by_id: self.counters.find_by_id.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }

    fn check_available(&self, op: Op) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("memory store is unavailable");
        }
        let failing_ops = self
            .failing_ops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing_ops.contains(&op) {
            bail!("memory store is unavailable for {:?}", op);
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create(&self, new: NewTodo) -> Result<Todo> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        self.check_available(Op::Create)?;

        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            completed: new.completed,
            created_at: now,
            updated_at: now,
        };
        self.todos.write().await.insert(todo.id.clone(), todo.clone());

        tracing::debug!("Inserted todo with id: {}", todo.id);
        Ok(todo)
    }

    async fn update(&self, id: &str, changes: TodoChanges) -> Result<Todo> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        self.check_available(Op::Update)?;

        let mut todos = self.todos.write().await;
        let todo = todos
            .get_mut(id)
            .ok_or_else(|| anyhow!("no todo with id {}", id))?;
        todo.apply(changes, Utc::now());

        tracing::debug!("Updated todo with id: {}", id);
        Ok(todo.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>> {
        self.counters.find_by_id.fetch_add(1, Ordering::SeqCst);
        self.check_available(Op::FindById)?;

        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<Todo> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        self.check_available(Op::Delete)?;

        let removed = self
            .todos
            .write()
            .await
            .remove(id)
            .ok_or_else(|| anyhow!("no todo with id {}", id))?;

        tracing::debug!("Deleted todo with id: {}", id);
        Ok(removed)
    }

    async fn health_check(&self) -> Result<()> {
        self.check_available(Op::HealthCheck)
    }
}
