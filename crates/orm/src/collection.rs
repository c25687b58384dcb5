//! Lazily loaded to-many relationships.

use crate::model::Model;
use crate::session::Session;
use crate::Result;
use docgraph_schema::ResourceId;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Handle on one managed object's to-many relationship.
///
/// Members are resolved on first access and remembered by the handle;
/// [`refresh`](Self::refresh) forgets them. Every mutation replaces the
/// relationship's pending linkage with the full new member list, which is
/// sent with the owner's next update.
pub struct RemoteCollection<T: Model> {
    session: Session,
    owner_type: String,
    owner_id: ResourceId,
    name: String,
    resolved: Mutex<Option<Vec<Arc<T>>>>,
}

impl<T: Model> RemoteCollection<T> {
    pub(crate) fn new(session: Session, owner_type: String, owner_id: ResourceId, name: String) -> Self {
        Self {
            session,
            owner_type,
            owner_id,
            name,
            resolved: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_id(&self) -> &ResourceId {
        &self.owner_id
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.lock().is_some()
    }

    pub async fn items(&self) -> Result<Vec<Arc<T>>> {
        let cached = self.resolved.lock().clone();
        if let Some(items) = cached {
            return Ok(items);
        }

        let items = self
            .session
            .resolve_collection::<T>(&self.owner_type, &self.owner_id, &self.name)
            .await?;
        *self.resolved.lock() = Some(items.clone());
        Ok(items)
    }

    /// Drop the resolved members and resolve them again.
    pub async fn refresh(&self) -> Result<Vec<Arc<T>>> {
        self.resolved.lock().take();
        self.items().await
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.items().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.items().await?.is_empty())
    }

    pub async fn contains(&self, item: &T) -> Result<bool> {
        let Some(id) = item.state().id() else {
            return Ok(false);
        };
        Ok(self
            .items()
            .await?
            .iter()
            .any(|member| member.state().id() == Some(id)))
    }

    /// Add `item` unless a member with its id is already present. An item
    /// without an id is assigned one.
    pub async fn push(&self, item: Arc<T>) -> Result<()> {
        let mut items = self.items().await?;
        let id = item.state().ensure_id().clone();
        if items.iter().any(|member| member.state().id() == Some(&id)) {
            return Ok(());
        }
        items.push(item);
        self.replace(items)
    }

    /// Remove the member with `item`'s id. Returns whether one was removed.
    pub async fn remove(&self, item: &T) -> Result<bool> {
        let Some(id) = item.state().id().cloned() else {
            return Ok(false);
        };
        let mut items = self.items().await?;
        let before = items.len();
        items.retain(|member| member.state().id() != Some(&id));
        if items.len() == before {
            return Ok(false);
        }
        self.replace(items)?;
        Ok(true)
    }

    pub fn replace(&self, items: Vec<Arc<T>>) -> Result<()> {
        self.session
            .write_collection(&self.owner_type, &self.owner_id, &self.name, &items)?;
        *self.resolved.lock() = Some(items);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.replace(Vec::new())
    }
}

impl<T: Model> fmt::Debug for RemoteCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCollection")
            .field("owner", &format_args!("{}/{}", self.owner_type, self.owner_id))
            .field("name", &self.name)
            .field("resolved", &self.resolved.lock().as_ref().map(Vec::len))
            .finish()
    }
}
