use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Default bound on a single request/reply exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any reference-data entity must implement to be managed by
/// [`ResourceActor`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    // --- Custom Actions ---
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and creation parameters.
    /// Returning `Err` rejects the row before it is stored.
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;
    fn on_delete(&self) -> Result<(), String> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;
}

/// Errors produced by the generic actor plumbing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A lifecycle hook or action refused the request.
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl FrameworkError {
    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FrameworkError::ActorClosed | FrameworkError::ActorDropped | FrameworkError::Timeout(_)
        )
    }
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Row predicate shipped to the actor for list and bulk-delete requests.
pub struct RowFilter<T>(Box<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> RowFilter<T> {
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }

    pub fn all() -> Self {
        Self::new(|_| true)
    }

    pub fn matches(&self, item: &T) -> bool {
        (self.0)(item)
    }
}

impl<T> Debug for RowFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowFilter(..)")
    }
}

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        filter: RowFilter<T>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    /// Removes every row matching the filter; answers with the removed rows.
    DeleteWhere {
        filter: RowFilter<T>,
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    name: &'static str,
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        name: &'static str,
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name,
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    pub async fn run(mut self) {
        info!(actor = self.name, "Resource actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = self.store.values().filter(|item| filter.matches(item)).cloned().collect();
                    debug!(actor = self.name, count = items.len(), "Listed rows");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item
                            .on_update(patch)
                            .map(|_| item.clone())
                            .map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(&id));
                }
                ResourceRequest::DeleteWhere { filter, respond_to } => {
                    let ids: Vec<T::Id> = self
                        .store
                        .values()
                        .filter(|item| filter.matches(item))
                        .map(|item| item.id().clone())
                        .collect();
                    let removed: Vec<T> = ids.iter().filter_map(|id| self.store.remove(id)).collect();
                    info!(actor = self.name, count = removed.len(), "Bulk delete");
                    let _ = respond_to.send(Ok(removed));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item.handle_action(action).map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Shutdown => {
                    info!(actor = self.name, "Resource actor shutting down");
                    break;
                }
            }
        }
        info!(actor = self.name, "Resource actor stopped");
    }

    fn handle_create(&mut self, params: T::CreateParams) -> Result<T::Id, FrameworkError> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create_params(id.clone(), params).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        if self.store.contains_key(&id) {
            warn!(actor = self.name, %id, "Id generator produced a duplicate");
            return Err(FrameworkError::Rejected(format!("Duplicate id: {}", id)));
        }
        self.store.insert(id.clone(), item);
        debug!(actor = self.name, %id, "Row created");
        Ok(id)
    }

    fn handle_delete(&mut self, id: &T::Id) -> Result<(), FrameworkError> {
        let item = self.store.get(id).ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.on_delete().map_err(FrameworkError::Rejected)?;
        self.store.remove(id);
        Ok(())
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    timeout: Duration,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self {
            sender,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends one request and waits for the reply, bounded by the client timeout.
    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(build(respond_to))
                .await
                .map_err(|_| FrameworkError::ActorClosed)?;
            response.await.map_err(|_| FrameworkError::ActorDropped)?
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FrameworkError::Timeout(self.timeout))?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self, filter: RowFilter<T>) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List { filter, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn delete_where(&self, filter: RowFilter<T>) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::DeleteWhere { filter, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    /// Asks the actor to stop. Requests already queued are still answered.
    pub async fn shutdown(&self) -> Result<(), FrameworkError> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Tray {
        id: String,
        label: String,
        clean: bool,
    }

    #[derive(Debug)]
    struct TrayCreate {
        label: String,
    }

    #[derive(Debug)]
    struct TrayPatch {
        label: Option<String>,
    }

    #[derive(Debug)]
    enum TrayAction {
        Wash,
    }

    impl Entity for Tray {
        type Id = String;
        type CreateParams = TrayCreate;
        type Patch = TrayPatch;
        type Action = TrayAction;
        type ActionResult = bool;

        fn id(&self) -> &String {
            &self.id
        }

        fn from_create_params(id: String, params: TrayCreate) -> Result<Self, String> {
            if params.label.is_empty() {
                return Err("label required".into());
            }
            Ok(Self { id, label: params.label, clean: false })
        }

        fn on_update(&mut self, patch: TrayPatch) -> Result<(), String> {
            if let Some(label) = patch.label {
                self.label = label;
            }
            Ok(())
        }

        fn handle_action(&mut self, action: TrayAction) -> Result<bool, String> {
            match action {
                TrayAction::Wash => {
                    let changed = !self.clean;
                    self.clean = true;
                    Ok(changed)
                }
            }
        }
    }

    fn start() -> ResourceClient<Tray> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("tray_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = ResourceActor::new("trays", 10, next_id);
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_resource_actor_with_actions() {
        let client = start();

        let id = client.create(TrayCreate { label: "blue".into() }).await.unwrap();
        assert_eq!(id, "tray_1");

        assert!(client.perform_action(id.clone(), TrayAction::Wash).await.unwrap());
        let tray = client.get(id.clone()).await.unwrap().unwrap();
        assert!(tray.clean);

        // Washing again is a no-op
        assert!(!client.perform_action(id.clone(), TrayAction::Wash).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejections_and_not_found() {
        let client = start();

        let err = client.create(TrayCreate { label: String::new() }).await.unwrap_err();
        assert_eq!(err, FrameworkError::Rejected("label required".into()));

        let err = client.update("tray_9".into(), TrayPatch { label: None }).await.unwrap_err();
        assert_eq!(err, FrameworkError::NotFound("tray_9".into()));
        assert!(!err.is_transient());

        assert_eq!(client.get("tray_9".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_and_delete_where() {
        let client = start();
        for label in ["red", "red", "green"] {
            client.create(TrayCreate { label: label.into() }).await.unwrap();
        }

        let reds = client.list(RowFilter::new(|t: &Tray| t.label == "red")).await.unwrap();
        assert_eq!(reds.len(), 2);

        let removed = client.delete_where(RowFilter::new(|t: &Tray| t.label == "red")).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(client.list(RowFilter::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_actor() {
        let client = start();
        client.shutdown().await.unwrap();
        // Give the actor a chance to drain and drop its receiver.
        tokio::task::yield_now().await;
        let err = client.get("tray_1".into()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
