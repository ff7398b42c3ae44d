pub mod coordinator;
pub mod error;
pub mod naming;
pub mod notifier;
pub mod reconciler;
pub mod request;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use coordinator::{CoordinatorConfig, TaskCoordinator, DEFAULT_MAX_ROUNDS};
pub use error::{OrchestratorError, Result};
pub use notifier::{HttpNotifier, NotificationPayload, Notifier, DEFAULT_NOTIFY_TIMEOUT};
pub use reconciler::{ReconcileOutcome, Reconciler, ReconcilerConfig, UNKNOWN_COMMIT};
pub use request::{AttachmentRef, Attachments, DeployRequest, DeployResponse, RoundRequest, RoundResult};
pub use store::{IdentityLocks, InMemoryRepositoryStore};
