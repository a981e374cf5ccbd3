//! Console engine: remote backend client and the actions that drive the store.
mod actions;
mod client;
mod endpoint;
mod engine;
mod types;

pub use actions::{ActionOutcome, Console, LogNotificationSink, NotificationSink, ValidationError};
pub use client::{list_entries, ClientSettings, RemoteService, ReqwestRemoteService};
pub use endpoint::{CredentialSet, CredentialTier, Credentials, Endpoint};
pub use engine::{Command, EngineEvent, EngineHandle, Ticket};
pub use types::{ExecuteOptions, RemoteError};
