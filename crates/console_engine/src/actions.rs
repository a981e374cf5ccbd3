use std::sync::Arc;

use console_core::{
    Effect, FileId, FileKind, Msg, Notification, NotificationLevel, OpError, Operation, Snapshot,
    Store,
};
use console_logging::{console_debug, console_error, console_info, console_warn};
use thiserror::Error;

use crate::{ExecuteOptions, RemoteError, RemoteService};

/// Receives the toasts produced while actions settle.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sink that only writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => console_error!("{}", notification.message),
            NotificationLevel::Success | NotificationLevel::Info => {
                console_info!("{}", notification.message)
            }
        }
    }
}

/// Local checks that stop an action before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a {kind} file named {name} already exists")]
    DuplicateName { kind: FileKind, name: String },
    #[error("{name} is not a .{} file", .kind.extension())]
    UnsupportedExtension { kind: FileKind, name: String },
    #[error("no {kind} file named {name}")]
    UnknownFile { kind: FileKind, name: String },
    #[error("no files selected")]
    NothingSelected,
}

/// How an action settled. Actions never return errors; failures are recorded
/// in the store and reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    Failed(OpError),
    Rejected(ValidationError),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }
}

/// Orchestrates remote calls and the store transitions around them.
#[derive(Clone)]
pub struct Console {
    store: Arc<Store>,
    remote: Arc<dyn RemoteService>,
    sink: Arc<dyn NotificationSink>,
}

impl Console {
    pub fn new(
        store: Arc<Store>,
        remote: Arc<dyn RemoteService>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            remote,
            sink,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Applies a user intent that needs no backend call (selection, list switch).
    pub fn dispatch(&self, msg: Msg) -> Snapshot {
        let (snapshot, effects) = self.store.dispatch(msg);
        // Local intents never ask for a refetch.
        let _ = self.forward(effects);
        snapshot
    }

    pub async fn fetch_files(&self, kind: FileKind) -> ActionOutcome {
        self.apply(Msg::FetchRequested { kind });
        match self.remote.list_files(kind).await {
            Ok(entries) => {
                console_debug!("fetched {} {} entries", entries.len(), kind);
                self.apply(Msg::FetchSucceeded { kind, entries });
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Fetch(kind), err),
        }
    }

    /// Fetch for a freshly shown page: on failure the placeholder list is
    /// installed so there is always something to render.
    pub async fn load_files(&self, kind: FileKind) -> ActionOutcome {
        let outcome = self.fetch_files(kind).await;
        if let ActionOutcome::Failed(_) = outcome {
            self.apply(Msg::FallbackApplied { kind });
        }
        outcome
    }

    pub async fn upload_file(
        &self,
        kind: FileKind,
        filename: &str,
        content: Vec<u8>,
    ) -> ActionOutcome {
        if !kind.accepts(filename) {
            return self.reject(ValidationError::UnsupportedExtension {
                kind,
                name: filename.to_owned(),
            });
        }
        // The backend stores duplicates happily; only the console refuses them.
        if self.store.snapshot().contains_name(kind, filename) {
            return self.reject(ValidationError::DuplicateName {
                kind,
                name: filename.to_owned(),
            });
        }

        self.apply(Msg::UploadRequested {
            kind,
            filename: filename.to_owned(),
        });
        match self.remote.upload_file(kind, content, filename).await {
            Ok(ack) => {
                self.apply(Msg::UploadSucceeded {
                    kind,
                    filename: filename.to_owned(),
                    ack,
                });
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Upload(kind), err),
        }
    }

    /// Deletes the records with the given ids from the list of `kind`.
    /// Ids missing from the current list are skipped.
    pub async fn delete_files(&self, kind: FileKind, ids: &[FileId]) -> ActionOutcome {
        let snapshot = self.store.snapshot();
        let mut known: Vec<FileId> = Vec::with_capacity(ids.len());
        for id in ids {
            if snapshot.name_of(kind, *id).is_some() && !known.contains(id) {
                known.push(*id);
            }
        }
        self.delete_records(kind, known).await
    }

    pub async fn delete_selected(&self) -> ActionOutcome {
        let snapshot = self.store.snapshot();
        let ids: Vec<FileId> = snapshot.selection().iter().copied().collect();
        self.delete_files(snapshot.displayed(), &ids).await
    }

    /// Deletes by name. Each distinct name stands for its first record in the list.
    pub async fn delete_names(&self, kind: FileKind, names: Vec<String>) -> ActionOutcome {
        if names.is_empty() {
            return self.reject(ValidationError::NothingSelected);
        }
        if let Some(err) = self.first_unknown(kind, &names) {
            return self.reject(err);
        }
        let snapshot = self.store.snapshot();
        let mut ids: Vec<FileId> = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(id) = snapshot.id_of(kind, name) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        self.delete_records(kind, ids).await
    }

    async fn delete_records(&self, kind: FileKind, ids: Vec<FileId>) -> ActionOutcome {
        if ids.is_empty() {
            return self.reject(ValidationError::NothingSelected);
        }
        let snapshot = self.store.snapshot();
        let mut names: Vec<String> = Vec::with_capacity(ids.len());
        for name in ids.iter().filter_map(|id| snapshot.name_of(kind, *id)) {
            if !names.iter().any(|sent| sent == name) {
                names.push(name.to_owned());
            }
        }

        self.apply(Msg::DeleteRequested {
            kind,
            ids: ids.clone(),
        });
        match self.remote.delete_files(kind, &names).await {
            Ok(_) => {
                let refetch = self.apply(Msg::DeleteSucceeded { kind, ids });
                self.refetch(refetch).await;
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Delete(kind), err),
        }
    }

    /// Converts one source file.
    pub async fn convert(&self, filename: &str, use_case: &str) -> ActionOutcome {
        if let Some(err) = self.first_unknown(FileKind::Source, &[filename.to_owned()]) {
            return self.reject(err);
        }

        self.apply(Msg::ConvertRequested {
            filename: filename.to_owned(),
        });
        match self.remote.convert_to_spreadsheet(filename, use_case).await {
            Ok(artifact) => {
                let refetch = self.apply(Msg::ConvertSucceeded {
                    filename: filename.to_owned(),
                    artifact,
                });
                self.refetch(refetch).await;
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Convert, err),
        }
    }

    /// Starts a run of converted files. Settles as soon as the backend accepts it.
    pub async fn execute(&self, names: Vec<String>, options: &ExecuteOptions) -> ActionOutcome {
        if names.is_empty() {
            return self.reject(ValidationError::NothingSelected);
        }
        if let Some(err) = self.first_unknown(FileKind::Converted, &names) {
            return self.reject(err);
        }

        self.apply(Msg::ExecuteRequested {
            names: names.clone(),
        });
        match self.remote.execute_tests(&names, options).await {
            Ok(handle) => {
                self.apply(Msg::ExecuteSucceeded { names, handle });
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Execute, err),
        }
    }

    pub async fn execute_selected(&self, options: &ExecuteOptions) -> ActionOutcome {
        let names = self.store.snapshot().selected_names();
        self.execute(names, options).await
    }

    pub async fn execute_legacy(&self) -> ActionOutcome {
        self.apply(Msg::ExecuteRequested { names: Vec::new() });
        match self.remote.execute_legacy().await {
            Ok(handle) => {
                self.apply(Msg::ExecuteSucceeded {
                    names: Vec::new(),
                    handle,
                });
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Execute, err),
        }
    }

    pub async fn record(&self, enabled: bool) -> ActionOutcome {
        self.apply(Msg::RecordRequested { enabled });
        match self.remote.start_recording(enabled).await {
            Ok(_) => {
                self.apply(Msg::RecordSucceeded { enabled });
                ActionOutcome::Succeeded
            }
            Err(err) => self.fail(Operation::Record, err),
        }
    }

    /// Dispatches `msg`, forwards its notifications and returns the lists to refetch.
    fn apply(&self, msg: Msg) -> Vec<FileKind> {
        let (_, effects) = self.store.dispatch(msg);
        self.forward(effects)
    }

    fn forward(&self, effects: Vec<Effect>) -> Vec<FileKind> {
        let mut refetch = Vec::new();
        for effect in effects {
            match effect {
                Effect::Notify(notification) => self.sink.notify(notification),
                Effect::Refetch { kind } => refetch.push(kind),
            }
        }
        refetch
    }

    async fn refetch(&self, kinds: Vec<FileKind>) {
        for kind in kinds {
            console_debug!("refetching {} files", kind);
            self.fetch_files(kind).await;
        }
    }

    fn fail(&self, op: Operation, err: RemoteError) -> ActionOutcome {
        console_warn!("{} failed: {}", op, err);
        let error = OpError::from(err);
        self.apply(Msg::OperationFailed {
            op,
            error: error.clone(),
        });
        ActionOutcome::Failed(error)
    }

    fn reject(&self, err: ValidationError) -> ActionOutcome {
        console_info!("rejected locally: {}", err);
        self.apply(Msg::Notified(Notification::error(err.to_string())));
        ActionOutcome::Rejected(err)
    }

    fn first_unknown(&self, kind: FileKind, names: &[String]) -> Option<ValidationError> {
        let snapshot = self.store.snapshot();
        names
            .iter()
            .find(|name| !snapshot.contains_name(kind, name))
            .map(|name| ValidationError::UnknownFile {
                kind,
                name: name.clone(),
            })
    }
}
