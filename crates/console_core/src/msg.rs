use serde_json::Value;

use crate::{FileId, FileKind, Notification, OpError, Operation};

/// Actions accepted by [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A listing of `kind` was sent to the backend.
    FetchRequested { kind: FileKind },
    /// The backend returned the raw listing of `kind`.
    FetchSucceeded { kind: FileKind, entries: Vec<Value> },
    UploadRequested { kind: FileKind, filename: String },
    /// `ack` is whatever the backend echoed for the stored file.
    UploadSucceeded {
        kind: FileKind,
        filename: String,
        ack: Value,
    },
    DeleteRequested { kind: FileKind, ids: Vec<FileId> },
    /// The whole batch was acknowledged; `ids` are the records it covered.
    DeleteSucceeded { kind: FileKind, ids: Vec<FileId> },
    ConvertRequested { filename: String },
    ConvertSucceeded { filename: String, artifact: Value },
    ExecuteRequested { names: Vec<String> },
    /// Execution was accepted; it may still be running remotely.
    ExecuteSucceeded { names: Vec<String>, handle: Value },
    RecordRequested { enabled: bool },
    RecordSucceeded { enabled: bool },
    /// Any remote call of family `op` failed.
    OperationFailed { op: Operation, error: OpError },
    /// Install the placeholder list for `kind` after a failed initial fetch.
    FallbackApplied { kind: FileKind },
    /// User switched the visible table.
    ShowList(FileKind),
    /// User clicked a row checkbox.
    ToggleSelected(FileId),
    /// User clicked the header checkbox.
    SelectAll,
    ClearSelection,
    /// A notification raised outside any settlement, e.g. by validation.
    Notified(Notification),
}
