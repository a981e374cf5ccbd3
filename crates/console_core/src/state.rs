use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::normalize::records_from_names;
use crate::view_model::{ConsoleViewModel, FileRowView, OperationErrorView};

pub type FileId = u32;

/// Which of the two file lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FileKind {
    /// Uploaded test definitions (`.side`).
    #[default]
    Source,
    /// Spreadsheets produced by conversion (`.xlsx`).
    Converted,
}

impl FileKind {
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Source => "side",
            FileKind::Converted => "xlsx",
        }
    }

    pub fn accepts(self, filename: &str) -> bool {
        filename.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty() && ext.eq_ignore_ascii_case(self.extension())
        })
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Source => write!(f, "source"),
            FileKind::Converted => write!(f, "converted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: FileId,
    pub name: String,
}

/// Operation families. Each one tracks its own request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Fetch(FileKind),
    Upload(FileKind),
    Delete(FileKind),
    Convert,
    Execute,
    Record,
}

impl Operation {
    /// Failures of operations that act on files bump the `error_files` counter.
    pub fn counts_error_file(self) -> bool {
        matches!(
            self,
            Operation::Upload(_) | Operation::Delete(_) | Operation::Convert | Operation::Execute
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Fetch(kind) => write!(f, "fetch {kind} files"),
            Operation::Upload(kind) => write!(f, "upload {kind} file"),
            Operation::Delete(kind) => write!(f, "delete {kind} files"),
            Operation::Convert => write!(f, "convert to excel"),
            Operation::Execute => write!(f, "execute tests"),
            Operation::Record => write!(f, "toggle recording"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    /// Settled with a failure; the payload is in [`OperationStatus::error`].
    Error,
}

/// Error payload recorded in the store when a remote call fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    Network { message: String },
    Server { status: u16, body: String },
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::Network { message } => write!(f, "network error: {message}"),
            OpError::Server { status, body } if body.is_empty() => {
                write!(f, "server error {status}")
            }
            OpError::Server { status, body } => write!(f, "server error {status}: {body}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationStatus {
    pub status: RequestStatus,
    pub error: Option<OpError>,
}

impl OperationStatus {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Session counters; they only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationMetrics {
    pub uploaded: u64,
    pub deleted: u64,
    pub executed: u64,
    pub converted_to_excel: u64,
    pub error_files: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// Transient toast shown once by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

const FALLBACK_STEMS: [&str; 5] = ["google", "google2", "sample", "sample1", "sample2"];

/// Placeholder list shown when the initial fetch of `kind` fails.
pub fn fallback_files(kind: FileKind) -> Vec<FileRecord> {
    records_from_names(
        FALLBACK_STEMS
            .iter()
            .map(|stem| format!("{stem}.{}", kind.extension())),
    )
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    source: Vec<FileRecord>,
    converted: Vec<FileRecord>,
    displayed: FileKind,
    selection: BTreeSet<FileId>,
    operations: BTreeMap<Operation, OperationStatus>,
    metrics: OperationMetrics,
    last_conversion: Option<Value>,
    last_execution: Option<Value>,
    recording: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self, kind: FileKind) -> &[FileRecord] {
        match kind {
            FileKind::Source => &self.source,
            FileKind::Converted => &self.converted,
        }
    }

    pub fn displayed(&self) -> FileKind {
        self.displayed
    }

    pub fn selection(&self) -> &BTreeSet<FileId> {
        &self.selection
    }

    /// Names of the selected records, in list order.
    pub fn selected_names(&self) -> Vec<String> {
        self.files(self.displayed)
            .iter()
            .filter(|record| self.selection.contains(&record.id))
            .map(|record| record.name.clone())
            .collect()
    }

    pub fn contains_name(&self, kind: FileKind, name: &str) -> bool {
        self.files(kind).iter().any(|record| record.name == name)
    }

    /// Id of the first record named `name`.
    pub fn id_of(&self, kind: FileKind, name: &str) -> Option<FileId> {
        self.files(kind)
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.id)
    }

    pub fn name_of(&self, kind: FileKind, id: FileId) -> Option<&str> {
        self.files(kind)
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.name.as_str())
    }

    pub fn status(&self, op: Operation) -> OperationStatus {
        self.operations.get(&op).cloned().unwrap_or_default()
    }

    pub fn error(&self, op: Operation) -> Option<&OpError> {
        self.operations.get(&op).and_then(|status| status.error.as_ref())
    }

    pub fn is_busy(&self) -> bool {
        self.operations.values().any(OperationStatus::is_pending)
    }

    pub fn metrics(&self) -> OperationMetrics {
        self.metrics
    }

    pub fn last_conversion(&self) -> Option<&Value> {
        self.last_conversion.as_ref()
    }

    pub fn last_execution(&self) -> Option<&Value> {
        self.last_execution.as_ref()
    }

    pub fn recording(&self) -> bool {
        self.recording
    }

    pub fn view(&self) -> ConsoleViewModel {
        let rows = self
            .files(self.displayed)
            .iter()
            .map(|record| FileRowView {
                id: record.id,
                name: record.name.clone(),
                selected: self.selection.contains(&record.id),
            })
            .collect();
        let errors = self
            .operations
            .iter()
            .filter_map(|(op, status)| {
                status.error.as_ref().map(|error| OperationErrorView {
                    operation: *op,
                    message: error.to_string(),
                })
            })
            .collect();

        ConsoleViewModel {
            displayed: self.displayed,
            rows,
            selected_count: self.selection.len(),
            source_count: self.source.len(),
            converted_count: self.converted.len(),
            metrics: self.metrics,
            busy: self.is_busy(),
            errors,
            recording: self.recording,
        }
    }

    pub(crate) fn begin(&mut self, op: Operation) {
        self.operations.insert(
            op,
            OperationStatus {
                status: RequestStatus::Pending,
                error: None,
            },
        );
    }

    pub(crate) fn finish(&mut self, op: Operation) {
        self.operations.insert(op, OperationStatus::default());
    }

    pub(crate) fn fail(&mut self, op: Operation, error: OpError) {
        self.operations.insert(
            op,
            OperationStatus {
                status: RequestStatus::Error,
                error: Some(error),
            },
        );
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut OperationMetrics {
        &mut self.metrics
    }

    pub(crate) fn replace_files(&mut self, kind: FileKind, records: Vec<FileRecord>) {
        match kind {
            FileKind::Source => self.source = records,
            FileKind::Converted => self.converted = records,
        }
        self.prune_selection();
    }

    pub(crate) fn append_file(&mut self, kind: FileKind, name: String) {
        let names = self
            .files(kind)
            .iter()
            .map(|record| record.name.clone())
            .chain(std::iter::once(name));
        let records = records_from_names(names);
        self.replace_files(kind, records);
    }

    /// Removes exactly the records with the given ids and renumbers the rest;
    /// returns how many went.
    pub(crate) fn remove_files(&mut self, kind: FileKind, ids: &[FileId]) -> usize {
        let before = self.files(kind).len();
        let kept: Vec<String> = self
            .files(kind)
            .iter()
            .filter(|record| !ids.contains(&record.id))
            .map(|record| record.name.clone())
            .collect();
        let removed = before - kept.len();
        self.replace_files(kind, records_from_names(kept));
        removed
    }

    pub(crate) fn show(&mut self, kind: FileKind) {
        if self.displayed != kind {
            self.displayed = kind;
            self.selection.clear();
        }
    }

    pub(crate) fn toggle_selected(&mut self, id: FileId) {
        if !self.selection.remove(&id) && self.name_of(self.displayed, id).is_some() {
            self.selection.insert(id);
        }
    }

    pub(crate) fn toggle_select_all(&mut self) {
        let all: BTreeSet<FileId> = self
            .files(self.displayed)
            .iter()
            .map(|record| record.id)
            .collect();
        if self.selection == all {
            self.selection.clear();
        } else {
            self.selection = all;
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub(crate) fn set_last_conversion(&mut self, artifact: Value) {
        self.last_conversion = Some(artifact);
    }

    pub(crate) fn set_last_execution(&mut self, handle: Value) {
        self.last_execution = Some(handle);
    }

    pub(crate) fn set_recording(&mut self, enabled: bool) {
        self.recording = enabled;
    }

    fn prune_selection(&mut self) {
        let displayed = match self.displayed {
            FileKind::Source => &self.source,
            FileKind::Converted => &self.converted,
        };
        self.selection
            .retain(|id| displayed.iter().any(|record| record.id == *id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_accepts_only_its_extension() {
        assert!(FileKind::Source.accepts("login.side"));
        assert!(FileKind::Source.accepts("LOGIN.SIDE"));
        assert!(!FileKind::Source.accepts("login.xlsx"));
        assert!(!FileKind::Source.accepts(".side"));
        assert!(!FileKind::Source.accepts("side"));
        assert!(FileKind::Converted.accepts("report.xlsx"));
    }

    #[test]
    fn fallback_lists_match_kind() {
        let source = fallback_files(FileKind::Source);
        assert_eq!(source.len(), 5);
        assert_eq!(source[0], FileRecord { id: 1, name: "google.side".into() });
        assert!(fallback_files(FileKind::Converted)
            .iter()
            .all(|record| FileKind::Converted.accepts(&record.name)));
    }

    #[test]
    fn status_defaults_to_idle() {
        let state = AppState::new();
        assert_eq!(state.status(Operation::Convert), OperationStatus::default());
        assert!(!state.is_busy());
    }

    #[test]
    fn remove_files_renumbers_and_prunes_selection() {
        let mut state = AppState::new();
        state.replace_files(
            FileKind::Source,
            records_from_names(["x", "y", "z"].map(String::from)),
        );
        state.toggle_selected(3);
        state.toggle_selected(1);

        let removed = state.remove_files(FileKind::Source, &[2, 3]);

        assert_eq!(removed, 2);
        assert_eq!(
            state.files(FileKind::Source),
            &[FileRecord { id: 1, name: "x".into() }]
        );
        assert_eq!(state.selection().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn remove_files_leaves_same_named_records_alone() {
        let mut state = AppState::new();
        state.replace_files(
            FileKind::Source,
            records_from_names(["a.side", "a.side", "b.side"].map(String::from)),
        );

        let removed = state.remove_files(FileKind::Source, &[1]);

        assert_eq!(removed, 1);
        assert_eq!(
            state.files(FileKind::Source),
            &[
                FileRecord { id: 1, name: "a.side".into() },
                FileRecord { id: 2, name: "b.side".into() },
            ]
        );
        assert_eq!(state.id_of(FileKind::Source, "b.side"), Some(2));
    }
}
