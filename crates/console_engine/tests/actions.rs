use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, Once};

use console_core::{
    FileKind, FileRecord, Msg, Notification, NotificationLevel, OpError, Operation, RequestStatus,
    Store,
};
use console_engine::{
    ActionOutcome, Console, ExecuteOptions, NotificationSink, RemoteError, RemoteService,
    ValidationError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::oneshot;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(console_logging::initialize_for_tests);
}

/// In-memory backend that records every call it receives.
#[derive(Default)]
struct FakeBackend {
    source: Mutex<Vec<String>>,
    converted: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with_files(source: &[&str], converted: &[&str]) -> Self {
        let backend = Self::default();
        *backend.source.lock().unwrap() = source.iter().map(|s| s.to_string()).collect();
        *backend.converted.lock().unwrap() = converted.iter().map(|s| s.to_string()).collect();
        backend
    }

    fn fail(&self, call: &'static str) {
        self.failing.lock().unwrap().insert(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn list(&self, kind: FileKind) -> &Mutex<Vec<String>> {
        match kind {
            FileKind::Source => &self.source,
            FileKind::Converted => &self.converted,
        }
    }

    fn enter(&self, call: &'static str, detail: String) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(format!("{call} {detail}"));
        if self.failing.lock().unwrap().contains(call) {
            return Err(RemoteError::Server {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteService for FakeBackend {
    async fn list_files(&self, kind: FileKind) -> Result<Vec<Value>, RemoteError> {
        self.enter("list", kind.to_string())?;
        Ok(self.list(kind).lock().unwrap().iter().map(|n| json!(n)).collect())
    }

    async fn upload_file(
        &self,
        kind: FileKind,
        _content: Vec<u8>,
        filename: &str,
    ) -> Result<Value, RemoteError> {
        self.enter("upload", filename.to_string())?;
        self.list(kind).lock().unwrap().push(filename.to_string());
        Ok(json!({ "name": filename }))
    }

    async fn delete_files(&self, kind: FileKind, names: &[String]) -> Result<Value, RemoteError> {
        self.enter("delete", names.join(","))?;
        self.list(kind).lock().unwrap().retain(|n| !names.contains(n));
        Ok(json!("deleted"))
    }

    async fn convert_to_spreadsheet(
        &self,
        filename: &str,
        use_case: &str,
    ) -> Result<Value, RemoteError> {
        self.enter("convert", format!("{filename}@{use_case}"))?;
        let converted = filename.replace(".side", ".xlsx");
        self.converted.lock().unwrap().push(converted.clone());
        Ok(json!({ "file": converted }))
    }

    async fn execute_tests(
        &self,
        names: &[String],
        options: &ExecuteOptions,
    ) -> Result<Value, RemoteError> {
        self.enter("execute", format!("{} wait={}", names.join(","), options.wait_time_ms))?;
        Ok(json!("accepted"))
    }

    async fn execute_legacy(&self) -> Result<Value, RemoteError> {
        self.enter("legacy", String::new())?;
        Ok(Value::Null)
    }

    async fn start_recording(&self, enabled: bool) -> Result<Value, RemoteError> {
        self.enter("record", enabled.to_string())?;
        Ok(Value::Null)
    }
}

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().drain(..).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

fn console(backend: Arc<FakeBackend>) -> (Console, Arc<RecordingSink>) {
    init_logging();
    let sink = Arc::new(RecordingSink::default());
    let console = Console::new(Arc::new(Store::new()), backend, sink.clone());
    (console, sink)
}

fn names(console: &Console, kind: FileKind) -> Vec<String> {
    console
        .snapshot()
        .files(kind)
        .iter()
        .map(|record| record.name.clone())
        .collect()
}

fn boom() -> OpError {
    OpError::Server {
        status: 500,
        body: "boom".to_string(),
    }
}

#[tokio::test]
async fn duplicate_upload_is_rejected_without_remote_call() {
    let backend = Arc::new(FakeBackend::with_files(&["a.side"], &[]));
    let (console, sink) = console(backend.clone());
    assert!(console.fetch_files(FileKind::Source).await.is_success());
    sink.take();

    let outcome = console
        .upload_file(FileKind::Source, "a.side", b"{}".to_vec())
        .await;

    assert_eq!(
        outcome,
        ActionOutcome::Rejected(ValidationError::DuplicateName {
            kind: FileKind::Source,
            name: "a.side".to_string(),
        })
    );
    assert_eq!(backend.calls(), vec!["list source".to_string()]);
    let snapshot = console.snapshot();
    assert_eq!(snapshot.error(Operation::Upload(FileKind::Source)), None);
    assert_eq!(
        snapshot.status(Operation::Upload(FileKind::Source)).status,
        RequestStatus::Idle
    );
    assert_eq!(
        sink.take(),
        vec![Notification::error("a source file named a.side already exists")]
    );
}

#[tokio::test]
async fn upload_with_wrong_extension_is_rejected() {
    let backend = Arc::new(FakeBackend::default());
    let (console, _sink) = console(backend.clone());

    let outcome = console
        .upload_file(FileKind::Source, "report.xlsx", Vec::new())
        .await;

    assert!(matches!(
        outcome,
        ActionOutcome::Rejected(ValidationError::UnsupportedExtension { .. })
    ));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn upload_appends_and_counts() {
    let backend = Arc::new(FakeBackend::with_files(&["a.side"], &[]));
    let (console, sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;

    let outcome = console
        .upload_file(FileKind::Source, "b.side", b"{}".to_vec())
        .await;

    assert_eq!(outcome, ActionOutcome::Succeeded);
    assert_eq!(names(&console, FileKind::Source), vec!["a.side", "b.side"]);
    assert_eq!(console.snapshot().metrics().uploaded, 1);
    assert!(sink
        .take()
        .contains(&Notification::success("Uploaded b.side")));
}

#[tokio::test]
async fn delete_by_ids_renumbers_and_refetches() {
    let backend = Arc::new(FakeBackend::with_files(&["x", "y", "z"], &[]));
    let (console, _sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;
    console.dispatch(Msg::ToggleSelected(2));

    let outcome = console.delete_files(FileKind::Source, &[2, 3]).await;

    assert_eq!(outcome, ActionOutcome::Succeeded);
    assert_eq!(
        console.snapshot().files(FileKind::Source),
        &[FileRecord {
            id: 1,
            name: "x".to_string()
        }]
    );
    assert!(console.snapshot().selection().is_empty());
    assert_eq!(console.snapshot().metrics().deleted, 2);
    assert_eq!(
        backend.calls(),
        vec!["list source", "delete y,z", "list source"]
    );
}

#[tokio::test]
async fn delete_selected_uses_displayed_list() {
    let backend = Arc::new(FakeBackend::with_files(&[], &["a.xlsx", "b.xlsx"]));
    let (console, _sink) = console(backend.clone());
    console.fetch_files(FileKind::Converted).await;
    console.dispatch(Msg::ShowList(FileKind::Converted));

    let outcome = console.delete_selected().await;
    assert_eq!(
        outcome,
        ActionOutcome::Rejected(ValidationError::NothingSelected)
    );

    console.dispatch(Msg::ToggleSelected(1));
    assert_eq!(console.delete_selected().await, ActionOutcome::Succeeded);
    assert_eq!(names(&console, FileKind::Converted), vec!["b.xlsx"]);
}

#[tokio::test]
async fn delete_selected_counts_only_the_selected_duplicate() {
    let backend = Arc::new(FakeBackend::with_files(&["a.side", "a.side", "b.side"], &[]));
    let (console, sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;
    console.dispatch(Msg::ToggleSelected(1));
    sink.take();

    assert_eq!(console.delete_selected().await, ActionOutcome::Succeeded);

    assert_eq!(console.snapshot().metrics().deleted, 1);
    assert_eq!(
        sink.take()[0],
        Notification::success("Deleted 1 source file(s)")
    );
    assert_eq!(
        backend.calls(),
        vec!["list source", "delete a.side", "list source"]
    );
}

#[tokio::test]
async fn repeated_names_are_sent_once() {
    let backend = Arc::new(FakeBackend::with_files(&["x", "y"], &[]));
    let (console, _sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;

    let outcome = console
        .delete_names(FileKind::Source, vec!["x".to_string(), "x".to_string()])
        .await;

    assert_eq!(outcome, ActionOutcome::Succeeded);
    assert_eq!(console.snapshot().metrics().deleted, 1);
    assert_eq!(names(&console, FileKind::Source), vec!["y"]);
    assert_eq!(backend.calls(), vec!["list source", "delete x", "list source"]);
}

#[tokio::test]
async fn failed_delete_keeps_list_and_records_error() {
    let backend = Arc::new(FakeBackend::with_files(&["x", "y"], &[]));
    backend.fail("delete");
    let (console, sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;
    sink.take();

    let outcome = console
        .delete_names(FileKind::Source, vec!["x".to_string()])
        .await;

    assert_eq!(outcome, ActionOutcome::Failed(boom()));
    let snapshot = console.snapshot();
    assert_eq!(names(&console, FileKind::Source), vec!["x", "y"]);
    assert_eq!(snapshot.error(Operation::Delete(FileKind::Source)), Some(&boom()));
    assert_eq!(snapshot.metrics().error_files, 1);
    let seen = sink.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn unknown_names_are_rejected_before_calling_backend() {
    let backend = Arc::new(FakeBackend::with_files(&["a.side"], &[]));
    let (console, _sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;

    let outcome = console.convert("missing.side", "smoke").await;

    assert_eq!(
        outcome,
        ActionOutcome::Rejected(ValidationError::UnknownFile {
            kind: FileKind::Source,
            name: "missing.side".to_string(),
        })
    );
    assert_eq!(backend.calls(), vec!["list source"]);
}

#[tokio::test]
async fn convert_then_execute_selected() {
    let backend = Arc::new(FakeBackend::with_files(&["login.side"], &[]));
    let (console, _sink) = console(backend.clone());
    console.fetch_files(FileKind::Source).await;

    assert!(console.convert("login.side", "smoke").await.is_success());
    assert_eq!(names(&console, FileKind::Converted), vec!["login.xlsx"]);
    assert_eq!(
        console.snapshot().last_conversion(),
        Some(&json!({ "file": "login.xlsx" }))
    );

    console.dispatch(Msg::ShowList(FileKind::Converted));
    console.dispatch(Msg::SelectAll);
    let options = ExecuteOptions {
        wait_time_ms: 250,
        ..ExecuteOptions::default()
    };
    assert!(console.execute_selected(&options).await.is_success());

    let snapshot = console.snapshot();
    assert_eq!(snapshot.metrics().converted_to_excel, 1);
    assert_eq!(snapshot.metrics().executed, 1);
    assert_eq!(snapshot.last_execution(), Some(&json!("accepted")));
    assert_eq!(
        backend.calls(),
        vec![
            "list source",
            "convert login.side@smoke",
            "list converted",
            "execute login.xlsx wait=250",
        ]
    );
}

#[tokio::test]
async fn load_falls_back_to_placeholders() {
    let backend = Arc::new(FakeBackend::default());
    backend.fail("list");
    let (console, sink) = console(backend);

    let outcome = console.load_files(FileKind::Source).await;

    assert_eq!(outcome, ActionOutcome::Failed(boom()));
    let snapshot = console.snapshot();
    assert_eq!(snapshot.files(FileKind::Source).len(), 5);
    assert_eq!(snapshot.files(FileKind::Source)[0].name, "google.side");
    assert!(snapshot.error(Operation::Fetch(FileKind::Source)).is_some());
    let levels: Vec<_> = sink.take().into_iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NotificationLevel::Error, NotificationLevel::Info]);
}

#[tokio::test]
async fn record_and_legacy_execute_settle() {
    let backend = Arc::new(FakeBackend::default());
    let (console, _sink) = console(backend.clone());

    assert!(console.record(true).await.is_success());
    assert!(console.snapshot().recording());
    assert!(console.execute_legacy().await.is_success());
    assert_eq!(console.snapshot().metrics().executed, 1);

    backend.fail("record");
    assert_eq!(console.record(false).await, ActionOutcome::Failed(boom()));
    assert!(console.snapshot().recording());
    // Recording failures are not file failures.
    assert_eq!(console.snapshot().metrics().error_files, 0);
}

/// Backend whose listings each wait for their own gate, in call order.
#[derive(Default)]
struct GatedBackend {
    gates: Mutex<VecDeque<(oneshot::Receiver<()>, Vec<Value>)>>,
    calls: Mutex<usize>,
}

impl GatedBackend {
    fn push(&self, gate: oneshot::Receiver<()>, entries: Vec<Value>) {
        self.gates.lock().unwrap().push_back((gate, entries));
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl RemoteService for GatedBackend {
    async fn list_files(&self, _kind: FileKind) -> Result<Vec<Value>, RemoteError> {
        let (gate, entries) = self.gates.lock().unwrap().pop_front().expect("gate");
        *self.calls.lock().unwrap() += 1;
        gate.await.map_err(|err| RemoteError::Network(err.to_string()))?;
        Ok(entries)
    }

    async fn upload_file(&self, _: FileKind, _: Vec<u8>, _: &str) -> Result<Value, RemoteError> {
        unreachable!()
    }

    async fn delete_files(&self, _: FileKind, _: &[String]) -> Result<Value, RemoteError> {
        unreachable!()
    }

    async fn convert_to_spreadsheet(&self, _: &str, _: &str) -> Result<Value, RemoteError> {
        unreachable!()
    }

    async fn execute_tests(&self, _: &[String], _: &ExecuteOptions) -> Result<Value, RemoteError> {
        unreachable!()
    }

    async fn execute_legacy(&self) -> Result<Value, RemoteError> {
        unreachable!()
    }

    async fn start_recording(&self, _: bool) -> Result<Value, RemoteError> {
        unreachable!()
    }
}

async fn wait_for_calls(backend: &GatedBackend, count: usize) {
    while backend.calls() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn overlapping_fetches_apply_in_arrival_order() {
    init_logging();
    let backend = Arc::new(GatedBackend::default());
    let (release_a, gate_a) = oneshot::channel();
    let (release_b, gate_b) = oneshot::channel();
    backend.push(gate_a, vec![json!("from-a.side")]);
    backend.push(gate_b, vec![json!("from-b.side")]);
    let sink = Arc::new(RecordingSink::default());
    let console = Console::new(Arc::new(Store::new()), backend.clone(), sink);

    let first = tokio::spawn({
        let console = console.clone();
        async move { console.fetch_files(FileKind::Source).await }
    });
    wait_for_calls(&backend, 1).await;
    let second = tokio::spawn({
        let console = console.clone();
        async move { console.fetch_files(FileKind::Source).await }
    });
    wait_for_calls(&backend, 2).await;

    // B answers first.
    release_b.send(()).unwrap();
    assert!(second.await.unwrap().is_success());
    assert_eq!(names(&console, FileKind::Source), vec!["from-b.side"]);

    // A answers last and overwrites B: there is no request fencing.
    release_a.send(()).unwrap();
    assert!(first.await.unwrap().is_success());
    assert_eq!(names(&console, FileKind::Source), vec!["from-a.side"]);
    assert!(!console
        .snapshot()
        .status(Operation::Fetch(FileKind::Source))
        .is_pending());
}
