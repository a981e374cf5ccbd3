use serde_json::Value;

use crate::normalize::{entry_name, normalize};
use crate::{fallback_files, AppState, Effect, FileKind, Msg, Notification, Operation};

/// Pure update function: applies a message to state and returns any effects.
///
/// Settlements are applied in the order they are dispatched. Nothing here
/// compares a settlement against the request that caused it, so a slow earlier
/// fetch overwrites a faster later one.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FetchRequested { kind } => {
            state.begin(Operation::Fetch(kind));
            Vec::new()
        }
        Msg::FetchSucceeded { kind, entries } => {
            state.finish(Operation::Fetch(kind));
            state.replace_files(kind, normalize(&entries));
            if state.displayed() == kind {
                state.clear_selection();
            }
            vec![Effect::Notify(Notification::success(format!(
                "Loaded {} {kind} files",
                state.files(kind).len()
            )))]
        }
        Msg::UploadRequested { kind, .. } => {
            state.begin(Operation::Upload(kind));
            Vec::new()
        }
        Msg::UploadSucceeded {
            kind,
            filename,
            ack,
        } => {
            state.finish(Operation::Upload(kind));
            let stored_name = acknowledged_name(&ack).unwrap_or(filename);
            let message = format!("Uploaded {stored_name}");
            state.append_file(kind, stored_name);
            state.metrics_mut().uploaded += 1;
            vec![Effect::Notify(Notification::success(message))]
        }
        Msg::DeleteRequested { kind, .. } => {
            state.begin(Operation::Delete(kind));
            Vec::new()
        }
        Msg::DeleteSucceeded { kind, ids } => {
            state.finish(Operation::Delete(kind));
            let removed = state.remove_files(kind, &ids);
            if state.displayed() == kind {
                state.clear_selection();
            }
            state.metrics_mut().deleted += removed as u64;
            vec![
                Effect::Notify(Notification::success(format!(
                    "Deleted {removed} {kind} file(s)"
                ))),
                Effect::Refetch { kind },
            ]
        }
        Msg::ConvertRequested { .. } => {
            state.begin(Operation::Convert);
            Vec::new()
        }
        Msg::ConvertSucceeded { filename, artifact } => {
            state.finish(Operation::Convert);
            state.set_last_conversion(artifact);
            state.metrics_mut().converted_to_excel += 1;
            vec![
                Effect::Notify(Notification::success(format!(
                    "Converted {filename} to excel"
                ))),
                Effect::Refetch {
                    kind: FileKind::Converted,
                },
            ]
        }
        Msg::ExecuteRequested { .. } => {
            state.begin(Operation::Execute);
            Vec::new()
        }
        Msg::ExecuteSucceeded { names, handle } => {
            state.finish(Operation::Execute);
            state.set_last_execution(handle);
            // A legacy run names no files and counts as one run.
            state.metrics_mut().executed += names.len().max(1) as u64;
            let message = if names.is_empty() {
                "Execution started".to_string()
            } else {
                format!("Execution started for {} file(s)", names.len())
            };
            vec![Effect::Notify(Notification::success(message))]
        }
        Msg::RecordRequested { .. } => {
            state.begin(Operation::Record);
            Vec::new()
        }
        Msg::RecordSucceeded { enabled } => {
            state.finish(Operation::Record);
            state.set_recording(enabled);
            let message = if enabled {
                "Recording enabled"
            } else {
                "Recording disabled"
            };
            vec![Effect::Notify(Notification::success(message))]
        }
        Msg::OperationFailed { op, error } => {
            let message = format!("Failed to {op}: {error}");
            if op.counts_error_file() {
                state.metrics_mut().error_files += 1;
            }
            state.fail(op, error);
            vec![Effect::Notify(Notification::error(message))]
        }
        Msg::FallbackApplied { kind } => {
            state.replace_files(kind, fallback_files(kind));
            if state.displayed() == kind {
                state.clear_selection();
            }
            vec![Effect::Notify(Notification::info(format!(
                "Showing placeholder {kind} files"
            )))]
        }
        Msg::ShowList(kind) => {
            state.show(kind);
            Vec::new()
        }
        Msg::ToggleSelected(id) => {
            state.toggle_selected(id);
            Vec::new()
        }
        Msg::SelectAll => {
            state.toggle_select_all();
            Vec::new()
        }
        Msg::ClearSelection => {
            state.clear_selection();
            Vec::new()
        }
        Msg::Notified(notification) => vec![Effect::Notify(notification)],
    };

    (state, effects)
}

/// Name the backend reports for an upload, if the ack names the file at all.
fn acknowledged_name(ack: &Value) -> Option<String> {
    match ack {
        Value::Object(_) => entry_name(ack).map(ToOwned::to_owned),
        _ => None,
    }
}
