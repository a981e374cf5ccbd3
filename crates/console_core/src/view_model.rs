use crate::{FileId, FileKind, Operation, OperationMetrics};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsoleViewModel {
    pub displayed: FileKind,
    pub rows: Vec<FileRowView>,
    pub selected_count: usize,
    pub source_count: usize,
    pub converted_count: usize,
    pub metrics: OperationMetrics,
    pub busy: bool,
    pub errors: Vec<OperationErrorView>,
    pub recording: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub id: FileId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationErrorView {
    pub operation: Operation,
    pub message: String,
}
