use crate::{FileKind, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a transient toast.
    Notify(Notification),
    /// Reload the listing of `kind` from the backend.
    Refetch { kind: FileKind },
}
