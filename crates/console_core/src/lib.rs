//! Console core: normalization, the pure state machine and the store around it.
mod effect;
mod msg;
mod normalize;
mod state;
mod store;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use normalize::{
    normalize, normalize_with, records_from_names, IdStrategy, PositionDerivedId,
    UNKNOWN_FILE_NAME,
};
pub use state::{
    fallback_files, AppState, FileId, FileKind, FileRecord, Notification, NotificationLevel,
    OpError, Operation, OperationMetrics, OperationStatus, RequestStatus,
};
pub use store::{Snapshot, Store};
pub use update::update;
pub use view_model::{ConsoleViewModel, FileRowView, OperationErrorView};
