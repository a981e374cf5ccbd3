use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{update, AppState, Effect, Msg};

/// Immutable view of the state at one point in time.
pub type Snapshot = Arc<AppState>;

/// Single-writer container around [`AppState`].
///
/// Every mutation goes through [`Store::dispatch`]; each dispatch runs
/// [`update`] under the lock, so readers never see a half-applied message.
#[derive(Debug, Default)]
pub struct Store {
    state: Mutex<Snapshot>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `msg` and hands its effects back to the caller that sent it.
    pub fn dispatch(&self, msg: Msg) -> (Snapshot, Vec<Effect>) {
        let mut state = self.lock();
        let (next, effects) = update(AppState::clone(&state), msg);
        *state = Arc::new(next);
        (Arc::clone(&state), effects)
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // `update` never panics midway, so a poisoned lock still holds a whole state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
