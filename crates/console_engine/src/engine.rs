use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use console_core::{FileKind, Notification, Snapshot, Store};
use console_logging::console_debug;

use crate::actions::{ActionOutcome, Console, NotificationSink};
use crate::{ExecuteOptions, RemoteService};

/// Identifies one submitted command in the event stream.
pub type Ticket = u64;

/// Work the engine runs on behalf of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch(FileKind),
    /// Fetch, falling back to placeholders on failure.
    Load(FileKind),
    Upload {
        kind: FileKind,
        filename: String,
        content: Vec<u8>,
    },
    Delete {
        kind: FileKind,
        names: Vec<String>,
    },
    DeleteSelected,
    Convert {
        filename: String,
        use_case: String,
    },
    Execute {
        names: Vec<String>,
        options: ExecuteOptions,
    },
    ExecuteSelected(ExecuteOptions),
    ExecuteLegacy,
    Record(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Notification(Notification),
    Settled {
        ticket: Ticket,
        outcome: ActionOutcome,
    },
}

struct EventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl NotificationSink for EventSink {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(EngineEvent::Notification(notification));
    }
}

/// Runs commands on a background runtime and reports back over a channel.
///
/// Commands run concurrently and settle in whatever order the backend
/// answers. Dropping the handle stops the runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<(Ticket, Command)>,
    event_rx: mpsc::Receiver<EngineEvent>,
    store: Arc<Store>,
    next_ticket: AtomicU64,
}

impl EngineHandle {
    pub fn new(store: Arc<Store>, remote: Arc<dyn RemoteService>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<(Ticket, Command)>();
        let (event_tx, event_rx) = mpsc::channel();
        let sink = Arc::new(EventSink {
            tx: event_tx.clone(),
        });
        let console = Console::new(Arc::clone(&store), remote, sink);

        thread::spawn(move || {
            while let Ok((ticket, command)) = cmd_rx.recv() {
                let console = console.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let outcome = run_command(&console, command).await;
                    let _ = event_tx.send(EngineEvent::Settled { ticket, outcome });
                });
            }
            console_debug!("engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            store,
            next_ticket: AtomicU64::new(1),
        })
    }

    pub fn submit(&self, command: Command) -> Ticket {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        console_debug!("submit #{} {:?}", ticket, CommandLabel(&command));
        let _ = self.cmd_tx.send((ticket, command));
        ticket
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until `ticket` settles, handing every notification seen on the
    /// way to `on_notification`. Settlements of other tickets are dropped.
    pub fn wait_for(
        &self,
        ticket: Ticket,
        mut on_notification: impl FnMut(Notification),
    ) -> Option<ActionOutcome> {
        while let Ok(event) = self.event_rx.recv() {
            match event {
                EngineEvent::Notification(notification) => on_notification(notification),
                EngineEvent::Settled {
                    ticket: settled,
                    outcome,
                } if settled == ticket => return Some(outcome),
                EngineEvent::Settled { .. } => {}
            }
        }
        None
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

async fn run_command(console: &Console, command: Command) -> ActionOutcome {
    match command {
        Command::Fetch(kind) => console.fetch_files(kind).await,
        Command::Load(kind) => console.load_files(kind).await,
        Command::Upload {
            kind,
            filename,
            content,
        } => console.upload_file(kind, &filename, content).await,
        Command::Delete { kind, names } => console.delete_names(kind, names).await,
        Command::DeleteSelected => console.delete_selected().await,
        Command::Convert { filename, use_case } => console.convert(&filename, &use_case).await,
        Command::Execute { names, options } => console.execute(names, &options).await,
        Command::ExecuteSelected(options) => console.execute_selected(&options).await,
        Command::ExecuteLegacy => console.execute_legacy().await,
        Command::Record(enabled) => console.record(enabled).await,
    }
}

/// Debug view of a command without upload payloads.
struct CommandLabel<'a>(&'a Command);

impl std::fmt::Debug for CommandLabel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Command::Upload {
                kind,
                filename,
                content,
            } => write!(f, "Upload({kind}, {filename}, {} bytes)", content.len()),
            other => write!(f, "{other:?}"),
        }
    }
}
