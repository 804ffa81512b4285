use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hopper_core::config::PipelineConfig;
use hopper_core::events::QueueEvent;
use hopper_core::types::Counter;
use hopper_queue::QueueStore;

use crate::types::ClientEvent;
use crate::{stats, worker};

/// Keeps a client connection counted for as long as it lives. Dropping
/// the guard reports the disconnect.
pub struct ClientGuard {
    conn_id: String,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        let _ = self.events.send(ClientEvent::Disconnected {
            conn_id: std::mem::take(&mut self.conn_id),
        });
    }
}

/// Clonable control surface for a running [`Lifecycle`].
#[derive(Clone)]
pub struct PipelineHandle {
    events: mpsc::UnboundedSender<ClientEvent>,
    consumed: Counter,
    clients: Counter,
    stop: watch::Sender<bool>,
}

impl PipelineHandle {
    /// Count a new client connection.
    pub fn register(&self, conn_id: impl Into<String>) -> ClientGuard {
        let conn_id = conn_id.into();
        let _ = self.events.send(ClientEvent::Connected {
            conn_id: conn_id.clone(),
        });
        ClientGuard {
            conn_id,
            events: self.events.clone(),
        }
    }

    /// Messages delivered since the pipeline last activated.
    pub fn consumed(&self) -> u64 {
        self.consumed.get()
    }

    /// Currently connected clients.
    pub fn clients(&self) -> u64 {
        self.clients.get()
    }

    /// Shut the supervisor down. Stopping twice is a no-op.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

struct Activation {
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    stats: JoinHandle<()>,
}

/// Connection-count driven supervisor.
///
/// Consumer workers and the stats emitter run exactly while at least one
/// client is connected: the 0 to 1 transition starts them, the 1 to 0
/// transition stops them and resets the delivered count. While nobody is
/// connected the queue simply accumulates.
pub struct Lifecycle {
    store: Arc<dyn QueueStore>,
    config: PipelineConfig,
    produced: Counter,
    consumed: Counter,
    clients: Counter,
    events_rx: mpsc::UnboundedReceiver<ClientEvent>,
    broadcast: broadcast::Sender<QueueEvent>,
    shutdown: watch::Receiver<bool>,
    active: Option<Activation>,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn QueueStore>,
        config: PipelineConfig,
        produced: Counter,
        broadcast: broadcast::Sender<QueueEvent>,
    ) -> (Self, PipelineHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let consumed = Counter::new();
        let clients = Counter::new();

        let handle = PipelineHandle {
            events: events_tx,
            consumed: consumed.clone(),
            clients: clients.clone(),
            stop: stop_tx,
        };
        let lifecycle = Self {
            store,
            config,
            produced,
            consumed,
            clients,
            events_rx,
            broadcast,
            shutdown: stop_rx,
            active: None,
        };
        (lifecycle, handle)
    }

    /// Supervisor loop. Returns after `stop`, or when every handle and
    /// guard is gone.
    pub async fn run(mut self) {
        info!(workers = self.config.workers, "pipeline supervisor started");
        loop {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        self.deactivate().await;
        info!("pipeline supervisor stopped");
    }

    async fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Connected { conn_id } => {
                let clients = self.clients.incr();
                info!(%conn_id, clients, "client connected");
                if clients == 1 {
                    self.activate();
                }
            }
            ClientEvent::Disconnected { conn_id } => {
                if self.clients.get() == 0 {
                    warn!(%conn_id, "disconnect for an uncounted client ignored");
                    return;
                }
                let clients = self.clients.decr();
                info!(%conn_id, clients, "client disconnected");
                if clients == 0 {
                    self.deactivate().await;
                }
            }
        }
    }

    fn activate(&mut self) {
        if self.active.is_some() {
            return;
        }
        info!(workers = self.config.workers, "starting consumer pipeline");

        let token = CancellationToken::new();
        let workers = (0..self.config.workers)
            .map(|id| {
                tokio::spawn(worker::run(worker::WorkerContext {
                    id,
                    store: self.store.clone(),
                    config: self.config.clone(),
                    consumed: self.consumed.clone(),
                    events: self.broadcast.clone(),
                    token: token.clone(),
                }))
            })
            .collect();
        let stats = tokio::spawn(stats::run(stats::StatsContext {
            store: self.store.clone(),
            produced: self.produced.clone(),
            consumed: self.consumed.clone(),
            events: self.broadcast.clone(),
            token: token.clone(),
        }));

        self.active = Some(Activation {
            token,
            workers,
            stats,
        });
    }

    /// Stop workers and the stats emitter, then reset the delivered
    /// count. Waits for each task to finish its current wait, so no
    /// dequeued message is lost on the way out.
    async fn deactivate(&mut self) {
        let Some(activation) = self.active.take() else {
            return;
        };
        info!("stopping consumer pipeline");
        activation.token.cancel();
        let _ = activation.stats.await;
        for worker in activation.workers {
            let _ = worker.await;
        }
        info!(delivered = self.consumed.get(), "consumer pipeline stopped");
        self.consumed.reset();
    }
}
