use std::collections::HashMap;

use log::*;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use super::{HubEvent, NotificationSink};

pub type ConnectionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The notification hub has shut down")]
pub struct HubClosed;

enum HubCommand {
    Register { sink: Box<dyn NotificationSink>, respond_to: oneshot::Sender<ConnectionId> },
    Unregister(ConnectionId),
    Publish(HubEvent),
    Count(oneshot::Sender<usize>),
}

/// The hub task. It is the sole owner of the connection table, so no locking is needed.
pub struct NotificationHub {
    connections: HashMap<ConnectionId, Box<dyn NotificationSink>>,
    next_id: ConnectionId,
    commands: mpsc::UnboundedReceiver<HubCommand>,
}

impl NotificationHub {
    /// Starts the hub on its own task. The hub stops when every [`HubHandle`] has been dropped.
    pub fn spawn() -> (HubHandle, JoinHandle<()>) {
        let (sender, commands) = mpsc::unbounded_channel();
        let hub = Self { connections: HashMap::new(), next_id: 1, commands };
        let task = tokio::spawn(hub.run());
        (HubHandle { sender }, task)
    }

    async fn run(mut self) {
        info!("📬️ Notification hub started");
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { sink, respond_to } => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.connections.insert(id, sink);
                    debug!("📬️ Connection #{id} registered. {} connected", self.connections.len());
                    let _ = respond_to.send(id);
                },
                HubCommand::Unregister(id) => {
                    if self.connections.remove(&id).is_some() {
                        debug!("📬️ Connection #{id} left. {} connected", self.connections.len());
                    }
                },
                HubCommand::Publish(event) => self.dispatch(event),
                HubCommand::Count(respond_to) => {
                    let _ = respond_to.send(self.connections.len());
                },
            }
        }
        info!("📬️ Notification hub has shut down");
    }

    fn dispatch(&mut self, event: HubEvent) {
        let Some(message) = event.broadcast() else {
            trace!("📬️ Ignoring hub event '{}'", event.action);
            return;
        };
        debug!("📬️ Broadcasting '{}' to {} connections", message.action, self.connections.len());
        self.connections.retain(|id, sink| match sink.deliver(&message) {
            Ok(()) => true,
            Err(e) => {
                info!("📬️ Dropping connection #{id}. {e}");
                false
            },
        });
    }
}

/// A cheap, cloneable handle for talking to the hub. None of its methods block on delivery.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub async fn register<S: NotificationSink + 'static>(&self, sink: S) -> Result<ConnectionId, HubClosed> {
        let (respond_to, response) = oneshot::channel();
        self.sender.send(HubCommand::Register { sink: Box::new(sink), respond_to }).map_err(|_| HubClosed)?;
        response.await.map_err(|_| HubClosed)
    }

    pub fn unregister(&self, id: ConnectionId) {
        let _ = self.sender.send(HubCommand::Unregister(id));
    }

    pub fn publish(&self, event: HubEvent) -> Result<(), HubClosed> {
        self.sender.send(HubCommand::Publish(event)).map_err(|_| HubClosed)
    }

    pub async fn connection_count(&self) -> Result<usize, HubClosed> {
        let (respond_to, response) = oneshot::channel();
        self.sender.send(HubCommand::Count(respond_to)).map_err(|_| HubClosed)?;
        response.await.map_err(|_| HubClosed)
    }
}
