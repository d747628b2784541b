use thiserror::Error;
use tokio::sync::mpsc;

use super::HubBroadcast;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The connection is closed")]
pub struct SinkClosed;

/// Somewhere the hub can push broadcasts. A sink that returns an error is dropped from the hub.
pub trait NotificationSink: Send {
    fn deliver(&mut self, message: &HubBroadcast) -> Result<(), SinkClosed>;
}

/// A sink that forwards broadcasts over a tokio channel, e.g. to an HTTP streaming response.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<HubBroadcast>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HubBroadcast>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&mut self, message: &HubBroadcast) -> Result<(), SinkClosed> {
        self.sender.send(message.clone()).map_err(|_| SinkClosed)
    }
}
