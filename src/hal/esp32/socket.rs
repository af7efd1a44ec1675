//! WebSocket transport over the ESP-IDF websocket client.
//!
//! The ESP-IDF client runs its own task and reports events through a
//! callback. The callback forwards them over a channel, and
//! [`SocketTransport::try_event`] drains that channel without blocking.
//! The driver's own reconnect is disabled; the realtime channel decides
//! when to reopen.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

use crate::traits::{ChannelEvent, Endpoint, SocketTransport};
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, WebSocketEvent, WebSocketEventType,
};
use esp_idf_svc::ws::FrameType;
use log::{debug, info};

/// Realtime socket on the ESP-IDF websocket client.
pub struct Esp32Socket {
    client: Option<EspWebSocketClient<'static>>,
    events: Option<Receiver<ChannelEvent>>,
    connect_timeout: Duration,
}

impl Esp32Socket {
    /// Creates an idle socket.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            client: None,
            events: None,
            connect_timeout,
        }
    }
}

impl Default for Esp32Socket {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

fn translate(event: &Result<WebSocketEvent<'_>, EspIOError>) -> Option<ChannelEvent> {
    match event {
        Err(e) => Some(ChannelEvent::Error(format!("{:?}", e))),
        Ok(event) => match &event.event_type {
            WebSocketEventType::Connected => Some(ChannelEvent::Opened),
            WebSocketEventType::Disconnected | WebSocketEventType::Closed => {
                Some(ChannelEvent::Closed)
            }
            WebSocketEventType::Text(text) => Some(ChannelEvent::Message(text.as_bytes().to_vec())),
            WebSocketEventType::Binary(bytes) => Some(ChannelEvent::Message(bytes.to_vec())),
            _ => None,
        },
    }
}

impl SocketTransport for Esp32Socket {
    type Error = anyhow::Error;

    fn open(&mut self, endpoint: &Endpoint) -> anyhow::Result<()> {
        self.close();

        // A fresh channel per connection drops late events from the old client
        let (tx, rx) = channel();
        let config = EspWebSocketClientConfig {
            disable_auto_reconnect: true,
            ..Default::default()
        };
        let uri = endpoint.ws_uri();
        info!("[WS] Opening {}", uri);

        let client = EspWebSocketClient::new(&uri, &config, self.connect_timeout, move |event| {
            if let Some(event) = translate(event) {
                let _ = tx.send(event);
            }
        })?;

        self.client = Some(client);
        self.events = Some(rx);
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("socket not open"))?;
        client.send(FrameType::Text(false), text.as_bytes())?;
        debug!("[WS] -> {}", text);
        Ok(())
    }

    fn try_event(&mut self) -> Option<ChannelEvent> {
        let rx = self.events.as_ref()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.events = None;
                Some(ChannelEvent::Closed)
            }
        }
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("[WS] Client dropped");
        }
        self.events = None;
    }
}
