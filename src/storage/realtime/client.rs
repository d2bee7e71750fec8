//! WebSocket change feed client

use super::ChangeFeed;
use super::protocol::{
    EVENT_CLOSE, EVENT_ERROR, EVENT_POSTGRES_CHANGES, EVENT_REPLY, PROTOCOL_VSN, PhoenixMessage,
};
use super::types::{ChangeEvent, ChangeFilter, Subscription};
use crate::config::{BackendConfig, RealtimeConfig};
use crate::utils::error::{HubError, Result};
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

enum Command {
    Join {
        topic: String,
        filter: ChangeFilter,
        events: mpsc::Sender<ChangeEvent>,
    },
    Leave {
        topic: String,
    },
}

type Routes = HashMap<String, (ChangeFilter, mpsc::Sender<ChangeEvent>)>;

/// Realtime endpoint URL for `backend`, with the API key and protocol version
pub fn websocket_url(backend: &BackendConfig) -> Result<Url> {
    if !backend.is_configured() {
        return Err(HubError::config("Backend URL is not configured"));
    }

    let mut url = Url::parse(&format!("{}/realtime/v1/websocket", backend.base_url()))
        .map_err(|e| HubError::config(format!("Invalid realtime URL: {}", e)))?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| HubError::config(format!("Cannot use {} for realtime", backend.url)))?;

    url.query_pairs_mut()
        .append_pair("apikey", &backend.anon_key)
        .append_pair("vsn", PROTOCOL_VSN);
    Ok(url)
}

/// Change feed over a single multiplexed WebSocket connection
///
/// One background task owns the socket. Subscriptions join their own channel
/// topic and leave it when released; heartbeats keep the connection alive.
/// The connection stays open while the client or any subscription is alive,
/// or until [`RealtimeClient::close`].
pub struct RealtimeClient {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: Option<mpsc::Sender<()>>,
    capacity: usize,
}

impl RealtimeClient {
    /// Connect to the backend's realtime endpoint
    pub async fn connect(backend: &BackendConfig, realtime: &RealtimeConfig) -> Result<Self> {
        let url = websocket_url(backend)?;
        info!(
            "Connecting to realtime endpoint {}://{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.path()
        );

        let (stream, _) = connect_async(url.as_str()).await?;
        let (write, read) = stream.split();

        let (commands, command_rx) = mpsc::unbounded_channel::<Command>();
        let (shutdown, shutdown_rx) = mpsc::channel::<()>(1);

        let heartbeat = realtime.heartbeat_interval().max(Duration::from_secs(1));
        let access_token = backend.bearer_token().to_string();
        tokio::spawn(async move {
            connection_loop(write, read, command_rx, shutdown_rx, heartbeat, access_token).await;
        });

        Ok(Self {
            commands,
            shutdown: Some(shutdown),
            capacity: realtime.channel_capacity.max(1),
        })
    }

    /// Whether the connection task is still running
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Close the connection; open subscriptions stop receiving events
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(()).await;
        }
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("connected", &self.is_connected())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[async_trait]
impl ChangeFeed for RealtimeClient {
    async fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription> {
        let id = Uuid::new_v4();
        let topic = format!("realtime:{}-{}", filter.collection, id.simple());
        let (events, rx) = mpsc::channel(self.capacity);

        self.commands
            .send(Command::Join {
                topic: topic.clone(),
                filter: filter.clone(),
                events,
            })
            .map_err(|_| HubError::realtime("Realtime connection is closed"))?;

        let commands = self.commands.clone();
        Ok(Subscription::new(id, filter, rx, move || {
            if commands.send(Command::Leave { topic }).is_err() {
                debug!("Realtime connection gone, nothing to leave");
            }
        }))
    }
}

async fn connection_loop<W, R>(
    mut write: W,
    mut read: R,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown: mpsc::Receiver<()>,
    heartbeat: Duration,
    access_token: String,
) where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
    R: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    let mut routes: Routes = HashMap::new();
    let mut next_ref: u64 = 0;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + heartbeat, heartbeat);

    loop {
        tokio::select! {
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => route(&text, &routes),
                    Some(Ok(Message::Ping(data))) => {
                        if write.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Realtime connection closed by server");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Realtime connection error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            command = commands.recv() => {
                // Every sender is gone: no client and no live subscription.
                let Some(command) = command else { break };
                next_ref += 1;
                let message = match command {
                    Command::Join { topic, filter, events } => {
                        debug!("Joining {} for {}.{}", topic, filter.schema, filter.collection);
                        let message = PhoenixMessage::join(&topic, &filter, &access_token);
                        routes.insert(topic, (filter, events));
                        message
                    }
                    Command::Leave { topic } => {
                        debug!("Leaving {}", topic);
                        routes.remove(&topic);
                        PhoenixMessage::leave(&topic)
                    }
                };
                if !send(&mut write, message.with_ref(next_ref)).await {
                    break;
                }
            }

            _ = ticker.tick() => {
                next_ref += 1;
                if !send(&mut write, PhoenixMessage::heartbeat().with_ref(next_ref)).await {
                    break;
                }
            }

            Some(()) = shutdown.recv() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }

    // Dropping the senders ends every open subscription stream.
    routes.clear();
}

async fn send<W>(write: &mut W, message: PhoenixMessage) -> bool
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = match message.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode {} message: {}", message.event, e);
            return true;
        }
    };
    match write.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to send {} on {}: {}", message.event, message.topic, e);
            false
        }
    }
}

fn route(text: &str, routes: &Routes) {
    let message = match PhoenixMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Ignoring undecodable realtime frame: {}", e);
            return;
        }
    };

    match message.event.as_str() {
        EVENT_POSTGRES_CHANGES => {
            let Some((filter, events)) = routes.get(&message.topic) else {
                return;
            };
            let Some(event) = message.change_event() else {
                warn!("Malformed change payload on {}", message.topic);
                return;
            };
            if !filter.accepts(&event) {
                return;
            }
            if let Err(mpsc::error::TrySendError::Full(_)) = events.try_send(event) {
                warn!("Subscription on {} is lagging, dropped change", message.topic);
            }
        }
        EVENT_REPLY => {
            if message.reply_status() == Some("error") {
                warn!("Realtime rejected request on {}: {}", message.topic, message.payload);
            }
        }
        EVENT_ERROR | EVENT_CLOSE => {
            warn!("Realtime channel {} reported {}", message.topic, message.event);
        }
        other => debug!("Unhandled realtime event {} on {}", other, message.topic),
    }
}
