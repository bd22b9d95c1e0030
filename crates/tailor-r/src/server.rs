use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use tailor_common::protocol::{
    HostCommand, Inbound, MessageResponse, Outbound, ReplyEnvelope, RuntimeMessage,
};
use tailor_engine::controller::BackgroundController;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, error, info, warn};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// An envelope whose message is not one the controller understands.
#[derive(Deserialize)]
struct UnknownEnvelope {
    id: u64,
    message: serde_json::Value,
}

/// WebSocket bridge between the browser extension and the controller.
pub struct RemoteServer {
    port: u16,
    controller: BackgroundController,
    // Host commands from the controller, fanned out to every connection.
    command_tx: broadcast::Sender<HostCommand>,
    response_timeout: Duration,
}

pub struct ServerHandle {
    pub local_addr: SocketAddr,
    pub command_tx: broadcast::Sender<HostCommand>,
    accept_task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections. Open connections end with their socket.
    pub fn shutdown(&self) {
        self.accept_task.abort();
    }
}

impl RemoteServer {
    pub fn new(
        port: u16,
        controller: BackgroundController,
        command_tx: broadcast::Sender<HostCommand>,
    ) -> Self {
        Self {
            port,
            controller,
            command_tx,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Messages the controller has not answered within `timeout` get a
    /// failure reply instead.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub async fn start(&self) -> Result<ServerHandle, std::io::Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Remote server listening on: {}", local_addr);

        let controller = self.controller.clone();
        let command_tx = self.command_tx.clone();
        let response_timeout = self.response_timeout;

        let accept_task = tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                info!("Accepted TCP connection from: {}", peer);
                let cmd_rx = command_tx.subscribe();
                tokio::spawn(accept_connection(
                    stream,
                    controller.clone(),
                    cmd_rx,
                    response_timeout,
                ));
            }
        });

        Ok(ServerHandle {
            local_addr,
            command_tx: self.command_tx.clone(),
            accept_task,
        })
    }
}

async fn accept_connection(
    stream: TcpStream,
    controller: BackgroundController,
    mut cmd_rx: broadcast::Receiver<HostCommand>,
    response_timeout: Duration,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("Error during the websocket handshake occurred: {}", e);
            return;
        }
    };

    info!("New WebSocket connection: established");
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ReplyEnvelope>(100);

    loop {
        tokio::select! {
            // Controller -> extension: host commands
            cmd = cmd_rx.recv() => match cmd {
                Ok(cmd) => {
                    if !send_frame(&mut ws_sender, &Outbound::Command(cmd)).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Connection lagged, {} host commands dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            // Controller -> extension: message replies
            Some(reply) = reply_rx.recv() => {
                if !send_frame(&mut ws_sender, &Outbound::Reply(reply)).await {
                    break;
                }
            }

            // Extension -> controller
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&controller, &reply_tx, response_timeout, &text).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
            },
        }
    }
}

async fn handle_text(
    controller: &BackgroundController,
    reply_tx: &mpsc::Sender<ReplyEnvelope>,
    response_timeout: Duration,
    text: &str,
) {
    let inbound = match serde_json::from_str::<Inbound>(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            // A well-formed envelope still gets an answer under its id.
            if let Ok(envelope) = serde_json::from_str::<UnknownEnvelope>(text) {
                let reason = match serde_json::from_value::<RuntimeMessage>(envelope.message) {
                    Err(e) => e.to_string(),
                    Ok(_) => e.to_string(),
                };
                warn!("Rejecting message {}: {}", envelope.id, reason);
                let reply = ReplyEnvelope {
                    id: envelope.id,
                    response: MessageResponse::failure(format!("Unsupported message: {}", reason)),
                };
                // The reply loop is this task; never wait on our own channel.
                if reply_tx.try_send(reply).is_err() {
                    debug!("Reply to message {} dropped", envelope.id);
                }
                return;
            }
            warn!("Dropping unparseable frame from extension: {} | Text: {}", e, text);
            return;
        }
    };

    match inbound {
        // Lifecycle events keep their emission order.
        Inbound::Event(event) => {
            debug!("Host event: {:?}", event);
            controller.handle_event(event).await;
        }
        // Messages carry no ordering guarantee and may interleave.
        Inbound::Message(envelope) => {
            let controller = controller.clone();
            let reply_tx = reply_tx.clone();
            tokio::spawn(async move {
                let name = envelope.message.name();
                let response =
                    match tokio::time::timeout(response_timeout, controller.handle_message(envelope.message))
                        .await
                    {
                        Ok(response) => response,
                        Err(_) => {
                            warn!("{} timed out after {:?}", name, response_timeout);
                            MessageResponse::failure(format!("{} timed out", name))
                        }
                    };
                let reply = ReplyEnvelope {
                    id: envelope.id,
                    response,
                };
                if reply_tx.send(reply).await.is_err() {
                    debug!("Connection closed before reply {} was sent", envelope.id);
                }
            });
        }
    }
}

async fn send_frame(ws_sender: &mut WsSink, frame: &Outbound) -> bool {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to encode frame: {}", e);
            return true;
        }
    };
    if let Err(e) = ws_sender.send(Message::Text(json)).await {
        error!("Failed to send message to WS: {}", e);
        return false;
    }
    true
}
