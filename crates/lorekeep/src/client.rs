//! The game client handle and its background connection task.
//!
//! ```text
//!                 ┌──────────── GameClient (handle) ────────────┐
//!   send() ──────→│ mpsc<Command> ──┐                           │
//!   close_widget()│                 ▼                           │
//!                 │        connection task (one per connect)    │
//!   socket ──────→│  recv → decode → Mirror::apply ──→ watch ───┼──→ subscribe()
//!                 │                         └──────→ broadcast ─┼──→ effects()
//!                 └─────────────────────────────────────────────┘
//! ```
//!
//! The task owns the connection and the [`Mirror`] and is the only writer
//! of the game state while it runs. When no task runs, the handle applies
//! application-layer actions to the last published state itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use lorekeep_mirror::{Effect, GameState, Mirror};
use lorekeep_protocol::{ClientCommand, Codec, GameAction, JsonCodec, ServerFrame, SessionId};
use lorekeep_session::{ConnectTarget, ConnectionStatus, SessionError};
use lorekeep_transport::{Connection, Connector, WebSocketConnector};

use crate::{ClientConfig, LorekeepError};

/// How long [`GameClient::disconnect`] waits for the task to close the
/// socket before aborting it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Actions that only touch the local state.
#[derive(Debug)]
enum LocalAction {
    CloseWidget(String),
    DismissToast(u64),
    ClearScreenShake,
    Disconnect,
}

impl LocalAction {
    fn apply(self, mirror: &mut Mirror) -> bool {
        match self {
            Self::CloseWidget(handle) => mirror.close_widget(&handle),
            Self::DismissToast(id) => mirror.dismiss_toast(id),
            Self::ClearScreenShake => mirror.clear_screen_shake(),
            Self::Disconnect => mirror.disconnect(),
        }
    }
}

/// What the handle asks of the connection task.
#[derive(Debug)]
enum Command {
    Send(ClientCommand),
    Local(LocalAction),
}

struct TaskHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

/// A client that mirrors one game session at a time.
///
/// `GameClient` is a handle: reading state is cheap and lock-free (an
/// `Arc<GameState>` snapshot), and every write is funnelled to a single
/// writer. Connection failures never surface as errors; they show up as
/// [`ConnectionStatus::Disconnected`] in the state.
///
/// ```rust,no_run
/// use lorekeep::prelude::*;
///
/// # async fn run() -> Result<(), LorekeepError> {
/// let mut client = GameClient::new(ClientConfig::default());
/// client.connect_to("session-001").await?;
///
/// let mut states = client.subscribe();
/// while states.changed().await.is_ok() {
///     let state = states.borrow_and_update().clone();
///     if let Some(line) = state.narrative.last() {
///         println!("{line}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct GameClient<K: Connector = WebSocketConnector> {
    connector: K,
    config: ClientConfig,
    target: Option<ConnectTarget>,
    state_tx: Arc<watch::Sender<Arc<GameState>>>,
    effects_tx: broadcast::Sender<Effect>,
    task: Option<TaskHandle>,
}

impl GameClient {
    /// A WebSocket client with the given settings.
    pub fn new(config: ClientConfig) -> Self {
        GameClientBuilder::new().config(config).build()
    }

    pub fn builder() -> GameClientBuilder {
        GameClientBuilder::new()
    }
}

impl<K: Connector> GameClient<K> {
    fn with_connector(connector: K, config: ClientConfig) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(GameState::default()));
        let (effects_tx, _) = broadcast::channel(config.effect_capacity.max(1));
        Self {
            connector,
            config,
            target: None,
            state_tx: Arc::new(state_tx),
            effects_tx,
            task: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The latest published state.
    pub fn state(&self) -> Arc<GameState> {
        Arc::clone(&self.state_tx.borrow())
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state_tx.borrow().session.status
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GameState>> {
        self.state_tx.subscribe()
    }

    /// A receiver for damage and heal cues.
    pub fn effects(&self) -> broadcast::Receiver<Effect> {
        self.effects_tx.subscribe()
    }

    /// The target of the last `connect`, if any.
    pub fn last_target(&self) -> Option<&ConnectTarget> {
        self.target.as_ref()
    }

    /// Connects to `session_id` on the configured host.
    pub async fn connect_to(&mut self, session_id: impl Into<SessionId>) -> Result<(), LorekeepError> {
        let target = self.config.target(session_id);
        self.connect(target).await
    }

    /// Opens a connection to `target` and starts mirroring.
    ///
    /// Returns once the socket is open and the connection request is sent;
    /// the state reaches `Connected` when the server confirms. A failed or
    /// timed-out attempt returns `Ok` and leaves the state `Disconnected`.
    ///
    /// # Errors
    /// - [`SessionError::InvalidTarget`] if the target does not form a URL.
    /// - [`SessionError::InvalidTransition`] unless currently disconnected.
    pub async fn connect(&mut self, target: ConnectTarget) -> Result<(), LorekeepError> {
        let url = target.url()?;

        let status = self.status();
        if status != ConnectionStatus::Disconnected {
            return Err(SessionError::InvalidTransition {
                from: status,
                to: ConnectionStatus::Connecting,
            }
            .into());
        }
        // A previous task may still be unwinding after its last publish.
        if let Some(old) = self.task.take() {
            if let Err(e) = old.join.await {
                tracing::warn!(error = %e, "previous connection task failed");
            }
        }

        let mut mirror = Mirror::from_state(self.state());
        mirror.begin_connect(target.session_id.clone())?;
        publish(&self.state_tx, &mirror);
        self.target = Some(target.clone());

        tracing::info!(%url, session_id = %target.session_id, "connecting");
        let conn = match tokio::time::timeout(
            self.config.connect_timeout,
            self.connector.connect(url.as_str()),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                tracing::warn!(%url, error = %e, "connect failed");
                self.abandon(mirror);
                return Ok(());
            }
            Err(_) => {
                tracing::warn!(%url, timeout = ?self.config.connect_timeout, "connect timed out");
                self.abandon(mirror);
                return Ok(());
            }
        };

        let request = match JsonCodec.encode(&ClientCommand::connection_request(
            target.session_id.clone(),
        )) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = conn.close().await;
                self.abandon(mirror);
                return Err(e.into());
            }
        };
        if let Err(e) = conn.send(&request).await {
            tracing::warn!(%url, error = %e, "failed to send connection request");
            let _ = conn.close().await;
            self.abandon(mirror);
            return Ok(());
        }

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(run_connection(
            conn,
            mirror,
            commands_rx,
            shutdown_rx,
            Arc::clone(&self.state_tx),
            self.effects_tx.clone(),
        ));
        self.task = Some(TaskHandle {
            commands,
            shutdown: Some(shutdown),
            join,
        });
        Ok(())
    }

    /// Closes the connection, if any, and waits for the state to read
    /// `Disconnected`. Any half-streamed narrative is dropped.
    pub async fn disconnect(&mut self) {
        if let Some(mut task) = self.task.take() {
            if let Some(tx) = task.shutdown.take() {
                let _ = tx.send(());
            }
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task.join).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "connection task failed"),
                Err(_) => {
                    tracing::warn!("connection task did not stop in time; aborting");
                    task.join.abort();
                    let _ = task.join.await;
                }
            }
        }
        apply_local(&self.state_tx, LocalAction::Disconnect);
    }

    /// Disconnects, then connects again to the last target.
    ///
    /// # Errors
    /// [`SessionError::InvalidTarget`] if there was no earlier `connect`,
    /// plus anything [`connect`](Self::connect) returns.
    pub async fn reconnect(&mut self) -> Result<(), LorekeepError> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| SessionError::InvalidTarget("no previous connection target".into()))?;
        self.disconnect().await;
        self.connect(target).await
    }

    /// Sends a command to the server. A no-op unless connected.
    pub fn send(&self, command: impl Into<ClientCommand>) {
        let command = command.into();
        let name = command.name();
        let sent = self
            .task
            .as_ref()
            .is_some_and(|task| task.commands.send(Command::Send(command)).is_ok());
        if !sent {
            tracing::debug!(command = name, "not connected; dropping command");
        }
    }

    /// Tells the server the widget was closed and removes it locally.
    pub fn close_widget(&self, widget_id: impl Into<String>) {
        let widget_id = widget_id.into();
        self.send(GameAction::CloseWidget {
            widget_id: widget_id.clone(),
        });
        self.local(LocalAction::CloseWidget(widget_id));
    }

    pub fn dismiss_toast(&self, id: u64) {
        self.local(LocalAction::DismissToast(id));
    }

    pub fn clear_screen_shake(&self) {
        self.local(LocalAction::ClearScreenShake);
    }

    fn local(&self, action: LocalAction) {
        let action = match &self.task {
            Some(task) => match task.commands.send(Command::Local(action)) {
                Ok(()) => return,
                Err(mpsc::error::SendError(Command::Local(action))) => action,
                Err(_) => return,
            },
            None => action,
        };
        apply_local(&self.state_tx, action);
    }

    /// Gives up on an attempt that never produced a running task.
    fn abandon(&self, mut mirror: Mirror) {
        mirror.disconnect();
        publish(&self.state_tx, &mirror);
    }
}

impl<K: Connector> Drop for GameClient<K> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.join.abort();
        }
    }
}

impl<K: Connector + std::fmt::Debug> std::fmt::Debug for GameClient<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("connector", &self.connector)
            .field("status", &self.status())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Builds a [`GameClient`].
#[derive(Debug, Clone, Default)]
pub struct GameClientBuilder {
    config: ClientConfig,
}

impl GameClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// A client over WebSocket.
    pub fn build(self) -> GameClient<WebSocketConnector> {
        self.build_with(WebSocketConnector)
    }

    /// A client over a custom transport.
    pub fn build_with<K: Connector>(self, connector: K) -> GameClient<K> {
        GameClient::with_connector(connector, self.config)
    }
}

fn publish(state_tx: &watch::Sender<Arc<GameState>>, mirror: &Mirror) {
    state_tx.send_replace(Arc::clone(mirror.state()));
}

/// Applies `action` to the published state. Only called when no task is
/// writing.
fn apply_local(state_tx: &watch::Sender<Arc<GameState>>, action: LocalAction) {
    state_tx.send_if_modified(|state| {
        let mut mirror = Mirror::from_state(Arc::clone(state));
        if action.apply(&mut mirror) {
            *state = Arc::clone(mirror.state());
            true
        } else {
            false
        }
    });
}

/// Marks the published state `Disconnected` when the connection task goes
/// away without reaching its normal exit, i.e. it panicked or was aborted.
struct DisconnectOnDrop {
    state_tx: Arc<watch::Sender<Arc<GameState>>>,
}

impl Drop for DisconnectOnDrop {
    fn drop(&mut self) {
        apply_local(&self.state_tx, LocalAction::Disconnect);
    }
}

/// Drives one connection until the server closes it, the transport fails,
/// or the handle asks it to stop.
async fn run_connection<C: Connection>(
    conn: C,
    mut mirror: Mirror,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown: oneshot::Receiver<()>,
    state_tx: Arc<watch::Sender<Arc<GameState>>>,
    mut effects: broadcast::Sender<Effect>,
) {
    let id = conn.id();
    tracing::debug!(%id, "connection task started");
    let _guard = DisconnectOnDrop {
        state_tx: Arc::clone(&state_tx),
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!(%id, "shutdown requested");
                if let Err(e) = conn.close().await {
                    tracing::debug!(%id, error = %e, "close failed");
                }
                break;
            }

            command = commands.recv() => {
                let Some(command) = command else {
                    let _ = conn.close().await;
                    break;
                };
                match command {
                    Command::Send(command) => {
                        if !mirror.state().session.is_connected() {
                            tracing::debug!(%id, command = command.name(), "not connected; dropping command");
                            continue;
                        }
                        let bytes = match JsonCodec.encode(&command) {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                tracing::warn!(%id, error = %e, "failed to encode command");
                                continue;
                            }
                        };
                        if let Err(e) = conn.send(&bytes).await {
                            tracing::warn!(%id, error = %e, "send failed");
                            break;
                        }
                        tracing::trace!(%id, command = command.name(), "sent");
                    }
                    Command::Local(action) => {
                        if action.apply(&mut mirror) {
                            publish(&state_tx, &mirror);
                        }
                    }
                }
            }

            received = conn.recv() => {
                match received {
                    Ok(Some(bytes)) => match JsonCodec.decode::<ServerFrame>(&bytes) {
                        Ok(frame) => {
                            let kind = frame.kind();
                            if mirror.apply(frame, &mut effects) {
                                publish(&state_tx, &mirror);
                            }
                            tracing::trace!(%id, kind, "frame applied");
                        }
                        Err(e) => tracing::warn!(%id, error = %e, "dropping undecodable frame"),
                    },
                    Ok(None) => {
                        tracing::info!(%id, "server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "connection lost");
                        break;
                    }
                }
            }
        }
    }

    mirror.disconnect();
    publish(&state_tx, &mirror);

    // Anything queued before the close still applies; later actions fail
    // to send and the handle applies them itself.
    commands.close();
    while let Ok(command) = commands.try_recv() {
        if let Command::Local(action) = command {
            apply_local(&state_tx, action);
        }
    }
    tracing::debug!(%id, "connection task stopped");
}
