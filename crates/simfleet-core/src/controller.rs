// ── Panel controller ──
//
// Full lifecycle management for one panel's view of the backend:
// background polling into the registry, edit-session orchestration,
// the listener subscription slot, and command routing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use simfleet_api::PanelClient;
use simfleet_api::models::{Device, InboundMessage, Parameter, PublishRequest};
use simfleet_api::transport::TransportConfig;

use crate::command::{self, Command, CommandEnvelope, CommandResult};
use crate::config::PanelConfig;
use crate::draft::ParamForm;
use crate::error::CoreError;
use crate::listener::{ListenerBuffer, ListenerSlot, SubscriptionState};
use crate::session::{DeviceForm, EditSession, SessionMode, SubmitAction};
use crate::store::{DeviceRegistry, FleetStats};
use crate::stream::DeviceStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── PanelState ───────────────────────────────────────────────────────

/// Controller lifecycle observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Running,
    Stopped,
}

// ── PanelController ─────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Owns the registry
/// cache, the single edit session, the single listener subscription
/// slot, and the background tasks that keep them current.
#[derive(Clone)]
pub struct PanelController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: PanelConfig,
    client: PanelClient,
    registry: Arc<DeviceRegistry>,
    session: Mutex<EditSession>,
    listener: Mutex<ListenerSlot>,
    listener_buffer: ListenerBuffer,
    listener_task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
    state: watch::Sender<PanelState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PanelController {
    /// Create a new controller from configuration. Does NOT touch the
    /// network -- call [`start()`](Self::start) to load data and spawn
    /// the background tasks.
    pub fn new(config: PanelConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let client = PanelClient::new(config.base_url.clone(), &transport)?;

        let (state, _) = watch::channel(PanelState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                registry: Arc::new(DeviceRegistry::new()),
                session: Mutex::new(EditSession::new()),
                listener: Mutex::new(ListenerSlot::new()),
                listener_buffer: ListenerBuffer::new(),
                listener_task: Mutex::new(None),
                state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the panel configuration.
    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }

    /// Access the underlying registry cache.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.inner.registry
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the initial snapshot and spawn background tasks (periodic
    /// refresh, command processor).
    ///
    /// The initial refresh failure is surfaced so callers can report an
    /// unreachable backend; once running, poll failures only degrade to
    /// a stale view.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.refresh().await?;

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        let poll_ms = self.inner.config.device_poll_ms;
        if poll_ms > 0 {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(refresh_task(ctrl, poll_ms, cancel)));
        }

        self.inner.state.send_replace(PanelState::Running);
        info!("panel controller started");
        Ok(())
    }

    /// Cancel background tasks and stop the controller.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.set_listener_panel_open(false).await;

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.state.send_replace(PanelState::Stopped);
        debug!("panel controller stopped");
    }

    /// Subscribe to controller lifecycle changes.
    pub fn state(&self) -> watch::Receiver<PanelState> {
        self.inner.state.subscribe()
    }

    // ── Registry refresh ─────────────────────────────────────────────

    /// Fetch the device collection and server stats, replacing the
    /// registry cache wholesale.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (devices, stats) = tokio::join!(
            self.inner.client.list_devices(),
            self.inner.client.get_stats(),
        );

        self.inner.registry.apply_snapshot(devices?);

        // Broker stats are a side dish; the derived FleetStats already
        // moved with the snapshot.
        match stats {
            Ok(s) => self.inner.registry.apply_broker_stats(s),
            Err(e) => debug!(error = %e, "stats fetch failed"),
        }

        debug!(
            devices = self.inner.registry.device_count(),
            "registry refresh complete"
        );
        Ok(())
    }

    // ── Snapshot accessors (delegate to the registry) ────────────────

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.registry.devices_snapshot()
    }

    pub fn fleet_stats(&self) -> FleetStats {
        self.inner.registry.fleet_stats()
    }

    pub fn devices(&self) -> DeviceStream {
        self.inner.registry.subscribe_devices()
    }

    // ── Edit session ─────────────────────────────────────────────────

    /// Open a create session. Returns the identity reserved for the
    /// new device.
    pub async fn begin_create(&self) -> Result<String, CoreError> {
        let mut session = self.inner.session.lock().await;
        self.guard_replacement(&session)?;
        Ok(session.begin_create())
    }

    /// Open an edit session for `uuid`, seeded from a fresh fetch.
    ///
    /// Any prior session is discarded first; if the fetch fails the
    /// session aborts and remains closed.
    pub async fn begin_edit(&self, uuid: &str) -> Result<Device, CoreError> {
        let mut session = self.inner.session.lock().await;
        self.guard_replacement(&session)?;
        session.cancel();

        let device = self.inner.client.get_device(uuid).await?;
        session.begin_edit(&device);
        Ok(device)
    }

    /// Close the session, discarding the draft.
    pub async fn cancel_edit(&self) {
        self.inner.session.lock().await.cancel();
    }

    pub async fn session_mode(&self) -> SessionMode {
        self.inner.session.lock().await.mode().clone()
    }

    /// The current draft contents (a copy; the draft itself stays
    /// session-owned).
    pub async fn draft_params(&self) -> Vec<Parameter> {
        self.inner.session.lock().await.draft().to_vec()
    }

    /// Validate a parameter form and append it to the open draft.
    pub async fn push_param(&self, form: &ParamForm) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        if !session.is_open() {
            return Err(CoreError::SessionClosed);
        }
        let param = form.build()?;
        session.draft_mut().push(param);
        Ok(())
    }

    /// Remove the draft parameter at `index`.
    pub async fn remove_param(&self, index: usize) -> Result<Parameter, CoreError> {
        let mut session = self.inner.session.lock().await;
        if !session.is_open() {
            return Err(CoreError::SessionClosed);
        }
        session
            .draft_mut()
            .remove_at(index)
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!("no parameter at index {index}"),
            })
    }

    /// Validate a parameter form and replace the draft entry at `index`.
    pub async fn replace_param(&self, index: usize, form: &ParamForm) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        if !session.is_open() {
            return Err(CoreError::SessionClosed);
        }
        let param = form.build()?;
        session
            .draft_mut()
            .replace_at(index, param)
            .map(|_| ())
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!("no parameter at index {index}"),
            })
    }

    /// Build and dispatch the session's device record.
    ///
    /// On success the session closes and a registry refresh is
    /// triggered (best-effort). On rejection the session stays open so
    /// the operator can correct and resubmit.
    pub async fn submit_device(&self, form: &DeviceForm) -> Result<Device, CoreError> {
        let mut session = self.inner.session.lock().await;

        let cached = session
            .mode()
            .target_uuid()
            .and_then(|uuid| self.inner.registry.get(uuid));
        let submission = session.build_submission(form, cached.as_deref())?;

        let result = match submission.action {
            SubmitAction::Create => self.inner.client.create_device(&submission.device).await,
            SubmitAction::Update => {
                self.inner
                    .client
                    .update_device(&submission.device.uuid, &submission.device)
                    .await
            }
        };

        match result {
            Ok(stored) => {
                session.cancel();
                drop(session);
                if let Err(e) = self.refresh().await {
                    debug!(error = %e, "post-submit refresh failed (best-effort)");
                }
                Ok(stored)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn guard_replacement(&self, session: &EditSession) -> Result<(), CoreError> {
        if self.inner.config.guard_unsaved_drafts && session.is_dirty() {
            return Err(CoreError::UnsavedDraft);
        }
        Ok(())
    }

    // ── Listener subscription ────────────────────────────────────────

    /// Open the single server-side subscription slot.
    pub async fn subscribe(&self, topic: &str) -> Result<(), CoreError> {
        let mut slot = self.inner.listener.lock().await;
        slot.check_subscribe(topic)?;
        self.inner.client.subscribe(topic).await?;
        slot.commit_subscribe(topic.to_owned());
        info!(topic, "subscribed");
        Ok(())
    }

    /// Release the subscription slot. The server request is
    /// best-effort: the slot is free even if it fails.
    pub async fn unsubscribe(&self) -> Result<(), CoreError> {
        let mut slot = self.inner.listener.lock().await;
        let topic = slot.begin_unsubscribe()?;
        if let Err(e) = self.inner.client.unsubscribe(&topic).await {
            debug!(error = %e, topic, "unsubscribe failed (best-effort)");
        }
        Ok(())
    }

    pub async fn subscription(&self) -> SubscriptionState {
        self.inner.listener.lock().await.state().clone()
    }

    /// The current listener buffer snapshot, oldest first.
    pub fn listener_messages(&self) -> Arc<Vec<InboundMessage>> {
        self.inner.listener_buffer.snapshot()
    }

    pub fn subscribe_listener_messages(&self) -> watch::Receiver<Arc<Vec<InboundMessage>>> {
        self.inner.listener_buffer.subscribe()
    }

    /// Purge the server-side buffer and re-poll immediately so the
    /// emptiness is visible.
    pub async fn clear_listener(&self) -> Result<(), CoreError> {
        self.inner.client.clear_listener_messages().await?;
        if let Err(e) = self.refresh_listener().await {
            debug!(error = %e, "listener re-poll failed (best-effort)");
        }
        Ok(())
    }

    /// One listener poll cycle.
    pub async fn refresh_listener(&self) -> Result<(), CoreError> {
        let messages = self.inner.client.listener_messages().await?;
        self.inner.listener_buffer.apply(messages);
        Ok(())
    }

    /// Start or stop listener polling with the panel's visibility.
    ///
    /// Polling runs exactly while the panel is open, independent of the
    /// subscription state -- the server may be relaying messages for
    /// topics this client never subscribed to.
    pub async fn set_listener_panel_open(&self, open: bool) {
        let mut task = self.inner.listener_task.lock().await;
        if open {
            if task.is_some() {
                return; // already polling
            }
            let poll_ms = self.inner.config.listener_poll_ms;
            if poll_ms == 0 {
                return;
            }
            let token = self.inner.cancel.child_token();
            let ctrl = self.clone();
            let handle = tokio::spawn(listener_poll_task(ctrl, poll_ms, token.clone()));
            *task = Some((token, handle));
            debug!("listener polling started");
        } else if let Some((token, handle)) = task.take() {
            token.cancel();
            let _ = handle.await;
            debug!("listener polling stopped");
        }
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a fleet command.
    ///
    /// Sends the command through the internal channel to the processor
    /// task and awaits the result. The processor triggers a registry
    /// refresh after every command, success or not.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.state.borrow() != PanelState::Running {
            return Err(CoreError::ControllerStopped);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerStopped)?;

        rx.await.map_err(|_| CoreError::ControllerStopped)?
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// One-shot: start, run closure, shut down.
    ///
    /// Optimized for the CLI: periodic device polling is disabled since
    /// a single request-response cycle is all that's needed.
    pub async fn oneshot<F, Fut, T>(config: PanelConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(PanelController) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.device_poll_ms = 0;

        let controller = PanelController::new(cfg)?;
        controller.start().await?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodically refresh devices + stats into the registry.
///
/// Ticks await their fetches serially, so this timer never overlaps
/// itself; a slow response delays the next cycle instead.
async fn refresh_task(controller: PanelController, poll_ms: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_millis(poll_ms));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Poll the listener buffer while the panel is open. The first tick
/// fires immediately so an opening panel shows messages right away.
async fn listener_poll_task(controller: PanelController, poll_ms: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_millis(poll_ms));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh_listener().await {
                    debug!(error = %e, "listener poll failed");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel, routing each to the backend
/// and refreshing the registry afterwards.
async fn command_processor_task(
    controller: PanelController,
    mut rx: mpsc::Receiver<CommandEnvelope>,
) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                // Unconditional: even a failed command may have had a
                // partial server-side effect worth showing.
                if let Err(e) = controller.refresh().await {
                    debug!(error = %e, "post-command refresh failed (best-effort)");
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

async fn route_command(
    controller: &PanelController,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let client = &controller.inner.client;

    match cmd {
        Command::Start { uuid } => {
            let reply = client.start_device(&uuid).await?;
            Ok(CommandResult::Status(reply.status))
        }

        Command::Stop { uuid } => {
            let reply = client.stop_device(&uuid).await?;
            Ok(CommandResult::Status(reply.status))
        }

        Command::StartAll => {
            client.start_all().await?;
            Ok(CommandResult::Ok)
        }

        Command::StopAll => {
            client.stop_all().await?;
            Ok(CommandResult::Ok)
        }

        Command::Delete { uuid } => {
            client.delete_device(&uuid).await?;
            Ok(CommandResult::Ok)
        }

        Command::Duplicate { uuid } => {
            let source = client.get_device(&uuid).await?;
            let copy = command::duplicate_of(&source);
            let created = client.create_device(&copy).await?;
            Ok(CommandResult::Device(created))
        }

        Command::UploadCsv {
            uuid,
            file_name,
            bytes,
        } => {
            let reply = client.upload_csv(&uuid, file_name, bytes).await?;
            Ok(CommandResult::CsvStored {
                file_path: reply.file_path,
            })
        }

        Command::Publish { topic, payload } => {
            if topic.trim().is_empty() {
                return Err(CoreError::ValidationFailed {
                    message: "publish topic must not be empty".into(),
                });
            }
            let payload = command::parse_payload(&payload);
            client
                .publish(&PublishRequest {
                    topic,
                    payload,
                    qos: 0,
                    retain: false,
                })
                .await?;
            Ok(CommandResult::Ok)
        }
    }
}
