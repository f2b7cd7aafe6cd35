//! vigild - the attentiveness monitor daemon
//!
//! Wires together:
//! - Configuration loading and the shared settings handle
//! - The monitoring engine (vigil-core)
//! - The Linux power action executor
//! - The IPC server and event broadcasting
//! - Signal handling and the 1-second tick loop

mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vigil_api::{
    ClientRole, Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, MonitorPhase,
    Response, ResponsePayload, StopReason,
};
use vigil_config::{load_settings, Settings, SettingsHandle};
use vigil_core::{EngineError, EngineEvent, MonitorEngine};
use vigil_host_api::ActionExecutor;
use vigil_host_linux::{autostart, LinuxActionExecutor};
use vigil_ipc::{IpcServer, ServerMessage};
use vigil_util::{
    default_config_path, default_log_dir, default_socket_path, ClientId, MonotonicInstant,
    RateLimiter,
};

use prompt::IpcPrompt;

/// vigild - sleep-attentiveness monitor daemon
#[derive(Parser, Debug)]
#[command(name = "vigild")]
#[command(about = "Periodically challenges the user and powers down on no answer", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/vigild/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set VIGILD_SOCKET env var)
    #[arg(short, long, env = "VIGILD_SOCKET")]
    socket: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: MonitorEngine,
    settings: SettingsHandle,
    config_path: PathBuf,
    executor: Arc<LinuxActionExecutor>,
    ipc: Arc<IpcServer>,
    rate_limiter: RateLimiter,
}

impl Service {
    async fn new(args: &Args, settings: Settings) -> Result<Self> {
        info!(
            config_path = %args.config.display(),
            check_interval_secs = settings.check_interval.as_secs(),
            response_timeout_secs = settings.response_timeout.as_secs(),
            action = %settings.action,
            "Configuration loaded"
        );

        // Determine paths
        let socket_path = args
            .socket
            .clone()
            .or_else(|| settings.socket_path.clone())
            .unwrap_or_else(default_socket_path);

        // Register/unregister with the desktop session
        Self::apply_autostart(settings.autostart);

        let settings = SettingsHandle::new(settings);

        // Initialize IPC server
        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;
        let ipc = Arc::new(ipc);

        info!(socket_path = %socket_path.display(), "IPC server started");

        // Initialize host adapter and engine
        let executor = Arc::new(LinuxActionExecutor::new());
        let prompt = Arc::new(IpcPrompt::new(ipc.clone()));
        let engine = MonitorEngine::new(settings.clone(), executor.clone(), prompt);

        // Rate limiter: 30 requests per second per client
        let rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

        Ok(Self {
            engine,
            settings,
            config_path: args.config.clone(),
            executor,
            ipc,
            rate_limiter,
        })
    }

    async fn run(self) -> Result<()> {
        let ipc_ref = self.ipc.clone();
        let mut ipc_messages = ipc_ref
            .take_message_receiver()
            .await
            .expect("Message receiver should be available");

        // Wrap mutable state
        let engine = Arc::new(Mutex::new(self.engine));
        let rate_limiter = Arc::new(Mutex::new(self.rate_limiter));
        let settings = self.settings.clone();
        let config_path = self.config_path.clone();
        let executor = self.executor.clone();

        // Spawn IPC accept task
        let ipc_accept = ipc_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        // Begin monitoring right away when registered to start with the session
        if settings.snapshot().autostart {
            let mut eng = engine.lock().await;
            if let Some(event) = eng.start(vigil_util::now(), MonotonicInstant::now()) {
                Self::broadcast_engine_event(&ipc_ref, &event);
            }
        }

        // Main event loop: transitions happen at 1-second granularity,
        // matching the countdown cadence the shell displays.
        let mut tick_timer = tokio::time::interval(Duration::from_secs(1));

        info!("Service running");

        loop {
            tokio::select! {
                // Signals - graceful shutdown
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    match load_settings(&config_path) {
                        Ok(new_settings) => {
                            Self::apply_autostart(new_settings.autostart);
                            settings.replace(new_settings);
                            ipc_ref.broadcast_event(Event::new(EventPayload::ConfigReloaded));
                        }
                        Err(e) => {
                            warn!(error = %e, "Config reload failed, keeping previous settings");
                        }
                    }
                }

                // Tick timer - drive deadlines and countdowns
                _ = tick_timer.tick() => {
                    let now = vigil_util::now();
                    let now_mono = MonotonicInstant::now();

                    let result = {
                        let mut engine = engine.lock().await;
                        engine.tick(now, now_mono).await
                    };

                    match result {
                        Ok(events) => {
                            for event in &events {
                                Self::broadcast_engine_event(&ipc_ref, event);
                            }
                            if events.iter().any(Self::changes_phase) {
                                Self::broadcast_state(&engine, &ipc_ref).await;
                            }
                        }
                        Err(EngineError::PromptUnavailable(e)) => {
                            error!(error = %e, "Monitoring aborted: challenge prompt unavailable");
                            ipc_ref.broadcast_event(Event::new(EventPayload::MonitoringStopped {
                                reason: StopReason::PromptUnavailable,
                            }));
                            Self::broadcast_state(&engine, &ipc_ref).await;
                        }
                    }
                }

                // IPC messages
                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(
                        &engine, &settings, &config_path, &executor, &ipc_ref, &rate_limiter, msg,
                    ).await;
                }
            }
        }

        // Graceful shutdown: stop monitoring without firing the action
        {
            let mut eng = engine.lock().await;
            if let Some(event) = eng.stop(StopReason::DaemonShutdown).await {
                Self::broadcast_engine_event(&ipc_ref, &event);
            }
        }
        ipc_ref.broadcast_event(Event::new(EventPayload::Shutdown));
        ipc_ref.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    /// True for events that move the monitor between phases
    fn changes_phase(event: &EngineEvent) -> bool {
        !matches!(event, EngineEvent::ChallengeCountdown { .. })
    }

    /// Map an engine event onto the wire and broadcast it.
    ///
    /// `ChallengeOpened` and `ChallengeCountdown` are already broadcast by
    /// the prompt surface as the prompt itself; rebroadcasting them here
    /// would show every shell a doubled dialog.
    fn broadcast_engine_event(ipc: &Arc<IpcServer>, event: &EngineEvent) {
        let payload = match event {
            EngineEvent::MonitoringStarted { next_check_at } => {
                Some(EventPayload::MonitoringStarted {
                    next_check_at: *next_check_at,
                })
            }
            EngineEvent::MonitoringStopped { reason } => Some(EventPayload::MonitoringStopped {
                reason: reason.clone(),
            }),
            EngineEvent::ChallengeAnswered {
                challenge_id,
                next_check_at,
            } => Some(EventPayload::ChallengeAnswered {
                challenge_id: *challenge_id,
                next_check_at: *next_check_at,
            }),
            EngineEvent::ChallengeTimedOut {
                challenge_id,
                action,
                action_ok,
            } => Some(EventPayload::ChallengeTimedOut {
                challenge_id: *challenge_id,
                action: *action,
                action_ok: *action_ok,
            }),
            EngineEvent::ChallengeOpened { .. } | EngineEvent::ChallengeCountdown { .. } => None,
        };

        if let Some(payload) = payload {
            ipc.broadcast_event(Event::new(payload));
        }
    }

    async fn broadcast_state(engine: &Arc<Mutex<MonitorEngine>>, ipc: &Arc<IpcServer>) {
        let snapshot = {
            let engine = engine.lock().await;
            engine.snapshot(MonotonicInstant::now())
        };
        ipc.broadcast_event(Event::new(EventPayload::StateChanged(snapshot)));
    }

    fn apply_autostart(enabled: bool) {
        let exec = std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "vigild".to_string());

        if let Err(e) = autostart::apply_autostart(enabled, &exec) {
            warn!(error = %e, enabled, "Failed to apply autostart setting");
        }
    }

    async fn handle_ipc_message(
        engine: &Arc<Mutex<MonitorEngine>>,
        settings: &SettingsHandle,
        config_path: &PathBuf,
        executor: &Arc<LinuxActionExecutor>,
        ipc: &Arc<IpcServer>,
        rate_limiter: &Arc<Mutex<RateLimiter>>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                // Rate limiting
                {
                    let mut limiter = rate_limiter.lock().await;
                    if !limiter.check(client_id) {
                        let response = Response::error(
                            request.request_id,
                            ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                        );
                        let _ = ipc.send_response(&client_id, response).await;
                        return;
                    }
                }

                let response = Self::handle_command(
                    engine,
                    settings,
                    config_path,
                    executor,
                    ipc,
                    &client_id,
                    request.request_id,
                    request.command,
                )
                .await;

                let _ = ipc.send_response(&client_id, response).await;
            }

            ServerMessage::ClientConnected { client_id, info } => {
                info!(
                    client_id = %client_id,
                    role = ?info.role,
                    uid = ?info.uid,
                    "Client connected"
                );
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                let mut limiter = rate_limiter.lock().await;
                limiter.remove_client(client_id);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_command(
        engine: &Arc<Mutex<MonitorEngine>>,
        settings: &SettingsHandle,
        config_path: &PathBuf,
        executor: &Arc<LinuxActionExecutor>,
        ipc: &Arc<IpcServer>,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
    ) -> Response {
        let now = vigil_util::now();
        let now_mono = MonotonicInstant::now();

        // Clients with unresolvable peer credentials end up read-only.
        let role = ipc
            .get_client_info(client_id)
            .await
            .map(|info| info.role)
            .unwrap_or(ClientRole::Observer);

        match command {
            Command::GetState => {
                let state = engine.lock().await.snapshot(now_mono);
                Response::success(request_id, ResponsePayload::State(state))
            }

            Command::Start => {
                if !role.can_start() {
                    return Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::PermissionDenied, "Shell or admin role required"),
                    );
                }

                let event = {
                    let mut eng = engine.lock().await;
                    eng.start(now, now_mono)
                };

                match event {
                    Some(event) => {
                        Self::broadcast_engine_event(ipc, &event);
                        Self::broadcast_state(engine, ipc).await;
                        Response::success(request_id, ResponsePayload::Started)
                    }
                    None => Response::success(request_id, ResponsePayload::AlreadyRunning),
                }
            }

            Command::Stop => {
                if !role.can_stop() {
                    return Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::PermissionDenied, "Shell or admin role required"),
                    );
                }

                let event = {
                    let mut eng = engine.lock().await;
                    eng.stop(StopReason::UserStop).await
                };

                match event {
                    Some(event) => {
                        Self::broadcast_engine_event(ipc, &event);
                        Self::broadcast_state(engine, ipc).await;
                        Response::success(request_id, ResponsePayload::Stopped)
                    }
                    None => Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::NotMonitoring, "Monitoring is not running"),
                    ),
                }
            }

            Command::Respond => {
                if !role.can_respond() {
                    return Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::PermissionDenied, "Shell or admin role required"),
                    );
                }

                let (event, phase) = {
                    let mut eng = engine.lock().await;
                    let event = eng.respond(now, now_mono).await;
                    (event, eng.phase())
                };

                match event {
                    Some(event) => {
                        Self::broadcast_engine_event(ipc, &event);
                        Self::broadcast_state(engine, ipc).await;
                        Response::success(request_id, ResponsePayload::Responded)
                    }
                    None if phase == MonitorPhase::Stopped => Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::NotMonitoring, "Monitoring is not running"),
                    ),
                    None => Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::NoOpenChallenge, "No open challenge"),
                    ),
                }
            }

            Command::TimeUntilNextCheck => {
                let remaining = engine.lock().await.time_until_next_check(now_mono);
                Response::success(
                    request_id,
                    ResponsePayload::TimeUntilNextCheck { remaining },
                )
            }

            Command::ReloadConfig => {
                if !role.can_reload_config() {
                    return Response::error(
                        request_id,
                        ErrorInfo::new(ErrorCode::PermissionDenied, "Admin role required"),
                    );
                }

                match load_settings(config_path) {
                    Ok(new_settings) => {
                        Self::apply_autostart(new_settings.autostart);
                        settings.replace(new_settings);

                        info!(config_path = %config_path.display(), "Configuration reloaded");
                        ipc.broadcast_event(Event::new(EventPayload::ConfigReloaded));

                        Response::success(request_id, ResponsePayload::ConfigReloaded)
                    }
                    Err(e) => {
                        // Keep the old settings on a bad file
                        warn!(error = %e, "Config reload failed");
                        Response::error(
                            request_id,
                            ErrorInfo::new(ErrorCode::ConfigError, e.to_string()),
                        )
                    }
                }
            }

            Command::SubscribeEvents => Response::success(
                request_id,
                ResponsePayload::Subscribed {
                    client_id: *client_id,
                },
            ),

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                let current = settings.snapshot();
                let health = HealthStatus {
                    live: true,
                    ready: true,
                    settings_loaded: true,
                    action_supported: executor.capabilities().supports(current.action),
                    prompt_clients: ipc.subscriber_count().await,
                };
                Response::success(request_id, ResponsePayload::Health(health))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Settings are loaded before logging so [daemon] log_dir can take effect
    let settings = load_settings(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let log_dir = settings.log_dir.clone().unwrap_or_else(default_log_dir);
    init_logging(&args.log_level, &log_dir);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "vigild starting"
    );

    let service = Service::new(&args, settings).await?;
    service.run().await
}

/// Human-readable logs on stderr, JSON records in `<log_dir>/vigild.log`.
/// The file layer is skipped if the directory cannot be created.
fn init_logging(log_level: &str, log_dir: &std::path::Path) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file_layer = open_log_file(log_dir).map(|file| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });

    if file_layer.is_none() {
        eprintln!("vigild: cannot open log file in {:?}, logging to stderr only", log_dir);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(file_layer)
        .init();
}

fn open_log_file(dir: &std::path::Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("vigild.log"))
        .ok()
}
