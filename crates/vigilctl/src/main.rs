//! vigilctl - command-line client for vigild
//!
//! Talks to the daemon over its Unix socket: query state, start/stop
//! monitoring, answer an open challenge, or follow the event stream.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vigil_api::{
    Command, EventPayload, MonitorPhase, MonitorSnapshot, ResponsePayload, ResponseResult,
};
use vigil_ipc::IpcClient;
use vigil_util::{default_socket_path, format_datetime_full, format_duration};

#[derive(Parser, Debug)]
#[command(name = "vigilctl")]
#[command(about = "Control the vigild attentiveness monitor", long_about = None)]
struct Args {
    /// Socket path override (or set VIGILD_SOCKET env var)
    #[arg(short, long, env = "VIGILD_SOCKET")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug)]
enum CtlCommand {
    /// Show current monitor state
    Status,
    /// Start monitoring
    Start,
    /// Stop monitoring (dismisses an open challenge without firing)
    Stop,
    /// Answer the open challenge
    Respond,
    /// Show time until the next check
    NextCheck,
    /// Reload the daemon's configuration file
    Reload,
    /// Show daemon health
    Health,
    /// Follow the event stream
    Watch,
    /// Check that the daemon answers
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let socket_path = args.socket.unwrap_or_else(default_socket_path);
    let mut client = IpcClient::connect(&socket_path)
        .await
        .with_context(|| format!("Failed to connect to vigild at {}", socket_path.display()))?;

    match args.command {
        CtlCommand::Status => {
            let payload = send(&mut client, Command::GetState).await?;
            match payload {
                ResponsePayload::State(snapshot) => print_snapshot(&snapshot),
                other => bail!("Unexpected response: {other:?}"),
            }
        }

        CtlCommand::Start => {
            match send(&mut client, Command::Start).await? {
                ResponsePayload::Started => println!("Monitoring started"),
                ResponsePayload::AlreadyRunning => println!("Monitoring already running"),
                other => bail!("Unexpected response: {other:?}"),
            }
        }

        CtlCommand::Stop => {
            send(&mut client, Command::Stop).await?;
            println!("Monitoring stopped");
        }

        CtlCommand::Respond => {
            send(&mut client, Command::Respond).await?;
            println!("Challenge answered");
        }

        CtlCommand::NextCheck => {
            match send(&mut client, Command::TimeUntilNextCheck).await? {
                ResponsePayload::TimeUntilNextCheck {
                    remaining: Some(remaining),
                } => println!("Next check in {}", format_duration(remaining)),
                ResponsePayload::TimeUntilNextCheck { remaining: None } => {
                    println!("No check scheduled")
                }
                other => bail!("Unexpected response: {other:?}"),
            }
        }

        CtlCommand::Reload => {
            send(&mut client, Command::ReloadConfig).await?;
            println!("Configuration reloaded");
        }

        CtlCommand::Health => {
            match send(&mut client, Command::GetHealth).await? {
                ResponsePayload::Health(health) => {
                    println!("live:             {}", health.live);
                    println!("ready:            {}", health.ready);
                    println!("settings loaded:  {}", health.settings_loaded);
                    println!("action supported: {}", health.action_supported);
                    println!("prompt clients:   {}", health.prompt_clients);
                }
                other => bail!("Unexpected response: {other:?}"),
            }
        }

        CtlCommand::Watch => {
            let mut events = client.subscribe().await?;
            eprintln!("Watching events (Ctrl-C to quit)");
            loop {
                let event = events.next().await?;
                print_event(&event.payload);
            }
        }

        CtlCommand::Ping => {
            match send(&mut client, Command::Ping).await? {
                ResponsePayload::Pong => println!("pong"),
                other => bail!("Unexpected response: {other:?}"),
            }
        }
    }

    Ok(())
}

async fn send(client: &mut IpcClient, command: Command) -> Result<ResponsePayload> {
    let response = client.send(command).await?;
    match response.result {
        ResponseResult::Ok(payload) => Ok(payload),
        ResponseResult::Err(e) => bail!("{:?}: {}", e.code, e.message),
    }
}

fn print_snapshot(snapshot: &MonitorSnapshot) {
    let phase = match snapshot.phase {
        MonitorPhase::Stopped => "stopped",
        MonitorPhase::Waiting => "waiting",
        MonitorPhase::Challenging => "challenging",
    };

    println!("phase:            {phase}");
    println!("action:           {}", snapshot.action);
    println!(
        "check interval:   {}",
        format_duration(snapshot.check_interval)
    );
    println!(
        "response timeout: {}",
        format_duration(snapshot.response_timeout)
    );

    if let (Some(at), Some(until)) = (snapshot.next_check_at, snapshot.time_until_next_check) {
        println!(
            "next check:       {} (in {})",
            format_datetime_full(&at),
            format_duration(until)
        );
    }

    if let Some(challenge) = &snapshot.challenge {
        println!(
            "challenge:        {}s remaining{} (deadline {})",
            challenge.remaining_seconds,
            if challenge.low_time { ", low time" } else { "" },
            format_datetime_full(&challenge.deadline)
        );
    }
}

fn print_event(payload: &EventPayload) {
    match payload {
        EventPayload::StateChanged(snapshot) => {
            println!("state changed: phase {:?}", snapshot.phase)
        }
        EventPayload::MonitoringStarted { next_check_at } => {
            println!(
                "monitoring started, next check {}",
                format_datetime_full(next_check_at)
            )
        }
        EventPayload::MonitoringStopped { reason } => {
            println!("monitoring stopped: {reason:?}")
        }
        EventPayload::ChallengeOpened {
            challenge_id,
            deadline,
            ..
        } => println!(
            "challenge {challenge_id} opened, deadline {}",
            format_datetime_full(deadline)
        ),
        EventPayload::ChallengeCountdown {
            remaining_seconds,
            low_time,
            ..
        } => println!(
            "countdown: {remaining_seconds}s{}",
            if *low_time { " (low time)" } else { "" }
        ),
        EventPayload::ChallengeAnswered {
            challenge_id,
            next_check_at,
        } => println!(
            "challenge {challenge_id} answered, next check {}",
            format_datetime_full(next_check_at)
        ),
        EventPayload::ChallengeTimedOut {
            challenge_id,
            action,
            action_ok,
        } => println!(
            "challenge {challenge_id} timed out, action {action} {}",
            if *action_ok { "performed" } else { "FAILED" }
        ),
        EventPayload::ConfigReloaded => println!("config reloaded"),
        EventPayload::Shutdown => println!("daemon shutting down"),
    }
}
