use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pulse_core::config::EngineConfig;
use pulse_core::permission::PermissionBroker;
use pulse_core::signal::{LogNotifier, SignalDispatcher};
use pulse_core::task::TaskType;
use pulse_core::{ControlService, RunDriver, TaskRegistry};
use pulse_host::TokioHost;
use pulse_web::ApiServer;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse - a periodic background task engine with a HTTP control surface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine and serve the control API
    Serve {
        /// Address to bind the control API on
        #[arg(long, default_value = "127.0.0.1:8947")]
        addr: SocketAddr,

        /// Register a task at startup, format: name:interval_seconds:task_type
        #[arg(long = "task")]
        tasks: Vec<String>,
    },

    /// Execute a single task body once and print its result
    RunTask {
        /// Task type tag (ping, ssh_check, system_monitor, file_sync, default)
        task_type: String,
    },
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    // Tests may initialize tracing multiple times; a second install is fine.
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = EngineConfig::default();

    match cli.command {
        Commands::Serve { addr, tasks } => serve(config, addr, tasks).await,
        Commands::RunTask { task_type } => run_task(config, &task_type).await,
    }
}

async fn serve(config: EngineConfig, addr: SocketAddr, tasks: Vec<String>) -> Result<()> {
    let notifier = Arc::new(LogNotifier::new(config.notification_channel.clone()));
    let registry = Arc::new(TaskRegistry::builtin(&config));
    let driver = RunDriver::new(registry, SignalDispatcher::new(notifier.clone()));
    let host = Arc::new(TokioHost::new(Arc::new(driver)));
    let control = Arc::new(ControlService::new(
        host.clone(),
        notifier,
        Arc::new(PermissionBroker::new()),
    ));

    for spec in tasks {
        let (name, interval, task_type) = parse_task_spec(&spec)?;
        let confirmation = control
            .start_periodic_work(name, interval, task_type)
            .await?;
        info!("{confirmation}");
    }

    info!("control API listening on {addr}");
    let server = ApiServer::new(control).serve(addr).await;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.abort();
    host.shutdown().await;
    Ok(())
}

async fn run_task(config: EngineConfig, task_type: &str) -> Result<()> {
    let registry = TaskRegistry::builtin(&config);
    let result = registry.execute(TaskType::parse(task_type)).await;
    println!(
        "{}: {}",
        if result.success { "SUCCESS" } else { "FAILED" },
        result.message
    );
    Ok(())
}

fn parse_task_spec(spec: &str) -> Result<(&str, u64, &str)> {
    let mut parts = spec.splitn(3, ':');
    let name = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("invalid task spec '{spec}', expected name:interval:type"))?;
    let interval = parts
        .next()
        .unwrap_or("20")
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid interval in task spec '{spec}'"))?;
    let task_type = parts.next().unwrap_or("ping");
    Ok((name, interval, task_type))
}
