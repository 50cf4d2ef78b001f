use maildesk::maildesk_version;
use maildesk::modules::{
    common::{rustls::MaildeskTls, signal::SignalManager, signal::SIGNAL_MANAGER},
    context::Initialize,
    database::manager::DatabaseManager,
    error::MaildeskResult,
    logger,
    settings::dir::DataDirManager,
    sync::supervisor::{MailboxSupervisor, MAILBOX_SUPERVISOR},
};
use mimalloc::MiMalloc;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

static LOGO: &str = r#"
  __  __       _ _     _           _
 |  \/  | __ _(_) | __| | ___  ___| | __
 | |\/| |/ _` | | |/ _` |/ _ \/ __| |/ /
 | |  | | (_| | | | (_| |  __/\__ \   <
 |_|  |_|\__,_|_|_|\__,_|\___||___/_|\_\

"#;

#[tokio::main]
async fn main() -> MaildeskResult<()> {
    logger::initialize_logging();
    info!("{}", LOGO);
    info!("Starting maildesk");
    info!("Version:  {}", maildesk_version!());

    if let Err(error) = initialize().await {
        eprintln!("{:?}", error);
        return Err(error);
    }

    // the supervisor owns every mailbox session from here on; the main task
    // only has to wait for the stop signal
    let mut shutdown = SIGNAL_MANAGER.subscribe();
    let _ = shutdown.recv().await;

    info!("Shutting down, closing mailbox sessions");
    MAILBOX_SUPERVISOR.shutdown_all().await;
    info!("Shutdown complete");
    Ok(())
}

/// Initialize the system by validating settings and starting necessary tasks.
async fn initialize() -> MaildeskResult<()> {
    SignalManager::initialize().await?;
    DataDirManager::initialize().await?;
    MaildeskTls::initialize().await?;
    DatabaseManager::initialize().await?;
    MailboxSupervisor::initialize().await?;
    Ok(())
}
