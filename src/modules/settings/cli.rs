// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::Parser;
use std::sync::LazyLock;

#[cfg(not(test))]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::parse);

#[cfg(test)]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::new_for_test);

#[derive(Debug, Parser)]
#[clap(
    name = "maildesk",
    about = "A mailbox synchronization and conversation-threading engine:
    one supervised IMAP session per business mailbox, exactly-once inbound ingestion,
    and one conversation thread per customer.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// maildesk log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for maildesk"
    )]
    pub maildesk_log_level: String,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub maildesk_ansi_logs: bool,

    /// Enable log file output (default: false)
    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Write logs to rolling files under the data directory instead of stdout"
    )]
    pub maildesk_log_to_file: bool,

    #[clap(
        long,
        default_value = "5",
        env,
        help = "Maximum number of rotated server log files to keep"
    )]
    pub maildesk_max_server_log_files: usize,

    /// Root directory for databases, logs and stored attachments
    #[clap(
        long,
        default_value = "/var/lib/maildesk",
        env,
        help = "Set the root data directory for maildesk"
    )]
    pub maildesk_root_dir: String,

    #[clap(
        long,
        env,
        help = "Cache size in bytes for the metadata database (default 128MB)"
    )]
    pub maildesk_metadata_cache_size: Option<u64>,

    #[clap(
        long,
        env,
        help = "Cache size in bytes for the mail database (default 1GB)"
    )]
    pub maildesk_mail_cache_size: Option<u64>,

    /// Keep the metadata database in memory (used by the test suite)
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Run the databases fully in memory, without persistence"
    )]
    pub maildesk_memory_mode_enabled: bool,

    #[clap(
        long,
        default_value = "change-this-default-password-now",
        env,
        help = "Password used to encrypt stored mailbox credentials"
    )]
    pub maildesk_encrypt_password: String,

    /// The folder that inbound synchronization watches
    #[clap(
        long,
        default_value = "INBOX",
        env,
        help = "Name of the provider folder watched for inbound mail"
    )]
    pub maildesk_inbound_folder: String,

    /// Minimum interval between two non-forced fetch cycles for one mailbox
    #[clap(
        long,
        default_value = "15",
        env,
        help = "Minimum seconds between non-forced sync cycles per mailbox",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub maildesk_sync_min_interval_secs: u64,

    /// Number of most-recent messages fetched per cycle
    #[clap(
        long,
        default_value = "10",
        env,
        help = "Bounded fetch window: how many of the newest messages one cycle inspects",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub maildesk_sync_fetch_window: u32,

    /// Settle delay applied before a notification-triggered sync
    #[clap(
        long,
        default_value = "1500",
        env,
        help = "Milliseconds to wait after a new-message notification before syncing"
    )]
    pub maildesk_sync_debounce_ms: u64,

    #[clap(
        long,
        default_value = "30",
        env,
        help = "Fixed delay in seconds before a dropped session reconnects",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub maildesk_reconnect_delay_secs: u64,

    #[clap(
        long,
        default_value = "30",
        env,
        help = "Interval in seconds of the session health-check sweep",
        value_parser = clap::value_parser!(u64).range(5..)
    )]
    pub maildesk_health_check_interval_secs: u64,

    /// How long one IDLE command is allowed to sit before it is re-issued
    #[clap(
        long,
        default_value = "300",
        env,
        help = "Seconds before an IDLE wait is refreshed (servers drop long idles)"
    )]
    pub maildesk_idle_refresh_secs: u64,

    #[clap(
        long,
        default_value = "10",
        env,
        help = "Maximum pooled SMTP connections per mailbox",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub maildesk_smtp_pool_size: u32,
}

impl Settings {
    #[cfg(test)]
    fn new_for_test() -> Self {
        Self {
            maildesk_log_level: "info".to_string(),
            maildesk_ansi_logs: false,
            maildesk_log_to_file: false,
            maildesk_max_server_log_files: 5,
            maildesk_root_dir: std::env::temp_dir()
                .join("maildesk_test_data")
                .to_string_lossy()
                .into_owned(),
            maildesk_metadata_cache_size: None,
            maildesk_mail_cache_size: None,
            maildesk_memory_mode_enabled: true,
            maildesk_encrypt_password: "maildesk-test-encrypt-password".into(),
            maildesk_inbound_folder: "INBOX".into(),
            maildesk_sync_min_interval_secs: 15,
            maildesk_sync_fetch_window: 10,
            maildesk_sync_debounce_ms: 1500,
            maildesk_reconnect_delay_secs: 30,
            maildesk_health_check_interval_secs: 30,
            maildesk_idle_refresh_secs: 300,
            maildesk_smtp_pool_size: 10,
        }
    }
}
