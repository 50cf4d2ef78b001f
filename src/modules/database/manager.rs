use crate::modules::context::Initialize;
use crate::modules::database::{MAIL_MODELS, META_MODELS};
use crate::modules::error::{code::ErrorCode, MaildeskError, MaildeskResult};
use crate::modules::settings::cli::SETTINGS;
use crate::modules::settings::dir::DATA_DIR_MANAGER;
use crate::raise_error;
use native_db::{Builder, Database};
use std::sync::{Arc, LazyLock};

pub static DB_MANAGER: LazyLock<DatabaseManager> = LazyLock::new(DatabaseManager::new);

pub struct DatabaseManager {
    /// Metadata database instance (mailbox configuration)
    meta_db: Arc<Database<'static>>,
    /// Mail database instance (customers, threads, emails, attachments)
    mail_db: Arc<Database<'static>>,
}

impl DatabaseManager {
    fn new() -> Self {
        let meta_db = Self::init_meta_database().expect("Failed to initialize metadata database");
        let mail_db = Self::init_mail_database().expect("Failed to initialize mail database");
        DatabaseManager { meta_db, mail_db }
    }

    /// Get a reference to the metadata database
    pub fn meta_db(&self) -> &Arc<Database<'static>> {
        &self.meta_db
    }

    /// Get a reference to the mail database
    pub fn mail_db(&self) -> &Arc<Database<'static>> {
        &self.mail_db
    }

    fn init_meta_database() -> MaildeskResult<Arc<Database<'static>>> {
        if SETTINGS.maildesk_memory_mode_enabled {
            return Ok(Arc::new(
                Builder::new().create_in_memory(&META_MODELS).unwrap(),
            ));
        }
        let mut database = Builder::new()
            .set_cache_size(
                SETTINGS
                    .maildesk_metadata_cache_size
                    .unwrap_or(134217728)
                    .max(67108864) as usize,
            ) //default 128MB
            .create(&META_MODELS, DATA_DIR_MANAGER.meta_db.clone())
            .map_err(Self::handle_database_error)?;
        database
            .compact()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        Ok(Arc::new(database))
    }

    fn init_mail_database() -> MaildeskResult<Arc<Database<'static>>> {
        if SETTINGS.maildesk_memory_mode_enabled {
            return Ok(Arc::new(
                Builder::new().create_in_memory(&MAIL_MODELS).unwrap(),
            ));
        }
        let mut database = Builder::new()
            .set_cache_size(
                SETTINGS
                    .maildesk_mail_cache_size
                    .unwrap_or(1073741824)
                    .max(67108864) as usize,
            ) //default 1GB
            .create(&MAIL_MODELS, DATA_DIR_MANAGER.mail_db.clone())
            .map_err(Self::handle_database_error)?;
        database
            .compact()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        Ok(Arc::new(database))
    }

    fn touch(&self) {
        let _ = (&self.meta_db, &self.mail_db);
    }

    fn handle_database_error(error: native_db::db_type::Error) -> MaildeskError {
        match error {
            native_db::db_type::Error::RedbDatabaseError(database_error) => match database_error {
                redb::DatabaseError::DatabaseAlreadyOpen => {
                    raise_error!(
                        "Database is already open by another instance".into(),
                        ErrorCode::InternalError
                    )
                }
                other => {
                    raise_error!(
                        format!("Database error: {:?}", other),
                        ErrorCode::InternalError
                    )
                }
            },
            other => {
                raise_error!(
                    format!("Failed to create database: {:?}", other),
                    ErrorCode::InternalError
                )
            }
        }
    }
}

impl Initialize for DatabaseManager {
    async fn initialize() -> MaildeskResult<()> {
        // force both databases open before any mailbox session starts
        DB_MANAGER.touch();
        Ok(())
    }
}
