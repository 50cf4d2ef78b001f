// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::context::Initialize;
use crate::modules::settings::cli::SETTINGS;
use crate::{
    modules::error::{code::ErrorCode, MaildeskResult},
    raise_error,
};
use std::path::PathBuf;
use std::sync::LazyLock;

pub const META_FILE: &str = "meta.db";
pub const MAIL_FILE: &str = "mail.db";
const LOG_DIR: &str = "logs";
const ATTACHMENT_DIR: &str = "attachments";
const ATTACHMENT_IMAGE_DIR: &str = "images";
const ATTACHMENT_FILE_DIR: &str = "files";

pub static DATA_DIR_MANAGER: LazyLock<DataDirManager> =
    LazyLock::new(|| DataDirManager::new(PathBuf::from(&SETTINGS.maildesk_root_dir)));

#[derive(Debug)]
pub struct DataDirManager {
    pub root_dir: PathBuf,
    pub meta_db: PathBuf,
    pub mail_db: PathBuf,
    pub log_dir: PathBuf,
    pub attachment_dir: PathBuf,
}

impl Initialize for DataDirManager {
    async fn initialize() -> MaildeskResult<()> {
        std::fs::create_dir_all(&DATA_DIR_MANAGER.root_dir)
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        std::fs::create_dir_all(&DATA_DIR_MANAGER.log_dir)
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        std::fs::create_dir_all(DATA_DIR_MANAGER.image_dir())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        std::fs::create_dir_all(DATA_DIR_MANAGER.file_dir())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        Ok(())
    }
}

impl DataDirManager {
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            root_dir: root_dir.clone(),
            meta_db: root_dir.join(META_FILE),
            mail_db: root_dir.join(MAIL_FILE),
            log_dir: root_dir.join(LOG_DIR),
            attachment_dir: root_dir.join(ATTACHMENT_DIR),
        }
    }

    pub fn image_dir(&self) -> PathBuf {
        self.attachment_dir.join(ATTACHMENT_IMAGE_DIR)
    }

    pub fn file_dir(&self) -> PathBuf {
        self.attachment_dir.join(ATTACHMENT_FILE_DIR)
    }
}
