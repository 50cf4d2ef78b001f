// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use tracing::warn;

use crate::modules::error::MaildeskResult;
use crate::modules::ingest::content::AttachmentPart;
use crate::modules::message::attachment::EmailAttachment;
use crate::modules::settings::dir::DATA_DIR_MANAGER;
use crate::{current_datetime, generate_token, id, utc_now};

pub static ATTACHMENT_STORE: LazyLock<AttachmentStore> =
    LazyLock::new(|| AttachmentStore::new(DATA_DIR_MANAGER.attachment_dir.clone()));

const IMAGE_DIR: &str = "images";
const FILE_DIR: &str = "files";

/// Writes parsed file parts beneath the attachment root and produces the
/// metadata rows for the repository. Image parts and generic files land in
/// separate subdirectories.
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Persist every part of one email. A single part's write failure is
    /// logged and skipped; the already-persisted email row is never rolled
    /// back and the remaining parts are still attempted.
    pub async fn persist(
        &self,
        email_id: u64,
        parts: &[AttachmentPart],
    ) -> MaildeskResult<Vec<EmailAttachment>> {
        let mut records = Vec::with_capacity(parts.len());
        for part in parts {
            let class_dir = classify(&part.mime_type);
            let file_name = generate_file_name(part.file_name.as_deref(), &part.mime_type);
            let dir = self.root.join(class_dir);
            let path = dir.join(&file_name);

            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                warn!(email_id, ?path, "Failed to create attachment dir: {e}");
                continue;
            }
            if let Err(e) = tokio::fs::write(&path, &part.content).await {
                warn!(email_id, ?path, "Failed to write attachment: {e}");
                continue;
            }

            let stored_path = format!("{}/{}", class_dir, file_name);
            records.push(EmailAttachment {
                id: id!(64),
                email_id,
                file_name,
                stored_path,
                mime_type: part.mime_type.clone(),
                size: part.content.len() as u64,
                created_at: utc_now!(),
            });
        }
        Ok(records)
    }

    pub fn resolve_path(&self, stored_path: &str) -> PathBuf {
        self.root.join(stored_path)
    }
}

fn classify(mime_type: &str) -> &'static str {
    if mime_type.starts_with("image/") {
        IMAGE_DIR
    } else {
        FILE_DIR
    }
}

/// Collision-resistant name: timestamp, random suffix, original extension.
fn generate_file_name(original: Option<&str>, mime_type: &str) -> String {
    let extension = original
        .map(Path::new)
        .and_then(|p| p.extension())
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type)
                .and_then(|exts| exts.first())
                .map(|ext| format!(".{}", ext))
        })
        .unwrap_or_default();
    format!(
        "{}-{}{}",
        current_datetime!(),
        generate_token!(48).to_lowercase(),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persists_parts_into_class_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path().to_path_buf());

        let parts = vec![
            AttachmentPart {
                file_name: Some("photo.PNG".into()),
                mime_type: "image/png".into(),
                content: vec![1, 2, 3, 4],
            },
            AttachmentPart {
                file_name: None,
                mime_type: "application/pdf".into(),
                content: vec![9; 10],
            },
        ];

        let email_id = id!(64);
        let records = store.persist(email_id, &parts).await.unwrap();
        assert_eq!(records.len(), 2);

        let image = &records[0];
        assert!(image.stored_path.starts_with("images/"));
        assert!(image.file_name.ends_with(".png"));
        assert_eq!(image.size, 4);
        assert!(store.resolve_path(&image.stored_path).exists());

        let file = &records[1];
        assert!(file.stored_path.starts_with("files/"));
        assert_eq!(file.size, 10);
        assert_eq!(file.email_id, email_id);
        assert!(store.resolve_path(&file.stored_path).exists());
    }

    #[tokio::test]
    async fn generated_names_do_not_collide() {
        let a = generate_file_name(Some("a.txt"), "text/plain");
        let b = generate_file_name(Some("a.txt"), "text/plain");
        assert_ne!(a, b);
    }
}
