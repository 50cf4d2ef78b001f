use crate::{
    modules::{
        context::Initialize,
        error::{code::ErrorCode, MaildeskResult},
    },
    raise_error,
};

pub struct MaildeskTls;

impl Initialize for MaildeskTls {
    async fn initialize() -> MaildeskResult<()> {
        rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
            .map_err(|_| {
                raise_error!(
                    "failed to set crypto provider".into(),
                    ErrorCode::InternalError
                )
            })
    }
}
