use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::raise_error;
use mail_send::smtp::message::IntoMessage;
use mail_send::SmtpClient;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pub enum MaildeskSmtpClient {
    Plain(SmtpClient<TcpStream>),
    Tls(SmtpClient<TlsStream<TcpStream>>),
}

pub(crate) trait Sender {
    async fn send_noop(&mut self) -> MaildeskResult<()>;
    async fn reset(&mut self) -> MaildeskResult<()>;
    async fn send_email<'x>(&mut self, message: impl IntoMessage<'x>) -> MaildeskResult<()>;
}

impl Sender for MaildeskSmtpClient {
    async fn send_noop(&mut self) -> MaildeskResult<()> {
        match self {
            MaildeskSmtpClient::Plain(smtp_client) => smtp_client
                .noop()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
            MaildeskSmtpClient::Tls(smtp_client) => smtp_client
                .noop()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
        }
    }

    async fn reset(&mut self) -> MaildeskResult<()> {
        match self {
            MaildeskSmtpClient::Plain(smtp_client) => smtp_client
                .rset()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
            MaildeskSmtpClient::Tls(smtp_client) => smtp_client
                .rset()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
        }
    }

    async fn send_email<'x>(&mut self, message: impl IntoMessage<'x>) -> MaildeskResult<()> {
        match self {
            MaildeskSmtpClient::Plain(smtp_client) => smtp_client
                .send(message)
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
            MaildeskSmtpClient::Tls(smtp_client) => smtp_client
                .send(message)
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpCommandFailed)),
        }
    }
}
