// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::raise_error;
use bb8::RunError;
use code::ErrorCode;
use snafu::{Location, Snafu};

pub mod code;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MaildeskError {
    #[snafu(display("{message}"))]
    Generic {
        message: String,
        #[snafu(implicit)]
        location: Location,
        code: ErrorCode,
    },
}

pub type MaildeskResult<T, E = MaildeskError> = std::result::Result<T, E>;

impl MaildeskError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MaildeskError::Generic { code, .. } => *code,
        }
    }
}

impl From<RunError<MaildeskError>> for MaildeskError {
    fn from(e: RunError<MaildeskError>) -> Self {
        match e {
            RunError::User(e) => e,
            RunError::TimedOut => raise_error!(
                "Timed out while attempting to acquire a connection from the pool".into(),
                ErrorCode::ConnectionPoolTimeout
            ),
        }
    }
}
