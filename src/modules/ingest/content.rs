// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use mail_parser::{Message, MessageParser, MimeHeaders};

use crate::modules::common::{Addr, AddrVec};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::raise_error;

/// One file part lifted out of a parsed message, content already decoded.
#[derive(Debug, Clone)]
pub struct AttachmentPart {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Everything the ingestion pipeline needs from one raw RFC 5322 message.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    pub from: Addr,
    pub to: Vec<Addr>,
    pub cc: Vec<Addr>,
    pub bcc: Vec<Addr>,
    pub subject: String,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    /// Date header (UNIX epoch milliseconds)
    pub date: Option<i64>,
    pub body_html: String,
    /// Plain text with quoted reply chains stripped
    pub body_text: String,
    pub attachments: Vec<AttachmentPart>,
}

pub fn parse_message(source: &[u8]) -> MaildeskResult<ParsedMessage> {
    let message = MessageParser::new().parse(source).ok_or_else(|| {
        raise_error!(
            "Message source failed to parse (RFC 5322 compliance required)".into(),
            ErrorCode::MessageParseFailed
        )
    })?;

    let html = message.body_html(0).map(|cow| cow.to_string());
    let text = message.body_text(0).map(|cow| cow.to_string());

    // Prefer the HTML body; a plain-text-only message gets wrapped so every
    // stored email renders the same way.
    let body_html = match html {
        Some(html) => html,
        None => text
            .as_deref()
            .map(wrap_plain_text_as_html)
            .unwrap_or_default(),
    };
    let body_text = strip_quoted_reply(text.as_deref().unwrap_or_default());

    let attachments = message
        .attachments()
        .filter(|part| part.is_text() || part.is_binary())
        .map(|part| {
            let mime_type = part
                .content_type()
                .and_then(|ct| {
                    ct.c_subtype
                        .as_ref()
                        .map(|subtype| format!("{}/{}", ct.c_type, subtype))
                })
                .unwrap_or_else(|| "application/octet-stream".into());
            AttachmentPart {
                file_name: part.attachment_name().map(String::from),
                mime_type,
                content: part.contents().to_vec(),
            }
        })
        .collect();

    Ok(ParsedMessage {
        from: message
            .from()
            .map(|addr| AddrVec::from(addr).0.first().cloned().unwrap_or_default())
            .unwrap_or_default(),
        to: message
            .to()
            .map(|addr| AddrVec::from(addr).0)
            .unwrap_or_default(),
        cc: message
            .cc()
            .map(|addr| AddrVec::from(addr).0)
            .unwrap_or_default(),
        bcc: message
            .bcc()
            .map(|addr| AddrVec::from(addr).0)
            .unwrap_or_default(),
        subject: message
            .subject()
            .map(String::from)
            .unwrap_or_else(|| "(no subject)".into()),
        message_id: message.message_id().map(String::from),
        in_reply_to: message.in_reply_to().as_text().map(String::from),
        references: extract_references(&message),
        date: message.date().map(|d| d.to_timestamp() * 1000),
        body_html,
        body_text,
        attachments,
    })
}

fn extract_references(message: &Message<'_>) -> Vec<String> {
    match message.references() {
        mail_parser::HeaderValue::Text(cow) => vec![cow.to_string()],
        mail_parser::HeaderValue::TextList(vec) => {
            vec.iter().map(|cow| cow.to_string()).collect()
        }
        _ => vec![],
    }
}

/// Reduce a plain-text body to the sender's own words: quoted lines, the
/// "On ... wrote:" reply block and forwarded content are cut off.
pub fn strip_quoted_reply(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('>') {
            continue;
        }
        if is_reply_marker(trimmed) || is_forward_marker(trimmed) {
            break;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}

fn is_reply_marker(line: &str) -> bool {
    line.starts_with("On ") && line.trim_end().ends_with("wrote:")
}

fn is_forward_marker(line: &str) -> bool {
    let lower = line.to_lowercase();
    (lower.contains("original message") && lower.starts_with('-')) || lower.starts_with("from:")
}

pub fn wrap_plain_text_as_html(text: &str) -> String {
    let escaped = html_escape::encode_text(text);
    format!("<div>{}</div>", escaped.replace('\n', "<br>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_MESSAGE: &[u8] = b"From: Jane Doe <jane@acme.com>\r\n\
To: desk@shop.example\r\n\
Subject: Order #55\r\n\
Message-ID: <m1@acme.com>\r\n\
Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello, my order arrived damaged.\r\n\
> earlier quoted line\r\n\
On Mon, 30 Jun 2025, desk@shop.example wrote:\r\n\
older reply text\r\n";

    #[test]
    fn parses_headers_and_strips_quotes() {
        let parsed = parse_message(PLAIN_MESSAGE).unwrap();
        assert_eq!(parsed.from.address.as_deref(), Some("jane@acme.com"));
        assert_eq!(parsed.from.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.subject, "Order #55");
        assert_eq!(parsed.message_id.as_deref(), Some("m1@acme.com"));
        assert_eq!(parsed.body_text, "Hello, my order arrived damaged.");
        assert!(parsed.body_html.contains("Hello, my order arrived damaged."));
    }

    #[test]
    fn missing_subject_gets_a_placeholder() {
        let source = b"From: a.b@x.example\r\nTo: y@z.example\r\n\r\nbody\r\n";
        let parsed = parse_message(source).unwrap();
        assert_eq!(parsed.subject, "(no subject)");
    }

    #[test]
    fn quoted_reply_stripping_handles_forward_markers() {
        let text = "fresh content\n-----Original Message-----\nFrom: someone\nold content";
        assert_eq!(strip_quoted_reply(text), "fresh content");

        let text = "answer here\nFrom: Bob <bob@x.example>\nforwarded body";
        assert_eq!(strip_quoted_reply(text), "answer here");

        let text = "> all quoted\n> every line";
        assert_eq!(strip_quoted_reply(text), "");
    }

    #[test]
    fn wraps_plain_text_as_html() {
        let html = wrap_plain_text_as_html("a < b\nnext");
        assert_eq!(html, "<div>a &lt; b<br>next</div>");
    }
}
