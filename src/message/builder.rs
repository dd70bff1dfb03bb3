//! RFC 5322 / MIME serialization.
//!
//! Turns an `OutgoingMessage` into the wire string handed to the SMTP
//! DATA command: a `multipart/mixed` body with one `text/plain` part
//! followed by one base64 attachment part per file.

use base64::Engine;
use chrono::Utc;

use super::{Attachment, OutgoingMessage, ATTACHMENT_CONTENT_TYPE};

/// Serialize a message to RFC 5322 wire format.
pub fn build_mime(msg: &OutgoingMessage) -> String {
    let boundary = format!("----=_Part_{}", uuid::Uuid::new_v4().simple());
    let mut out = String::with_capacity(msg.estimated_size() + 1024);

    write_header(&mut out, "Message-ID", &format!("<{}>", msg.id));
    write_header(
        &mut out,
        "Date",
        &Utc::now().format("%a, %d %b %Y %H:%M:%S %z").to_string(),
    );
    write_header(&mut out, "From", &msg.from);
    write_header(&mut out, "To", &msg.to);
    write_header(&mut out, "Subject", &encode_header_value(&msg.subject));
    write_header(&mut out, "MIME-Version", "1.0");
    write_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{}\"", boundary),
    );
    out.push_str("\r\n");
    out.push_str("This is a multi-part message in MIME format.\r\n");

    out.push_str(&format!("\r\n--{}\r\n", boundary));
    write_text_part(&mut out, &msg.body);

    for att in &msg.attachments {
        out.push_str(&format!("\r\n--{}\r\n", boundary));
        write_attachment(&mut out, att);
    }
    out.push_str(&format!("\r\n--{}--\r\n", boundary));

    out
}

fn write_text_part(out: &mut String, body: &str) {
    write_header(out, "Content-Type", "text/plain; charset=\"UTF-8\"");
    if body.is_ascii() {
        write_header(out, "Content-Transfer-Encoding", "7bit");
        out.push_str("\r\n");
        out.push_str(body);
        out.push_str("\r\n");
    } else {
        write_header(out, "Content-Transfer-Encoding", "base64");
        out.push_str("\r\n");
        let b64 = base64::engine::general_purpose::STANDARD.encode(body.as_bytes());
        write_wrapped(out, &b64);
    }
}

fn write_attachment(out: &mut String, att: &Attachment) {
    write_header(
        out,
        "Content-Type",
        &format!("{}; name=\"{}\"", ATTACHMENT_CONTENT_TYPE, att.filename),
    );
    write_header(
        out,
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", att.filename),
    );
    write_header(out, "Content-Transfer-Encoding", "base64");
    out.push_str("\r\n");
    write_wrapped(out, &att.data_base64);
}

/// Wrap base64 data at 76 columns, CRLF line endings.
fn write_wrapped(out: &mut String, b64: &str) {
    for chunk in b64.as_bytes().chunks(76) {
        out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
        out.push_str("\r\n");
    }
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// RFC 2047 encode a header value if it contains non-ASCII characters.
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
    format!("=?UTF-8?B?{}?=", encoded)
}
