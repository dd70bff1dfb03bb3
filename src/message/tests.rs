use super::*;

use std::fs;

use base64::Engine;

use crate::grouper::{FileEntry, Group};

fn template() -> MessageTemplate {
    MessageTemplate {
        from: "sender@example.com".into(),
        to: "rcpt@example.com".into(),
        subject: "Backup".into(),
        body: "Files attached.".into(),
    }
}

fn sample_message() -> OutgoingMessage {
    OutgoingMessage {
        id: "test-id".into(),
        from: "sender@example.com".into(),
        to: "rcpt@example.com".into(),
        subject: "Backup 1/2".into(),
        body: "Files attached.".into(),
        attachments: vec![Attachment::new("data.bin", b"\x00\x01\xffpayload")],
    }
}

#[test]
fn test_attachment_round_trip() {
    let data: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
    let att = Attachment::new("bytes.bin", &data);
    assert_eq!(att.decode_data().unwrap(), data);
}

#[test]
fn test_attachment_from_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    let data = b"\xff\xd8\xff\xe0 not really a jpeg \x00\x00";
    fs::write(&path, data).unwrap();

    let att = Attachment::from_file(&path).unwrap();
    assert_eq!(att.filename, "photo.jpg");
    assert_eq!(att.decode_data().unwrap(), data);
}

#[test]
fn test_attachment_from_missing_file_reports_path() {
    let err = Attachment::from_file(std::path::Path::new("/nonexistent/gone.bin")).unwrap_err();
    match err {
        MessageError::Io { path, .. } => assert!(path.contains("gone.bin")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_from_group_numbers_subject_and_strips_directories() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"aaa").unwrap();
    fs::write(&b, b"bbbb").unwrap();

    let group = Group {
        entries: vec![FileEntry::new(&a, 3), FileEntry::new(&b, 4)],
    };
    let msg = OutgoingMessage::from_group(&template(), &group, 1, 3).unwrap();

    assert_eq!(msg.subject, "Backup 2/3");
    assert_eq!(msg.from, "sender@example.com");
    assert_eq!(msg.to, "rcpt@example.com");
    let names: Vec<&str> = msg.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_from_group_fails_on_unreadable_file() {
    let group = Group {
        entries: vec![FileEntry::new("/nonexistent/lost.dat", 10)],
    };
    let err = OutgoingMessage::from_group(&template(), &group, 0, 1).unwrap_err();
    assert!(matches!(err, MessageError::Io { .. }));
}

#[test]
fn test_mime_has_required_headers() {
    let raw = build_mime(&sample_message());
    assert!(raw.contains("Message-ID: <test-id>"));
    assert!(raw.contains("From: sender@example.com\r\n"));
    assert!(raw.contains("To: rcpt@example.com\r\n"));
    assert!(raw.contains("Subject: Backup 1/2\r\n"));
    assert!(raw.contains("MIME-Version: 1.0\r\n"));
    assert!(raw.contains("multipart/mixed; boundary="));
    assert!(raw.contains("Date: "));
}

#[test]
fn test_mime_attachment_part_headers() {
    let raw = build_mime(&sample_message());
    assert!(raw.contains("Content-Type: application/octet-stream; name=\"data.bin\""));
    assert!(raw.contains("Content-Disposition: attachment; filename=\"data.bin\""));
    assert!(raw.contains("Content-Transfer-Encoding: base64"));
}

#[test]
fn test_mime_body_is_plain_text_part() {
    let raw = build_mime(&sample_message());
    assert!(raw.contains("Content-Type: text/plain; charset=\"UTF-8\""));
    assert!(raw.contains("Files attached.\r\n"));
}

#[test]
fn test_mime_boundary_opens_and_closes() {
    let raw = build_mime(&sample_message());
    let boundary = raw
        .split("boundary=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .expect("boundary present");
    // One opening marker per part (text + 1 attachment) and a closing one.
    assert_eq!(raw.matches(&format!("--{}\r\n", boundary)).count(), 2);
    assert_eq!(raw.matches(&format!("--{}--", boundary)).count(), 1);
}

#[test]
fn test_mime_base64_wrapped_at_76_columns() {
    let data = vec![0xabu8; 300];
    let mut msg = sample_message();
    msg.attachments = vec![Attachment::new("big.bin", &data)];
    let raw = build_mime(&msg);

    let expected = base64::engine::general_purpose::STANDARD.encode(&data);
    assert!(raw.contains(&format!("{}\r\n", &expected[..76])));
    assert!(!raw.contains(&expected[..77]));
}

#[test]
fn test_mime_attachment_survives_extraction() {
    let data = b"round trip me \x00\x07\x7f";
    let mut msg = sample_message();
    msg.attachments = vec![Attachment::new("rt.bin", data)];
    let raw = build_mime(&msg);

    // Pull the base64 block back out of the wire form and decode it.
    let start = raw.find("Content-Transfer-Encoding: base64").unwrap();
    let block = &raw[start..];
    let block = block.split("\r\n\r\n").nth(1).unwrap();
    let b64: String = block
        .lines()
        .take_while(|l| !l.starts_with("--"))
        .collect::<Vec<_>>()
        .join("");
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_non_ascii_subject_is_rfc2047_encoded() {
    let mut msg = sample_message();
    msg.subject = "Sicherung für heute".into();
    let raw = build_mime(&msg);
    assert!(raw.contains("Subject: =?UTF-8?B?"));
}

#[test]
fn test_non_ascii_body_uses_base64() {
    let mut msg = sample_message();
    msg.body = "héllo".into();
    msg.attachments.clear();
    let raw = build_mime(&msg);
    let expected = base64::engine::general_purpose::STANDARD.encode("héllo".as_bytes());
    assert!(raw.contains(&expected));
}

#[test]
fn test_encode_header_value_ascii_passthrough() {
    assert_eq!(encode_header_value("Backup 1/2"), "Backup 1/2");
}
