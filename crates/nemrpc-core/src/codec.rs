//! Frame codec for the node's STOMP subset.
//!
//! Incoming frames look like
//!
//! ```text
//! COMMAND\n
//! header:value\n
//! ...
//! \n
//! [body]\0
//! ```
//!
//! Decoding is line oriented. A buffer that ends before the terminating NUL is
//! still accepted; [`DecodedFrame::complete`] tells the caller whether the
//! NUL was seen so that strict callers can reject truncated frames.

use crate::error::FrameError;
use crate::frame::{Command, Frame, FrameBody, Headers};

const EOL: u8 = b'\n';
const NUL: u8 = 0;

/// Result of decoding one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub frame: Frame,
    /// `false` when the input ended before the terminating NUL.
    pub complete: bool,
}

impl Frame {
    /// Decode a frame, tolerating a missing trailing NUL.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        decode_frame(buf).map(|d| d.frame)
    }

    /// Decode a frame, rejecting input that ends before the trailing NUL.
    pub fn decode_strict(buf: &[u8]) -> Result<Self, FrameError> {
        let decoded = decode_frame(buf)?;
        if !decoded.complete {
            return Err(FrameError::Truncated);
        }
        Ok(decoded.frame)
    }

    /// Wire text for this frame, body included.
    pub fn encode(&self) -> String {
        encode_frame(self)
    }
}

/// Decode one frame from `buf`.
pub fn decode_frame(buf: &[u8]) -> Result<DecodedFrame, FrameError> {
    let mut pos = 0;

    // The first non-empty line is the command.
    let command = loop {
        if pos >= buf.len() {
            return Err(FrameError::MissingCommand);
        }
        let (line, next) = next_line(buf, pos);
        pos = next;
        let text = trim_line(line);
        if text.is_empty() {
            continue;
        }
        let command = Command::parse(&String::from_utf8_lossy(text));
        // `CONNECTED\0`: the NUL closes the frame on the command line.
        if strip_eol(line).last() == Some(&NUL) {
            return Ok(finish(command, Headers::new(), None, true));
        }
        break command;
    };

    let mut headers = Headers::new();
    while pos < buf.len() {
        let (line, next) = next_line(buf, pos);
        pos = next;

        // Frame ends here with no body.
        if line == [NUL] {
            return Ok(finish(command, headers, None, true));
        }

        // Blank line: headers done, body follows.
        if line.is_empty() || line == b"\r" {
            return decode_body(command, headers, &buf[pos..]);
        }

        let ends_frame = strip_eol(line).last() == Some(&NUL);
        let text = String::from_utf8_lossy(trim_line(line));
        let Some((name, value)) = text.split_once(':') else {
            return Err(FrameError::MissingSeparator {
                line: text.into_owned(),
            });
        };
        headers.insert(name, value)?;

        if ends_frame {
            return Ok(finish(command, headers, None, true));
        }
    }

    Ok(finish(command, headers, None, false))
}

fn decode_body(command: Command, headers: Headers, rest: &[u8]) -> Result<DecodedFrame, FrameError> {
    let (raw, complete) = split_body(rest, &headers);
    if !command.carries_body() {
        return Ok(finish(command, headers, None, complete));
    }
    let raw = raw.trim_ascii();
    let body = if raw.is_empty() {
        None
    } else {
        let value: serde_json::Value = serde_json::from_slice(raw)?;
        Some(FrameBody::from(value))
    };
    Ok(finish(command, headers, body, complete))
}

/// Body bytes and whether the terminating NUL was found after them.
fn split_body<'a>(rest: &'a [u8], headers: &Headers) -> (&'a [u8], bool) {
    if let Some(len) = headers.content_length() {
        if len <= rest.len() {
            return (&rest[..len], rest.get(len) == Some(&NUL));
        }
    }
    match rest.iter().position(|b| *b == NUL) {
        Some(end) => (&rest[..end], true),
        None => (rest, false),
    }
}

fn finish(command: Command, headers: Headers, body: Option<FrameBody>, complete: bool) -> DecodedFrame {
    DecodedFrame {
        frame: Frame {
            command,
            headers,
            body,
        },
        complete,
    }
}

/// Returns the line starting at `pos` (without its `\n`) and the next offset.
fn next_line(buf: &[u8], pos: usize) -> (&[u8], usize) {
    match buf[pos..].iter().position(|b| *b == EOL) {
        Some(i) => (&buf[pos..pos + i], pos + i + 1),
        None => (&buf[pos..], buf.len()),
    }
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    &line[..end]
}

/// Trim trailing CR, LF and NUL bytes.
fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\r' | b'\n' | NUL) {
        end -= 1;
    }
    &line[..end]
}

/// `true` for a bare heart-beat: only end-of-line bytes.
pub fn is_heartbeat(buf: &[u8]) -> bool {
    !buf.is_empty() && buf.iter().all(|b| matches!(b, b'\r' | b'\n'))
}

/// Encode an outgoing command frame (CONNECT, SUBSCRIBE) with no body.
pub fn encode_command(command: &Command, headers: &Headers) -> String {
    let mut out = String::with_capacity(64);
    write_head(&mut out, command, headers);
    out.push(NUL as char);
    out
}

/// Encode a full frame, writing its body as compact JSON.
pub fn encode_frame(frame: &Frame) -> String {
    let mut out = String::with_capacity(128);
    write_head(&mut out, &frame.command, &frame.headers);
    if let Some(body) = &frame.body {
        out.push_str(&body.to_value().to_string());
    }
    out.push(NUL as char);
    out
}

fn write_head(out: &mut String, command: &Command, headers: &Headers) {
    out.push_str(command.as_str());
    out.push_str("\r\n");
    for (name, value) in headers.iter() {
        out.push_str(name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connected_without_body() {
        let frame = Frame::decode(b"CONNECTED\n\n\x00").unwrap();
        assert_eq!(frame.command, Command::Connected);
        assert!(frame.headers.is_empty());
        assert!(frame.body.is_none());
    }

    #[test]
    fn message_with_json_body() {
        let buf = b"MESSAGE\nsubscription:42\ndestination:/blocks/new\n\n{\"height\":100}\x00";
        let decoded = decode_frame(buf).unwrap();
        assert!(decoded.complete);
        let frame = decoded.frame;
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.headers.subscription(), Some("42"));
        assert_eq!(frame.headers.destination(), Some("/blocks/new"));
        assert_eq!(frame.headers.len(), 2);
        assert_eq!(frame.body, Some(FrameBody::from(json!({"height": 100}))));
    }

    #[test]
    fn ends_after_command_line() {
        let decoded = decode_frame(b"CONNECTED\n").unwrap();
        assert!(!decoded.complete);
        assert_eq!(decoded.frame.command, Command::Connected);
        assert!(decoded.frame.headers.is_empty());
        assert!(decoded.frame.body.is_none());

        assert!(matches!(
            Frame::decode_strict(b"CONNECTED\n"),
            Err(FrameError::Truncated)
        ));
    }

    #[test]
    fn nul_on_command_line_is_complete() {
        for buf in [&b"CONNECTED\x00"[..], &b"RECEIPT\x00"[..], &b"\nCONNECTED\x00\n"[..]] {
            let decoded = decode_frame(buf).unwrap();
            assert!(decoded.complete, "{buf:?}");
            assert!(decoded.frame.headers.is_empty());
            assert!(decoded.frame.body.is_none());
        }

        let frame = Frame::decode_strict(b"CONNECTED\x00").unwrap();
        assert_eq!(frame.command, Command::Connected);
        assert_eq!(Frame::decode(b"RECEIPT\x00").unwrap().command, Command::Receipt);
    }

    #[test]
    fn nul_line_ends_headers_without_body() {
        let decoded = decode_frame(b"RECEIPT\nreceipt-id:77\n\x00").unwrap();
        assert!(decoded.complete);
        assert_eq!(decoded.frame.headers.get("receipt-id"), Some("77"));
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let frame = Frame::decode(b"\n\r\nCONNECTED\r\nversion:1.2\n\n\x00").unwrap();
        assert_eq!(frame.command, Command::Connected);
        assert_eq!(frame.headers.version(), Some("1.2"));
    }

    #[test]
    fn empty_buffer_has_no_command() {
        assert!(matches!(decode_frame(b""), Err(FrameError::MissingCommand)));
        assert!(matches!(decode_frame(b"\n\n"), Err(FrameError::MissingCommand)));
    }

    #[test]
    fn header_without_separator() {
        let err = decode_frame(b"MESSAGE\nsubscription 42\n\n{}\x00").unwrap_err();
        assert!(matches!(err, FrameError::MissingSeparator { .. }));
    }

    #[test]
    fn header_value_keeps_colons() {
        let frame = Frame::decode(b"MESSAGE\nx-origin:http://node:7890\n\n\x00").unwrap();
        assert_eq!(frame.headers.get("x-origin"), Some("http://node:7890"));
    }

    #[test]
    fn invalid_json_body() {
        let err = decode_frame(b"MESSAGE\nsubscription:1\n\n{not json}\x00").unwrap_err();
        assert!(matches!(err, FrameError::InvalidBody(_)));
    }

    #[test]
    fn body_ignored_for_other_commands() {
        let frame = Frame::decode(b"RECEIPT\n\n{not json}\x00").unwrap();
        assert!(frame.body.is_none());
    }

    #[test]
    fn body_without_nul_is_tolerated() {
        let decoded = decode_frame(b"MESSAGE\nsubscription:1\n\n[1,2,3]").unwrap();
        assert!(!decoded.complete);
        assert_eq!(decoded.frame.body, Some(FrameBody::from(json!([1, 2, 3]))));
    }

    #[test]
    fn content_length_bounds_body() {
        let buf = b"MESSAGE\ncontent-length:4\n\ntrue\x00trailing";
        let decoded = decode_frame(buf).unwrap();
        assert!(decoded.complete);
        assert_eq!(decoded.frame.body, Some(FrameBody::from(json!(true))));
    }

    #[test]
    fn empty_error_body_is_absent() {
        let frame = Frame::decode(b"ERROR\nmessage:bad destination\n\n\x00").unwrap();
        assert_eq!(frame.command, Command::Error);
        assert_eq!(frame.headers.get("message"), Some("bad destination"));
        assert!(frame.body.is_none());
    }

    #[test]
    fn encode_connect() {
        let headers = Headers::new()
            .with("accept-version", "1.2")
            .with("host", "node.example");
        let text = encode_command(&Command::Connect, &headers);
        assert_eq!(text, "CONNECT\r\naccept-version:1.2\nhost:node.example\n\n\0");
    }

    #[test]
    fn encode_subscribe_decodes_back() {
        let headers = Headers::new()
            .with("id", 9)
            .with("destination", "/errors")
            .with("ack", "auto");
        let text = encode_command(&Command::Subscribe, &headers);
        let decoded = decode_frame(text.as_bytes()).unwrap();
        assert!(decoded.complete);
        assert_eq!(decoded.frame.command, Command::Subscribe);
        assert_eq!(decoded.frame.headers, headers);
    }

    #[test]
    fn body_bearing_frames_roundtrip() {
        let frames = [
            Frame::new(Command::Message)
                .with_headers(Headers::new().with("subscription", 5).with("destination", "/account/TA"))
                .with_body(json!({"meta": {"status": "LOCKED"}, "balance": 12})),
            Frame::new(Command::Send)
                .with_headers(Headers::new().with("destination", "/w/api/account/subscribe"))
                .with_body(json!(["a", 1, null])),
            Frame::new(Command::Error)
                .with_headers(Headers::new().with("message", "oops"))
                .with_body(json!("text")),
        ];
        for frame in frames {
            let decoded = Frame::decode_strict(frame.encode().as_bytes()).unwrap();
            assert_eq!(decoded, frame);
        }
    }

    #[test]
    fn heartbeat_detection() {
        assert!(is_heartbeat(b"\n"));
        assert!(is_heartbeat(b"\r\n\n"));
        assert!(!is_heartbeat(b""));
        assert!(!is_heartbeat(b"CONNECTED\n"));
    }
}
