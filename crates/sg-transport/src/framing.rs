//! Message framing for the LSP Base Protocol.
//!
//! Implements Content-Length based message framing: zero or more
//! `Key: value` header lines terminated by a blank line, followed by
//! exactly `Content-Length` bytes of UTF-8 JSON.

use sg_protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};

/// Read an LSP message from a buffered reader.
///
/// Returns `Ok(None)` on EOF or a malformed/unparsable frame (both
/// recoverable per the error-handling design: log and continue).
/// Returns `Err` only on genuine I/O errors.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<JsonRpcRequest>> {
    let mut headers = HashMap::new();

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None); // EOF
        }

        let line = line.trim_end();
        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_string(), value.to_string());
        }
    }

    let Some(content_length) = headers.get("Content-Length") else {
        return Ok(None);
    };
    let Ok(length) = content_length.parse::<usize>() else {
        return Ok(None);
    };

    let mut content = vec![0u8; length];
    let mut bytes_read = 0;
    while bytes_read < length {
        match reader.read(&mut content[bytes_read..])? {
            0 => return Ok(None), // unexpected EOF mid-frame
            n => bytes_read += n,
        }
    }

    match serde_json::from_slice(&content) {
        Ok(request) => Ok(Some(request)),
        Err(e) => {
            eprintln!("sg-lsp: JSON parse error - {e}");
            let content_str = String::from_utf8_lossy(&content);
            if content_str.len() > 100 {
                eprintln!("sg-lsp: malformed frame (truncated): {}...", &content_str[..100]);
            } else {
                eprintln!("sg-lsp: malformed frame: {content_str}");
            }
            Ok(None)
        }
    }
}

/// Write an LSP response with Content-Length framing.
pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let content = serde_json::to_string(response)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

/// Write an LSP notification with Content-Length framing.
pub fn write_notification<W: Write>(
    writer: &mut W,
    method: &str,
    params: serde_json::Value,
) -> io::Result<()> {
    let notification = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    });
    let text = serde_json::to_string(&notification)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", text.len(), text)?;
    writer.flush()
}

/// Debug-log an outgoing response.
pub fn log_response(response: &JsonRpcResponse) {
    if let Ok(content) = serde_json::to_string(response) {
        eprintln!(
            "[sg-lsp:tx] id={:?} has_result={} has_error={} len={}",
            response.id,
            response.result.is_some(),
            response.error.is_some(),
            content.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn reads_a_well_formed_frame() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":null}"#;
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(frame.as_bytes());
        let request = read_message(&mut reader).unwrap().unwrap();
        assert_eq!(request.method, "initialize");
        assert_eq!(request.id, Some(serde_json::json!(1)));
    }

    #[test]
    fn returns_none_on_eof() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(read_message(&mut reader).unwrap().is_none());
    }

    #[test]
    fn returns_none_on_malformed_json_body() {
        let body = "{not valid json";
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(frame.as_bytes());
        assert!(read_message(&mut reader).unwrap().is_none());
    }

    #[test]
    fn write_message_round_trips_through_read_message() {
        let response = JsonRpcResponse::success(Some(serde_json::json!(7)), serde_json::json!({"ok": true}));
        let mut buf = Vec::new();
        write_message(&mut buf, &response).unwrap();
        let mut reader = BufReader::new(&buf[..]);
        let mut headers = String::new();
        reader.read_line(&mut headers).unwrap();
        assert!(headers.starts_with("Content-Length: "));
    }
}
