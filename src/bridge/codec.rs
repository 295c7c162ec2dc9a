//! Bridge wire codec
//!
//! Messages use HTTP-style headers followed by a JSON body:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io::{self, BufRead, Write};

use crate::common::Error;

/// Largest body accepted; an accessibility subtree dump stays far below this
const MAX_BODY: usize = 16 * 1024 * 1024;

fn eof_as_crash(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::BridgeCrashed
    } else {
        Error::Io(e)
    }
}

/// Read one message from the stream
///
/// Parses the Content-Length header and reads the JSON body
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<String, Error> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).map_err(eof_as_crash)?;

        if bytes_read == 0 {
            return Err(Error::BridgeCrashed);
        }

        // Empty line ends the headers
        if line == "\r\n" || line == "\n" {
            break;
        }

        let line = line.trim();
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|_| {
                Error::BridgeProtocol(format!("Invalid Content-Length: {}", value.trim()))
            })?);
        }
    }

    let len = content_length
        .ok_or_else(|| Error::BridgeProtocol("Missing Content-Length header".to_string()))?;

    if len > MAX_BODY {
        return Err(Error::BridgeProtocol(format!(
            "Content-Length too large: {} bytes",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).map_err(eof_as_crash)?;

    String::from_utf8(body).map_err(|e| Error::BridgeProtocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one message to the stream
///
/// Adds the Content-Length header and flushes
pub fn write_message<W: Write>(writer: &mut W, json: &str) -> Result<(), Error> {
    let header = format!("Content-Length: {}\r\n\r\n", json.len());

    writer.write_all(header.as_bytes())?;
    writer.write_all(json.as_bytes())?;
    writer.flush()?;

    Ok(())
}
