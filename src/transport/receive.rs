//! Response assembly
//!
//! Reads one complete HTTP/1.1 response off a [`WireReader`]:
//!
//! 1. Accumulate bounded reads until the `\r\n\r\n` head separator appears.
//!    Line terminators that precede the status line (stray CRLFs a peer
//!    flushes between exchanges, usually as reads of one or two bytes) are
//!    skipped without advancing.
//! 2. Parse the status line and headers; body bytes that arrived with the head
//!    are pushed back into the reader.
//! 3. Decode the body by `Transfer-Encoding: chunked` framing when present,
//!    otherwise by `Content-Length`.
//!
//! A stream that ends before the response is complete is reported as "closed"
//! rather than as an error; callers model it as a synthetic 500.

use crate::transport::response::{parse_head, Response};
use crate::transport::wire::WireReader;
use crate::transport::{ProtocolError, TransportError};
use std::collections::HashMap;
use std::io::Read;

const HEAD_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Reads one response, mapping a closed stream to [`Response::dead_connection`]
pub fn receive<R: Read>(reader: &mut WireReader<R>) -> Result<Response, TransportError> {
    Ok(assemble(reader)?.unwrap_or_else(Response::dead_connection))
}

/// Reads one response; `None` means the peer closed the stream first
pub(crate) fn assemble<R: Read>(
    reader: &mut WireReader<R>,
) -> Result<Option<Response>, TransportError> {
    let Some(head) = read_head(reader)? else {
        tracing::debug!("Stream closed before response head");
        return Ok(None);
    };

    let (status, headers) = parse_head(&head)?;
    tracing::trace!("Parsed response head: status {}, {} headers", status, headers.len());

    let body = match body_framing(status, &headers)? {
        Framing::Empty => Vec::new(),
        Framing::Chunked => match read_chunked(reader)? {
            Some(body) => body,
            None => {
                tracing::debug!("Stream closed inside chunked body");
                return Ok(None);
            }
        },
        Framing::Length(len) => match reader.read_exact_bytes(len)? {
            Some(body) => body,
            None => {
                tracing::debug!("Stream closed before {} body bytes arrived", len);
                return Ok(None);
            }
        },
    };

    Ok(Some(Response::new(
        String::from_utf8_lossy(&body).into_owned(),
        status,
        headers,
    )))
}

/// How the body of a response is delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Empty,
    Chunked,
    Length(usize),
}

fn body_framing(status: u16, headers: &HashMap<String, String>) -> Result<Framing, ProtocolError> {
    let lookup = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    };

    if let Some(encoding) = lookup("Transfer-Encoding") {
        if encoding
            .rsplit(',')
            .next()
            .map(|last| last.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false)
        {
            return Ok(Framing::Chunked);
        }
    }

    match lookup("Content-Length") {
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map(Framing::Length)
            .map_err(|_| ProtocolError::InvalidContentLength(value.to_string())),
        None if (100..200).contains(&status) || status == 204 || status == 304 => {
            Ok(Framing::Empty)
        }
        None => Err(ProtocolError::MissingLength { status }),
    }
}

/// Accumulates reads until the head separator; returns the head without it
fn read_head<R: Read>(reader: &mut WireReader<R>) -> Result<Option<Vec<u8>>, TransportError> {
    let mut buffer: Vec<u8> = Vec::new();
    loop {
        let segment = reader.read_segment(reader.block_size())?;
        if segment.is_empty() {
            return Ok(None);
        }

        if buffer.is_empty() && segment.len() <= 2 && segment.iter().all(is_line_end) {
            tracing::trace!("Skipping spurious {}-byte segment", segment.len());
            continue;
        }

        buffer.extend_from_slice(&segment);
        let leading = buffer.iter().take_while(|b| is_line_end(b)).count();
        buffer.drain(..leading);

        if let Some(pos) = find(&buffer, HEAD_SEPARATOR) {
            let rest = buffer.split_off(pos + HEAD_SEPARATOR.len());
            buffer.truncate(pos);
            reader.unread(&rest);
            return Ok(Some(buffer));
        }
    }
}

/// Decodes a chunked body: hex size line, payload, CRLF; repeated until the
/// zero-size chunk, after which trailer lines up to the blank line are dropped.
fn read_chunked<R: Read>(reader: &mut WireReader<R>) -> Result<Option<Vec<u8>>, TransportError> {
    let mut body = Vec::new();
    loop {
        let Some(line) = reader.read_line()? else {
            return Ok(None);
        };
        let line = String::from_utf8_lossy(&line);
        let size_field = line.split(';').next().unwrap_or_default().trim();
        if size_field.is_empty() {
            continue;
        }

        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| ProtocolError::InvalidChunkSize(line.to_string()))?;

        if size == 0 {
            while let Some(trailer) = reader.read_line()? {
                if trailer.is_empty() {
                    break;
                }
            }
            return Ok(Some(body));
        }

        let Some(chunk) = reader.read_exact_bytes(size)? else {
            return Ok(None);
        };
        body.extend_from_slice(&chunk);

        match reader.read_line()? {
            None => return Ok(None),
            Some(rest) if rest.is_empty() => {}
            Some(rest) => {
                return Err(ProtocolError::MissingChunkTerminator(
                    String::from_utf8_lossy(&rest).into_owned(),
                )
                .into())
            }
        }
    }
}

fn is_line_end(byte: &u8) -> bool {
    *byte == b'\r' || *byte == b'\n'
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
