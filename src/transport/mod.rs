//! Hand-rolled HTTP/1.1 transport
//!
//! This module talks to a single origin over plaintext TCP:
//! - One persistent keep-alive connection for GET traffic
//! - A fresh, short-lived connection for each form POST
//! - Response assembly with Content-Length and chunked framing
//! - Dead connections folded into a synthetic 500 response
//!
//! Everything blocks the calling thread; there are no read timeouts.

mod receive;
mod request;
mod response;
mod traits;
mod wire;

pub use receive::receive;
pub use request::{encode_form, Method, Request};
pub use response::Response;
pub use traits::HttpTransport;
pub use wire::WireReader;

use crate::config::Config;
use crate::url::Origin;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use thiserror::Error;

/// Errors raised by the transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Malformed response framing. Not retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed status line: {0:?}")]
    MalformedStatusLine(String),

    #[error("Malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("HTTP {status} response has neither Content-Length nor chunked encoding")]
    MissingLength { status: u16 },

    #[error("Invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("Invalid chunk size line: {0:?}")]
    InvalidChunkSize(String),

    #[error("Chunk payload not followed by CRLF: {0:?}")]
    MissingChunkTerminator(String),
}

/// Blocking HTTP/1.1 client bound to one origin
pub struct Transport {
    origin: Origin,
    user_agent: String,
    block_size: usize,
    conn: Option<WireReader<TcpStream>>,
}

impl Transport {
    /// Creates a transport without connecting; the first `get` dials lazily
    pub fn new(origin: Origin, user_agent: impl Into<String>, block_size: usize) -> Self {
        Self {
            origin,
            user_agent: user_agent.into(),
            block_size,
            conn: None,
        }
    }

    /// Creates a transport and opens its persistent connection
    pub fn connect(
        origin: Origin,
        user_agent: impl Into<String>,
        block_size: usize,
    ) -> Result<Self, TransportError> {
        let mut transport = Self::new(origin, user_agent, block_size);
        transport.open()?;
        Ok(transport)
    }

    /// Builds and connects a transport from the `[server]` and `[user-agent]` sections
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::connect(
            Origin::from_config(&config.server),
            config.user_agent.header_value(),
            config.server.read_block_size,
        )
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Returns true while a persistent connection is held
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Opens the persistent connection, replacing any existing one
    pub fn open(&mut self) -> Result<(), TransportError> {
        self.close();
        let stream = self.dial()?;
        self.conn = Some(WireReader::new(stream, self.block_size));
        Ok(())
    }

    /// Shuts down the persistent connection if one is held
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.get_ref().shutdown(Shutdown::Both);
        }
    }

    /// Tears down and reopens the persistent connection
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        tracing::debug!("Reconnecting to {}", self.origin.socket_addr());
        self.open()
    }

    /// Sends a GET over the persistent connection and reads the response
    pub fn get(&mut self, target: &str, headers: &[(&str, &str)]) -> Result<Response, TransportError> {
        let request = Request::get(target)
            .header("User-Agent", &self.user_agent)
            .header("Connection", "keep-alive")
            .headers(headers);
        let bytes = request.serialize(&self.origin.host_header());
        tracing::debug!("GET {}", target);

        let conn = self.connection()?;
        match exchange(conn, &bytes) {
            Ok(Some(response)) => {
                if response.closes_connection() {
                    tracing::debug!("Server closed keep-alive connection");
                    self.close();
                }
                tracing::debug!("GET {} -> {}", target, response.status());
                Ok(response)
            }
            Ok(None) => {
                tracing::warn!("Connection closed by peer during GET {}", target);
                self.close();
                Ok(Response::dead_connection())
            }
            Err(TransportError::Io(e)) if is_dead_connection(&e) => {
                tracing::warn!("Connection lost during GET {}: {}", target, e);
                self.close();
                Ok(Response::dead_connection())
            }
            Err(e) => Err(e),
        }
    }

    /// Sends a form POST on its own connection, closed once the response is read
    pub fn post(
        &mut self,
        target: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, TransportError> {
        let request = Request::post_form(target, form)
            .header("User-Agent", &self.user_agent)
            .header("Connection", "keep-alive")
            .headers(headers);
        let bytes = request.serialize(&self.origin.host_header());
        tracing::debug!("POST {} ({} fields)", target, form.len());

        let mut conn = WireReader::new(self.dial()?, self.block_size);
        let result = exchange(&mut conn, &bytes);
        let _ = conn.get_ref().shutdown(Shutdown::Both);

        match result {
            Ok(Some(response)) => {
                tracing::debug!("POST {} -> {}", target, response.status());
                Ok(response)
            }
            Ok(None) => Ok(Response::dead_connection()),
            Err(TransportError::Io(e)) if is_dead_connection(&e) => {
                tracing::warn!("Connection lost during POST {}: {}", target, e);
                Ok(Response::dead_connection())
            }
            Err(e) => Err(e),
        }
    }

    fn dial(&self) -> Result<TcpStream, TransportError> {
        let addr = self.origin.socket_addr();
        let stream = TcpStream::connect(&addr)
            .map_err(|source| TransportError::Connect { addr: addr.clone(), source })?;
        let _ = stream.set_nodelay(true);
        tracing::trace!("Connected to {}", addr);
        Ok(stream)
    }

    fn connection(&mut self) -> Result<&mut WireReader<TcpStream>, TransportError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => WireReader::new(self.dial()?, self.block_size),
        };
        Ok(self.conn.insert(conn))
    }
}

impl HttpTransport for Transport {
    fn get(&mut self, target: &str, headers: &[(&str, &str)]) -> Result<Response, TransportError> {
        Transport::get(self, target, headers)
    }

    fn post(
        &mut self,
        target: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, TransportError> {
        Transport::post(self, target, form, headers)
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        Transport::reconnect(self)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Writes one request and assembles its response
fn exchange<S: Read + Write>(
    conn: &mut WireReader<S>,
    request: &[u8],
) -> Result<Option<Response>, TransportError> {
    let stream = conn.get_mut();
    stream.write_all(request)?;
    stream.flush()?;
    receive::assemble(conn)
}

/// Errors that mean the peer is gone rather than that something is broken
fn is_dead_connection(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    /// Reads one request (head plus Content-Length body) from a test server socket
    fn read_request(reader: &mut BufReader<TcpStream>) -> Option<String> {
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).ok()? == 0 {
                return None;
            }
            head.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }

        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).ok()?;
        head.push_str(&String::from_utf8_lossy(&body));
        Some(head)
    }

    fn ok_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    fn bind() -> (TcpListener, Origin) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Origin::new("127.0.0.1", port))
    }

    #[test]
    fn test_keep_alive_reuses_connection() {
        let (listener, origin) = bind();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut requests = Vec::new();
            for body in ["first", "second"] {
                requests.push(read_request(&mut reader).unwrap());
                writer.write_all(ok_response(body).as_bytes()).unwrap();
            }
            requests
        });

        let mut transport = Transport::connect(origin, "test/1.0", 64).unwrap();
        let first = transport.get("/a/", &[("Cookie", "sessionid=1")]).unwrap();
        let second = transport.get("/b/", &[]).unwrap();

        assert_eq!(first.body(), "first");
        assert_eq!(second.body(), "second");

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /a/ HTTP/1.1\r\n"));
        assert!(requests[0].contains("Connection: keep-alive\r\n"));
        assert!(requests[0].contains("Cookie: sessionid=1\r\n"));
        assert!(requests[0].contains("User-Agent: test/1.0\r\n"));
        assert!(requests[1].starts_with("GET /b/ HTTP/1.1\r\n"));
    }

    #[test]
    fn test_chunked_over_socket() {
        let (listener, origin) = bind();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            read_request(&mut reader).unwrap();
            writer
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n")
                .unwrap();
            writer.flush().unwrap();
            writer.write_all(b"6\r\n World\r\n0\r\n\r\n").unwrap();
        });

        let mut transport = Transport::connect(origin, "test/1.0", 1024).unwrap();
        let response = transport.get("/", &[]).unwrap();
        assert_eq!(response.body(), "Hello World");
        server.join().unwrap();
    }

    #[test]
    fn test_dead_connection_yields_500_then_reopens() {
        let (listener, origin) = bind();
        let server = thread::spawn(move || {
            // First connection: read the request, hang up without answering.
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            read_request(&mut reader).unwrap();
            drop(reader);
            drop(stream);

            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            read_request(&mut reader).unwrap();
            writer.write_all(ok_response("back").as_bytes()).unwrap();
        });

        let mut transport = Transport::connect(origin, "test/1.0", 64).unwrap();
        let dead = transport.get("/", &[]).unwrap();
        assert_eq!(dead, Response::dead_connection());
        assert!(!transport.is_open());

        let revived = transport.get("/", &[]).unwrap();
        assert_eq!(revived.status(), 200);
        assert_eq!(revived.body(), "back");
        server.join().unwrap();
    }

    #[test]
    fn test_post_uses_own_connection() {
        let (listener, origin) = bind();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let request = read_request(&mut reader).unwrap();
            writer
                .write_all(
                    b"HTTP/1.1 302 Found\r\nSet-Cookie: sessionid=xyz; Path=/\r\nLocation: /\r\nContent-Length: 0\r\n\r\n",
                )
                .unwrap();
            request
        });

        let mut transport = Transport::new(origin, "test/1.0", 64);
        let response = transport
            .post(
                "/accounts/login/",
                &[("username", "alice"), ("password", "a b&c")],
                &[("Cookie", "csrftoken=t")],
            )
            .unwrap();

        assert_eq!(response.status(), 302);
        assert_eq!(response.header("Set-Cookie"), Some("sessionid=xyz; Path=/"));
        assert!(!transport.is_open());

        let request = server.join().unwrap();
        let body = "username=alice&password=a+b%26c";
        assert!(request.starts_with("POST /accounts/login/ HTTP/1.1\r\n"));
        assert!(request.contains("Content-Type: application/x-www-form-urlencoded\r\n"));
        assert!(request.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(request.contains("Cookie: csrftoken=t\r\n"));
        assert!(request.ends_with(&format!("\r\n\r\n{}", body)));
    }

    #[test]
    fn test_connect_failure() {
        let (listener, origin) = bind();
        drop(listener);
        let result = Transport::connect(origin, "test/1.0", 64);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_connection_close_header_drops_connection() {
        let (listener, origin) = bind();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            read_request(&mut reader).unwrap();
            writer
                .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 2\r\n\r\nhi")
                .unwrap();
        });

        let mut transport = Transport::connect(origin, "test/1.0", 64).unwrap();
        let response = transport.get("/", &[]).unwrap();
        assert_eq!(response.body(), "hi");
        assert!(!transport.is_open());
        server.join().unwrap();
    }
}
