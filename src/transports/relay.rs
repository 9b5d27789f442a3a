//! Relay transport for chat-bot message delivery
//!
//! Posts each record, rendered as Markdown, to a Bot-API style relay
//! (`{base_url}/bot{token}/sendMessage`). HTTP/1.0 with one connection per
//! request, over TLS when the base URL is `https`.

use crate::core::{LogRecord, PoolError, RelayConfig, Result, Transport};
use http::header::{ACCEPT, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::uri::PathAndQuery;
use http::{Method, StatusCode};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use serde_json::{json, Value};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use url::Url;

/// Largest response body kept in a `TransportStatus` error
const MAX_ERROR_BODY: usize = 512;

/// HTTP(S) transport to a chat-bot message relay
///
/// # Example
///
/// ```no_run
/// use relay_logger_pool::prelude::*;
/// use relay_logger_pool::{RelayConfig, RelayTransport};
///
/// # fn main() -> relay_logger_pool::Result<()> {
/// let relay = RelayTransport::new(RelayConfig {
///     base_url: "https://api.telegram.org".to_string(),
///     bot_token: "123456:ABC".to_string(),
///     chat_id: "-1001234567890".to_string(),
///     ..RelayConfig::default()
/// })?;
///
/// let pool = LoggerPool::builder().transport(relay).build()?;
/// let bot = pool.check_transport()?;
/// println!("relaying as @{}", bot);
/// # Ok(())
/// # }
/// ```
pub struct RelayTransport {
    config: RelayConfig,
    base: Url,
    host_header: String,
    /// Present for `https` base URLs
    tls: Option<TlsTarget>,
}

struct TlsTarget {
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
}

/// One request's connection, plain or wrapped in TLS
enum RelayStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for RelayStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            RelayStream::Plain(stream) => stream.read(buf),
            RelayStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for RelayStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RelayStream::Plain(stream) => stream.write(buf),
            RelayStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RelayStream::Plain(stream) => stream.flush(),
            RelayStream::Tls(stream) => stream.flush(),
        }
    }
}

fn tls_client_config() -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| PoolError::config("RelayTransport", format!("tls setup: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

impl RelayTransport {
    /// Validate the configuration and parse the relay address
    ///
    /// No connection is made until the first delivery or probe.
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;

        let base = Url::parse(&config.base_url).map_err(|e| {
            PoolError::config("RelayTransport", format!("invalid base_url: {}", e))
        })?;
        let host = base
            .host_str()
            .ok_or_else(|| PoolError::config("RelayTransport", "base_url has no host"))?;
        let host_header = match base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let tls = match base.scheme() {
            "http" => None,
            "https" => {
                // IPv6 literals come back bracketed from host_str
                let name = host.trim_start_matches('[').trim_end_matches(']');
                let server_name = ServerName::try_from(name.to_string()).map_err(|e| {
                    PoolError::config("RelayTransport", format!("invalid tls server name: {}", e))
                })?;
                Some(TlsTarget {
                    config: tls_client_config()?,
                    server_name,
                })
            }
            other => {
                return Err(PoolError::config(
                    "RelayTransport",
                    format!("unsupported scheme '{}'", other),
                ))
            }
        };

        Ok(Self {
            config,
            base,
            host_header,
            tls,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Request path for one Bot-API method
    fn api_path(&self, api_method: &str) -> Result<PathAndQuery> {
        let path = format!(
            "{}/bot{}/{}",
            self.base.path().trim_end_matches('/'),
            self.config.bot_token,
            api_method
        );
        PathAndQuery::try_from(path.as_str()).map_err(|e| {
            PoolError::config("RelayTransport", format!("invalid request path: {}", e))
        })
    }

    /// JSON payload for `sendMessage`
    pub fn message_body(&self, record: &LogRecord) -> Value {
        json!({
            "chat_id": self.config.chat_id,
            "text": record.render_markdown(),
            "parse_mode": "Markdown",
        })
    }

    fn write_request(
        &self,
        method: &Method,
        path: &PathAndQuery,
        body: Option<&[u8]>,
        buf: &mut Vec<u8>,
    ) {
        buf.extend_from_slice(method.as_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(path.as_str().as_bytes());
        buf.extend_from_slice(b" HTTP/1.0\r\n");
        let _ = write!(buf, "{}: {}\r\n", HOST.as_str(), self.host_header);
        let _ = write!(buf, "{}: close\r\n", CONNECTION.as_str());
        let _ = write!(buf, "{}: application/json\r\n", ACCEPT.as_str());
        if let Some(body) = body {
            let _ = write!(buf, "{}: application/json\r\n", CONTENT_TYPE.as_str());
            let _ = write!(buf, "{}: {}\r\n", CONTENT_LENGTH.as_str(), body.len());
        }
        buf.extend_from_slice(b"\r\n");
        if let Some(body) = body {
            buf.extend_from_slice(body);
        }
    }

    fn connect_tcp(&self) -> Result<TcpStream> {
        let timeout = self.config.timeout();
        let addrs = self.base.socket_addrs(|| None).map_err(|e| {
            PoolError::transport("relay", format!("resolve {}: {}", self.host_header, e))
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(PoolError::transport(
            "relay",
            match last_err {
                Some(e) => format!("connect to {}: {}", self.host_header, e),
                None => format!("no address for {}", self.host_header),
            },
        ))
    }

    fn connect(&self) -> Result<RelayStream> {
        let tcp = self.connect_tcp()?;

        match self.tls {
            None => Ok(RelayStream::Plain(tcp)),
            Some(ref target) => {
                let conn =
                    ClientConnection::new(Arc::clone(&target.config), target.server_name.clone())
                        .map_err(|e| PoolError::transport("relay", format!("tls: {}", e)))?;
                Ok(RelayStream::Tls(Box::new(StreamOwned::new(conn, tcp))))
            }
        }
    }

    /// Send one request and read the whole response
    fn call(
        &self,
        method: Method,
        api_method: &str,
        body: Option<&[u8]>,
    ) -> Result<(StatusCode, String)> {
        let path = self.api_path(api_method)?;
        let mut request = Vec::with_capacity(512);
        self.write_request(&method, &path, body, &mut request);

        let mut stream = self.connect()?;
        stream
            .write_all(&request)
            .and_then(|()| stream.flush())
            .map_err(|e| PoolError::transport("relay", format!("send {}: {}", api_method, e)))?;

        let response = read_response(&mut stream).map_err(|e| {
            PoolError::transport("relay", format!("read {} response: {}", api_method, e))
        })?;

        parse_response(&response)
    }
}

/// Read until the peer closes the connection
///
/// Servers often close TLS connections without `close_notify`; that shows up
/// as `UnexpectedEof` and ends the response once some bytes arrived.
fn read_response<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !response.is_empty() => {
                break
            }
            Err(e) => return Err(e),
        }
    }
    Ok(response)
}

/// Split a raw HTTP response into status and body
fn parse_response(raw: &[u8]) -> Result<(StatusCode, String)> {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text
        .split_once("\r\n\r\n")
        .ok_or_else(|| PoolError::transport("relay", "truncated response"))?;

    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| PoolError::transport("relay", "malformed status line"))?;

    Ok((status, body.to_string()))
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

impl Transport for RelayTransport {
    fn deliver(&mut self, record: &LogRecord) -> Result<()> {
        let payload = serde_json::to_vec(&self.message_body(record))?;
        let (status, body) = self.call(Method::POST, "sendMessage", Some(&payload))?;

        if !status.is_success() {
            return Err(PoolError::transport_status(
                status.as_u16(),
                truncate_body(&body),
            ));
        }
        Ok(())
    }

    /// Calls `getMe` and returns the bot's username
    fn probe(&mut self) -> Result<String> {
        let (status, body) = self.call(Method::GET, "getMe", None)?;
        if !status.is_success() {
            return Err(PoolError::transport_status(
                status.as_u16(),
                truncate_body(&body),
            ));
        }

        let reply: Value = serde_json::from_str(&body)?;
        reply
            .pointer("/result/username")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PoolError::transport("relay", "getMe reply carries no username"))
    }

    fn name(&self) -> &str {
        "relay"
    }
}
