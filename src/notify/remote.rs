use crate::ledger::{TollTransaction, TransactionKind};
use crate::notify::EventNotifier;
use serde::Serialize;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const API_VERSION: &str = "1.0";
const DEFAULT_HTTP_PORT: u16 = 80;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notify endpoint {endpoint:?} is invalid: {reason}")]
    InvalidEndpoint { endpoint: String, reason: &'static str },
    #[error("could not resolve notify host {0}")]
    Unresolved(String),
    #[error("notify transport failed: {0}")]
    Transport(#[from] io::Error),
    #[error("notify endpoint answered with status {0}")]
    Rejected(u16),
    #[error("notify endpoint sent an unreadable status line")]
    MalformedResponse,
    #[error("failed to encode transaction event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to format transaction timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Where events are posted. Validated once when the notifier is built.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    fn parse(endpoint: &str) -> Result<Self, NotifyError> {
        let invalid = |reason: &'static str| NotifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let rest = endpoint
            .strip_prefix("http://")
            .ok_or_else(|| invalid("only http:// is supported"))?;
        let (authority, path) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, "")) => (host, DEFAULT_HTTP_PORT),
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid("bad port"))?),
            None => (authority, DEFAULT_HTTP_PORT),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    fn resolve(&self) -> Result<SocketAddr, NotifyError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| NotifyError::Unresolved(self.host.clone()))?
            .next()
            .ok_or_else(|| NotifyError::Unresolved(self.host.clone()))
    }
}

/// Posts each transaction as JSON to a plain `http://` endpoint. Only the
/// response status is inspected.
#[derive(Debug)]
pub struct RemoteNotifier {
    endpoint: Endpoint,
    timeout: Duration,
}

impl RemoteNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        Ok(Self {
            endpoint: Endpoint::parse(endpoint)?,
            timeout,
        })
    }

    fn post(&self, payload: &[u8]) -> Result<(), NotifyError> {
        let addr = self.endpoint.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut writer = BufWriter::new(&stream);
        write!(
            writer,
            "POST {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {length}\r\n\
             Connection: close\r\n\r\n",
            path = self.endpoint.path,
            host = self.endpoint.host,
            length = payload.len(),
        )?;
        writer.write_all(payload)?;
        writer.flush()?;
        drop(writer);

        let mut status_line = String::new();
        BufReader::new(&stream).read_line(&mut status_line)?;
        match status_code(&status_line) {
            Some(code) if (200..300).contains(&code) => Ok(()),
            Some(code) => Err(NotifyError::Rejected(code)),
            None => Err(NotifyError::MalformedResponse),
        }
    }
}

impl EventNotifier for RemoteNotifier {
    fn notify(&self, transaction: &TollTransaction) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(&TransactionEvent::new(transaction)?)?;
        self.post(&payload)
    }
}

/// `HTTP/1.1 204 No Content` -> 204
fn status_code(status_line: &str) -> Option<u16> {
    let mut parts = status_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct TransactionEvent<'a> {
    api_version: &'static str,
    plate: &'a str,
    kind: TransactionKind,
    entry_time: String,
    exit_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    travel_time_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    toll_amount: Option<u32>,
}

impl<'a> TransactionEvent<'a> {
    fn new(transaction: &'a TollTransaction) -> Result<Self, NotifyError> {
        Ok(Self {
            api_version: API_VERSION,
            plate: transaction.plate.as_str(),
            kind: transaction.kind,
            entry_time: rfc3339(transaction.entry_time)?,
            exit_time: transaction.exit_time.map(rfc3339).transpose()?,
            travel_time_minutes: transaction.travel_time_minutes,
            toll_amount: transaction.toll_amount,
        })
    }
}

fn rfc3339(timestamp: SystemTime) -> Result<String, NotifyError> {
    Ok(OffsetDateTime::from(timestamp).format(&Rfc3339)?)
}
