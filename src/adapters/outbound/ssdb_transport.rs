//! SSDB Transport
//!
//! Implements StatusTransport over SSDB's block protocol.
//!
//! Every argument (and every response token) is framed as `<len>\n<bytes>\n`,
//! and a packet ends with an empty line.

use crate::domain::entities::{BackendAddress, StatusTokens};
use crate::domain::ports::{StatusTransport, TransportError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Request for the server statistics. Plain `info` omits the per-command
/// `cmd.*` table; the `cmd` argument asks for it.
pub const INFO_REQUEST: &[&str] = &["info", "cmd"];

/// Largest single response block accepted.
pub const MAX_BLOCK_LEN: usize = 16 * 1024 * 1024;

/// Fetches `info cmd` from SSDB servers over plain TCP.
#[derive(Debug, Clone, Default)]
pub struct SsdbTransport;

impl SsdbTransport {
    pub fn new() -> Self {
        Self
    }

    async fn exchange(addr: &str) -> Result<StatusTokens, TransportError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::Connect)?;

        stream.write_all(&encode_request(INFO_REQUEST)).await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        read_response(&mut reader).await
    }
}

#[async_trait]
impl StatusTransport for SsdbTransport {
    async fn fetch_status(
        &self,
        addr: &BackendAddress,
        timeout: Duration,
    ) -> Result<StatusTokens, TransportError> {
        match tokio::time::timeout(timeout, Self::exchange(addr.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}

/// Frame a request packet.
pub fn encode_request(args: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    for arg in args {
        buf.extend_from_slice(arg.len().to_string().as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(arg.as_bytes());
        buf.push(b'\n');
    }
    buf.push(b'\n');
    buf
}

/// Read one response packet, one token per block.
pub async fn read_response<R>(reader: &mut R) -> Result<StatusTokens, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut tokens = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(TransportError::Protocol(
                "connection closed before end of response".to_string(),
            ));
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            return Ok(tokens);
        }

        let len: usize = header
            .trim()
            .parse()
            .map_err(|_| TransportError::Protocol(format!("invalid block length {:?}", header)))?;
        if len > MAX_BLOCK_LEN {
            return Err(TransportError::Protocol(format!(
                "block of {} bytes exceeds limit",
                len
            )));
        }

        let mut block = vec![0u8; len];
        reader.read_exact(&mut block).await?;

        let mut terminator = reader.read_u8().await?;
        if terminator == b'\r' {
            terminator = reader.read_u8().await?;
        }
        if terminator != b'\n' {
            return Err(TransportError::Protocol(
                "block not terminated by newline".to_string(),
            ));
        }

        tokens.push(String::from_utf8_lossy(&block).into_owned());
    }
}
