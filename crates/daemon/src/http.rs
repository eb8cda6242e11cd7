// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/1.1 client for the CI service over TCP.
//!
//! One request per connection (`Connection: close`). Responses are framed by
//! Content-Length, chunked transfer encoding, or connection close.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::client::ClientError;

/// Where the service lives: `http://host[:port][/base]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let invalid = |why: &str| ClientError::InvalidUrl(format!("{}: {}", url, why));
        let rest = url.strip_prefix("http://").ok_or_else(|| invalid("expected http://"))?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], rest[i..].trim_end_matches('/')),
            None => (rest, ""),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid("bad port"))?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        Ok(Self { host: host.to_string(), port, base_path: path.to_string() })
    }

    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Status code and decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// POST a JSON body, bounding connect + write + read by `timeout`.
pub async fn post_json(
    endpoint: &Endpoint,
    path: &str,
    body: &str,
    timeout: Duration,
) -> Result<Response, ClientError> {
    let request = format!(
        "POST {}{} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nAccept: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        endpoint.base_path,
        path,
        endpoint.host_header(),
        body.len(),
        body
    );
    tokio::time::timeout(timeout, send_request(endpoint, &request))
        .await
        .map_err(|_| ClientError::Timeout(timeout))?
}

async fn send_request(endpoint: &Endpoint, request: &str) -> Result<Response, ClientError> {
    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|e| ClientError::io("connect", e))?;
    stream.write_all(request.as_bytes()).await.map_err(|e| ClientError::io("write", e))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub async fn read_http_response<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Response, ClientError> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.map_err(|e| ClientError::io("read status", e))?;
    let bad_status = || ClientError::Malformed(format!("bad status line {:?}", status_line.trim()));
    if !status_line.starts_with("HTTP/") {
        return Err(bad_status());
    }
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(bad_status)?;

    // Headers: Content-Length and Transfer-Encoding (case-insensitive)
    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.map_err(|e| ClientError::io("read header", e))?;
        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().ok();
        } else if let Some(val) = line_lower.strip_prefix("transfer-encoding:") {
            chunked = val.contains("chunked");
        }
    }

    let bytes = if chunked {
        read_chunked(reader).await?
    } else if let Some(len) = content_length {
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await.map_err(|e| ClientError::io("read body", e))?;
        buf
    } else {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.map_err(|e| ClientError::io("read body", e))?;
        buf
    };

    Ok(Response { status, body: String::from_utf8_lossy(&bytes).into_owned() })
}

async fn read_chunked<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Vec<u8>, ClientError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await.map_err(|e| ClientError::io("read chunk", e))?;
        let size_field = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| ClientError::Malformed(format!("bad chunk size {:?}", size_field)))?;
        if size == 0 {
            // Trailers end with an empty line.
            loop {
                let mut line = String::new();
                let n = reader
                    .read_line(&mut line)
                    .await
                    .map_err(|e| ClientError::io("read trailer", e))?;
                if n == 0 || line == "\r\n" || line == "\n" {
                    return Ok(body);
                }
            }
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader
            .read_exact(&mut body[start..])
            .await
            .map_err(|e| ClientError::io("read chunk", e))?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await.map_err(|e| ClientError::io("read chunk", e))?;
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
