// Copyright (c) 2018 Nuclear Furnace
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//! Framing for the Request/Response object stream.
//!
//! One JSON object per line: newline-terminated `serde_json` text over a
//! `Framed` transport. Sender writes exactly one top-level object and
//! stops; the other side decodes exactly one object and stops.
use crate::error::RmiError;
use crate::wire::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use futures::{SinkExt, StreamExt};

/// Writes exactly one JSON-encoded value as a single line, then returns.
async fn write_one<T, S>(stream: S, value: &T) -> Result<(), RmiError>
where
    T: Serialize,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LinesCodec::new());
    let line = serde_json::to_string(value)?;
    framed
        .send(line)
        .await
        .map_err(|e| RmiError::wrap("failed to write wire record", e))
}

/// Reads exactly one line and decodes it as a JSON-encoded value.
async fn read_one<T, S>(stream: S) -> Result<T, RmiError>
where
    T: DeserializeOwned,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LinesCodec::new());
    let line = framed
        .next()
        .await
        .ok_or_else(|| RmiError::new("peer closed the connection before sending a wire record"))?
        .map_err(|e| RmiError::wrap("failed to read wire record", e))?;
    let value = serde_json::from_str(&line)?;
    Ok(value)
}

/// Writes one `Request` (the Stub invoker's outbound call).
pub async fn write_request<S>(stream: S, request: &Request) -> Result<(), RmiError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_one(stream, request).await
}

/// Reads one `Request` (the Skeleton request handler's first step).
pub async fn read_request<S>(stream: S) -> Result<Request, RmiError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    read_one(stream).await
}

/// Writes one `Response` (the Skeleton request handler's last step).
pub async fn write_response<S>(stream: S, response: &Response) -> Result<(), RmiError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_one(stream, response).await
}

/// Reads one `Response` (the Stub invoker's reply).
pub async fn read_response<S>(stream: S) -> Result<Response, RmiError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    read_one(stream).await
}
