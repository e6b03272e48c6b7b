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
//! The Stub half of the RMI pair: an immutable, transportable handle to a
//! remote object that invokes methods on it over TCP.
use crate::address::Address;
use crate::codec::{read_response, write_request};
use crate::error::RmiError;
use crate::interface::{validate, InterfaceDescriptor, RemoteInterface};
use crate::skeleton::Skeleton;
use crate::wire::{Request, Response, Status};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// The outcome of one `Stub` invocation: either the decoded normal return,
/// or a user-raised error transparently re-raised from the remote method,
/// kept as its raw JSON payload since there is no reflective facility here
/// to reconstruct the original exception type.
pub enum Invoked<T> {
    Returned(T),
    Raised(Value),
}

/// An immutable, serializable handle identifying a remote object: the
/// interface it was built against, plus the address it lives at.
///
/// Two Stubs are equal, and hash the same, iff both the interface and the
/// address match -- the descriptor pointer itself never changes for a
/// given `I`, so comparing addresses alone inside one process is
/// sufficient, and comparing interface *names* makes the same hold across
/// a serialize/deserialize round trip.
pub struct Stub<I: RemoteInterface> {
    descriptor: &'static InterfaceDescriptor,
    addr: Address,
    _interface: PhantomData<fn() -> I>,
}

impl<I: RemoteInterface> Stub<I> {
    /// Builds a Stub pointed directly at `addr`. Validates `I` eagerly,
    /// the same as `Skeleton::new`.
    pub fn at(addr: Address) -> Stub<I> {
        validate::<I>();
        Stub {
            descriptor: I::descriptor(),
            addr,
            _interface: PhantomData,
        }
    }

    /// Builds a Stub from a running `Skeleton`'s bound address, resolving
    /// a wildcard host to the local machine's host name first. Fails if
    /// the Skeleton isn't currently running.
    pub fn create<D>(skeleton: &Skeleton<I, D>) -> Result<Stub<I>, RmiError>
    where
        D: crate::interface::Dispatch<I> + 'static,
    {
        let addr = skeleton
            .address()
            .ok_or_else(|| RmiError::new("cannot build a stub for a skeleton that is not running"))?;
        let resolved = addr.resolve_wildcard()?;
        Ok(Stub::at(resolved))
    }

    /// Builds a Stub combining a caller-supplied `hostname` with a running
    /// `Skeleton`'s effective port -- unlike `create`, no wildcard
    /// resolution happens since the host is already concrete. Fails if the
    /// Skeleton isn't currently running and so has no port yet.
    pub fn create_with_hostname<D>(skeleton: &Skeleton<I, D>, hostname: impl Into<String>) -> Result<Stub<I>, RmiError>
    where
        D: crate::interface::Dispatch<I> + 'static,
    {
        let addr = skeleton
            .address()
            .ok_or_else(|| RmiError::new("cannot build a stub for a skeleton that is not running"))?;
        Ok(Stub::at(Address::new(hostname, addr.port())))
    }

    /// Builds a Stub at a given hostname and port directly, with no
    /// Skeleton involved at all -- useful when the caller already knows
    /// the concrete address a peer published out of band.
    pub fn with_hostname(host: impl Into<String>, port: u16) -> Stub<I> { Stub::at(Address::new(host, port)) }

    pub fn address(&self) -> &Address { &self.addr }

    /// Invokes `method` with JSON-encoded arguments, round-tripping one
    /// `Request`/`Response` pair over a freshly opened connection. The
    /// connection is not kept open between calls.
    pub async fn invoke(&self, method: &str, arg_types: Vec<String>, args: Vec<Value>) -> Result<Invoked<Value>, RmiError> {
        if self.descriptor.resolve(method, &arg_types).is_none() {
            return Err(RmiError::new(format!(
                "no method '{}' with the given argument types on interface '{}'",
                method, self.descriptor.name,
            )));
        }

        let mut socket = tokio::net::TcpStream::connect(self.addr.socket_addr_string())
            .await
            .map_err(|e| RmiError::wrap(format!("failed to connect to '{}'", self.addr), e))?;

        let request = Request::new(method, arg_types, args);
        write_request(&mut socket, &request).await?;
        let response = read_response(&mut socket).await?;

        match response.status {
            Status::Normal => Ok(Invoked::Returned(response.payload)),
            Status::Exception => Ok(Invoked::Raised(response.payload)),
            Status::Error => Err(RmiError::new(
                response
                    .payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("remote dispatch failure")
                    .to_owned(),
            )),
        }
    }
}

impl<I: RemoteInterface> Clone for Stub<I> {
    fn clone(&self) -> Stub<I> {
        Stub {
            descriptor: self.descriptor,
            addr: self.addr.clone(),
            _interface: PhantomData,
        }
    }
}

impl<I: RemoteInterface> PartialEq for Stub<I> {
    fn eq(&self, other: &Self) -> bool { self.descriptor.name == other.descriptor.name && self.addr == other.addr }
}

impl<I: RemoteInterface> Eq for Stub<I> {}

impl<I: RemoteInterface> Hash for Stub<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.name.hash(state);
        self.addr.hash(state);
    }
}

impl<I: RemoteInterface> fmt::Display for Stub<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Stub<{}>@{}", self.descriptor.name, self.addr) }
}

impl<I: RemoteInterface> fmt::Debug for Stub<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub").field("interface", &self.descriptor.name).field("addr", &self.addr).finish()
    }
}

/// Stubs serialize as `{interface, addr}`, so one can ride across the wire
/// as an ordinary return value -- a method that hands back a handle to
/// another remote object -- and be reconstituted on the far side, so long
/// as both sides link the same `I`.
impl<I: RemoteInterface> Serialize for Stub<I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Stub", 2)?;
        s.serialize_field("interface", self.descriptor.name)?;
        s.serialize_field("addr", &self.addr)?;
        s.end()
    }
}

impl<'de, I: RemoteInterface> Deserialize<'de> for Stub<I> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Stub<I>, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            interface: String,
            addr: Address,
        }
        let raw = Raw::deserialize(deserializer)?;
        let descriptor = I::descriptor();
        if raw.interface != descriptor.name {
            return Err(de::Error::custom(format!(
                "stub was encoded for interface '{}', expected '{}'",
                raw.interface, descriptor.name,
            )));
        }
        Ok(Stub {
            descriptor,
            addr: raw.addr,
            _interface: PhantomData,
        })
    }
}
