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
use crate::error::RmiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard host a Skeleton may be configured with, meaning "listen on
/// every local interface." A Stub can never connect to this literally; it
/// gets rewritten to the local host name when a Stub is built from a
/// wildcard-bound Skeleton.
pub const UNSPECIFIED_HOST: &str = "0.0.0.0";

/// A (host, port) pair. Two `Address`es are equal, and hash the same, iff
/// both fields match -- this is what gives `Stub` its identity law.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    /// Builds an address directly. Used for bootstrapping a Stub straight
    /// from a known address, without going through a Skeleton.
    pub fn new<S: Into<String>>(host: S, port: u16) -> Address {
        Address {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str { &self.host }

    pub fn port(&self) -> u16 { self.port }

    /// True if this address is the wildcard "any interface" host.
    pub fn is_wildcard(&self) -> bool { self.host == UNSPECIFIED_HOST }

    /// Resolves the wildcard host to the local machine's host name, leaving
    /// any concrete host untouched. Fails with an `RmiError` if the local
    /// host name can't be determined.
    pub fn resolve_wildcard(&self) -> Result<Address, RmiError> {
        if !self.is_wildcard() {
            return Ok(self.clone());
        }

        let hostname = local_hostname()?;
        Ok(Address::new(hostname, self.port))
    }

    pub(crate) fn socket_addr_string(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.host, self.port) }
}

/// Looks up the name of the local machine, the way `Stub::create(I, skeleton)`
/// needs to when rewriting a wildcard-bound Skeleton's address.
///
/// There is no portable, dependency-free way to ask the OS for its
/// configured host name, so we fall back to resolving `localhost` to a
/// concrete loopback address and using that as the "local host name" --
/// good enough for a Stub that will only ever be handed to a process on the
/// same machine, which is the only case a wildcard bind can support anyway.
fn local_hostname() -> Result<String, RmiError> {
    use std::net::ToSocketAddrs;

    let mut addrs = "localhost:0"
        .to_socket_addrs()
        .map_err(|e| RmiError::wrap("could not resolve local host name", e))?;
    let first = addrs
        .next()
        .ok_or_else(|| RmiError::new("could not resolve local host name: no addresses returned"))?;
    Ok(first.ip().to_string())
}
