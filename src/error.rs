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
use std::error::Error as StdError;
use std::fmt;

/// The single runtime error kind used for transport and dispatch failures.
///
/// Distinct from whatever error type a server object's methods may raise
/// themselves -- those are transported back to a Stub unchanged (see
/// `crate::stub::Invoked`). An `RmiError` only ever shows up when the
/// connection, the wire protocol, or method resolution itself misbehaves.
#[derive(Debug)]
pub struct RmiError {
    message: String,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl RmiError {
    /// Builds an `RmiError` carrying just a message, with no underlying cause.
    pub fn new<S: Into<String>>(message: S) -> RmiError {
        RmiError {
            message: message.into(),
            cause: None,
        }
    }

    /// Builds an `RmiError` that wraps some other error as its cause.
    pub fn wrap<S, E>(message: S, cause: E) -> RmiError
    where
        S: Into<String>,
        E: StdError + Send + Sync + 'static,
    {
        RmiError {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The human-readable message describing this failure.
    pub fn message(&self) -> &str { &self.message }
}

impl fmt::Display for RmiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for RmiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for RmiError {
    fn from(e: std::io::Error) -> RmiError { RmiError::wrap("i/o failure", e) }
}

impl From<serde_json::Error> for RmiError {
    fn from(e: serde_json::Error) -> RmiError { RmiError::wrap("malformed wire record", e) }
}

/// An unrecoverable fault arising from misuse of the API: passing a
/// descriptor that isn't a valid remote interface, asking for a Skeleton's
/// address before it has one, and the like.
///
/// `ProgrammerError` is deliberately not threaded through `Result` the way
/// `RmiError` is -- it must not be recoverable through the caller's normal
/// error-handling path, so the functions that detect one panic with it
/// rather than returning it. The type exists so that the panic message is
/// built in one place and is consistent.
#[derive(Debug)]
pub struct ProgrammerError(String);

impl ProgrammerError {
    pub fn new<S: Into<String>>(message: S) -> ProgrammerError { ProgrammerError(message.into()) }

    /// Panics with this error's message. Call sites use this instead of
    /// `panic!` directly so every programmer-error site reads the same way.
    pub fn raise(self) -> ! { panic!("rmi: programmer error: {}", self.0) }
}

impl fmt::Display for ProgrammerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl StdError for ProgrammerError {}
