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
//! On-the-wire Request/Response record shapes.
//!
//! Values are carried as `serde_json::Value`: all that's required is that
//! whatever encoding gets picked round-trips arbitrary argument/return/error
//! values along with the two record shapes below, and JSON already does
//! that without inventing a format.
use serde::{Deserialize, Serialize};

/// One request sent by a Stub invocation: `{method-name, argument-types,
/// arguments}`. `arg_types` and `args` always have equal length; a
/// zero-argument call sends both as empty arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub arg_types: Vec<String>,
    pub args: Vec<serde_json::Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, arg_types: Vec<String>, args: Vec<serde_json::Value>) -> Request {
        debug_assert_eq!(arg_types.len(), args.len(), "argument-types and arguments must have equal arity");
        Request {
            method: method.into(),
            arg_types,
            args,
        }
    }

    /// `|argument-types| = |arguments|`, the Request's arity invariant.
    pub fn arity_matches(&self) -> bool { self.arg_types.len() == self.args.len() }
}

/// The three-way result taxonomy of a Response: a normal return, a
/// user-raised error from inside the target method, or a transport/dispatch
/// failure. Serialized as one of three discriminable lowercase tags so
/// that an interoperable peer can tell them apart without also decoding
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Exception,
    Error,
}

/// A single Response record: `{status, payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub payload: serde_json::Value,
}

impl Response {
    pub fn normal(payload: serde_json::Value) -> Response {
        Response {
            status: Status::Normal,
            payload,
        }
    }

    pub fn exception(payload: serde_json::Value) -> Response {
        Response {
            status: Status::Exception,
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Response {
        Response {
            status: Status::Error,
            payload: serde_json::json!({ "message": message.into() }),
        }
    }
}
