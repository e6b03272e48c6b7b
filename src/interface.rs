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
//! Remote interface descriptors, the interface validator, and the dynamic
//! dispatch contract a server object satisfies.
//!
//! Rust has no runtime reflection, so interface-driven request dispatch is
//! realized as a pair of hand-written, per-interface pieces instead of
//! something discovered at runtime: a `'static` [`InterfaceDescriptor`]
//! describing the interface's methods, and a [`Dispatch`] impl on the
//! server object that resolves `(name, argument-types)` to a method call
//! itself.
use crate::error::ProgrammerError;
use serde_json::Value;

/// One method of a remote interface: its name, the type tags of its
/// parameters in order, and whether it declares the RMI-error kind among
/// its failure conditions.
///
/// `arg_types` doubles as the type-descriptor sequence that goes out on
/// the wire in every `Request` for this method.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub arg_types: &'static [&'static str],
    pub declares_rmi_error: bool,
}

/// An interface descriptor: a named, ordered set of methods. Built once,
/// at compile time, by each remote interface's `RemoteInterface` impl.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceDescriptor {
    pub name: &'static str,
    pub methods: &'static [MethodDescriptor],
}

impl InterfaceDescriptor {
    /// Looks up a method by exact `(name, argument-types)` match. Returns
    /// `None` for an unknown method or a type-list mismatch -- both surface
    /// to the caller as "unknown method" dispatch errors, since there is
    /// no useful distinction to draw between them here.
    pub fn resolve(&self, name: &str, arg_types: &[String]) -> Option<&'static MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arg_types.len() == arg_types.len() && m.arg_types.iter().zip(arg_types).all(|(a, b)| a == b))
    }
}

/// A marker type identifying one remote interface. Implemented once per
/// interface, usually on a zero-sized struct, giving `Stub<I>` and
/// `Skeleton<I, _>` their interface identity as a type parameter.
pub trait RemoteInterface: 'static {
    /// A human-readable name for the interface, used in `Stub`'s
    /// `Display` rendering.
    const NAME: &'static str;

    /// The interface's method table, built once at compile time.
    fn descriptor() -> &'static InterfaceDescriptor;
}

/// Verifies that `I` satisfies the "remote interface" predicate: every
/// method declares the RMI-error kind in its failure set.
///
/// Failure is a programmer error -- it panics rather than returning a
/// `Result`, since it must not be recoverable through the caller's normal
/// error-handling path. Called eagerly from both `Stub::create` and
/// `Skeleton::new`.
pub fn validate<I: RemoteInterface>() {
    let descriptor = I::descriptor();
    for method in descriptor.methods {
        if !method.declares_rmi_error {
            ProgrammerError::new(format!(
                "interface '{}' method '{}' does not declare the RMI-error kind in its failure set",
                descriptor.name, method.name,
            ))
            .raise();
        }
    }
}

/// Why a server-object method invocation failed to produce a normal
/// return, from the Skeleton's point of view.
///
/// `User` carries whatever the method itself raised, to become a
/// `Response::exception` with no hook callback; `UnknownMethod` and
/// `BadArguments` are dispatch-level failures that become a
/// `Response::error` plus a `service_error` callback.
pub enum Fault {
    /// The target method was invoked and raised its own, user-level error.
    User(Value),
    /// No method matched `(name, argument-types)` on this server object.
    UnknownMethod,
    /// The request's argument values didn't decode into what the method
    /// expected, even though the type-tag list matched.
    BadArguments(String),
}

/// The capability a server object must provide for a given remote
/// interface: resolving `(name, argument-types)` to a method and invoking
/// it with decoded arguments, from the Skeleton's point of view.
///
/// Implementations are generated by hand per interface (see the ping
/// scenarios in the integration tests for a worked example); in a language
/// with reflection this would instead be derived automatically from `I`'s
/// method table.
pub trait Dispatch<I: RemoteInterface>: Send + Sync {
    /// Invokes `method` with the given JSON-encoded arguments and returns
    /// the JSON-encoded return value, or the `Fault` that prevented one.
    fn dispatch(&self, method: &str, arg_types: &[String], args: Vec<Value>) -> Result<Value, Fault>;
}
