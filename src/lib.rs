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
//! A minimal Remote Method Invocation runtime: a Skeleton/Stub pair for
//! invoking methods on a long-lived remote object over TCP. Each remote
//! interface is described by a hand-written [`interface::InterfaceDescriptor`]
//! instead of being discovered through runtime reflection.
//!
//! A server registers an object implementing [`interface::Dispatch`] with
//! a [`skeleton::Skeleton`], starts it listening, and hands out
//! [`stub::Stub`]s (or lets clients build their own from the bound
//! address) for callers to invoke methods through.
pub mod address;
pub mod codec;
pub mod error;
pub mod interface;
pub mod skeleton;
pub mod stub;
pub mod wire;

pub use address::Address;
pub use error::{ProgrammerError, RmiError};
pub use interface::{Dispatch, Fault, InterfaceDescriptor, MethodDescriptor, RemoteInterface};
pub use skeleton::{Hooks, HooksBuilder, Skeleton};
pub use stub::{Invoked, Stub};
pub use wire::{Request, Response, Status};
