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
//! The three overridable Skeleton hooks, modeled as an injected callback
//! trio rather than subclass overrides, since there is nothing to
//! subclass in Rust.
use crate::error::RmiError;

/// `stopped`, `listen_error`, and `service_error`, bundled into one
/// capability a `Skeleton` is built with.
///
/// `listen_error` defaults to returning `false`, so a transient accept
/// error tears the whole server down unless the caller opts into retrying
/// by supplying their own hook -- arguably too eager a default, kept as-is
/// rather than silently made more forgiving.
pub struct Hooks {
    stopped: Box<dyn Fn(Option<&RmiError>) + Send + Sync>,
    listen_error: Box<dyn Fn(&RmiError) -> bool + Send + Sync>,
    service_error: Box<dyn Fn(&RmiError) + Send + Sync>,
}

impl Hooks {
    pub fn builder() -> HooksBuilder { HooksBuilder::default() }

    /// Invoked exactly once per `running` session, from the listening
    /// task, after the accept-loop exits.
    pub(crate) fn stopped(&self, cause: Option<&RmiError>) { (self.stopped)(cause) }

    /// Invoked from the accept-loop when `accept` fails while still
    /// `running`. `true` means resume accepting; `false` means shut down.
    pub(crate) fn listen_error(&self, e: &RmiError) -> bool { (self.listen_error)(e) }

    /// Invoked from a worker when a dispatch-level error occurs.
    pub(crate) fn service_error(&self, e: &RmiError) { (self.service_error)(e) }
}

impl Default for Hooks {
    fn default() -> Hooks { HooksBuilder::default().build() }
}

/// Builds a [`Hooks`] trio, defaulting every hook to a reasonable
/// logging-only behavior.
pub struct HooksBuilder {
    stopped: Box<dyn Fn(Option<&RmiError>) + Send + Sync>,
    listen_error: Box<dyn Fn(&RmiError) -> bool + Send + Sync>,
    service_error: Box<dyn Fn(&RmiError) + Send + Sync>,
}

impl Default for HooksBuilder {
    fn default() -> HooksBuilder {
        HooksBuilder {
            stopped: Box::new(|cause| match cause {
                Some(e) => log::warn!("[skeleton] stopped due to: {}", e),
                None => log::debug!("[skeleton] stopped"),
            }),
            listen_error: Box::new(|_| false),
            service_error: Box::new(|e| log::warn!("[skeleton] service error: {}", e)),
        }
    }
}

impl HooksBuilder {
    pub fn on_stopped<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&RmiError>) + Send + Sync + 'static,
    {
        self.stopped = Box::new(f);
        self
    }

    pub fn on_listen_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RmiError) -> bool + Send + Sync + 'static,
    {
        self.listen_error = Box::new(f);
        self
    }

    pub fn on_service_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RmiError) + Send + Sync + 'static,
    {
        self.service_error = Box::new(f);
        self
    }

    pub fn build(self) -> Hooks {
        Hooks {
            stopped: self.stopped,
            listen_error: self.listen_error,
            service_error: self.service_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_listen_error_hook_returns_false() {
        let hooks = Hooks::default();
        assert!(!hooks.listen_error(&RmiError::new("transient")));
    }

    #[test]
    fn custom_hooks_are_invoked() {
        let called = Arc::new(AtomicBool::new(false));
        let called2 = called.clone();
        let hooks = Hooks::builder()
            .on_listen_error(move |_| {
                called2.store(true, Ordering::SeqCst);
                true
            })
            .build();

        assert!(hooks.listen_error(&RmiError::new("oops")));
        assert!(called.load(Ordering::SeqCst));
    }
}
