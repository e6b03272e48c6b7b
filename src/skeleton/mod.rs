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
//! The Skeleton half of the RMI pair: publishes a server object under a
//! remote interface and services incoming `Stub` calls over TCP.
pub mod handler;
pub mod hooks;

use crate::address::Address;
use crate::error::RmiError;
use crate::interface::{validate, Dispatch, RemoteInterface};
use handler::handle_connection;
pub use hooks::{Hooks, HooksBuilder};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// What the Skeleton-scoped lock actually guards: the running flag, the
/// effective bound address (so a restart can reuse it with no address
/// given), and the `Notify` the accept-loop task watches for a stop
/// signal. The listening socket itself is owned by the accept-loop task,
/// not by this state, so the lock is never held across an `.await`.
struct State {
    running: bool,
    effective_addr: Option<Address>,
    stop: Option<Arc<Notify>>,
}

impl State {
    fn new() -> State {
        State {
            running: false,
            effective_addr: None,
            stop: None,
        }
    }
}

/// A published server object, reachable over TCP by any `Stub<I>` built
/// from its address. `I` fixes the remote interface; `D` is the concrete
/// server object, which must implement `Dispatch<I>`.
pub struct Skeleton<I: RemoteInterface, D: Dispatch<I>> {
    server: Arc<D>,
    hooks: Arc<Hooks>,
    state: Arc<Mutex<State>>,
    _interface: PhantomData<fn() -> I>,
}

impl<I, D> Skeleton<I, D>
where
    I: RemoteInterface,
    D: Dispatch<I> + 'static,
{
    /// Builds a Skeleton around `server`, with the default hooks. Validates
    /// `I` eagerly, the same as `Stub::create` does, since either side of
    /// the pair could be built first.
    pub fn new(server: D) -> Skeleton<I, D> { Skeleton::with_hooks(server, Hooks::default()) }

    /// Builds a Skeleton with caller-supplied hooks.
    pub fn with_hooks(server: D, hooks: Hooks) -> Skeleton<I, D> {
        validate::<I>();
        Skeleton {
            server: Arc::new(server),
            hooks: Arc::new(hooks),
            state: Arc::new(Mutex::new(State::new())),
            _interface: PhantomData,
        }
    }

    /// Starts listening at `addr`. Binds immediately and returns the
    /// effective address (with any OS-assigned port filled in), so the
    /// caller can hand it straight to `Stub::at`. A Skeleton is idle or
    /// running, never both: calling `start` on a running Skeleton is a
    /// caller mistake surfaced as an `RmiError` rather than silently
    /// restarting.
    pub async fn start(&self, addr: Address) -> Result<Address, RmiError> {
        {
            let state = self.state.lock().expect("skeleton lock poisoned");
            if state.running {
                return Err(RmiError::new("skeleton is already running"));
            }
        }

        let listener = TcpListener::bind(addr.socket_addr_string())
            .await
            .map_err(|e| RmiError::wrap(format!("failed to bind '{}'", addr), e))?;
        let local = listener
            .local_addr()
            .map_err(|e| RmiError::wrap("failed to read bound local address", e))?;
        let effective = Address::new(addr.host().to_owned(), local.port());

        self.spawn_accept_loop(listener, effective.clone());
        Ok(effective)
    }

    /// Restarts a previously stopped Skeleton on the address it was last
    /// bound to. Fails if the Skeleton has never been started.
    pub async fn restart(&self) -> Result<Address, RmiError> {
        let addr = {
            let state = self.state.lock().expect("skeleton lock poisoned");
            if state.running {
                return Err(RmiError::new("skeleton is already running"));
            }
            state
                .effective_addr
                .clone()
                .ok_or_else(|| RmiError::new("skeleton has never been started, nothing to restart"))?
        };
        self.start(addr).await
    }

    /// Stops accepting new connections. In-flight workers are left to
    /// finish on their own; the worker pool has no lifetime tied to the
    /// Skeleton's running state.
    pub fn stop(&self) {
        let stop = {
            let mut state = self.state.lock().expect("skeleton lock poisoned");
            if !state.running {
                return;
            }
            state.running = false;
            state.stop.take()
        };
        if let Some(stop) = stop {
            stop.notify_one();
        }
    }

    /// The address currently bound, if running.
    pub fn address(&self) -> Option<Address> {
        let state = self.state.lock().expect("skeleton lock poisoned");
        if state.running {
            state.effective_addr.clone()
        } else {
            None
        }
    }

    fn spawn_accept_loop(&self, listener: TcpListener, effective: Address) {
        let stop = Arc::new(Notify::new());
        {
            let mut state = self.state.lock().expect("skeleton lock poisoned");
            state.running = true;
            state.effective_addr = Some(effective.clone());
            state.stop = Some(stop.clone());
        }

        let server = self.server.clone();
        let hooks = self.hooks.clone();
        let state = self.state.clone();
        let session_stop = stop.clone();

        tokio::spawn(async move {
            log::info!("[skeleton] listening on '{}'", effective);
            let cause = accept_loop::<I, D>(listener, server, hooks.clone(), stop).await;

            // Whether the loop exited because `stop()` was called or because a
            // fatal listen error was declined, the Skeleton transitions back to
            // idle here and `stopped` fires under the same lock that guards
            // `running` -- both the ordinary and the fatal-error shutdown paths
            // go through this one place so the transition always happens. Only
            // touch the state if it still belongs to this session: `stop()`
            // already cleared `state.stop` itself, and a `restart()` racing
            // ahead of this continuation installs its own, so clobbering
            // either would stomp on a session that isn't this one.
            let mut state = state.lock().expect("skeleton lock poisoned");
            let belongs_to_this_session = match &state.stop {
                Some(current) => Arc::ptr_eq(current, &session_stop),
                None => true,
            };
            if belongs_to_this_session {
                state.running = false;
                state.stop = None;
                hooks.stopped(cause.as_ref());
            }
        });
    }
}

/// Runs until told to stop or until a `listen_error` hook declines to
/// continue after a transient accept failure. Every accepted connection is
/// handed to its own worker task with no cap on the number in flight at
/// once.
async fn accept_loop<I, D>(listener: TcpListener, server: Arc<D>, hooks: Arc<Hooks>, stop: Arc<Notify>) -> Option<RmiError>
where
    I: RemoteInterface,
    D: Dispatch<I> + 'static,
{
    loop {
        tokio::select! {
            _ = stop.notified() => return None,
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, _peer)) => {
                        let server = server.clone();
                        let hooks = hooks.clone();
                        tokio::spawn(async move {
                            handle_connection::<I, D>(socket, server, hooks).await;
                        });
                    },
                    Err(e) => {
                        let error = RmiError::wrap("failed to accept connection", e);
                        log::warn!("[skeleton] accept error: {}", error);
                        if !hooks.listen_error(&error) {
                            return Some(error);
                        }
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Fault, InterfaceDescriptor, MethodDescriptor};
    use crate::wire::{Request, Status};

    struct Ping;
    impl RemoteInterface for Ping {
        const NAME: &'static str = "Ping";
        fn descriptor() -> &'static InterfaceDescriptor {
            static DESC: InterfaceDescriptor = InterfaceDescriptor {
                name: "Ping",
                methods: &[MethodDescriptor {
                    name: "ping",
                    arg_types: &["i32"],
                    declares_rmi_error: true,
                }],
            };
            &DESC
        }
    }

    struct PingServer;
    impl Dispatch<Ping> for PingServer {
        fn dispatch(&self, method: &str, _arg_types: &[String], mut args: Vec<serde_json::Value>) -> Result<serde_json::Value, Fault> {
            match method {
                "ping" => {
                    let n = args.remove(0).as_i64().ok_or_else(|| Fault::BadArguments("expected i32".to_owned()))?;
                    Ok(serde_json::json!(n + 1))
                },
                _ => Err(Fault::UnknownMethod),
            }
        }
    }

    #[tokio::test]
    async fn start_binds_and_fills_in_the_assigned_port() {
        let skeleton: Skeleton<Ping, PingServer> = Skeleton::new(PingServer);
        let addr = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
        assert_ne!(addr.port(), 0);
        skeleton.stop();
    }

    #[tokio::test]
    async fn starting_twice_without_stopping_is_an_error() {
        let skeleton: Skeleton<Ping, PingServer> = Skeleton::new(PingServer);
        skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
        let result = skeleton.start(Address::new("127.0.0.1", 0)).await;
        assert!(result.is_err());
        skeleton.stop();
    }

    #[tokio::test]
    async fn stop_then_restart_reuses_the_effective_address() {
        let skeleton: Skeleton<Ping, PingServer> = Skeleton::new(PingServer);
        let first = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
        skeleton.stop();
        // give the accept-loop task a moment to observe the stop signal.
        tokio::task::yield_now().await;
        let second = skeleton.restart().await.unwrap();
        assert_eq!(first, second);
        skeleton.stop();
    }

    #[tokio::test]
    async fn an_accepted_connection_is_serviced_end_to_end() {
        let skeleton: Skeleton<Ping, PingServer> = Skeleton::new(PingServer);
        let addr = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();

        let mut socket = tokio::net::TcpStream::connect(addr.socket_addr_string()).await.unwrap();
        let request = Request::new("ping", vec!["i32".to_owned()], vec![serde_json::json!(41)]);
        crate::codec::write_request(&mut socket, &request).await.unwrap();
        let response = crate::codec::read_response(&mut socket).await.unwrap();

        assert_eq!(response.status, Status::Normal);
        assert_eq!(response.payload, serde_json::json!(42));
        skeleton.stop();
    }
}
