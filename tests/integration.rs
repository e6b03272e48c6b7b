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
//! End-to-end exercises of the Skeleton/Stub pair, run against real
//! sockets bound on `127.0.0.1:0` rather than mocked transports -- the
//! same posture the crate's unit tests take with `tokio::io::duplex`, just
//! over the real network stack.
use rmi::{Address, Dispatch, Fault, Hooks, InterfaceDescriptor, MethodDescriptor, RemoteInterface, Skeleton, Stub};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Installs a test-scoped logger so the crate's `log::` output (accept-loop
/// iterations, hook invocations) is visible under `cargo test -- --nocapture`.
/// Safe to call from every test: `try_init` is a no-op past the first call.
fn init_logging() { let _ = env_logger::builder().is_test(true).try_init(); }

/// A small "PingServer" remote interface, exercised only by these tests --
/// not a shipped sample application, just scaffolding for the scenarios
/// below.
struct PingServer;
impl RemoteInterface for PingServer {
    const NAME: &'static str = "PingServer";
    fn descriptor() -> &'static InterfaceDescriptor {
        static DESC: InterfaceDescriptor = InterfaceDescriptor {
            name: "PingServer",
            methods: &[
                MethodDescriptor {
                    name: "ping",
                    arg_types: &["i32"],
                    declares_rmi_error: true,
                },
                MethodDescriptor {
                    name: "divide",
                    arg_types: &["i32", "i32"],
                    declares_rmi_error: true,
                },
            ],
        };
        &DESC
    }
}

struct PingServerImpl {
    calls: Arc<AtomicUsize>,
}

impl PingServerImpl {
    fn new() -> PingServerImpl { PingServerImpl { calls: Arc::new(AtomicUsize::new(0)) } }
}

impl Dispatch<PingServer> for PingServerImpl {
    fn dispatch(&self, method: &str, _arg_types: &[String], mut args: Vec<Value>) -> Result<Value, Fault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "ping" => {
                let n = args.remove(0).as_i64().ok_or_else(|| Fault::BadArguments("expected i32".to_owned()))?;
                Ok(json!(n + 1))
            },
            "divide" => {
                let a = args.remove(0).as_i64().ok_or_else(|| Fault::BadArguments("expected i32".to_owned()))?;
                let b = args.remove(0).as_i64().ok_or_else(|| Fault::BadArguments("expected i32".to_owned()))?;
                if b == 0 {
                    return Err(Fault::User(json!({ "kind": "DivideByZero" })));
                }
                Ok(json!(a / b))
            },
            _ => Err(Fault::UnknownMethod),
        }
    }
}

#[tokio::test]
async fn ping_round_trips_through_a_stub() {
    init_logging();
    let skeleton: Skeleton<PingServer, PingServerImpl> = Skeleton::new(PingServerImpl::new());
    let addr = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
    let stub: Stub<PingServer> = Stub::create(&skeleton).unwrap();
    assert_eq!(stub.address(), &addr);

    let result = stub.invoke("ping", vec!["i32".to_owned()], vec![json!(41)]).await.unwrap();
    match result {
        rmi::Invoked::Returned(v) => assert_eq!(v, json!(42)),
        rmi::Invoked::Raised(_) => panic!("expected a normal return"),
    }

    skeleton.stop();
}

#[tokio::test]
async fn a_stub_returned_by_a_call_is_itself_usable() {
    init_logging();
    // Two independently running skeletons, standing in for "a call that
    // returns a handle to another remote object": the factory scenario.
    let factory: Skeleton<PingServer, PingServerImpl> = Skeleton::new(PingServerImpl::new());
    factory.start(Address::new("127.0.0.1", 0)).await.unwrap();
    let factory_stub: Stub<PingServer> = Stub::create(&factory).unwrap();

    let produced: Skeleton<PingServer, PingServerImpl> = Skeleton::new(PingServerImpl::new());
    let produced_addr = produced.start(Address::new("127.0.0.1", 0)).await.unwrap();
    let produced_stub: Stub<PingServer> = Stub::create(&produced).unwrap();

    // Round-trip the produced stub as a JSON value, the way it would come
    // back as an invocation's payload.
    let encoded = serde_json::to_value(&produced_stub).unwrap();
    let decoded: Stub<PingServer> = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, produced_stub);
    assert_eq!(decoded.address(), &produced_addr);

    let result = decoded.invoke("ping", vec!["i32".to_owned()], vec![json!(1)]).await.unwrap();
    match result {
        rmi::Invoked::Returned(v) => assert_eq!(v, json!(2)),
        rmi::Invoked::Raised(_) => panic!("expected a normal return"),
    }

    let _ = factory_stub;
    factory.stop();
    produced.stop();
}

#[tokio::test]
async fn a_user_error_is_transparently_re_raised_as_an_exception() {
    init_logging();
    let skeleton: Skeleton<PingServer, PingServerImpl> = Skeleton::new(PingServerImpl::new());
    skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
    let stub: Stub<PingServer> = Stub::create(&skeleton).unwrap();

    let result = stub.invoke("divide", vec!["i32".to_owned(), "i32".to_owned()], vec![json!(10), json!(0)]).await.unwrap();
    match result {
        rmi::Invoked::Raised(payload) => assert_eq!(payload, json!({ "kind": "DivideByZero" })),
        rmi::Invoked::Returned(_) => panic!("expected a user exception"),
    }

    skeleton.stop();
}

#[tokio::test]
async fn connecting_to_a_dead_address_is_an_rmi_error() {
    init_logging();
    let stub: Stub<PingServer> = Stub::with_hostname("127.0.0.1", 1);
    let result = stub.invoke("ping", vec!["i32".to_owned()], vec![json!(1)]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn a_malformed_request_is_answered_with_an_error_and_the_service_error_hook_fires() {
    init_logging();
    use std::sync::atomic::AtomicBool;

    let fired = Arc::new(AtomicBool::new(false));
    let fired2 = fired.clone();
    let hooks = Hooks::builder().on_service_error(move |_| fired2.store(true, Ordering::SeqCst)).build();

    let skeleton: Skeleton<PingServer, PingServerImpl> = Skeleton::with_hooks(PingServerImpl::new(), hooks);
    let addr = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();

    let mut socket = tokio::net::TcpStream::connect(format!("{}:{}", addr.host(), addr.port())).await.unwrap();
    rmi_test_support::write_raw_line(&mut socket, "not json").await;
    let response = rmi::codec::read_response(&mut socket).await.unwrap();
    assert_eq!(response.status, rmi::Status::Error);

    // give the worker a moment to invoke the hook after writing its response.
    tokio::task::yield_now().await;
    assert!(fired.load(Ordering::SeqCst));

    skeleton.stop();
}

#[tokio::test]
async fn a_skeleton_can_be_stopped_and_restarted_on_the_same_address() {
    init_logging();
    let skeleton: Skeleton<PingServer, PingServerImpl> = Skeleton::new(PingServerImpl::new());
    let addr = skeleton.start(Address::new("127.0.0.1", 0)).await.unwrap();
    skeleton.stop();
    tokio::task::yield_now().await;

    let restarted_addr = skeleton.restart().await.unwrap();
    assert_eq!(addr, restarted_addr);

    let stub: Stub<PingServer> = Stub::create(&skeleton).unwrap();
    let result = stub.invoke("ping", vec!["i32".to_owned()], vec![json!(9)]).await.unwrap();
    match result {
        rmi::Invoked::Returned(v) => assert_eq!(v, json!(10)),
        rmi::Invoked::Raised(_) => panic!("expected a normal return"),
    }

    skeleton.stop();
}

/// Tiny helpers kept local to the integration tests: writing a raw,
/// intentionally-malformed line past the usual `Request` encoder to
/// exercise the handler's decode-failure path, and exposing the socket
/// address string the production code keeps crate-private.
mod rmi_test_support {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    pub async fn write_raw_line(socket: &mut TcpStream, line: &str) {
        socket.write_all(line.as_bytes()).await.unwrap();
        socket.write_all(b"\n").await.unwrap();
    }
}
