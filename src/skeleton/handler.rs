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
//! The per-connection worker task: the Skeleton's request handler.
use crate::codec::{read_request, write_response};
use crate::interface::{Dispatch, Fault, RemoteInterface};
use crate::skeleton::hooks::Hooks;
use crate::wire::Response;
use std::sync::Arc;
use tokio::net::TcpStream;

/// Runs one connection to completion: decode one Request, resolve and
/// invoke the target method against `server`, encode and write one
/// Response, then let the socket close on drop.
///
/// A malformed request or an unresolved method becomes an `Error` response
/// plus a `service_error` callback; a user-level error from the target
/// method becomes an `Exception` response with no callback; an I/O failure
/// writing the response is swallowed after a `service_error` callback,
/// since the client will see the failure on its own side.
pub async fn handle_connection<I, D>(mut socket: TcpStream, server: Arc<D>, hooks: Arc<Hooks>)
where
    I: RemoteInterface,
    D: Dispatch<I> + ?Sized,
{
    let descriptor = I::descriptor();

    let request = match read_request(&mut socket).await {
        Ok(request) => request,
        Err(e) => {
            log::debug!("[skeleton] malformed request: {}", e);
            hooks.service_error(&e);
            let _ = write_response(&mut socket, &Response::error(format!("invalid request: {}", e))).await;
            return;
        },
    };

    if !request.arity_matches() {
        let e = crate::error::RmiError::new("argument-types and arguments have mismatched arity");
        hooks.service_error(&e);
        let _ = write_response(&mut socket, &Response::error(e.message())).await;
        return;
    }

    if descriptor.resolve(&request.method, &request.arg_types).is_none() {
        let e = crate::error::RmiError::new(format!(
            "no method '{}' with the given argument types on interface '{}'",
            request.method, descriptor.name,
        ));
        hooks.service_error(&e);
        let _ = write_response(&mut socket, &Response::error(e.message())).await;
        return;
    }

    let response = match server.dispatch(&request.method, &request.arg_types, request.args) {
        Ok(payload) => Response::normal(payload),
        Err(Fault::User(payload)) => Response::exception(payload),
        Err(Fault::UnknownMethod) => {
            let e = crate::error::RmiError::new(format!("unknown method '{}'", request.method));
            hooks.service_error(&e);
            Response::error(e.message())
        },
        Err(Fault::BadArguments(reason)) => {
            let e = crate::error::RmiError::new(format!("bad arguments for '{}': {}", request.method, reason));
            hooks.service_error(&e);
            Response::error(e.message())
        },
    };

    if let Err(e) = write_response(&mut socket, &response).await {
        log::debug!("[skeleton] failed to write response, client presumed gone: {}", e);
        hooks.service_error(&e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{InterfaceDescriptor, MethodDescriptor};
    use crate::wire::Status;
    use tokio::net::{TcpListener, TcpStream};

    struct Echo;
    impl RemoteInterface for Echo {
        const NAME: &'static str = "Echo";
        fn descriptor() -> &'static InterfaceDescriptor {
            static DESC: InterfaceDescriptor = InterfaceDescriptor {
                name: "Echo",
                methods: &[MethodDescriptor {
                    name: "shout",
                    arg_types: &["String"],
                    declares_rmi_error: true,
                }],
            };
            &DESC
        }
    }

    struct EchoServer;
    impl Dispatch<Echo> for EchoServer {
        fn dispatch(&self, method: &str, _arg_types: &[String], mut args: Vec<serde_json::Value>) -> Result<serde_json::Value, Fault> {
            match method {
                "shout" => {
                    let s = args.remove(0).as_str().unwrap_or_default().to_uppercase();
                    Ok(serde_json::json!(s))
                },
                _ => Err(Fault::UnknownMethod),
            }
        }
    }

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accepted, connected) = tokio::join!(listener.accept(), connect);
        (accepted.unwrap().0, connected.unwrap())
    }

    #[tokio::test]
    async fn normal_return_yields_a_normal_response() {
        let (server_sock, mut client_sock) = connected_pair().await;
        let server = Arc::new(EchoServer);
        let hooks = Arc::new(Hooks::default());

        let request = crate::wire::Request::new("shout", vec!["String".to_owned()], vec![serde_json::json!("hi")]);
        crate::codec::write_request(&mut client_sock, &request).await.unwrap();

        handle_connection::<Echo, _>(server_sock, server, hooks).await;

        let response = crate::codec::read_response(&mut client_sock).await.unwrap();
        assert_eq!(response.status, Status::Normal);
        assert_eq!(response.payload, serde_json::json!("HI"));
    }

    #[tokio::test]
    async fn unknown_method_yields_an_error_response() {
        let (server_sock, mut client_sock) = connected_pair().await;
        let server = Arc::new(EchoServer);
        let hooks = Arc::new(Hooks::default());

        let request = crate::wire::Request::new("whisper", vec!["String".to_owned()], vec![serde_json::json!("hi")]);
        crate::codec::write_request(&mut client_sock, &request).await.unwrap();

        handle_connection::<Echo, _>(server_sock, server, hooks).await;

        let response = crate::codec::read_response(&mut client_sock).await.unwrap();
        assert_eq!(response.status, Status::Error);
    }

    #[tokio::test]
    async fn malformed_request_yields_an_error_response_and_keeps_the_skeleton_usable() {
        let (server_sock, mut client_sock) = connected_pair().await;
        let server = Arc::new(EchoServer);
        let hooks = Arc::new(Hooks::default());

        client_sock.try_write(b"not json at all\n").unwrap();

        handle_connection::<Echo, _>(server_sock, server, hooks).await;

        let response = crate::codec::read_response(&mut client_sock).await.unwrap();
        assert_eq!(response.status, Status::Error);
    }
}
