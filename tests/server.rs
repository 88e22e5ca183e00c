//! End-to-end: the hyper transport in front of an app, on an ephemeral port.

use std::net::SocketAddr;
use std::time::Duration;

use rally::{App, Context, Server, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

async fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

fn app() -> App {
    let mut app = App::new();
    app.root().get("/ping", |ctx: &mut Context| ctx.response.text("pong"));
    app.root().router("/sub").get("/:name", |ctx: &mut Context| {
        let value = serde_json::json!({ "name": ctx.param("name") });
        ctx.json(&value);
    });
    app.root().post("/echo", |ctx: &mut Context| {
        let name = ctx.request.form("name");
        ctx.response.set_status(StatusCode::CREATED);
        ctx.response.text(name);
    });
    app
}

#[tokio::test]
async fn serves_routes_until_shutdown() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::from_listener(listener).serve_with_shutdown(app(), async {
            let _ = stopped.await;
        }),
    );

    let ping = send(addr, "GET /ping HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(ping.starts_with("HTTP/1.1 200 OK"), "{ping}");
    assert!(ping.ends_with("pong"), "{ping}");

    let json = send(addr, "GET /sub/pong HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(json.to_ascii_lowercase().contains("content-type: application/json"), "{json}");
    assert!(json.ends_with(r#"{"name":"pong"}"#), "{json}");

    let body = "name=hal";
    let echo = send(
        addr,
        &format!(
            "POST /echo HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\
             Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(echo.starts_with("HTTP/1.1 201 Created"), "{echo}");
    assert!(echo.ends_with("hal"), "{echo}");

    let missing = send(addr, "GET /nope HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"), "{missing}");
    assert!(missing.ends_with(rally::NOT_FOUND_BODY), "{missing}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::from_listener(listener).serve_with_shutdown(app(), async {
            let _ = stopped.await;
        }),
    );

    // No `Connection: close`, so the connection stays open after the reply.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /ping HTTP/1.1\r\nHost: test\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    let mut chunk = [0u8; 1024];
    while !response.ends_with(b"pong") {
        let n = stream.read(&mut chunk).await.unwrap();
        assert_ne!(n, 0, "connection closed before the response was complete");
        response.extend_from_slice(&chunk[..n]);
    }

    stop.send(()).unwrap();
    let served = timeout(Duration::from_secs(3), server)
        .await
        .expect("serve did not return with an idle connection open");
    served.unwrap().unwrap();

    // The server side hung up.
    let n = stream.read(&mut chunk).await.unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn invalid_bind_address_is_reported() {
    let result = Server::bind("not an address")
        .serve_with_shutdown(App::new(), std::future::ready(()))
        .await;
    assert!(matches!(result, Err(rally::Error::Addr(_))));
}
