//! End-to-end tests: a live gateway on a real TCP port between a client
//! socket and a stub upstream service.

use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use indoc::indoc;
use portico_gateway::Gateway;
use portico_gateway::rules::{Rule, RuleKey, Target};
use portico_http::conn::{SourceConnection, TargetConnection};
use portico_http::protocol::{Message, Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

/// An upstream that answers every request with a summary of what it saw.
async fn echo_upstream() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut conn = SourceConnection::new(stream, Duration::from_secs(5));
                while let Ok(Some(mut request)) = conn.read_request().await {
                    let body = request.body_mut().read().await.unwrap_or_default();
                    let echo = format!(
                        "method={} path={} host={} xff={} body={}",
                        request.method(),
                        request.path(),
                        request.header().host().unwrap_or("-"),
                        request.header().x_forwarded_for().unwrap_or("-"),
                        String::from_utf8_lossy(&body),
                    );
                    let mut response = Response::ok().body(echo).build();
                    if conn.write_response(&mut response).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    port
}

/// An upstream that reads one request and replies with fixed raw bytes.
async fn canned_upstream(raw: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(raw.replace('\n', "\r\n").as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    port
}

/// A gateway on an ephemeral port with one catch-all forwarding rule.
async fn forwarded_gateway(upstream: u16, adjust_host: bool) -> (Arc<Gateway>, u16) {
    let gateway = Gateway::builder().adjust_host_header(adjust_host).build();
    let port = gateway.open_port(0).await.unwrap();
    let key = RuleKey::new("*", "*", ".*", port).unwrap();
    gateway.table().add_if_new(Rule::new(key, Target::forward("127.0.0.1", upstream)));
    (gateway, port)
}

async fn connect(port: u16) -> TargetConnection<OwnedReadHalf, OwnedWriteHalf> {
    TargetConnection::connect(
        &format!("127.0.0.1:{port}"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .await
    .unwrap()
}

async fn call(port: u16, request: &mut Request) -> Response {
    let mut conn = connect(port).await;
    conn.write_request(request).await.unwrap();
    conn.read_response(*request.method() == Method::HEAD).await.unwrap()
}

async fn text(response: &mut Response) -> String {
    let bytes = response.body_mut().read().await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn forwards_rewriting_host_and_stamping_forwarded_for() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let mut request = Request::new(Method::GET, "/hello");
    request.header_mut().set_host("api.example.com");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = text(&mut response).await;
    assert!(body.contains("path=/hello"), "{body}");
    assert!(body.contains(&format!("host=127.0.0.1:{upstream}")), "{body}");
    assert!(body.contains("xff=127.0.0.1"), "{body}");
}

#[tokio::test]
async fn host_header_passes_through_when_adjustment_is_off() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, false).await;

    let mut request = Request::new(Method::GET, "/hello");
    request.header_mut().set_host("api.example.com");
    let mut response = call(port, &mut request).await;

    let body = text(&mut response).await;
    assert!(body.contains("host=api.example.com"), "{body}");
}

#[tokio::test]
async fn forwarded_for_appends_to_an_existing_chain() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let mut request = Request::new(Method::GET, "/");
    request.header_mut().set_host("svc");
    request.header_mut().set_value("X-Forwarded-For", "198.51.100.7");
    let mut response = call(port, &mut request).await;

    let body = text(&mut response).await;
    assert!(body.contains("xff=198.51.100.7, 127.0.0.1"), "{body}");
}

#[tokio::test]
async fn unmatched_request_gets_404() {
    let gateway = Gateway::builder().build();
    let port = gateway.open_port(0).await.unwrap();

    let mut request = Request::new(Method::GET, "/nothing");
    request.header_mut().set_host("nowhere.example.com");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = text(&mut response).await;
    assert!(body.contains("not mapped"), "{body}");
}

#[tokio::test]
async fn blocked_rule_answers_403() {
    let gateway = Gateway::builder().build();
    let port = gateway.open_port(0).await.unwrap();
    let key = RuleKey::new("*", "*", ".*", port).unwrap();
    gateway
        .table()
        .add_if_new(Rule::new(key, Target::forward("127.0.0.1", 1)).block_request(true));

    let mut request = Request::new(Method::GET, "/secret");
    request.header_mut().set_host("svc");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = text(&mut response).await;
    assert!(body.contains("blocked"), "{body}");
}

#[tokio::test]
async fn keep_alive_carries_sequential_exchanges() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let mut conn = connect(port).await;
    for path in ["/first", "/second"] {
        let mut request = Request::new(Method::GET, path);
        request.header_mut().set_host("svc");
        conn.write_request(&mut request).await.unwrap();

        let mut response = conn.read_response(false).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = text(&mut response).await;
        assert!(body.contains(&format!("path={path}")), "{body}");
    }
}

#[tokio::test]
async fn chunked_request_body_streams_through() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let raw = indoc! {"
        POST /upload HTTP/1.1
        Host: svc
        Connection: close
        Transfer-Encoding: chunked

        5
        alpha
        4
        beta
        0

    "};
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(raw.replace('\n', "\r\n").as_bytes()).await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    let reply = String::from_utf8_lossy(&reply);

    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    assert!(reply.contains("body=alphabeta"), "{reply}");
    assert!(reply.contains("Connection: close"), "{reply}");
}

#[tokio::test]
async fn chunked_response_streams_back() {
    let upstream = canned_upstream(
        "HTTP/1.1 200 OK\nTransfer-Encoding: chunked\n\n5\nhello\n6\n world\n0\n\n",
    )
    .await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let mut request = Request::new(Method::GET, "/stream");
    request.header_mut().set_host("svc");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.header().is_chunked());
    assert_eq!(text(&mut response).await, "hello world");
}

#[tokio::test]
async fn pass_through_rule_follows_the_request_authority() {
    let upstream = echo_upstream().await;
    let gateway = Gateway::builder().build();
    let port = gateway.open_port(0).await.unwrap();
    let key = RuleKey::new("*", "*", ".*", port).unwrap();
    gateway.table().add_if_new(Rule::new(key, Target::PassThrough));

    let mut request = Request::new(Method::GET, "/via-proxy");
    request.header_mut().set_host(format!("127.0.0.1:{upstream}"));
    let mut response = call(port, &mut request).await;

    let body = text(&mut response).await;
    assert!(body.contains("path=/via-proxy"), "{body}");
    assert!(body.contains(&format!("host=127.0.0.1:{upstream}")), "{body}");
}

#[tokio::test]
async fn head_response_keeps_length_but_carries_no_payload() {
    let upstream = echo_upstream().await;
    let (_gateway, port) = forwarded_gateway(upstream, true).await;

    let mut conn = connect(port).await;
    let mut request = Request::new(Method::HEAD, "/probe");
    request.header_mut().set_host("svc");
    conn.write_request(&mut request).await.unwrap();
    let mut response = conn.read_response(true).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.header().content_length().unwrap() > 0);
    assert!(response.body_mut().read().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_answers_502() {
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = unused.local_addr().unwrap().port();
    drop(unused);

    let (_gateway, port) = forwarded_gateway(dead_port, true).await;

    let mut request = Request::new(Method::GET, "/");
    request.header_mut().set_host("svc");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = text(&mut response).await;
    assert!(body.contains("could not be reached"), "{body}");
}

#[tokio::test]
async fn add_rule_opens_its_port() {
    let upstream = echo_upstream().await;
    let gateway = Gateway::builder().build();

    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = unused.local_addr().unwrap().port();
    drop(unused);

    let key = RuleKey::new("*", "*", ".*", port).unwrap();
    let rule = Rule::new(key.clone(), Target::forward("127.0.0.1", upstream));
    assert!(gateway.add_rule(rule).await.unwrap());
    assert!(gateway.is_port_open(port));

    let duplicate = Rule::new(key, Target::forward("127.0.0.1", upstream));
    assert!(!gateway.add_rule(duplicate).await.unwrap());

    let mut request = Request::new(Method::GET, "/via-added-rule");
    request.header_mut().set_host("svc");
    let mut response = call(port, &mut request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(&mut response).await.contains("path=/via-added-rule"));
}

#[tokio::test]
async fn closed_port_stops_accepting() {
    let upstream = echo_upstream().await;
    let (gateway, port) = forwarded_gateway(upstream, true).await;

    let mut request = Request::new(Method::GET, "/");
    request.header_mut().set_host("svc");
    let response = call(port, &mut request).await;
    assert_eq!(response.status(), StatusCode::OK);

    gateway.remove_rules_by_port(port);
    assert!(!gateway.is_port_open(port));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}
