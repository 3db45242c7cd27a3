// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use equipdesk_app::{Record, RecordId, RecordService, ServiceError};
use equipdesk_client::{DEFAULT_TIMEOUT, HttpService};
use equipdesk_testkit::fixture_records;
use std::io::Read;
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server};

fn json_response(body: String, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());
    Ok((server, addr))
}

/// Accepts requests without answering until the client goes quiet, then
/// reports how many arrived.
fn stalling_server() -> Result<(String, JoinHandle<usize>)> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let mut held = Vec::new();
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(1_500)) {
            held.push(request);
        }
        held.len()
    });
    Ok((addr, handle))
}

#[test]
fn default_timeout_is_five_seconds() -> Result<()> {
    let service = HttpService::new("http://127.0.0.1:8080", DEFAULT_TIMEOUT)?;
    assert_eq!(service.timeout(), Duration::from_secs(5));
    Ok(())
}

#[test]
fn slow_list_times_out_after_one_retry() -> Result<()> {
    let (addr, handle) = stalling_server()?;
    let service = HttpService::new(&addr, Duration::from_millis(200))?;

    let started = Instant::now();
    let error = service.list().expect_err("stalled list should time out");
    assert_eq!(error, ServiceError::Timeout);
    assert!(started.elapsed() >= Duration::from_millis(400));

    let requests = handle.join().expect("server thread should join");
    assert_eq!(requests, 2);
    Ok(())
}

#[test]
fn slow_insert_times_out_without_retry() -> Result<()> {
    let (addr, handle) = stalling_server()?;
    let service = HttpService::new(&addr, Duration::from_millis(200))?;

    let record = fixture_records().remove(0);
    assert_eq!(service.insert(&record), Err(ServiceError::Timeout));

    let requests = handle.join().expect("server thread should join");
    assert_eq!(requests, 1);
    Ok(())
}

#[test]
fn slow_update_times_out_without_retry() -> Result<()> {
    let (addr, handle) = stalling_server()?;
    let service = HttpService::new(&addr, Duration::from_millis(200))?;

    let record = fixture_records().remove(0);
    assert_eq!(service.update(&record), Err(ServiceError::Timeout));

    let requests = handle.join().expect("server thread should join");
    assert_eq!(requests, 1);
    Ok(())
}

#[test]
fn unreachable_service_reports_transport_error() {
    let service = HttpService::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("service should initialize");

    let error = service.list().expect_err("list should fail");
    assert!(error.is_transient());
    assert!(
        error.to_string().contains("service.base_url") || error == ServiceError::Timeout,
        "{error}"
    );

    let error = service.ping().expect_err("ping should fail");
    assert!(format!("{error:#}").contains("cannot list records"));
}

#[test]
fn list_posts_to_equip_list_and_unwraps_data() -> Result<()> {
    let (server, addr) = mock_server()?;
    let records = fixture_records();
    let body = serde_json::json!({ "data": records }).to_string();

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/api/equip/list");
        let mut sent = String::new();
        request
            .as_reader()
            .read_to_string(&mut sent)
            .expect("request body should read");
        assert_eq!(sent, "{}");
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    assert_eq!(service.list()?, fixture_records());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_retries_once_after_server_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let first = server.recv().expect("first request expected");
        first
            .respond(json_response(r#"{"message":"warming up"}"#.to_owned(), 503))
            .expect("response should succeed");
        let second = server.recv().expect("retry expected");
        second
            .respond(json_response(r#"{"data":[]}"#.to_owned(), 200))
            .expect("response should succeed");
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    assert!(service.list()?.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn insert_sends_wire_record_and_reads_assigned_id() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/equip/insert");
        let mut sent = String::new();
        request
            .as_reader()
            .read_to_string(&mut sent)
            .expect("request body should read");
        let value: serde_json::Value = serde_json::from_str(&sent).expect("json body");
        assert_eq!(value["type"], "照明设备");
        assert_eq!(value["name"], "手电筒");
        assert_eq!(value["status"], "使用中");
        assert_eq!(value["createTime"], "2026-01-18 19:00:00");
        request
            .respond(json_response(r#"{"data":{"id":31}}"#.to_owned(), 200))
            .expect("response should succeed");

        let request = server.recv().expect("second request expected");
        request
            .respond(json_response(String::new(), 200))
            .expect("response should succeed");
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    let record = fixture_records()
        .into_iter()
        .find(|record| record.id == RecordId::new(7))
        .ok_or_else(|| anyhow!("fixture 7 missing"))?;
    assert_eq!(service.insert(&record)?, Some(RecordId::new(31)));
    assert_eq!(service.insert(&record)?, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn mutations_fail_on_error_status_without_retry() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut paths = Vec::new();
        for _ in 0..2 {
            let request = server.recv().expect("request expected");
            paths.push(request.url().to_owned());
            request
                .respond(json_response(r#"{"msg":"boom"}"#.to_owned(), 500))
                .expect("response should succeed");
        }
        paths
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    let record: Record = fixture_records().remove(0);
    assert_eq!(service.update(&record), Err(ServiceError::Status(500)));
    assert_eq!(service.remove(&record), Err(ServiceError::Status(500)));

    let paths = handle.join().expect("server thread should join");
    assert_eq!(paths, vec!["/api/equip/update", "/api/equip/delete"]);
    Ok(())
}

#[test]
fn list_gives_up_after_second_server_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut seen = 0;
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(500)) {
            seen += 1;
            request
                .respond(json_response(r#"{"message":"down"}"#.to_owned(), 503))
                .expect("response should succeed");
        }
        seen
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    assert_eq!(service.list(), Err(ServiceError::Status(503)));

    assert_eq!(handle.join().expect("server thread should join"), 2);
    Ok(())
}

#[test]
fn malformed_list_body_is_decode_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"data":"nope"}"#.to_owned(), 200))
            .expect("response should succeed");
    });

    let service = HttpService::new(&addr, Duration::from_secs(1))?;
    let error = service.list().expect_err("decode should fail");
    assert!(matches!(error, ServiceError::Decode(_)), "{error}");

    handle.join().expect("server thread should join");
    Ok(())
}
