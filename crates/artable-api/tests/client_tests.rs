// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use artable_api::Client;
use artable_app::{BulkSelection, BulkStop, SelectionSet};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn page_body(page: u32, first_id: i64, rows: i64, total_pages: u32) -> String {
    let data = (first_id..first_id + rows)
        .map(|id| {
            format!(
                r#"{{"id":{id},"title":"Work {id}","place_of_origin":"Japan","artist_display":"Hokusai","inscriptions":null,"date_start":1830,"date_end":1832}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"pagination":{{"total":{},"limit":10,"offset":{},"total_pages":{total_pages},"current_page":{page}}},"data":[{data}]}}"#,
        u64::from(total_pages) * 10,
        (page - 1) * 10,
    )
}

#[test]
fn unreachable_endpoint_error_names_the_base_url() {
    let client = Client::new("http://127.0.0.1:1/api/v1", 10, Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .fetch_page(1)
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(
        message.contains("127.0.0.1:1"),
        "unexpected message: {message}"
    );
}

#[test]
fn fetch_page_decodes_mock_response() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert!(
            request.url().starts_with("/api/v1/artworks?page=2&limit=10&fields="),
            "unexpected url {}",
            request.url()
        );
        let response = Response::from_string(page_body(2, 11, 10, 5))
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, 10, Duration::from_secs(1))?;
    let page = client.fetch_page(2)?;
    assert_eq!(page.number, 2);
    assert_eq!(page.total, 50);
    assert_eq!(page.total_pages, 5);
    assert_eq!(page.records.len(), 10);
    assert_eq!(page.records[0].id.get(), 11);
    assert_eq!(page.records[0].artist_display, "Hokusai");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn error_status_surfaces_api_detail() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(
            r#"{"status":403,"error":"Invalid number of results","detail":"Please set a smaller limit or page."}"#,
        )
        .with_status_code(403)
        .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, 10, Duration::from_secs(1))?;
    let error = client.fetch_page(1001).expect_err("403 should fail");
    assert_eq!(
        error.to_string(),
        "server error (403): Please set a smaller limit or page."
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn bulk_walk_fetches_pages_in_order_and_keeps_partial_result() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api/v1", server.server_addr());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..2 {
            let request = server.recv().expect("request expected");
            seen.push(request.url().to_owned());
            let response = if request.url().contains("page=3&") {
                Response::from_string("upstream down").with_status_code(502)
            } else {
                Response::from_string(page_body(2, 11, 10, 5))
                    .with_status_code(200)
                    .with_header(json_header())
            };
            request.respond(response).expect("response should succeed");
        }
        seen
    });

    let mut client = Client::new(&addr, 10, Duration::from_secs(1))?;
    let first_page: Vec<_> = (1..=10)
        .map(|id| artable_app::Artwork {
            id: artable_app::ArtworkId::new(id),
            title: format!("Work {id}"),
            place_of_origin: None,
            artist_display: String::new(),
            inscriptions: None,
            date_start: None,
            date_end: None,
        })
        .collect();

    let outcome =
        BulkSelection::begin(25, &SelectionSet::new(), 1, &first_page, 5).run(&mut client);
    assert_eq!(outcome.picked.len(), 20);
    assert_eq!(
        outcome.stop,
        BulkStop::FetchFailed {
            page: 3,
            error: "server error (502): upstream down".to_owned(),
        }
    );

    let seen = handle.join().expect("server thread should join");
    assert!(seen[0].contains("page=2&"));
    assert!(seen[1].contains("page=3&"));
    Ok(())
}
