//! Loader tests against a one-shot HTTP server on the loopback interface.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use ci_source::{ColumnSelection, SourceConfig, load_table};

const BODY: &str = "date,control,conversions\n2024-01-01,1,10\n2024-01-02,2,12\n2024-01-03,3,14\n";

/// Read the request head so the client sees a well-behaved peer.
fn drain_request(stream: &TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
}

/// Serve exactly one connection with `handler`; returns the base URL.
fn serve_once<F>(handler: F) -> String
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            handler(stream);
        }
    });
    format!("http://{addr}")
}

fn respond(mut stream: TcpStream, status: &str, body: &str) {
    drain_request(&stream);
    let resp = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(resp.as_bytes()).unwrap();
    stream.flush().unwrap();
}

#[test]
fn reads_csv_over_http() {
    let base = serve_once(|s| respond(s, "200 OK", BODY));
    let url = format!("{base}/exports/daily.csv");
    let src = load_table(&url, &ColumnSelection::Auto, &SourceConfig::default()).unwrap();

    assert_eq!(src.table.len(), 3);
    assert_eq!(src.endpoint, url);
    assert_eq!(src.n_bytes, BODY.len());
    assert_eq!(src.table.outcomes(), vec![10.0, 12.0, 14.0]);
}

#[test]
fn non_success_status_is_source_unavailable() {
    let base = serve_once(|s| respond(s, "404 Not Found", "gone"));
    let url = format!("{base}/exports/daily.csv");
    let err = load_table(&url, &ColumnSelection::Auto, &SourceConfig::default()).unwrap_err();

    assert_eq!(err.kind(), "source_unavailable");
    assert!(err.to_string().contains("404"), "{err}");
}

#[test]
fn stalled_server_times_out() {
    let base = serve_once(|s| {
        drain_request(&s);
        // Hold the connection open without answering.
        thread::sleep(Duration::from_secs(5));
        drop(s);
    });
    let url = format!("{base}/exports/daily.csv");
    let cfg = SourceConfig { timeout_secs: 1, ..Default::default() };

    let started = Instant::now();
    let err = load_table(&url, &ColumnSelection::Auto, &cfg).unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.kind(), "source_unavailable");
    assert!(err.to_string().contains("timed out"), "{err}");
    assert!(elapsed < Duration::from_secs(4), "elapsed={elapsed:?}");
}
