use keg_backends::{NotifyError, WebhookNotifier};
use keg_traits::Notifier;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::time::Duration;

// Accept `requests` requests in turn, answer each with `status`, and hand
// back the bodies.
fn server(status: &'static str, requests: usize) -> (String, std::thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    let handle = std::thread::spawn(move || {
        let mut bodies = Vec::new();
        for _ in 0..requests {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            bodies.push(String::from_utf8(body).unwrap());
        }
        bodies
    });
    (url, handle)
}

fn one_shot_server(status: &'static str) -> (String, std::thread::JoinHandle<Vec<String>>) {
    server(status, 1)
}

#[test]
fn posts_content_json() {
    let (url, server) = one_shot_server("204 No Content");
    let n = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
    n.notify("Pivo! 🍺").unwrap();
    let body: serde_json::Value = serde_json::from_str(&server.join().unwrap()[0]).unwrap();
    assert_eq!(body["content"], "Pivo! 🍺");
}

#[test]
fn non_success_status_is_an_error() {
    let (url, server) = one_shot_server("500 Internal Server Error");
    let n = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
    let err = n.notify("hello").unwrap_err();
    server.join().unwrap();
    match err.downcast_ref::<NotifyError>() {
        Some(NotifyError::Status(500)) => {}
        other => panic!("expected Status(500), got {other:?}"),
    }
}

#[test]
fn one_notifier_delivers_repeated_messages() {
    let (url, server) = server("200 OK", 2);
    let n = WebhookNotifier::new(url.as_str(), Duration::from_secs(5)).unwrap();
    assert_eq!(n.url(), url);
    n.notify("first").unwrap();
    n.notify("second").unwrap();
    let bodies: Vec<serde_json::Value> = server
        .join()
        .unwrap()
        .iter()
        .map(|b| serde_json::from_str(b).unwrap())
        .collect();
    assert_eq!(bodies[0]["content"], "first");
    assert_eq!(bodies[1]["content"], "second");
}
