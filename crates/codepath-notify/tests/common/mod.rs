//! Local stand-ins for the GitHub API, the token endpoint and the mail relay.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

/// A request as the HTTP stub saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// `GET /path?query HTTP/1.1`
    pub request_line: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Serves canned responses in order, one per connection, on a background thread.
pub struct HttpStub {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl HttpStub {
    pub fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        std::thread::spawn(move || {
            let mut responses = responses.into_iter();
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                stream
                    .set_read_timeout(Some(Duration::from_secs(5)))
                    .unwrap();

                let recorded = read_request(&mut stream);
                log.lock().unwrap().push(recorded);

                let (status, body) = responses
                    .next()
                    .unwrap_or((500, r#"{"message":"unexpected request"}"#.to_string()));
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Recorded {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).unwrap();

    Recorded {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// JSON body of one files-listing page.
pub fn files_page<S: AsRef<str>>(files: &[S]) -> String {
    let entries: Vec<_> = files
        .iter()
        .map(|f| serde_json::json!({ "filename": f.as_ref(), "status": "modified" }))
        .collect();
    serde_json::Value::Array(entries).to_string()
}

pub const EHLO_XOAUTH2: &str =
    "250-relay.test\r\n250-SIZE 35882577\r\n250-8BITMIME\r\n250 AUTH LOGIN PLAIN XOAUTH2\r\n";

/// One exchange with the scripted relay.
pub enum Step {
    /// Read one line starting with the prefix, answer with the reply.
    Expect(&'static str, &'static str),
    /// Read message data up to the lone `.`, answer with the reply.
    Data(&'static str),
    /// Drop the connection.
    Hangup,
}

/// Plain-TCP SMTP relay; accepts one connection per script, in order.
/// Resolves to every line received, across all connections.
pub async fn relay(scripts: Vec<Vec<Step>>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut received = Vec::new();
        for steps in scripts {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut reader = tokio::io::BufReader::new(read);

            write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();
            for step in steps {
                match step {
                    Step::Expect(prefix, reply) => {
                        let mut line = String::new();
                        reader.read_line(&mut line).await.unwrap();
                        let line = line.trim_end().to_string();
                        assert!(line.starts_with(prefix), "expected {prefix:?}, got {line:?}");
                        received.push(line);
                        write.write_all(reply.as_bytes()).await.unwrap();
                    }
                    Step::Data(reply) => {
                        loop {
                            let mut line = String::new();
                            reader.read_line(&mut line).await.unwrap();
                            let line = line.trim_end_matches(['\r', '\n']).to_string();
                            if line == "." {
                                break;
                            }
                            received.push(line);
                        }
                        write.write_all(reply.as_bytes()).await.unwrap();
                    }
                    Step::Hangup => break,
                }
            }
        }
        received
    });

    (port, handle)
}
