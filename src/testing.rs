//! In-memory transport for tests.
//!
//! Routes are keyed by verb and URL. A route with several replies serves
//! them in order and then keeps repeating the last one. Unknown routes fail
//! with a non-retryable error, which makes unregistered HEAD probes count as
//! unreachable. [`FakeTransport::refuse_first`] produces genuine
//! connection-refused errors from reqwest for retry tests.

use crate::error::{Result, ScoutError};
use crate::http::{HttpRequest, HttpResponse, Transport, Verb};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Answer(u16, String),
    Fail,
    Refuse,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<(Verb, String), Vec<Reply>>,
    log: Vec<HttpRequest>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every request for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, verb: Verb, url: &str, status: u16, body: &str) -> Self {
        self.respond_seq(verb, url, vec![(status, body)])
    }

    pub fn respond_seq(self, verb: Verb, url: &str, replies: Vec<(u16, &str)>) -> Self {
        let replies = replies
            .into_iter()
            .map(|(s, b)| Reply::Answer(s, b.to_string()))
            .collect();
        self.route(verb, url, replies)
    }

    pub fn fail(self, verb: Verb, url: &str) -> Self {
        self.route(verb, url, vec![Reply::Fail])
    }

    /// Answer the first `times` requests on the route with a refused
    /// connection before the replies registered so far.
    pub fn refuse_first(self, verb: Verb, url: &str, times: usize) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let replies = state.routes.entry((verb, url.to_string())).or_default();
            for _ in 0..times {
                replies.insert(0, Reply::Refuse);
            }
        }
        self
    }

    /// Shorthand for a HEAD route answering 200.
    pub fn reachable(self, url: &str) -> Self {
        self.respond(Verb::Head, url, 200, "")
    }

    fn route(self, verb: Verb, url: &str, replies: Vec<Reply>) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((verb, url.to_string()), replies);
        self
    }

    pub fn calls(&self, verb: Verb, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|r| r.verb == verb && r.url == url)
            .count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    fn next_reply(&self, request: &HttpRequest) -> Option<Reply> {
        let mut state = self.state.lock().unwrap();
        state.log.push(request.clone());
        let replies = state.routes.get_mut(&(request.verb, request.url.clone()))?;
        if replies.len() > 1 {
            Some(replies.remove(0))
        } else {
            replies.first().cloned()
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.next_reply(&request);
        self.state.lock().unwrap().in_flight -= 1;

        match reply {
            Some(Reply::Answer(status, body)) => Ok(HttpResponse { status, body }),
            Some(Reply::Refuse) => Err(refused(request.url).await),
            Some(Reply::Fail) | None => Err(ScoutError::Simulated(request.url)),
        }
    }
}

/// A real reqwest connect error, from dialing a loopback port that was just
/// released.
async fn refused(url: String) -> ScoutError {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .unwrap()
        .port();
    let source = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap_err();
    ScoutError::Transport { url, source }
}
