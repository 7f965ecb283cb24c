//! Retry and backoff timing of `RestClient`, driven by a scripted transport
//! on a paused clock.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use jester::{
    ClientConfig, Context, Error, ErrorKind, HttpClient, Method, Request, Response, Result,
    RestClient, RetryPolicy,
};
use serde_json::{Value, json};
use tokio::time::Instant;

/// Replays canned outcomes and records when each attempt happened.
struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<Response>>>,
    attempts: Mutex<Vec<(Instant, Request)>>,
}

impl ScriptedTransport {
    fn new(outcomes: impl IntoIterator<Item = Result<Response>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempts
            .lock()
            .expect("lock")
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    fn attempt_count(&self) -> usize {
        self.attempts.lock().expect("lock").len()
    }
}

impl HttpClient for ScriptedTransport {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.attempts
            .lock()
            .expect("lock")
            .push((Instant::now(), request));
        let outcome = self
            .outcomes
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(Error::no_type("script exhausted")));
        std::future::ready(outcome)
    }
}

fn status(code: u16, body: &str) -> Result<Response> {
    Ok(Response::new(code, HashMap::new(), body.to_string()))
}

fn rest(transport: &ScriptedTransport, retry: RetryPolicy) -> RestClient<&ScriptedTransport> {
    let config = ClientConfig::builder().name("scripted").retry(retry).build();
    RestClient::with_transport(transport, &config)
}

fn request() -> Request {
    Request::builder(Method::Get, "http://upstream.local/names").build()
}

fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn bad_request_then_success_waits_one_second() {
    let transport = ScriptedTransport::new([
        status(400, "slow down"),
        status(200, r#"{"name":"Ada"}"#),
    ]);

    let value: Value = rest(&transport, RetryPolicy::default())
        .request(&Context::new(), request())
        .await
        .expect("second attempt succeeds");

    assert_eq!(value, json!({"name": "Ada"}));
    assert_eq!(transport.attempt_count(), 2);
    assert_eq!(gaps(&transport.attempt_times()), vec![Duration::from_secs(1)]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_attempts_sleep_only_between_attempts() {
    let transport = ScriptedTransport::new([
        status(503, "one"),
        status(503, "two"),
        status(503, "three"),
    ]);

    let start = Instant::now();
    let err = rest(&transport, RetryPolicy::default())
        .request::<Value>(&Context::new(), request())
        .await
        .expect_err("always 503");

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Not Found: three");
    assert_eq!(
        gaps(&transport.attempt_times()),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn longer_policy_doubles_until_cap() {
    let transport = ScriptedTransport::new((0..5).map(|_| status(429, "limited")));
    let policy = RetryPolicy {
        max_attempts: 5,
        max_backoff: Duration::from_secs(5),
        ..RetryPolicy::default()
    };

    let err = rest(&transport, policy)
        .request::<Value>(&Context::new(), request())
        .await
        .expect_err("always 429");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(
        gaps(&transport.attempt_times()),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(5),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_status_is_retried() {
    let transport = ScriptedTransport::new([
        status(102, "processing"),
        status(200, "[1, 2]"),
    ]);

    let value: Vec<u8> = rest(&transport, RetryPolicy::default())
        .request(&Context::new(), request())
        .await
        .expect("second attempt succeeds");

    assert_eq!(value, vec![1, 2]);
    assert_eq!(transport.attempt_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn redirect_status_is_decoded() {
    let transport = ScriptedTransport::new([status(302, r#"{"name":"Ada"}"#)]);

    let value: Value = rest(&transport, RetryPolicy::default())
        .request(&Context::new(), request())
        .await
        .expect("3xx decodes");

    assert_eq!(value["name"], "Ada");
    assert_eq!(transport.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_error_is_returned_at_once() {
    let transport = ScriptedTransport::new([
        Err(Error::no_type("connection refused")),
        status(200, "{}"),
    ]);

    let start = Instant::now();
    let err = rest(&transport, RetryPolicy::default())
        .request::<Value>(&Context::new(), request())
        .await
        .expect_err("no retry");

    assert_eq!(err.kind(), ErrorKind::NoType);
    assert_eq!(transport.attempt_count(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn unreadable_error_body_is_not_retried() {
    let transport = ScriptedTransport::new([
        Ok(Response::new(500, HashMap::new(), vec![0xff, 0xfe])),
        status(200, "{}"),
    ]);

    let err = rest(&transport, RetryPolicy::default())
        .request::<Value>(&Context::new(), request())
        .await
        .expect_err("no retry");

    assert_eq!(err.kind(), ErrorKind::NoType);
    assert_eq!(transport.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_during_backoff_cancels() {
    let transport = ScriptedTransport::new([
        status(500, "one"),
        status(500, "two"),
        status(200, "{}"),
    ]);

    let ctx = Context::with_timeout(Duration::from_millis(1500));
    let start = Instant::now();
    let err = rest(&transport, RetryPolicy::default())
        .request::<Value>(&ctx, request())
        .await
        .expect_err("deadline hits during the 2s backoff");

    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert_eq!(err.to_string(), "context deadline exceeded");
    assert_eq!(transport.attempt_count(), 2);
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_stops_retrying() {
    let transport = ScriptedTransport::new([status(500, "one"), status(200, "{}")]);

    let ctx = Context::new();
    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceler.cancel();
    });

    let err = rest(&transport, RetryPolicy::default())
        .request::<Value>(&ctx, request())
        .await
        .expect_err("canceled");

    assert!(err.is_canceled());
    assert_eq!(transport.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn single_attempt_policy_never_sleeps() {
    let transport = ScriptedTransport::new([status(400, "nope")]);

    let start = Instant::now();
    let err = rest(&transport, RetryPolicy::no_retry())
        .request::<Value>(&Context::new(), request())
        .await
        .expect_err("400");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(start.elapsed(), Duration::ZERO);
}
