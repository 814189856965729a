//! The polling channel
//!
//! A single task owns the channel and runs the request cycle:
//!
//! ```text
//!   Idle --(timer fires)--> InFlight --(reply or error)--> Idle
//!                              |
//!                       (watchdog fires)
//!                              v
//!                       InFlight { overdue }
//! ```
//!
//! Only one request is ever outstanding. Input that arrives while a request
//! is in flight is queued and carried by the next one, which then follows
//! after the short input delay instead of the backoff.

use std::sync::Arc;
use std::time::Duration;

use pollterm_protocol::{classify, PollRequest, ScreenUpdate, SessionToken};
use pollterm_utils::Result;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::backoff::{Backoff, PollTimings};
use super::options::TransportConfig;
use super::queue::InputQueue;
use super::transport::Transport;

/// Hooks through which the channel reports to the display surface
pub trait SessionObserver: Send + 'static {
    /// The host sent a fresh screen (already unescaped)
    fn on_screen_update(&mut self, content: String);

    /// The host reported no change since the previous reply
    fn on_unchanged(&mut self) {}

    /// Informational message, e.g. the session token at startup
    fn on_status(&mut self, message: String);

    /// An exchange failed or the host stopped answering
    fn on_connectivity_error(&mut self, message: String);
}

/// What callers feed into a running channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// An escaped key chunk
    Keys(String),
    /// New screen dimensions for subsequent requests
    Resize { cols: u16, rows: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    /// `overdue` is set once the watchdog has reported the request
    InFlight { overdue: bool },
}

/// Adaptive request/response loop for one session
pub struct PollingChannel<T: Transport, O: SessionObserver> {
    transport: Arc<T>,
    observer: O,
    token: SessionToken,
    config: TransportConfig,
    width: u16,
    height: u16,
    timings: PollTimings,
    queue: InputQueue,
    backoff: Backoff,
    state: PollState,
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    inputs_closed: bool,
    shutdown: CancellationToken,
    /// An error was reported and no exchange has succeeded since
    degraded: bool,
}

impl<T: Transport, O: SessionObserver> PollingChannel<T, O> {
    /// Create a channel and the sender that feeds it
    pub fn new(
        transport: Arc<T>,
        observer: O,
        token: SessionToken,
        config: TransportConfig,
        size: (u16, u16),
        timings: PollTimings,
    ) -> (Self, mpsc::UnboundedSender<SessionInput>) {
        let (tx, inputs) = mpsc::unbounded_channel();
        let channel = Self {
            transport,
            observer,
            token,
            config,
            width: size.0,
            height: size.1,
            backoff: Backoff::new(&timings),
            timings,
            queue: InputQueue::new(),
            state: PollState::Idle,
            inputs,
            inputs_closed: false,
            shutdown: CancellationToken::new(),
            degraded: false,
        };
        (channel, tx)
    }

    /// Stop the channel when `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run until shutdown
    pub async fn run(mut self) {
        self.observer.on_status(format!("Session: {}", self.token));
        debug!(session = %self.token, "polling channel started");

        let timer = sleep(self.timings.startup_delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                input = self.inputs.recv(), if !self.inputs_closed => {
                    if self.accept(input) {
                        let soon = Instant::now() + self.timings.input_delay;
                        if soon < timer.deadline() {
                            timer.as_mut().reset(soon);
                        }
                    }
                }
                _ = &mut timer => {
                    let Some(delay) = self.cycle().await else {
                        break;
                    };
                    debug!(delay_ms = delay.as_millis() as u64, "next poll scheduled");
                    timer.as_mut().reset(Instant::now() + delay);
                }
            }
        }

        debug!(session = %self.token, state = ?self.state, "polling channel stopped");
    }

    /// Take one input item; true when it should be sent promptly
    fn accept(&mut self, input: Option<SessionInput>) -> bool {
        match input {
            Some(SessionInput::Keys(chunk)) => {
                trace!(chunk = %chunk, "key input queued");
                self.queue.enqueue(chunk);
                true
            }
            Some(SessionInput::Resize { cols, rows }) => {
                debug!(cols, rows, "screen resized");
                self.width = cols;
                self.height = rows;
                true
            }
            None => {
                self.inputs_closed = true;
                false
            }
        }
    }

    fn compose(&mut self) -> PollRequest {
        PollRequest {
            method: self.config.method(),
            session: self.token.clone(),
            width: self.width,
            height: self.height,
            color: self.config.color_enabled(),
            cache_bust: self.config.cache_bust(),
            keys: self.queue.drain_all(),
        }
    }

    /// One request/response exchange; returns the delay before the next,
    /// or `None` on shutdown
    async fn cycle(&mut self) -> Option<Duration> {
        let request = self.compose();
        debug!(
            method = request.method.as_str(),
            payload_len = request.keys.len(),
            "sending poll request"
        );

        self.state = PollState::InFlight { overdue: false };
        let transport = Arc::clone(&self.transport);
        let exchange = async move { transport.exchange(&request).await };
        tokio::pin!(exchange);
        let watchdog = sleep(self.timings.watchdog);
        tokio::pin!(watchdog);

        let mut overdue = false;
        let mut input_arrived = false;

        let outcome = loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.state = PollState::Idle;
                    return None;
                }
                outcome = &mut exchange => break outcome,
                _ = &mut watchdog, if !overdue => {
                    overdue = true;
                    self.state = PollState::InFlight { overdue: true };
                    self.report_overdue();
                }
                input = self.inputs.recv(), if !self.inputs_closed => {
                    input_arrived |= self.accept(input);
                }
            }
        };

        self.state = PollState::Idle;
        self.apply(outcome);

        if input_arrived {
            Some(self.timings.input_delay)
        } else {
            Some(self.backoff.current())
        }
    }

    fn report_overdue(&mut self) {
        let millis = self.timings.watchdog.as_millis();
        warn!(watchdog_ms = millis as u64, state = ?self.state, "no reply from host, still waiting");
        self.degraded = true;
        self.observer
            .on_connectivity_error(format!("Connection lost: no reply after {millis}ms"));
    }

    fn apply(&mut self, outcome: Result<String>) {
        let body = match outcome {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "poll exchange failed");
                self.degraded = true;
                self.observer.on_connectivity_error(err.to_string());
                self.backoff.on_empty();
                return;
            }
        };

        if self.degraded {
            self.degraded = false;
            self.observer.on_status("Connection restored".to_string());
        }

        match classify(&body) {
            Ok(ScreenUpdate::Content(content)) => {
                self.observer.on_screen_update(content);
                self.backoff.on_content();
            }
            Ok(ScreenUpdate::Unchanged) => {
                self.observer.on_unchanged();
                self.backoff.on_empty();
            }
            Err(err) => {
                warn!(error = %err, body_len = body.len(), "ignoring malformed reply");
                self.backoff.on_empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pollterm_protocol::Method;
    use pollterm_utils::PolltermError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const IDEM: &str = "<?xml version=\"1.0\"?><idem></idem>";
    const SCREEN: &str = "<?xml version=\"1.0\"?><pre class=\"term\">$ </pre>";

    enum Reply {
        Body(&'static str),
        Status(u16),
        /// Answer `IDEM` after this long instead of the usual latency
        Slow(Duration),
    }

    #[derive(Debug, Clone)]
    struct Sent {
        at: Duration,
        request: PollRequest,
    }

    struct ScriptedTransport {
        started: Instant,
        latency: Duration,
        replies: Mutex<VecDeque<Reply>>,
        sent: Mutex<Vec<Sent>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(latency: Duration, replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                started: Instant::now(),
                latency,
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn times(&self) -> Vec<u64> {
            self.sent()
                .iter()
                .map(|s| s.at.as_millis() as u64)
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn exchange(&self, request: &PollRequest) -> Result<String> {
            self.sent.lock().unwrap().push(Sent {
                at: self.started.elapsed(),
                request: request.clone(),
            });
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let reply = self.replies.lock().unwrap().pop_front();
            let (delay, result) = match reply {
                None => (self.latency, Ok(IDEM.to_string())),
                Some(Reply::Body(body)) => (self.latency, Ok(body.to_string())),
                Some(Reply::Status(status)) => (
                    self.latency,
                    Err(PolltermError::http_status(status, "Service Unavailable")),
                ),
                Some(Reply::Slow(delay)) => (delay, Ok(IDEM.to_string())),
            };
            if !delay.is_zero() {
                sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Screen(String),
        Unchanged,
        Status(String),
        Error(String),
    }

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.seen()
                .into_iter()
                .filter_map(|s| match s {
                    Seen::Error(msg) => Some(msg),
                    _ => None,
                })
                .collect()
        }
    }

    impl SessionObserver for Recorder {
        fn on_screen_update(&mut self, content: String) {
            self.seen.lock().unwrap().push(Seen::Screen(content));
        }

        fn on_unchanged(&mut self) {
            self.seen.lock().unwrap().push(Seen::Unchanged);
        }

        fn on_status(&mut self, message: String) {
            self.seen.lock().unwrap().push(Seen::Status(message));
        }

        fn on_connectivity_error(&mut self, message: String) {
            self.seen.lock().unwrap().push(Seen::Error(message));
        }
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        recorder: Recorder,
        config: TransportConfig,
        tx: mpsc::UnboundedSender<SessionInput>,
        shutdown: CancellationToken,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Harness {
        fn start(latency: Duration, replies: Vec<Reply>) -> Self {
            Self::start_with(latency, replies, TransportConfig::new(Method::Post, false, true))
        }

        fn start_with(latency: Duration, replies: Vec<Reply>, config: TransportConfig) -> Self {
            let transport = ScriptedTransport::new(latency, replies);
            let recorder = Recorder::default();
            let shutdown = CancellationToken::new();
            let (channel, tx) = PollingChannel::new(
                Arc::clone(&transport),
                recorder.clone(),
                SessionToken::parse("abcdefghijklmnop").unwrap(),
                config.clone(),
                (80, 25),
                PollTimings::default(),
            );
            let handle = tokio::spawn(channel.with_shutdown(shutdown.clone()).run());
            Self {
                transport,
                recorder,
                config,
                tx,
                shutdown,
                handle,
            }
        }

        fn keys(&self, chunk: &str) {
            self.tx.send(SessionInput::Keys(chunk.to_string())).unwrap();
        }

        async fn stop(self) -> (Arc<ScriptedTransport>, Recorder) {
            self.shutdown.cancel();
            self.handle.await.unwrap();
            (self.transport, self.recorder)
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_after_startup_delay() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        sleep(ms(101)).await;
        let (transport, recorder) = harness.stop().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].at, ms(100));
        assert_eq!(sent[0].request.keys, "");
        assert_eq!(sent[0].request.width, 80);
        assert_eq!(sent[0].request.height, 25);
        assert_eq!(
            recorder.seen()[0],
            Seen::Status("Session: abcdefghijklmnop".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_replies_double_and_content_resets() {
        let replies = vec![
            Reply::Body(IDEM),
            Reply::Body(IDEM),
            Reply::Body(IDEM),
            Reply::Body(SCREEN),
            Reply::Body(IDEM),
        ];
        let harness = Harness::start(Duration::ZERO, replies);
        sleep(ms(500)).await;
        let (transport, recorder) = harness.stop().await;

        assert_eq!(transport.times(), vec![100, 102, 106, 114, 214, 414]);
        assert!(recorder
            .seen()
            .contains(&Seen::Screen("<?xml version=\"1.0\"?><pre class=\"term\">$ </pre>".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_delay_caps_at_max() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        sleep(ms(12_000)).await;
        let (transport, _) = harness.stop().await;

        let times = transport.times();
        let gaps: Vec<u64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(&gaps[..10], &[2, 4, 8, 16, 32, 64, 128, 256, 512, 1024]);
        assert!(gaps[10..].iter().all(|&gap| gap == 2000), "gaps: {gaps:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_two_requests_in_flight() {
        let harness = Harness::start(ms(50), vec![]);
        let mut expected = String::new();
        for i in 0..200 {
            let chunk = format!("k{i}");
            harness.keys(&chunk);
            expected.push_str(&chunk);
            sleep(ms(7)).await;
        }
        sleep(ms(500)).await;
        let (transport, _) = harness.stop().await;

        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
        let delivered: String = transport
            .sent()
            .iter()
            .map(|s| s.request.keys.as_str())
            .collect();
        assert_eq!(delivered, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_during_flight_is_sent_right_after_reply() {
        let harness = Harness::start(ms(50), vec![Reply::Body(SCREEN)]);
        sleep(ms(120)).await;
        harness.keys("a");
        sleep(ms(40)).await;
        let (transport, _) = harness.stop().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].request.keys, "");
        // Reply lands at 150; the backoff would wait until 250.
        assert_eq!(sent[1].at, ms(151));
        assert_eq!(sent[1].request.keys, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_input_preempts_long_backoff() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        sleep(ms(5000)).await;
        harness.keys("x");
        sleep(ms(10)).await;
        let (transport, _) = harness.stop().await;

        let sent = transport.sent();
        let with_key = sent
            .iter()
            .find(|s| s.request.keys == "x")
            .expect("key was never sent");
        assert_eq!(with_key.at, ms(5001));
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_before_startup_rides_first_request() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        harness.keys("%01");
        harness.keys("%02");
        sleep(ms(2)).await;
        let (transport, _) = harness.stop().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].at, ms(1));
        assert_eq!(sent[0].request.keys, "%01%02");
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_reports_and_keeps_waiting() {
        let harness = Harness::start(Duration::ZERO, vec![Reply::Slow(ms(8000))]);
        sleep(ms(6000)).await;
        harness.keys("late");
        sleep(ms(2200)).await;
        let (transport, recorder) = harness.stop().await;

        let sent = transport.sent();
        assert_eq!(sent[0].at, ms(100));
        assert_eq!(sent[1].at, ms(8101));
        assert_eq!(sent[1].request.keys, "late");
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);

        let errors = recorder.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("5000ms"));
        assert!(recorder
            .seen()
            .contains(&Seen::Status("Connection restored".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_is_reported_and_retried() {
        let harness = Harness::start(Duration::ZERO, vec![Reply::Status(503), Reply::Body(SCREEN)]);
        sleep(ms(103)).await;
        let (transport, recorder) = harness.stop().await;

        assert_eq!(transport.times(), vec![100, 102]);
        let seen = recorder.seen();
        assert_eq!(
            seen[1],
            Seen::Error("Connection error, status: 503 Service Unavailable".to_string())
        );
        assert_eq!(seen[2], Seen::Status("Connection restored".to_string()));
        assert!(matches!(seen[3], Seen::Screen(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_reply_counts_as_unchanged() {
        let harness = Harness::start(Duration::ZERO, vec![Reply::Body("not xml at all")]);
        sleep(ms(103)).await;
        let (transport, recorder) = harness.stop().await;

        assert_eq!(transport.times(), vec![100, 102]);
        let seen = recorder.seen();
        assert!(recorder.errors().is_empty());
        assert!(!seen.iter().any(|s| matches!(s, Seen::Screen(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_reply_notifies_observer() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        sleep(ms(101)).await;
        let (_, recorder) = harness.stop().await;
        assert_eq!(recorder.seen().last(), Some(&Seen::Unchanged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggles_apply_to_next_request() {
        let config = TransportConfig::new(Method::Post, false, true);
        let harness = Harness::start_with(Duration::ZERO, vec![], config);
        sleep(ms(101)).await;
        harness.config.toggle_get();
        harness.config.toggle_color();
        sleep(ms(2)).await;
        let (transport, _) = harness.stop().await;

        let sent = transport.sent();
        assert_eq!(sent[0].request.method, Method::Post);
        assert!(!sent[0].request.color);
        assert_eq!(sent[1].request.method, Method::Get);
        assert!(sent[1].request.color);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_applies_to_next_request() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        sleep(ms(101)).await;
        harness
            .tx
            .send(SessionInput::Resize { cols: 132, rows: 43 })
            .unwrap();
        sleep(ms(2)).await;
        let (transport, _) = harness.stop().await;

        let last = transport.sent().pop().unwrap();
        assert_eq!((last.request.width, last.request.height), (132, 43));
        assert_eq!(last.at, ms(102));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_flight_stops_channel() {
        let harness = Harness::start(Duration::ZERO, vec![Reply::Slow(ms(60_000))]);
        sleep(ms(200)).await;
        let (transport, _) = harness.stop().await;
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_keeps_polling() {
        let harness = Harness::start(Duration::ZERO, vec![]);
        let Harness {
            transport,
            tx,
            shutdown,
            handle,
            ..
        } = harness;
        drop(tx);
        sleep(ms(110)).await;
        shutdown.cancel();
        handle.await.unwrap();
        assert!(transport.sent().len() >= 3);
    }
}
