//! Tests for deferring work through queued signal connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use cashpoint_core::{ConnectionType, EventLoop, EventLoopError, Signal};
use parking_lot::Mutex;

/// An object that handles its own requests on a later loop turn.
struct Searcher {
    request: Signal<String>,
    handled: Mutex<Vec<String>>,
}

impl Searcher {
    fn new(event_loop: &EventLoop) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let request = Signal::new();
            let weak = weak.clone();
            request.connect_queued(event_loop, move |text: &String| {
                if let Some(searcher) = weak.upgrade() {
                    searcher.handle(text);
                }
            });
            Self {
                request,
                handled: Mutex::new(Vec::new()),
            }
        })
    }

    fn search(&self, text: &str) {
        self.request.emit(text.to_owned());
    }

    fn handle(&self, text: &str) {
        self.handled.lock().push(text.to_owned());
    }
}

#[test]
fn test_self_dispatch_runs_on_next_turn() {
    let event_loop = EventLoop::new();
    let searcher = Searcher::new(&event_loop);

    searcher.search("tverskaya");
    assert!(searcher.handled.lock().is_empty());
    assert!(event_loop.has_pending());

    assert_eq!(event_loop.process_pending(), 1);
    assert_eq!(*searcher.handled.lock(), vec!["tverskaya".to_string()]);
}

#[test]
fn test_self_dispatch_is_fifo() {
    let event_loop = EventLoop::new();
    let searcher = Searcher::new(&event_loop);

    for text in ["a", "ab", "abc"] {
        searcher.search(text);
    }
    event_loop.run_until_idle();

    assert_eq!(*searcher.handled.lock(), vec!["a", "ab", "abc"]);
}

#[test]
fn test_dropped_receiver_is_skipped() {
    let event_loop = EventLoop::new();
    let searcher = Searcher::new(&event_loop);
    searcher.search("orphan");
    drop(searcher);

    assert_eq!(event_loop.run_until_idle(), 1);
}

#[test]
fn test_handler_posting_more_work_waits_for_next_turn() {
    let event_loop = EventLoop::new();
    let turns = Arc::new(AtomicUsize::new(0));

    let inner_loop = event_loop.clone();
    let counter = turns.clone();
    event_loop
        .post(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let counter = counter.clone();
            inner_loop
                .post(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        })
        .unwrap();

    assert_eq!(event_loop.process_pending(), 1);
    assert_eq!(turns.load(Ordering::SeqCst), 1);
    assert_eq!(event_loop.process_pending(), 1);
    assert_eq!(turns.load(Ordering::SeqCst), 2);
}

#[test]
fn test_mixed_connections() {
    let event_loop = EventLoop::new();
    let signal = Signal::<u32>::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let direct = log.clone();
    signal.connect_with_type(
        move |n| direct.lock().push(format!("direct {n}")),
        ConnectionType::Direct,
    );
    let queued = log.clone();
    signal.connect_with_type(
        move |n| queued.lock().push(format!("queued {n}")),
        ConnectionType::Queued(event_loop.clone()),
    );

    signal.emit(1);
    signal.emit(2);
    assert_eq!(*log.lock(), vec!["direct 1", "direct 2"]);

    event_loop.process_pending();
    assert_eq!(
        *log.lock(),
        vec!["direct 1", "direct 2", "queued 1", "queued 2"]
    );
}

#[test]
fn test_quit_rejects_new_work() {
    let event_loop = EventLoop::new();
    event_loop.post(|| {}).unwrap();
    event_loop.quit();

    assert!(!event_loop.is_running());
    assert_eq!(event_loop.post(|| {}).unwrap_err(), EventLoopError::Stopped);
    assert_eq!(event_loop.run_until_idle(), 1);
}

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_emit_to_stopped_loop_warns() {
    let writer = CaptureWriter::default();
    let make_writer = writer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || make_writer.clone())
        .with_ansi(false)
        .finish();

    let event_loop = EventLoop::new();
    let signal = Signal::<()>::new();
    signal.connect_queued(&event_loop, |_| {});
    event_loop.quit();

    tracing::subscriber::with_default(subscriber, || signal.emit(()));

    let output = String::from_utf8_lossy(&writer.0.lock()).into_owned();
    assert!(output.contains("WARN"), "{output}");
    assert!(
        output.contains("Failed to queue signal invocation"),
        "{output}"
    );
}
