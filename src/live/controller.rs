//! A headless controller that keeps an up-to-date list of recent transactions
//! by listening to the change feed.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use rusqlite::Connection;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::{
    Error,
    live::ChangeFeed,
    transaction::{TransactionRecord, get_recent_transactions},
};

/// Why a fetch of recent transactions failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The backing store has not been set up yet. Treated as an empty list
    /// rather than a failure.
    NotProvisioned,
    /// Any other failure. The list keeps listening and recovers on the next
    /// change event.
    Transient(String),
}

/// A source of recent transactions for the live list.
pub trait TransactionReader: Send + Sync + 'static {
    /// Fetch the `limit` most recent transactions, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, FetchError>;
}

/// Reads recent transactions from the SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteTransactionReader {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl TransactionReader for SqliteTransactionReader {
    fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, FetchError> {
        let connection = self
            .db_connection
            .lock()
            .map_err(|_| FetchError::Transient("database lock was poisoned".to_owned()))?;

        match get_recent_transactions(limit, &connection) {
            Ok(transactions) => Ok(transactions),
            Err(Error::NotProvisioned) => Err(FetchError::NotProvisioned),
            Err(error) => Err(FetchError::Transient(error.to_string())),
        }
    }
}

/// What the live list currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    /// Not mounted yet.
    Idle,
    /// Mounted, first fetch still in flight.
    Loading,
    /// The most recently fetched transactions. An unprovisioned store reads
    /// as an empty list.
    Ready(Vec<TransactionRecord>),
    /// The last fetch failed.
    Failed(String),
}

struct Inner<R> {
    reader: R,
    feed: ChangeFeed,
    limit: usize,
    state: Mutex<ListState>,
    mounted: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Keeps the most recent transactions loaded while mounted.
///
/// This is the in-process counterpart of the browser path: where web clients
/// subscribe to the SSE stream and refetch the recent transactions fragment,
/// embedders (background jobs, native shells, integration tests) hold one of
/// these and read [state](LiveTransactionList::state).
///
/// On [mount](LiveTransactionList::mount) the list fetches once and then
/// refetches in full whenever the change feed announces any change. The list
/// never patches its contents incrementally. On
/// [unmount](LiveTransactionList::unmount) the listener is torn down and any
/// fetch still in flight is discarded.
pub struct LiveTransactionList<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for LiveTransactionList<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: TransactionReader> LiveTransactionList<R> {
    /// Create an unmounted list that will show at most `limit` transactions.
    pub fn new(reader: R, feed: ChangeFeed, limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                reader,
                feed,
                limit,
                state: Mutex::new(ListState::Idle),
                mounted: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    /// What the list currently shows.
    ///
    /// # Panics
    ///
    /// Panics if a previous fetch panicked while holding the state lock.
    pub fn state(&self) -> ListState {
        self.inner
            .state
            .lock()
            .expect("state lock was poisoned")
            .clone()
    }

    /// Start fetching and keep the list up to date.
    ///
    /// Does nothing if the list is already mounted.
    pub fn mount(&self) {
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            return;
        }

        *self
            .inner
            .state
            .lock()
            .expect("state lock was poisoned") = ListState::Loading;

        let mut events = self.inner.feed.subscribe();
        let list = self.clone();
        let task = tokio::spawn(async move {
            list.refresh();

            loop {
                match events.recv().await {
                    // A lagged subscriber missed events, which calls for the
                    // same full refetch as any single event.
                    Ok(_) | Err(RecvError::Lagged(_)) => list.refresh(),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        *self.inner.task.lock().expect("task lock was poisoned") = Some(task);
    }

    /// Stop listening for changes and discard any fetch still in flight.
    ///
    /// Does nothing if the list is not mounted, so calling this twice tears
    /// down at most once.
    pub fn unmount(&self) {
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(task) = self
            .inner
            .task
            .lock()
            .expect("task lock was poisoned")
            .take()
        {
            task.abort();
        }
    }

    fn refresh(&self) {
        let result = self.inner.reader.recent(self.inner.limit);

        // The list may have been unmounted while the fetch was running, in
        // which case the result must not be shown.
        if !self.inner.mounted.load(Ordering::SeqCst) {
            return;
        }

        let state = match result {
            Ok(transactions) => ListState::Ready(transactions),
            Err(FetchError::NotProvisioned) => ListState::Ready(Vec::new()),
            Err(FetchError::Transient(message)) => ListState::Failed(message),
        };

        *self.inner.state.lock().expect("state lock was poisoned") = state;
    }
}

#[cfg(test)]
mod live_transaction_list_tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    };

    use tokio::time::{Duration, sleep};

    use crate::{
        live::{ChangeEvent, ChangeFeed},
        transaction::{TransactionKind, TransactionRecord},
    };

    use super::{FetchError, ListState, LiveTransactionList, TransactionReader};

    fn some_transaction(amount: f64) -> TransactionRecord {
        TransactionRecord {
            id: 1,
            amount,
            kind: TransactionKind::Expense,
            category: "Groceries".to_owned(),
            description: None,
            origin: crate::transaction::TransactionOrigin::Web,
            created_at: time::OffsetDateTime::now_utc(),
        }
    }

    /// Returns a canned result and counts how many times it was asked.
    struct StubReader {
        calls: AtomicUsize,
        result: Result<Vec<TransactionRecord>, FetchError>,
    }

    impl StubReader {
        fn new(result: Result<Vec<TransactionRecord>, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result,
            })
        }
    }

    impl TransactionReader for Arc<StubReader> {
        fn recent(&self, _limit: usize) -> Result<Vec<TransactionRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    async fn wait_for_state<R: TransactionReader>(
        list: &LiveTransactionList<R>,
        predicate: impl Fn(&ListState) -> bool,
    ) -> ListState {
        for _ in 0..100 {
            let state = list.state();
            if predicate(&state) {
                return state;
            }
            sleep(Duration::from_millis(10)).await;
        }

        panic!("timed out waiting for state, last state: {:?}", list.state());
    }

    #[tokio::test]
    async fn starts_idle_and_loads_on_mount() {
        let reader = StubReader::new(Ok(vec![some_transaction(10.0)]));
        let list = LiveTransactionList::new(reader, ChangeFeed::new(), 10);

        assert_eq!(list.state(), ListState::Idle);

        list.mount();
        let state = wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;

        assert_eq!(state, ListState::Ready(vec![some_transaction(10.0)]));
    }

    #[tokio::test]
    async fn unprovisioned_store_reads_as_empty_list() {
        let reader = StubReader::new(Err(FetchError::NotProvisioned));
        let list = LiveTransactionList::new(reader, ChangeFeed::new(), 10);

        list.mount();
        let state = wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;

        assert_eq!(state, ListState::Ready(Vec::new()));
    }

    #[tokio::test]
    async fn transient_failure_sets_failed_state() {
        let reader = StubReader::new(Err(FetchError::Transient("boom".to_owned())));
        let list = LiveTransactionList::new(reader, ChangeFeed::new(), 10);

        list.mount();
        let state = wait_for_state(&list, |state| matches!(state, ListState::Failed(_))).await;

        assert_eq!(state, ListState::Failed("boom".to_owned()));
    }

    #[tokio::test]
    async fn refetches_on_every_change_event() {
        let reader = StubReader::new(Ok(Vec::new()));
        let feed = ChangeFeed::new();
        let list = LiveTransactionList::new(reader.clone(), feed.clone(), 10);

        list.mount();
        wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);

        for event in [
            ChangeEvent::Inserted,
            ChangeEvent::Updated,
            ChangeEvent::Deleted,
        ] {
            feed.publish(event);
        }

        for _ in 0..100 {
            if reader.calls.load(Ordering::SeqCst) == 4 {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }

        panic!(
            "want 4 fetches (1 initial + 3 events), got {}",
            reader.calls.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn unmount_stops_refetching() {
        let reader = StubReader::new(Ok(Vec::new()));
        let feed = ChangeFeed::new();
        let list = LiveTransactionList::new(reader.clone(), feed.clone(), 10);

        list.mount();
        wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;

        list.unmount();
        // A second unmount must be a no-op.
        list.unmount();

        feed.publish(ChangeEvent::Inserted);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            reader.calls.load(Ordering::SeqCst),
            1,
            "no fetches should happen after unmount"
        );
    }

    /// Blocks in `recent` until the test releases it.
    struct GatedReader {
        started: AtomicUsize,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl TransactionReader for Arc<GatedReader> {
        fn recent(&self, _limit: usize) -> Result<Vec<TransactionRecord>, FetchError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate
                .lock()
                .unwrap()
                .recv()
                .expect("gate sender dropped");

            Ok(vec![some_transaction(99.0)])
        }
    }

    #[tokio::test]
    async fn sqlite_reader_feeds_the_list() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        crate::transaction::create_transaction(
            TransactionRecord::build(10.0, TransactionKind::Expense, "Groceries"),
            &connection,
        )
        .unwrap();
        let reader = super::SqliteTransactionReader {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let list = LiveTransactionList::new(reader, ChangeFeed::new(), 10);

        list.mount();
        let state = wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;

        match state {
            ListState::Ready(transactions) => {
                assert_eq!(transactions.len(), 1);
                assert_eq!(transactions[0].category, "Groceries");
            }
            other => panic!("want Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sqlite_reader_treats_missing_table_as_unprovisioned() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        let reader = super::SqliteTransactionReader {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let list = LiveTransactionList::new(reader, ChangeFeed::new(), 10);

        list.mount();
        let state = wait_for_state(&list, |state| matches!(state, ListState::Ready(_))).await;

        assert_eq!(state, ListState::Ready(Vec::new()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lagged_listener_still_refetches() {
        let (release, gate) = mpsc::channel();
        let reader = Arc::new(GatedReader {
            started: AtomicUsize::new(0),
            gate: Mutex::new(gate),
        });
        let feed = ChangeFeed::new();
        let list = LiveTransactionList::new(reader.clone(), feed.clone(), 10);

        list.mount();
        while reader.started.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }

        // The listener is stuck in its first fetch and not consuming events,
        // so this overflows its buffer and it misses some of them.
        for _ in 0..24 {
            feed.publish(ChangeEvent::Inserted);
        }

        // Let the first fetch and every follow-up refetch through.
        for _ in 0..32 {
            release.send(()).unwrap();
        }

        for _ in 0..100 {
            if reader.started.load(Ordering::SeqCst) >= 2
                && matches!(list.state(), ListState::Ready(_))
            {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }

        panic!(
            "want a refetch after the listener lagged, got {} fetches, state {:?}",
            reader.started.load(Ordering::SeqCst),
            list.state()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unmount_discards_fetch_in_flight() {
        let (release, gate) = mpsc::channel();
        let reader = Arc::new(GatedReader {
            started: AtomicUsize::new(0),
            gate: Mutex::new(gate),
        });
        let list = LiveTransactionList::new(reader.clone(), ChangeFeed::new(), 10);

        list.mount();
        while reader.started.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }

        list.unmount();
        release.send(()).unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            list.state(),
            ListState::Loading,
            "the in-flight result should be discarded after unmount"
        );
    }
}
