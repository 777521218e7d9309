use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use introwall_core::{
    AddOutcome, CloudCommentStore, Comment, CommentBackend, CommentDraft, CommentStore,
    CommentTable, NewCommentRow, RemoteError, RemoteResult, StoreError, Subscription,
};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(5);

/// In-memory stand-in for the remote comments table.
#[derive(Default)]
struct MemoryTable {
    rows: Mutex<Vec<Comment>>,
    next_id: AtomicUsize,
    fail_select: AtomicBool,
    reject_insert: AtomicBool,
    calls: AtomicUsize,
    selects: AtomicUsize,
    /// Seconds added to `Utc::now()` when stamping inserted rows.
    clock_offset_secs: AtomicI64,
}

impl MemoryTable {
    fn with_rows(rows: Vec<Comment>) -> Arc<Self> {
        let table = Self::default();
        table.next_id.store(rows.len() + 1, Ordering::SeqCst);
        *table.rows.lock().unwrap() = rows;
        Arc::new(table)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    fn sorted_for(&self, person_id: &str, since: Option<DateTime<Utc>>) -> Vec<Comment> {
        let mut rows: Vec<Comment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.person_id == person_id)
            .filter(|row| since.map_or(true, |since| row.created_at >= since))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        rows
    }
}

impl CommentTable for MemoryTable {
    fn select_for_person(&self, person_id: &str) -> RemoteResult<Vec<Comment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.selects.fetch_add(1, Ordering::SeqCst);
        if self.fail_select.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        Ok(self.sorted_for(person_id, None))
    }

    fn select_since(&self, person_id: &str, since: DateTime<Utc>) -> RemoteResult<Vec<Comment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.selects.fetch_add(1, Ordering::SeqCst);
        Ok(self.sorted_for(person_id, Some(since)))
    }

    fn insert(&self, row: &NewCommentRow) -> RemoteResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_insert.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: 403,
                message: "row-level security".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(Comment {
            id: id.to_string(),
            person_id: row.person_id.clone(),
            name: Some(row.name.clone()),
            text: row.text.clone(),
            parent_id: row.parent_id.clone(),
            created_at: Utc::now()
                + ChronoDuration::seconds(self.clock_offset_secs.load(Ordering::SeqCst)),
            local: false,
        });
        Ok(())
    }
}

fn row(id: &str, person_id: &str, parent: Option<&str>, minute: u32) -> Comment {
    Comment {
        id: id.to_string(),
        person_id: person_id.to_string(),
        name: None,
        text: format!("text {id}"),
        parent_id: parent.map(str::to_string),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        local: false,
    }
}

fn wait_until(store: &mut dyn CommentStore, done: impl Fn(&dyn CommentStore) -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if done(&*store) {
            return true;
        }
        store.sync_wait(POLL);
    }
    done(&*store)
}

#[test]
fn snapshot_arrives_in_ascending_order_and_clears_loading() {
    let table = MemoryTable::with_rows(vec![
        row("2", "p1", Some("1"), 5),
        row("1", "p1", None, 1),
        row("9", "p2", None, 2),
    ]);
    let mut store = CloudCommentStore::open(table, "p1", POLL);
    assert!(store.status().loading);
    assert!(store.status().is_cloud());

    assert!(wait_until(&mut store, |store| !store.status().loading));

    let ids: Vec<&str> = store.comments().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(store.status().error, None);

    let tree = store.thread();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].replies[0].comment.id, "2");
}

#[test]
fn fetch_failure_is_reported_and_list_stays_empty() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    table.fail_select.store(true, Ordering::SeqCst);

    let mut store = CloudCommentStore::open(table, "p1", POLL);
    assert!(wait_until(&mut store, |store| !store.status().loading));

    let status = store.status();
    assert!(status.error.unwrap().contains("connection refused"));
    assert!(store.comments().is_empty());
}

#[test]
fn submitted_comment_appears_through_push_channel_once() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    let mut store = CloudCommentStore::open(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(wait_until(&mut store, |store| !store.status().loading));

    let outcome = store
        .add(&CommentDraft::new("  ", " welcome! ").reply_to("1"))
        .unwrap();
    assert_eq!(outcome, AddOutcome::Submitted);

    assert!(wait_until(&mut store, |store| store.comments().len() == 2));
    let pushed = &store.comments()[1];
    assert_eq!(pushed.text, "welcome!");
    assert_eq!(pushed.author(), "anonymous");
    assert_eq!(pushed.parent(), Some("1"));

    // Later polls see the row again (cursor is inclusive) but must not duplicate it.
    std::thread::sleep(POLL * 5);
    store.sync();
    assert_eq!(store.comments().len(), 2);
}

#[test]
fn blank_submission_makes_no_remote_call() {
    let table = MemoryTable::with_rows(Vec::new());
    let mut store = CloudCommentStore::open(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(wait_until(&mut store, |store| !store.status().loading));

    let before = table.rows.lock().unwrap().len();
    assert_eq!(
        store.add(&CommentDraft::new("amy", "   ")).unwrap(),
        AddOutcome::Ignored
    );
    assert_eq!(table.rows.lock().unwrap().len(), before);
}

#[test]
fn rejected_insert_propagates_error() {
    let table = MemoryTable::with_rows(Vec::new());
    table.reject_insert.store(true, Ordering::SeqCst);
    let mut store = CloudCommentStore::open(table, "p1", POLL);

    let err = store.add(&CommentDraft::new("amy", "hi")).unwrap_err();
    match err {
        StoreError::Remote(RemoteError::Rejected { status, .. }) => assert_eq!(status, 403),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn remove_is_disabled_for_cloud_rows() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    let mut store = CloudCommentStore::open(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(wait_until(&mut store, |store| !store.status().loading));

    store.remove("1").unwrap();

    assert_eq!(store.comments().len(), 1);
    assert_eq!(table.rows.lock().unwrap().len(), 1);
}

#[test]
fn topic_is_scoped_to_person() {
    let table = MemoryTable::with_rows(Vec::new());
    let store = CloudCommentStore::open(table, "p1", POLL);
    assert_eq!(store.topic(), "comments:p1");
}

#[test]
fn cancel_runs_once_and_stops_polling() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    let mut subscription =
        Subscription::start(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(subscription.is_active());
    assert!(subscription.next_timeout(WAIT).is_some());

    assert!(subscription.cancel());
    assert!(!subscription.cancel());
    assert!(!subscription.is_active());

    let calls = table.calls();
    std::thread::sleep(POLL * 5);
    assert_eq!(table.calls(), calls);
}

#[test]
fn rows_for_other_people_are_never_pushed() {
    let table = MemoryTable::with_rows(Vec::new());
    let subscription =
        Subscription::start(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(subscription.next_timeout(WAIT).is_some());

    table.rows.lock().unwrap().push(Comment {
        created_at: Utc::now() + ChronoDuration::seconds(1),
        ..row("50", "p2", None, 0)
    });
    std::thread::sleep(POLL * 5);

    assert!(subscription.drain().is_empty());
}

#[test]
fn wait_loaded_blocks_until_snapshot_is_applied() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    let mut store = CloudCommentStore::open(table, "p1", POLL);

    assert!(store.wait_loaded(WAIT));
    assert!(!store.status().loading);
    assert_eq!(store.comments().len(), 1);
}

#[test]
fn first_comment_arrives_even_when_backend_clock_lags() {
    let table = MemoryTable::with_rows(Vec::new());
    table.clock_offset_secs.store(-30, Ordering::SeqCst);
    let mut store = CloudCommentStore::open(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(store.wait_loaded(WAIT));
    assert!(store.comments().is_empty());

    assert_eq!(
        store.add(&CommentDraft::new("", "hi")).unwrap(),
        AddOutcome::Submitted
    );

    assert!(wait_until(&mut store, |store| store.comments().len() == 1));
    assert_eq!(store.comments()[0].text, "hi");
}

#[test]
fn later_rows_with_lagging_timestamps_still_arrive_after_first_push() {
    let table = MemoryTable::with_rows(Vec::new());
    table.clock_offset_secs.store(-30, Ordering::SeqCst);
    let mut store = CloudCommentStore::open(Arc::clone(&table) as Arc<dyn CommentTable>, "p1", POLL);
    assert!(store.wait_loaded(WAIT));

    store.add(&CommentDraft::new("", "one")).unwrap();
    assert!(wait_until(&mut store, |store| store.comments().len() == 1));
    store.add(&CommentDraft::new("", "two")).unwrap();

    assert!(wait_until(&mut store, |store| store.comments().len() == 2));
}

#[test]
fn backend_submit_inserts_without_reading_the_table() {
    let table = MemoryTable::with_rows(vec![row("1", "p1", None, 1)]);
    let backend = CommentBackend::Cloud {
        table: Arc::clone(&table) as Arc<dyn CommentTable>,
        poll_interval: POLL,
    };

    let outcome = backend
        .submit("p1", &CommentDraft::new("amy", "hello").reply_to("1"))
        .unwrap();
    assert_eq!(outcome, AddOutcome::Submitted);
    assert_eq!(
        backend.submit("p1", &CommentDraft::new("amy", "  ")).unwrap(),
        AddOutcome::Ignored
    );
    backend.remove("p1", "1").unwrap();

    assert_eq!(table.selects(), 0);
    assert_eq!(table.rows.lock().unwrap().len(), 2);
}
