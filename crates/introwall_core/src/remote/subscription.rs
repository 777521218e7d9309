//! Per-person push channel for the cloud backend.
//!
//! A background worker performs the initial ordered fetch, then polls for
//! rows created at or after the newest server timestamp it has seen (the
//! whole person scope while it has seen none) and forwards unseen rows
//! over a channel. The owner drains the channel from its own thread.
//!
//! # Invariants
//! - The snapshot event is always delivered before any insert event.
//! - A row id is forwarded at most once per subscription.
//! - Cancellation runs exactly once, whether through `cancel` or `Drop`,
//!   and no table call starts after it returns.

use super::{CommentTable, RemoteError, RemoteResult};
use crate::model::comment::Comment;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Messages delivered to the subscription owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Result of the initial ordered fetch.
    Snapshot(RemoteResult<Vec<Comment>>),
    /// A row inserted after the snapshot.
    Inserted(Comment),
}

/// Cancellable handle to a running push channel.
pub struct Subscription {
    topic: String,
    events: Receiver<PushEvent>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Starts the snapshot fetch and the insert poller for `person_id`.
    pub fn start(table: Arc<dyn CommentTable>, person_id: &str, interval: Duration) -> Self {
        let topic = format!("comments:{person_id}");
        let (event_tx, events) = mpsc::channel();
        let (stop, stop_rx) = mpsc::channel();
        let person_id = person_id.to_string();
        let worker_topic = topic.clone();
        let fallback_tx = event_tx.clone();

        let worker = std::thread::Builder::new()
            .name(format!("introwall-{topic}"))
            .spawn(move || run_worker(table, person_id, interval, event_tx, stop_rx));

        let worker = match worker {
            Ok(handle) => {
                info!("event=subscription_start module=remote status=ok topic={worker_topic}");
                Some(handle)
            }
            Err(err) => {
                warn!(
                    "event=subscription_start module=remote status=error topic={} error={}",
                    worker_topic, err
                );
                let _ = fallback_tx.send(PushEvent::Snapshot(Err(RemoteError::Transport(
                    format!("push worker unavailable: {err}"),
                ))));
                None
            }
        };

        Self {
            topic,
            events,
            stop: Some(stop),
            worker,
        }
    }

    /// Channel name, `comments:{person_id}`.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether `cancel` has not run yet.
    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }

    /// Returns every event already delivered, without blocking.
    pub fn drain(&self) -> Vec<PushEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return drained,
            }
        }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<PushEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Returns `true` only for the call that actually cancelled.
    pub fn cancel(&mut self) -> bool {
        let Some(stop) = self.stop.take() else {
            return false;
        };
        drop(stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(
                    "event=subscription_cancel module=remote status=error topic={} error=worker_panicked",
                    self.topic
                );
            }
        }
        info!(
            "event=subscription_cancel module=remote status=ok topic={}",
            self.topic
        );
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_worker(
    table: Arc<dyn CommentTable>,
    person_id: String,
    interval: Duration,
    events: Sender<PushEvent>,
    stop: Receiver<()>,
) {
    let snapshot = table.select_for_person(&person_id);

    // Only server-assigned timestamps may narrow the poll; the local clock
    // can run ahead of the backend.
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor: Option<DateTime<Utc>> = None;
    if let Ok(rows) = &snapshot {
        seen.extend(rows.iter().map(|row| row.id.clone()));
        cursor = rows.iter().map(|row| row.created_at).max();
    }
    if events.send(PushEvent::Snapshot(snapshot)).is_err() {
        return;
    }

    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }

        let polled = match cursor {
            Some(since) => table.select_since(&person_id, since),
            None => table.select_for_person(&person_id),
        };
        let rows = match polled {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    "event=subscription_poll module=remote status=error person_id={} error={}",
                    person_id, err
                );
                continue;
            }
        };

        for row in rows {
            if row.person_id != person_id || !seen.insert(row.id.clone()) {
                continue;
            }
            cursor = Some(cursor.map_or(row.created_at, |since| since.max(row.created_at)));
            debug!(
                "event=subscription_push module=remote status=ok person_id={} comment_id={}",
                person_id, row.id
            );
            if events.send(PushEvent::Inserted(row)).is_err() {
                return;
            }
        }
    }
}
