//! Core domain logic for IntroWall.
//! This crate is the single source of truth for comment, people and
//! persistence invariants; front ends only render what it returns.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod people;
pub mod remote;
pub mod storage;
pub mod store;
pub mod thread;
pub mod view;

pub use config::{ConfigError, RemoteConfig, WallConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::comment::{
    Comment, CommentDraft, CommentId, CommentValidationError, ValidComment, ANONYMOUS_AUTHOR,
};
pub use model::person::{NewPerson, Person, PersonValidationError, ANONYMOUS_MEMBER};
pub use people::{DatasetCheck, DatasetSource, PeopleDirectory, PeopleError};
pub use remote::{
    CommentTable, NewCommentRow, PushEvent, RemoteError, RemoteResult, RestCommentTable,
    Subscription,
};
pub use storage::local::{LocalStorage, StorageError, StorageResult};
pub use store::{
    AddOutcome, BackendKind, CloudCommentStore, CommentBackend, CommentStore, LocalCommentStore,
    StoreError, StoreResult, StoreStatus,
};
pub use thread::{build_thread, count_nodes, CommentNode};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
