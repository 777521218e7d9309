//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose wall, comment and people use cases to Dart via FRB.
//! - Resolve configuration and the comment backend per call.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported in response envelopes, never thrown.

use introwall_core::db::open_db;
use introwall_core::view::{storage_indicator, CommentView, PersonCardView};
use introwall_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, AddOutcome, CommentBackend, CommentDraft, CommentStore, DatasetCheck,
    LocalStorage, NewPerson, PeopleDirectory, WallConfig,
};
use log::warn;
use std::sync::OnceLock;
use std::time::Duration;

const LOAD_TIMEOUT: Duration = Duration::from_secs(3);
static WALL_CONFIG: OnceLock<Result<WallConfig, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Storage indicator label of the configured backend (`cloud|local only`).
#[flutter_rust_bridge::frb(sync)]
pub fn backend_label() -> String {
    match resolve_config() {
        Ok(config) => config.backend_kind().label().to_string(),
        Err(err) => format!("unavailable: {err}"),
    }
}

/// One profile card as shown on the wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonItem {
    pub person_id: String,
    /// Avatar glyph.
    pub initial: String,
    pub name: String,
    pub city: Option<String>,
    /// MBTI, zodiac and gender labels in display order.
    pub badges: Vec<String>,
    /// First tags, `#`-prefixed.
    pub tags: Vec<String>,
    pub headline: Option<String>,
    pub intro: Option<String>,
}

/// Wall search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallSearchResponse {
    /// Matching people in dataset order.
    pub items: Vec<PersonItem>,
    /// Size of the whole people list.
    pub total: u32,
    /// Dataset self-check result.
    pub dataset_ok: bool,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// One comment in a flattened thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentItem {
    pub comment_id: String,
    pub parent_id: Option<String>,
    /// Nesting level, 0 for top-level comments.
    pub depth: u32,
    pub author: String,
    pub timestamp: String,
    pub text: String,
}

/// Comment thread response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThreadResponse {
    /// Comments in display order: each parent before its replies.
    pub items: Vec<CommentItem>,
    pub loading: bool,
    pub error: Option<String>,
    /// Storage indicator line for the card.
    pub storage_line: String,
    pub message: String,
}

/// Generic action response envelope for write calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created record when it is known immediately.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Filters the people list by case-insensitive substring match.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank query returns everyone.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn wall_search(query: String) -> WallSearchResponse {
    let result = with_storage(|_, storage| {
        let directory = PeopleDirectory::load(storage);
        let items = directory
            .search(&query)
            .into_iter()
            .map(to_person_item)
            .collect::<Vec<_>>();
        Ok((items, directory.people().len(), directory.dataset_check()))
    });

    match result {
        Ok((items, total, check)) => {
            let message = if items.is_empty() {
                "No members match this search.".to_string()
            } else {
                format!("Found {} member(s).", items.len())
            };
            WallSearchResponse {
                items,
                total: u32::try_from(total).unwrap_or(u32::MAX),
                dataset_ok: check == DatasetCheck::Ok,
                message,
            }
        }
        Err(err) => WallSearchResponse {
            items: Vec::new(),
            total: 0,
            dataset_ok: false,
            message: format!("wall_search failed: {err}"),
        },
    }
}

/// Loads one person's comments as a flattened reply tree.
///
/// # FFI contract
/// - Sync call; with a remote configured it waits briefly for the
///   initial fetch and reports `loading=true` if it did not finish.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn comment_thread(person_id: String) -> CommentThreadResponse {
    let result = with_storage(|config, storage| {
        let backend = CommentBackend::from_config(config, storage).map_err(|err| err.to_string())?;
        let mut store = backend.open_person(person_id.trim());
        store.wait_loaded(LOAD_TIMEOUT);

        let status = store.status();
        let mut items = Vec::new();
        for node in store.thread() {
            flatten(&CommentView::from_node(&node), &mut items);
        }
        Ok(CommentThreadResponse {
            message: format!("{} comment(s).", items.len()),
            items,
            loading: status.loading,
            storage_line: storage_indicator(&status),
            error: status.error,
        })
    });

    result.unwrap_or_else(|err| CommentThreadResponse {
        items: Vec::new(),
        loading: false,
        error: Some(err.clone()),
        storage_line: String::new(),
        message: format!("comment_thread failed: {err}"),
    })
}

/// Posts a comment, or a reply when `parent_id` is set.
///
/// # FFI contract
/// - Blank text is ignored and reported as not ok.
/// - Local posts return the new id; cloud posts return no id because the
///   row arrives later through the push channel.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn comment_add(
    person_id: String,
    name: String,
    text: String,
    parent_id: Option<String>,
) -> ActionResponse {
    let mut draft = CommentDraft::new(name, text);
    if let Some(parent_id) = parent_id {
        draft = draft.reply_to(parent_id);
    }

    let result = with_backend(|backend| {
        backend
            .submit(person_id.trim(), &draft)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(AddOutcome::Ignored) => ActionResponse::failure("Comment text is empty."),
        Ok(AddOutcome::Stored(comment)) => {
            ActionResponse::success("Comment saved.", Some(comment.id))
        }
        Ok(AddOutcome::Submitted) => ActionResponse::success("Comment submitted.", None),
        Err(err) => ActionResponse::failure(format!("comment_add failed: {err}")),
    }
}

/// Deletes a comment and its direct replies from local storage.
///
/// With a remote configured this is a logged no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn comment_remove(person_id: String, comment_id: String) -> ActionResponse {
    let result = with_backend(|backend| {
        backend
            .remove(person_id.trim(), comment_id.trim())
            .map(|()| backend.kind().is_cloud())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(true) => ActionResponse::success("Cloud comments cannot be deleted here.", None),
        Ok(false) => ActionResponse::success("Comment deleted.", None),
        Err(err) => ActionResponse::failure(format!("comment_remove failed: {err}")),
    }
}

/// Appends a person to the locally stored people list.
///
/// # FFI contract
/// - Blank optional fields are dropped; `name` is required.
/// - Never panics; returns the new person id on success.
#[allow(clippy::too_many_arguments)]
#[flutter_rust_bridge::frb(sync)]
pub fn person_add(
    name: String,
    city: Option<String>,
    mbti: Option<String>,
    zodiac: Option<String>,
    gender: Option<String>,
    tags: Vec<String>,
    headline: Option<String>,
    intro: Option<String>,
) -> ActionResponse {
    let input = NewPerson {
        name,
        city,
        mbti,
        zodiac,
        gender,
        tags,
        headline,
        intro,
    };
    let result = with_storage(|_, storage| {
        let mut directory = PeopleDirectory::load(storage);
        directory
            .add_person(input)
            .map(|person| person.id.clone())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => ActionResponse::success("Person added.", Some(id)),
        Err(err) => ActionResponse::failure(format!("person_add failed: {err}")),
    }
}

fn resolve_config() -> Result<WallConfig, String> {
    WALL_CONFIG
        .get_or_init(|| {
            WallConfig::from_env().map_err(|err| {
                warn!("event=config_load module=ffi status=error error={err}");
                err.to_string()
            })
        })
        .clone()
}

fn with_storage<T>(
    f: impl FnOnce(&WallConfig, LocalStorage<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let config = resolve_config()?;
    let conn = open_db(&config.db_path).map_err(|err| format!("DB open failed: {err}"))?;
    f(&config, LocalStorage::new(&conn))
}

fn with_backend<T>(f: impl FnOnce(&CommentBackend<'_>) -> Result<T, String>) -> Result<T, String> {
    with_storage(|config, storage| {
        let backend = CommentBackend::from_config(config, storage).map_err(|err| err.to_string())?;
        f(&backend)
    })
}

fn to_person_item(person: &introwall_core::Person) -> PersonItem {
    PersonItem {
        person_id: person.id.clone(),
        initial: person.initial().to_string(),
        name: person.display_name().to_string(),
        city: person.city.clone(),
        badges: person.badges().into_iter().map(str::to_string).collect(),
        tags: person
            .visible_tags()
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect(),
        headline: person.headline.clone(),
        intro: person.intro.clone(),
    }
}

/// Pre-order flattening; each item records its parent and depth.
fn flatten(view: &CommentView, out: &mut Vec<CommentItem>) {
    let mut pending: Vec<(&CommentView, Option<&str>, u32)> = vec![(view, None, 0)];
    while let Some((view, parent_id, depth)) = pending.pop() {
        out.push(CommentItem {
            comment_id: view.id.clone(),
            parent_id: parent_id.map(str::to_string),
            depth,
            author: view.author.clone(),
            timestamp: view.timestamp.clone(),
            text: view.text.clone(),
        });
        pending.extend(
            view.replies
                .iter()
                .rev()
                .map(|reply| (reply, Some(view.id.as_str()), depth + 1)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{
        backend_label, comment_add, comment_remove, comment_thread, core_version, init_logging,
        person_add, ping, wall_search,
    };
    use introwall_core::WallConfig;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn backend_label_matches_environment_config() {
        let expected = WallConfig::from_env()
            .map(|config| config.backend_kind().label().to_string())
            .unwrap_or_default();
        assert!(backend_label().ends_with(expected.as_str()));
    }

    #[test]
    fn wall_search_blank_query_returns_everyone() {
        let response = wall_search("  ".to_string());
        assert!(response.dataset_ok, "{}", response.message);
        assert_eq!(response.items.len() as u32, response.total);
    }

    #[test]
    fn person_add_then_search_finds_new_member() {
        let token = unique_token("person");
        let added = person_add(
            format!("Member {token}"),
            Some("Oslo".to_string()),
            None,
            None,
            None,
            vec!["ski".to_string()],
            None,
            None,
        );
        assert!(added.ok, "{}", added.message);
        let id = added.id.expect("person add should return id");

        let response = wall_search(token.to_uppercase());
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].person_id, id);
        assert_eq!(response.items[0].tags, vec!["#ski".to_string()]);
    }

    #[test]
    fn person_add_rejects_blank_name() {
        let response = person_add(" ".to_string(), None, None, None, None, Vec::new(), None, None);
        assert!(!response.ok);
    }

    #[test]
    fn comment_reply_is_nested_and_delete_cascades() {
        if !local_backend_configured() {
            return;
        }
        let person_id = unique_token("thread");
        let root = comment_add(person_id.clone(), String::new(), "hi".to_string(), None);
        assert!(root.ok, "{}", root.message);
        let root_id = root.id.expect("local add should return id");
        let reply = comment_add(
            person_id.clone(),
            "bo".to_string(),
            "hello back".to_string(),
            Some(root_id.clone()),
        );
        assert!(reply.ok, "{}", reply.message);

        let thread = comment_thread(person_id.clone());
        assert_eq!(thread.items.len(), 2);
        assert_eq!(thread.items[0].comment_id, root_id);
        assert_eq!(thread.items[0].author, "anonymous");
        assert_eq!(thread.items[1].depth, 1);
        assert_eq!(thread.items[1].parent_id.as_deref(), Some(root_id.as_str()));
        assert!(!thread.loading);
        assert_eq!(thread.storage_line, "comments: local only");

        let removed = comment_remove(person_id.clone(), root_id);
        assert!(removed.ok, "{}", removed.message);
        assert!(comment_thread(person_id).items.is_empty());
    }

    #[test]
    fn comment_add_ignores_blank_text() {
        if !local_backend_configured() {
            return;
        }
        let person_id = unique_token("blank");
        let response = comment_add(person_id.clone(), "amy".to_string(), "  ".to_string(), None);
        assert!(!response.ok);
        assert!(comment_thread(person_id).items.is_empty());
    }

    /// Comment round-trips below assume the local backend.
    fn local_backend_configured() -> bool {
        WallConfig::from_env().is_ok_and(|config| config.remote.is_none())
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
