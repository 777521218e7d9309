//! IntroWall terminal front end.
//!
//! # Responsibility
//! - Render the wall and person cards as plain text.
//! - Map subcommands onto core use cases (comment, delete, add person).
//!
//! Exit codes: `0` success, `1` operation failure, `2` usage error.

use clap::{Args, Parser, Subcommand};
use introwall_core::db::open_db;
use introwall_core::view::{render_card, render_wall, PersonCardView, WallView};
use introwall_core::{
    init_from_config, AddOutcome, CommentBackend, CommentDraft, CommentStore, LocalStorage,
    NewPerson, PeopleDirectory, WallConfig,
};
use log::{info, warn};
use std::fmt::{Display, Formatter};
use std::process::ExitCode;
use std::time::{Duration, Instant};

const LOAD_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WATCH_SECONDS: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "introwall", version, about = "Community introduction wall")]
struct Cli {
    /// Defaults to `wall` with an empty query.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show member cards matching a query, with their comments.
    Wall {
        /// Search words; matched case-insensitively against every field.
        query: Vec<String>,
    },
    /// Post a comment, or a reply with `--reply-to`.
    Comment {
        person_id: String,
        text: String,
        /// Author nickname; blank posts as anonymous.
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        reply_to: Option<String>,
    },
    /// Delete a local comment and its direct replies.
    Delete {
        person_id: String,
        comment_id: String,
    },
    /// Append a member to the locally stored people list.
    AddPerson(AddPersonArgs),
    /// Print a member card and reprint it as new comments arrive.
    Watch {
        person_id: String,
        #[arg(long, default_value_t = DEFAULT_WATCH_SECONDS)]
        seconds: u64,
    },
    /// Print the core version.
    Version,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Wall { .. } => "wall",
            Self::Comment { .. } => "comment",
            Self::Delete { .. } => "delete",
            Self::AddPerson(_) => "add-person",
            Self::Watch { .. } => "watch",
            Self::Version => "version",
        }
    }
}

#[derive(Args, Debug, PartialEq, Eq)]
struct AddPersonArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    mbti: Option<String>,
    #[arg(long)]
    zodiac: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    /// Repeatable.
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    headline: Option<String>,
    #[arg(long)]
    intro: Option<String>,
}

impl From<AddPersonArgs> for NewPerson {
    fn from(args: AddPersonArgs) -> Self {
        Self {
            name: args.name,
            city: args.city,
            mbti: args.mbti,
            zodiac: args.zodiac,
            gender: args.gender,
            tags: args.tags,
            headline: args.headline,
            intro: args.intro,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Failed(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "usage error: {message}"),
            Self::Failed(message) => write!(f, "error: {message}"),
        }
    }
}

type CliResult<T> = Result<T, CliError>;

fn failed(err: impl Display) -> CliError {
    CliError::Failed(err.to_string())
}

fn main() -> ExitCode {
    // Argument errors exit with status 2 inside `parse`.
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Wall { query: Vec::new() });
    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ CliError::Usage(_)) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err @ CliError::Failed(_)) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Command) -> CliResult<()> {
    if command == Command::Version {
        println!("introwall {}", introwall_core::core_version());
        return Ok(());
    }

    let config = WallConfig::from_env().map_err(failed)?;
    if let Err(err) = init_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
    let conn = open_db(&config.db_path).map_err(failed)?;
    let storage = LocalStorage::new(&conn);
    let command_name = command.name();

    let result = match command {
        Command::Wall { query } => show_wall(&config, storage, &query.join(" ")),
        Command::Comment {
            person_id,
            text,
            name,
            reply_to,
        } => {
            let mut draft = CommentDraft::new(name, text);
            if let Some(parent_id) = reply_to {
                draft = draft.reply_to(parent_id);
            }
            add_comment(&config, storage, &person_id, &draft)
        }
        Command::Delete {
            person_id,
            comment_id,
        } => delete_comment(&config, storage, &person_id, &comment_id),
        Command::AddPerson(args) => add_person(storage, args.into()),
        Command::Watch { person_id, seconds } => {
            watch(&config, storage, &person_id, Duration::from_secs(seconds))
        }
        Command::Version => Ok(()),
    };

    match &result {
        Ok(()) => info!("event=cli_command module=cli status=ok command={command_name}"),
        Err(err) => {
            warn!("event=cli_command module=cli status=error command={command_name} error={err}")
        }
    }
    result
}

fn show_wall(config: &WallConfig, storage: LocalStorage<'_>, query: &str) -> CliResult<()> {
    let directory = PeopleDirectory::load(storage);
    let backend = CommentBackend::from_config(config, storage).map_err(failed)?;

    let cards = directory
        .search(query)
        .into_iter()
        .map(|person| {
            let mut store = backend.open_person(&person.id);
            store.wait_loaded(LOAD_TIMEOUT);
            PersonCardView::build(person, store.as_ref())
        })
        .collect();

    let wall = WallView {
        query: query.to_string(),
        total_people: directory.people().len(),
        cards,
        dataset: directory.dataset_check(),
        backend: backend.kind(),
    };
    print!("{}", render_wall(&wall));
    Ok(())
}

fn add_comment(
    config: &WallConfig,
    storage: LocalStorage<'_>,
    person_id: &str,
    draft: &CommentDraft,
) -> CliResult<()> {
    let backend = CommentBackend::from_config(config, storage).map_err(failed)?;

    match backend.submit(person_id, draft).map_err(failed)? {
        AddOutcome::Ignored => Err(CliError::Usage("comment text is empty".to_string())),
        AddOutcome::Stored(comment) => {
            println!("saved comment {}", comment.id);
            Ok(())
        }
        AddOutcome::Submitted => {
            println!("comment submitted");
            Ok(())
        }
    }
}

fn delete_comment(
    config: &WallConfig,
    storage: LocalStorage<'_>,
    person_id: &str,
    comment_id: &str,
) -> CliResult<()> {
    let backend = CommentBackend::from_config(config, storage).map_err(failed)?;
    backend.remove(person_id, comment_id).map_err(failed)?;

    if backend.kind().is_cloud() {
        println!("cloud comments can only be deleted by an administrator");
    } else {
        println!("deleted comment {comment_id} and its direct replies");
    }
    Ok(())
}

fn add_person(storage: LocalStorage<'_>, input: NewPerson) -> CliResult<()> {
    let mut directory = PeopleDirectory::load(storage);
    let person = directory.add_person(input).map_err(failed)?;
    println!("added {} ({})", person.display_name(), person.id);
    Ok(())
}

/// Prints a person card and reprints it whenever pushed comments arrive.
fn watch(
    config: &WallConfig,
    storage: LocalStorage<'_>,
    person_id: &str,
    duration: Duration,
) -> CliResult<()> {
    let directory = PeopleDirectory::load(storage);
    let person = directory
        .get(person_id)
        .ok_or_else(|| failed(format!("no member with id `{person_id}`")))?;
    let backend = CommentBackend::from_config(config, storage).map_err(failed)?;
    let mut store = backend.open_person(person_id);

    store.wait_loaded(LOAD_TIMEOUT);
    print!("{}", render_card(&PersonCardView::build(person, store.as_ref())));

    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        if store.sync_wait(deadline - now) > 0 {
            println!();
            print!("{}", render_card(&PersonCardView::build(person, store.as_ref())));
        }
    }
}
