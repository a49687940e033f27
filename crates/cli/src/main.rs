//! `eventstore`: command-line access to a remote event store.
//!
//! Connection settings come from flags, then `EVENTSTORE_*` environment
//! variables (a `.env` file in the working directory is loaded first).
//! Streaming commands print one JSON document per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use eventstore_client::{
    ClientResult, Config, ENV_API_URL, ENV_API_VERSION, ENV_AUTH_TOKEN, Event, EventStoreClient,
    NdjsonDecoder, parse_timestamp,
};
use eventstore_observability::LogFormat;
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Parser, Debug)]
#[command(name = "eventstore")]
#[command(about = "Read, write and query a remote event store", version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log line format written to stderr (`json` or `text`).
    #[arg(long, global = true, env = "EVENTSTORE_LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ConnectionArgs {
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,
    #[arg(long, global = true, env = ENV_API_VERSION)]
    api_version: Option<String>,
    #[arg(long, global = true, env = ENV_AUTH_TOKEN, hide_env_values = true)]
    auth_token: Option<String>,
}

impl ConnectionArgs {
    fn to_config(&self) -> anyhow::Result<Config> {
        let config = Config::new(
            self.api_url.clone().unwrap_or_default(),
            self.api_version.clone().unwrap_or_default(),
            self.auth_token.clone().unwrap_or_default(),
        )?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the server is reachable.
    Ping,
    /// Run the server-side audit check.
    Audit,
    /// Print every event of a subject.
    Stream { subject: String },
    /// Run a query and print the result rows.
    Query { query: String },
    /// Commit one event (from flags) or a batch (from an NDJSON file).
    Commit(CommitArgs),
}

#[derive(clap::Args, Debug)]
struct CommitArgs {
    /// NDJSON file with one event per line; `-` reads stdin.
    #[arg(long, conflicts_with_all = ["subject", "event_type", "data", "id", "source", "time"])]
    file: Option<PathBuf>,

    #[arg(long, required_unless_present = "file")]
    subject: Option<String>,
    #[arg(long = "type", required_unless_present = "file")]
    event_type: Option<String>,
    /// Event payload as a JSON document.
    #[arg(long, default_value = "{}")]
    data: String,
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    source: Option<String>,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    time: Option<String>,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    eventstore_observability::init(cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let client = EventStoreClient::new(cli.connection.to_config()?)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Ping => write!(out, "{}", client.ping()?)?,
        Commands::Audit => write!(out, "{}", client.audit()?)?,
        Commands::Stream { subject } => {
            let count = write_ndjson(&mut out, client.event_stream(&subject)?)?;
            tracing::info!(%subject, count, "stream finished");
        }
        Commands::Query { query } => {
            let count = write_ndjson(&mut out, client.query_stream(&query)?)?;
            tracing::info!(count, "query finished");
        }
        Commands::Commit(args) => {
            let committed = client.commit_events(events_to_commit(&args)?)?;
            write_ndjson(&mut out, committed.into_iter().map(Ok))?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Print items as they arrive; stops at (and returns) the first error.
fn write_ndjson<W, T, I>(out: &mut W, items: I) -> anyhow::Result<usize>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = ClientResult<T>>,
{
    let mut written = 0;
    for item in items {
        serde_json::to_writer(&mut *out, &item?)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

fn events_to_commit(args: &CommitArgs) -> anyhow::Result<Vec<Event>> {
    match &args.file {
        Some(path) if path.as_os_str() == "-" => read_events(io::stdin().lock()),
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            read_events(BufReader::new(file))
        }
        None => Ok(vec![event_from_flags(args)?]),
    }
}

fn read_events<R: BufRead>(reader: R) -> anyhow::Result<Vec<Event>> {
    let events = NdjsonDecoder::<R, Event>::new(reader)
        .collect::<ClientResult<Vec<_>>>()
        .context("reading events")?;
    if events.is_empty() {
        bail!("no events to commit");
    }
    Ok(events)
}

fn event_from_flags(args: &CommitArgs) -> anyhow::Result<Event> {
    let data: JsonValue =
        serde_json::from_str(&args.data).context("--data is not valid JSON")?;

    let mut event = Event::new(
        args.subject.clone().unwrap_or_default(),
        args.event_type.clone().unwrap_or_default(),
        data,
    );
    if let Some(id) = &args.id {
        event = event.with_id(id);
    }
    if let Some(source) = &args.source {
        event = event.with_source(source);
    }
    if let Some(time) = args.time.as_deref() {
        if let Some(time) = parse_timestamp(time)? {
            event = event.with_time(time);
        }
    }
    Ok(event)
}
