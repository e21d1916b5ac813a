use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dashkit::{
    Column, FilterValue, Filters, HttpTransport, ListConfig, ListController, Notice, NoticeLevel, Notifier,
    OptimisticTracker, RemoteLookup, RollbackPolicy, SortDir, Suggestion, SuggestionSource, Table, Transport,
};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// dashkit - browse, search and export dashboard API lists
#[derive(Parser)]
#[command(name = "dashkit")]
#[command(about = "dashkit - browse, search and export dashboard API lists")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a list endpoint and print it as a table
    List(ListArgs),
    /// Run a debounced suggestion lookup for a search term
    Suggest(SuggestArgs),
    /// Mark entities present/absent with optimistic rollback on failure
    Mark(MarkArgs),
    /// Download a file from the API
    Download(DownloadArgs),
    /// Check configuration
    Check,
}

#[derive(Args)]
struct ListArgs {
    /// Resource path, e.g. /api/children
    path: String,
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Rows per page (defaults to listing.default_page_size)
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    /// Field the search term is sent as; repeatable
    #[arg(long = "search-field")]
    search_fields: Vec<String>,
    /// Filter as key=value; repeatable, blank values are dropped
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, FilterValue)>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, default_value = "asc")]
    order: SortDir,
    /// Columns to show, comma separated (defaults to the first row's fields)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    /// Also export the rows as CSV under this entity name
    #[arg(long)]
    export: Option<String>,
}

#[derive(Args)]
struct SuggestArgs {
    path: String,
    term: String,
    /// Query parameter carrying the term
    #[arg(long, default_value = "search")]
    param: String,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args)]
struct MarkArgs {
    /// Collection path; each entity is written to <path>/<id>
    path: String,
    #[arg(required = true)]
    ids: Vec<String>,
    /// Mark absent instead of present
    #[arg(long)]
    absent: bool,
    /// Body field carrying the flag
    #[arg(long, default_value = "present")]
    field: String,
    /// On failure restore the previous local value instead of clearing it
    #[arg(long)]
    restore_previous: bool,
}

#[derive(Args)]
struct DownloadArgs {
    path: String,
    /// Output file (defaults to the export directory)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn parse_filter(raw: &str) -> Result<(String, FilterValue), String> {
    Filters::parse_pair(raw).map_err(|e| e.to_string())
}

/// Prints notices to stderr next to the log output.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Error => "error",
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
        };
        eprintln!("[{tag}] {}", notice.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        base_url: cli.base_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    config.validate().context("Invalid configuration after CLI overrides")?;

    let logging_config = config.logging.clone().unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.home_dir));
    tracing::debug!(base_url = %config.api.base_url, "dashkit starting");

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = match cli.command {
        Some(Commands::Check) | None => return check_config(&config),
        Some(c) => c,
    };

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::from_base_url(&config.api.base_url, config.api.timeout())
            .context("Failed to build HTTP client")?,
    );

    match command {
        Commands::List(a) => list_command(&config, transport, a).await,
        Commands::Suggest(a) => suggest_command(&config, transport, a).await,
        Commands::Mark(a) => mark_command(transport, a).await,
        Commands::Download(a) => download_command(&config, transport, a).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn list_command(config: &AppConfig, transport: Arc<dyn Transport>, args: ListArgs) -> Result<()> {
    let mut cfg = ListConfig::new(&args.path);
    cfg.initial_page = args.page;
    cfg.initial_page_size = args.page_size.unwrap_or(config.listing.default_page_size);
    cfg.initial_search = args.search.unwrap_or_default();
    cfg.search_fields = args.search_fields;
    cfg.filters = args.filters.into_iter().collect();
    cfg.sort_by = args.sort;
    cfg.sort_order = Some(args.order);
    cfg.auto_fetch = false;
    cfg.show_error_toast = config.listing.show_error_toast;

    let list: ListController<Value> =
        ListController::with_notifier(transport, cfg, Arc::new(ConsoleNotifier)).context("Invalid list query")?;
    list.fetch_data()
        .await
        .with_context(|| format!("Failed to load {}", list.current_url()))?;

    let data = list.data();
    let columns = if args.columns.is_empty() {
        infer_columns(&data)
    } else {
        args.columns
    };
    let table = Table::new(columns.iter().map(|c| Column::new(c.as_str(), c.as_str())).collect());

    let rendered = table.render(&data, list.page(), list.page_size(), list.total());
    print!("{}", rendered.to_text());
    println!("{} total", list.total());

    if let Some(entity) = args.export {
        let today = chrono::Local::now().date_naive();
        let path = table
            .export(&data, &config.export_dir(), &entity, today)
            .context("Export failed")?;
        ConsoleNotifier.notify(Notice::info(format!("Exported {}", path.display())));
    }
    Ok(())
}

/// Field names of the first object row, in order; `value` for scalar rows.
fn infer_columns(data: &[Value]) -> Vec<String> {
    match data.first() {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(_) => vec!["value".to_string()],
        None => vec!["id".to_string()],
    }
}

async fn suggest_command(config: &AppConfig, transport: Arc<dyn Transport>, args: SuggestArgs) -> Result<()> {
    if args.term.trim().is_empty() {
        println!("No suggestions");
        return Ok(());
    }

    let mut lookup: RemoteLookup<Value> = RemoteLookup::new(transport, &args.path).with_param(&args.param);
    if let Some(limit) = args.limit {
        lookup = lookup.with_limit(limit);
    }
    let source = SuggestionSource::with_options(Arc::new(lookup), config.listing.debounce(), None);

    // Every state change, in order: wait until a lookup has started and settled.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _sub = source.subscribe(move |s| {
        let _ = tx.send(s.is_loading);
    });
    source.on_input(args.term);

    let wait = config.listing.debounce() + config.api.timeout().unwrap_or(Duration::from_secs(30));
    tokio::time::timeout(wait, async {
        let mut started = false;
        while let Some(loading) = rx.recv().await {
            if loading {
                started = true;
            } else if started {
                break;
            }
        }
    })
    .await
    .context("Suggestion lookup timed out")?;

    let found = source.suggestions();
    if found.is_empty() {
        println!("No suggestions");
    }
    for item in found {
        println!("{}", item.label());
    }
    Ok(())
}

async fn mark_command(transport: Arc<dyn Transport>, args: MarkArgs) -> Result<()> {
    let policy = if args.restore_previous {
        RollbackPolicy::RestorePrevious
    } else {
        RollbackPolicy::Clear
    };
    let tracker: Arc<OptimisticTracker<String, bool>> = Arc::new(OptimisticTracker::new(policy));
    let present = !args.absent;
    let base = args.path.trim_end_matches('/').to_string();

    let mut tasks = tokio::task::JoinSet::new();
    for id in args.ids {
        let tracker = tracker.clone();
        let transport = transport.clone();
        let url = format!("{base}/{id}");
        let body = json!({ args.field.as_str(): present });
        tasks.spawn(async move {
            let res = tracker
                .apply(id.clone(), present, || async { transport.put(&url, &body).await })
                .await;
            (id, res)
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (id, res) = joined.context("mark task panicked")?;
        match res {
            Ok(_) => {
                let state = if present { "present" } else { "absent" };
                println!("{id}: {state}");
                ConsoleNotifier.notify(Notice::success(format!("{id} marked {state}")));
            }
            Err(e) => {
                failed += 1;
                ConsoleNotifier.notify(Notice::error(format!("{id}: rolled back ({})", e.user_message())));
            }
        }
    }

    let mut local: Vec<_> = tracker.snapshot().into_iter().collect();
    local.sort();
    tracing::debug!(?local, "optimistic state after writes");

    if failed > 0 {
        bail!("{failed} update(s) failed");
    }
    Ok(())
}

async fn download_command(config: &AppConfig, transport: Arc<dyn Transport>, args: DownloadArgs) -> Result<()> {
    let bytes = transport
        .download(&args.path)
        .await
        .with_context(|| format!("Download of {} failed", args.path))?;

    let out = match args.out {
        Some(p) => p,
        None => {
            let name = args
                .path
                .split('?')
                .next()
                .and_then(|p| p.rsplit('/').find(|s| !s.is_empty()))
                .unwrap_or("download");
            config.export_dir().join(name)
        }
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    std::fs::write(&out, &bytes).with_context(|| format!("Cannot write {}", out.display()))?;
    println!("Saved {} bytes to {}", bytes.len(), out.display());
    Ok(())
}
