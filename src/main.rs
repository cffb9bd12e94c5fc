//! content-router CLI - run CRUD calls against the routed store from a shell

use clap::{Parser, Subcommand, ValueEnum};
use content_router::config::{self, RouterConfig};
use content_router::ui::{self, Icons, Spinner};
use content_router::{ChangeNotifier, ContentProvider, ContentUri, RowValues, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "content-router")]
#[command(version)]
#[command(about = "URI-routed CRUD over a single shared SQLite connection")]
#[command(long_about = r#"
content-router resolves content URIs to tables and runs CRUD calls on them:
  • content://<authority>/book  -> table book
  • content://<authority>/user  -> table user

A bare path ("book") is expanded with the configured authority.

Example usage:
  content-router init --database .content-router/store.db
  content-router query --uri book --order id
  content-router insert --uri book --set id=5 --set name=Linux
  content-router delete --uri user --where "name = ?" --arg Tom
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print change notifications as they are delivered
    #[arg(long, global = true)]
    watch: bool,

    /// Database file (overrides the config; in-memory when neither is set)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the default routes
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// List the registered routes
    Routes,

    /// Query rows behind a URI
    Query {
        #[arg(short, long)]
        uri: String,

        /// Comma-separated projection (all columns when omitted)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Selection clause, `?` placeholders bind to --arg
        #[arg(short = 'w', long = "where")]
        selection: Option<String>,

        /// Selection argument (repeatable)
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// ORDER BY clause
        #[arg(short, long)]
        order: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Insert a row
    Insert {
        #[arg(short, long)]
        uri: String,

        /// column=value (repeatable)
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        values: Vec<(String, Value)>,
    },

    /// Update rows
    Update {
        #[arg(short, long)]
        uri: String,

        /// column=value (repeatable)
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        values: Vec<(String, Value)>,

        #[arg(short = 'w', long = "where")]
        selection: Option<String>,

        #[arg(short, long = "arg")]
        args: Vec<String>,
    },

    /// Delete rows
    Delete {
        #[arg(short, long)]
        uri: String,

        #[arg(short = 'w', long = "where")]
        selection: Option<String>,

        #[arg(short, long = "arg")]
        args: Vec<String>,
    },

    /// Print the media type hint for a URI
    Type {
        #[arg(short, long)]
        uri: String,
    },

    /// Run concurrent inserts and check row and notification counts
    Stress {
        #[arg(short, long, default_value = "book")]
        uri: String,

        /// Total number of inserts
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        #[arg(short, long, default_value = "8")]
        threads: usize,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got `{}`", raw))?;
    if column.trim().is_empty() {
        return Err(format!("empty column name in `{}`", raw));
    }
    Ok((column.trim().to_string(), Value::infer(value)))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut router_config = config::load_config(Some(&config_path))?.unwrap_or_default();
    if let Some(database) = &cli.database {
        router_config.database = Some(database.display().to_string());
    }

    if let Commands::Init { force } = cli.command {
        if router_config.database.is_none() {
            let base = std::env::current_dir()?;
            router_config.database = Some(config::default_database_path_in(&base).display().to_string());
        }
        config::write_config(&config_path, &router_config, force)?;
        ui::success(&format!("Wrote {}", config_path.display()));
        return Ok(());
    }

    if let Some(database) = &router_config.database {
        config::ensure_db_dir(PathBuf::from(database).as_path())?;
    }

    let authority = router_config.authority.clone();
    let provider = open_provider(&router_config, cli.watch)?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Routes => {
            ui::header("Registered routes");
            println!("{}", ui::routes_table(&provider.routes().routes()));
        }

        Commands::Query { uri, columns, selection, args, order, format } => {
            let uri = expand_uri(&uri, &authority)?;
            let projection = (!columns.is_empty()).then_some(columns);
            let rows = provider.query(
                &uri,
                projection.as_deref(),
                selection.as_deref(),
                &infer_args(&args),
                order.as_deref(),
            )?;

            match (rows, format) {
                (None, Format::Json) => println!("null"),
                (None, Format::Text) => ui::warn(&format!("{} does not route to any table", uri)),
                (Some(rows), Format::Json) => {
                    let maps: Vec<_> = rows.iter_maps().collect();
                    println!("{}", serde_json::to_string_pretty(&maps)?);
                }
                (Some(rows), Format::Text) if rows.is_empty() => {
                    println!("{} No rows.", Icons::EMPTY);
                }
                (Some(rows), Format::Text) => {
                    println!("{} {} ({} rows)", Icons::SEARCH, ui::uri(&uri), rows.len());
                    println!("{}", ui::row_set_table(&rows));
                }
            }
        }

        Commands::Insert { uri, values } => {
            let uri = expand_uri(&uri, &authority)?;
            let values: RowValues = values.into_iter().collect();
            match provider.insert(&uri, &values)? {
                Some(row) => println!("{} Inserted {}", Icons::CHECK, ui::uri(&row)),
                None => ui::warn(&format!("{} does not route to any table, nothing inserted", uri)),
            }
        }

        Commands::Update { uri, values, selection, args } => {
            let uri = expand_uri(&uri, &authority)?;
            let values: RowValues = values.into_iter().collect();
            let count = provider.update(&uri, &values, selection.as_deref(), &infer_args(&args))?;
            ui::info("Rows updated", &count.to_string());
        }

        Commands::Delete { uri, selection, args } => {
            let uri = expand_uri(&uri, &authority)?;
            let count = provider.delete(&uri, selection.as_deref(), &infer_args(&args))?;
            ui::info("Rows deleted", &count.to_string());
        }

        Commands::Type { uri } => {
            let uri = expand_uri(&uri, &authority)?;
            let hint = provider.get_type(&uri);
            println!("{}", hint.as_deref().unwrap_or("unspecified"));
        }

        Commands::Stress { uri, count, threads } => {
            let uri = expand_uri(&uri, &authority)?;
            run_stress(&provider, &uri, count, threads.max(1))?;
        }
    }

    Ok(())
}

fn open_provider(config: &RouterConfig, watch: bool) -> anyhow::Result<ContentProvider> {
    let notifier = Arc::new(ChangeNotifier::new());
    if watch {
        // bare authority with descendants: every route under it
        notifier.subscribe(
            ContentUri::new(config.authority.as_str(), ""),
            true,
            Arc::new(|uri: &ContentUri| -> anyhow::Result<()> {
                ui::change(uri);
                Ok(())
            }),
        );
    }

    let provider = ContentProvider::new(config.routing_table(), config.connection_handle(), notifier);
    provider.on_create();

    let target = config.database.as_deref().unwrap_or(":memory:");
    let spinner = Spinner::new(&format!("{} Opening {}", Icons::DATABASE, target));
    match provider.handle().wait_ready() {
        Ok(()) => spinner.finish_with_message(&format!("{} Store ready", Icons::DATABASE)),
        Err(e) => {
            spinner.abandon();
            ui::error(&e.to_string());
            return Err(e.into());
        }
    }
    Ok(provider)
}

/// Accept full content URIs or a bare path under `authority`
fn expand_uri(raw: &str, authority: &str) -> content_router::Result<ContentUri> {
    if raw.contains("://") {
        ContentUri::parse(raw)
    } else {
        Ok(ContentUri::new(authority, raw))
    }
}

fn infer_args(args: &[String]) -> Vec<Value> {
    args.iter().map(|a| Value::infer(a)).collect()
}

fn run_stress(provider: &ContentProvider, uri: &ContentUri, count: usize, threads: usize) -> anyhow::Result<()> {
    let Some(table) = provider.routes().table_for(uri).map(str::to_string) else {
        anyhow::bail!("{} does not route to any table", uri);
    };

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let observer = provider.notifier().subscribe(
        uri.clone(),
        false,
        Arc::new(move |_: &ContentUri| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }),
    );

    let before = provider.handle().with_store(|s| s.count(&table))?;
    ui::header(&format!("{} inserts into {} on {} threads", count, uri, threads));

    let started = Instant::now();
    let failures = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for worker in 0..threads {
            let failures = &failures;
            scope.spawn(move || {
                for i in (worker..count).step_by(threads) {
                    let values = RowValues::new().with("name", format!("stress-{}", i));
                    if let Err(e) = provider.insert(uri, &values) {
                        tracing::warn!(worker, i, error = %e, "insert failed");
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });
    let elapsed = started.elapsed();

    provider.notifier().unsubscribe(observer);
    let after = provider.handle().with_store(|s| s.count(&table))?;
    let failures = failures.into_inner();
    let notified = notified.load(Ordering::Relaxed);

    ui::section("Result");
    ui::info("Rows before", &before.to_string());
    ui::info("Rows after", &after.to_string());
    ui::info("Notifications", &notified.to_string());
    ui::info("Failures", &failures.to_string());
    println!("{} {}", Icons::CLOCK, ui::dim(&format!("{:?}", elapsed)));

    let succeeded = count - failures;
    if after == before + succeeded && notified == succeeded {
        ui::success("Row and notification counts match");
        Ok(())
    } else {
        anyhow::bail!(
            "expected {} new rows and notifications, got {} rows and {} notifications",
            succeeded,
            after - before,
            notified
        )
    }
}
