mod config;
mod resolve;
mod storage;

use anyhow::Context;
use clap::{Parser, Subcommand};
use resolve::{Outcome, Resolver, ResolvedStream, YtDlp};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "muse-resolve",
    version,
    about = "Resolve a URL or search query to a playable audio stream"
)]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Netscape cookie file passed to yt-dlp (overrides config).
    #[arg(long, global = true, env = "YTDL_COOKIE")]
    cookies: Option<PathBuf>,

    /// Seconds before yt-dlp is killed (overrides config).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Skip the resolution cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a URL or search query to a stream URL.
    Resolve {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the target yt-dlp would be given for a query.
    Classify {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Inspect the configured cookie file.
    Cookies,
    /// Resolve one query per line from stdin.
    Batch,
    /// Resolution cache maintenance.
    Cache {
        #[command(subcommand)]
        cmd: CacheCommand,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    /// Delete expired entries.
    Purge,
}

struct Ctx {
    resolver: Resolver<YtDlp>,
    store: Option<Storage>,
    ttl_secs: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    if let Some(path) = cli.cookies {
        cfg.cookies.path = Some(path);
    }
    if let Some(secs) = cli.timeout {
        cfg.extractor.timeout_secs = secs;
    }
    if cli.no_cache {
        cfg.cache.enabled = false;
    }

    match cli.command {
        Command::Classify { query } => {
            let query = join_query(&query)?;
            println!("{}", resolve::classify(&query));
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve { query, json } => {
            let query = join_query(&query)?;
            let ctx = make_ctx(&cfg)?;
            let Some(outcome) = resolve_interruptible(&ctx, &query).await else {
                return Ok(ExitCode::from(INTERRUPTED));
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
            } else {
                println!("{outcome}");
            }
            Ok(exit_code(&outcome))
        }
        Command::Batch => {
            let ctx = make_ctx(&cfg)?;
            let mut worst = 0;
            for line in std::io::stdin().lock().lines() {
                let line = line.context("read stdin")?;
                if line.trim().is_empty() {
                    continue;
                }
                let Some(outcome) = resolve_interruptible(&ctx, &line).await else {
                    return Ok(ExitCode::from(INTERRUPTED));
                };
                println!("> {line}\n{outcome}\n");
                worst = match (worst, outcome.exit_code()) {
                    (1, _) | (_, 1) => 1,
                    (a, b) => a.max(b),
                };
            }
            Ok(ExitCode::from(worst as u8))
        }
        Command::Cookies => {
            let Some(path) = cfg.cookies.path.as_deref() else {
                println!("No cookie file configured.");
                return Ok(ExitCode::SUCCESS);
            };
            if !path.exists() {
                println!("{} does not exist; extraction runs unauthenticated.", path.display());
                return Ok(ExitCode::SUCCESS);
            }
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            let cookies = resolve::cookies::parse_netscape(&raw);
            println!(
                "{} ({:?} mode): {} cookies",
                path.display(),
                cfg.cookies.mode,
                cookies.len()
            );
            for c in &cookies {
                let expires = c
                    .expires_utc
                    .filter(|&t| t > 0)
                    .map_or("session".to_string(), |t| t.to_string());
                println!(
                    "  {}{} {} {}=<{} bytes> expires={}",
                    c.domain,
                    c.path,
                    if c.secure { "secure" } else { "-" },
                    c.name,
                    c.value.len(),
                    expires
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Cache { cmd } => match cmd {
            CacheCommand::Purge => {
                let store = Storage::open(&cfg.paths.cache_db()).context("open cache")?;
                let n = store.purge_expired(storage::now_unix())?;
                println!("Removed {n} expired entries.");
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}

/// Multiple argv words form one query; whitespace-only input is rejected.
fn join_query(words: &[String]) -> anyhow::Result<String> {
    let query = words.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("query is empty");
    }
    Ok(query)
}

fn make_ctx(cfg: &config::Config) -> anyhow::Result<Ctx> {
    let extractor = YtDlp::new(&cfg.extractor.program)
        .timeout(cfg.extractor.timeout())
        .extra_args(cfg.extractor.extra_args.clone());
    let resolver = Resolver::new(extractor).with_cookies(cfg.cookies.path.clone(), cfg.cookies.mode);

    let store = if cfg.cache.enabled {
        match Storage::open(&cfg.paths.cache_db()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "resolution cache disabled");
                None
            }
        }
    } else {
        None
    };

    Ok(Ctx {
        resolver,
        store,
        ttl_secs: cache_ttl(cfg.cache.ttl_secs),
    })
}

fn cache_ttl(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

const INTERRUPTED: u8 = 130;

/// yt-dlp runs in its own process group, so it doesn't see the terminal's
/// SIGINT. Dropping the resolution here is what kills it.
async fn resolve_interruptible(ctx: &Ctx, query: &str) -> Option<Outcome> {
    tokio::select! {
        outcome = resolve_one(ctx, query) => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(query, "interrupted");
            None
        }
    }
}

/// Cache lookup, then yt-dlp. Only successful resolutions are stored.
async fn resolve_one(ctx: &Ctx, query: &str) -> Outcome {
    if let Some(store) = &ctx.store {
        match store.get_resolution(query, storage::now_unix()) {
            Ok(Some(stream)) => {
                tracing::debug!(query, "cache hit");
                return stream.into();
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "cache lookup failed"),
        }
    }

    let res = ctx.resolver.resolve(query).await;
    if let (Some(store), Ok(stream)) = (&ctx.store, &res)
        && let Err(e) = store.put_resolution(query, stream, ctx.ttl_secs, storage::now_unix())
    {
        tracing::warn!(error = %format!("{e:#}"), "cache write failed");
    }
    res.into()
}

fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Playable { title, url } => serde_json::to_value(ResolvedStream {
            title: title.clone(),
            audio_url: Some(url.clone()),
        })
        .unwrap_or_default(),
        Outcome::NoPlayableUrl { title } => serde_json::to_value(ResolvedStream {
            title: title.clone(),
            audio_url: None,
        })
        .unwrap_or_default(),
        Outcome::Failed { message } => serde_json::json!({ "error": message }),
    }
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    ExitCode::from(outcome.exit_code() as u8)
}
