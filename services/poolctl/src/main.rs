//! Pool operations CLI
//!
//! Ops tooling for the shared key pool:
//!
//! ```text
//! poolctl load [keys-file] [--tier full|mid|low] [--config path]
//! poolctl counts [--config path]
//! ```
//!
//! `load` wipes the pool and installs the keys file (defaults from config);
//! `counts` prints the per-tier health snapshot as JSON. Configuration comes
//! from `--config` / `CONFIG_PATH`, or defaults plus `REDIS_URL` /
//! `KEYS_FILE` env vars when no file is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::Config;
use key_pool::{KeyPool, KeyTier, RedisStore, bootstrap};

struct Args {
    command: String,
    keys_file: Option<PathBuf>,
    tier: Option<String>,
    config: Option<String>,
}

fn parse_args(argv: &[String]) -> Result<Args> {
    let mut command = None;
    let mut keys_file = None;
    let mut tier = None;
    let mut config = None;

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tier" => {
                tier = Some(
                    iter.next()
                        .context("--tier requires a value (full, mid or low)")?
                        .clone(),
                );
            }
            "--config" => {
                config = Some(iter.next().context("--config requires a path")?.clone());
            }
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            positional => {
                if command.is_none() {
                    command = Some(positional.to_string());
                } else if keys_file.is_none() {
                    keys_file = Some(PathBuf::from(positional));
                } else {
                    bail!("unexpected argument: {positional}");
                }
            }
        }
    }

    let command =
        command.context("usage: poolctl <load|counts> [keys-file] [--tier t] [--config path]")?;
    Ok(Args {
        command,
        keys_file,
        tier,
        config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs with LOG_LEVEL / RUST_LOG support, matching the service fleet.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    let config = match Config::resolve_path(args.config.as_deref()) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::from_env()?,
    };

    let store = RedisStore::connect(&config.store.url)
        .await
        .with_context(|| format!("cannot reach shared store at {}", config.store.url))?;
    let store = Arc::new(store);

    match args.command.as_str() {
        "load" => {
            let tier_label = args.tier.as_deref().unwrap_or(&config.pool.default_tier);
            let tier = KeyTier::parse(tier_label).with_context(|| {
                format!("unknown tier: {tier_label} (expected full, mid or low)")
            })?;
            let path = args
                .keys_file
                .unwrap_or_else(|| config.pool.keys_file.clone());
            let count = bootstrap::load_keys(store.as_ref(), &path, tier).await?;
            info!(count, tier = %tier, file = %path.display(), "pool reloaded");
            println!("{count}");
        }
        "counts" => {
            let pool = KeyPool::new(store);
            let health = pool.health().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        other => bail!("unknown command: {other} (expected load or counts)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_load_with_flags() {
        let args = parse_args(&argv(&["load", "/srv/keys.text", "--tier", "mid"])).unwrap();
        assert_eq!(args.command, "load");
        assert_eq!(args.keys_file, Some(PathBuf::from("/srv/keys.text")));
        assert_eq!(args.tier.as_deref(), Some("mid"));
        assert_eq!(args.config, None);
    }

    #[test]
    fn parse_counts_with_config() {
        let args = parse_args(&argv(&["counts", "--config", "/etc/pool.toml"])).unwrap();
        assert_eq!(args.command, "counts");
        assert_eq!(args.config.as_deref(), Some("/etc/pool.toml"));
    }

    #[test]
    fn parse_rejects_unknown_flag() {
        assert!(parse_args(&argv(&["load", "--frobnicate"])).is_err());
    }

    #[test]
    fn parse_rejects_missing_command() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn parse_rejects_dangling_flag_value() {
        assert!(parse_args(&argv(&["load", "--tier"])).is_err());
    }
}
