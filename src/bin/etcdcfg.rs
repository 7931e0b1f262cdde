// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line access to configuration stored in etcd.
//!
//! ```text
//! etcdcfg --root myapp get database
//! etcdcfg --root myapp set database.host db.internal
//! etcdcfg --root myapp copy database replica
//! etcdcfg --root myapp delete replica
//! etcdcfg --root myapp init
//! ```
//!
//! Connection settings come from `--endpoints` or the `ETCD_*` environment
//! variables. Logging is controlled with `RUST_LOG`.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use etcdcfg::adapters::{EtcdBackend, EtcdSettings};
use etcdcfg::prelude::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn cli() -> Command {
    let path = |help: &'static str| Arg::new("path").required(true).help(help);
    Command::new("etcdcfg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read and write hierarchical configuration stored in etcd")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("root")
                .long("root")
                .short('r')
                .global(true)
                .default_value("")
                .help("Root node that paths are relative to"),
        )
        .arg(
            Arg::new("endpoints")
                .long("endpoints")
                .global(true)
                .value_delimiter(',')
                .help("Comma separated etcd endpoints (default: from ETCD_* variables)"),
        )
        .arg(
            Arg::new("redis-url")
                .long("redis-url")
                .global(true)
                .help("Redis URL of the snapshot cache"),
        )
        .arg(
            Arg::new("cache-ttl")
                .long("cache-ttl")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Snapshot lifetime in seconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print values as JSON"),
        )
        .subcommand(
            Command::new("get")
                .about("Print the value at a path")
                .arg(path("Dotted or slash-delimited path"))
                .arg(
                    Arg::new("fresh")
                        .long("fresh")
                        .action(ArgAction::SetTrue)
                        .help("Read from etcd, bypassing the snapshot cache"),
                ),
        )
        .subcommand(
            Command::new("set")
                .about("Write a value at a path")
                .arg(path("Dotted or slash-delimited path"))
                .arg(Arg::new("value").required(true).help("Value to store"))
                .arg(
                    Arg::new("structured")
                        .long("structured")
                        .action(ArgAction::SetTrue)
                        .help("Parse the value as a YAML or JSON document"),
                ),
        )
        .subcommand(
            Command::new("copy")
                .about("Copy a leaf or subtree")
                .arg(Arg::new("src").required(true).help("Source path"))
                .arg(Arg::new("dst").required(true).help("Destination path")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a leaf or subtree")
                .arg(path("Path to delete")),
        )
        .subcommand(Command::new("init").about("Create the root directory if it is missing"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn etcd_settings(matches: &ArgMatches) -> CliResult<EtcdSettings> {
    #[cfg(feature = "env")]
    let mut settings = EtcdSettings::from_env()?;
    #[cfg(not(feature = "env"))]
    let mut settings = EtcdSettings::default();

    if let Some(endpoints) = matches.get_many::<String>("endpoints") {
        settings.endpoints = endpoints.cloned().collect();
    }
    Ok(settings)
}

fn builder(matches: &ArgMatches) -> CliResult<ConfigStoreBuilder> {
    let backend = EtcdBackend::connect(&etcd_settings(matches)?)?;
    let root = matches.get_one::<String>("root").cloned().unwrap_or_default();
    let mut builder = ConfigStore::builder().root(root).backend(Arc::new(backend));

    if let Some(url) = matches.get_one::<String>("redis-url") {
        builder = builder.cache(snapshot_cache(url)?);
    }
    if let Some(secs) = matches.get_one::<u64>("cache-ttl") {
        builder = builder.cache_ttl(Duration::from_secs(*secs));
    }
    Ok(builder)
}

#[cfg(feature = "redis")]
fn snapshot_cache(url: &str) -> CliResult<Arc<dyn SnapshotCache>> {
    Ok(Arc::new(etcdcfg::adapters::RedisSnapshotCache::new(url)?))
}

#[cfg(not(feature = "redis"))]
fn snapshot_cache(_url: &str) -> CliResult<Arc<dyn SnapshotCache>> {
    Err("this build has no Redis support; enable the `redis` feature".into())
}

fn parse_value(raw: &str, structured: bool) -> CliResult<ConfigValue> {
    if !structured {
        return Ok(ConfigValue::from(raw));
    }
    #[cfg(feature = "yaml")]
    {
        Ok(ConfigValue::from_yaml_str(raw)?)
    }
    #[cfg(not(feature = "yaml"))]
    {
        Ok(serde_json::from_str(raw)?)
    }
}

fn render(value: &ConfigValue, json: bool) -> CliResult<String> {
    if let ConfigValue::Scalar(s) = value {
        return Ok(s.clone());
    }
    #[cfg(feature = "yaml")]
    if !json {
        return Ok(value.to_yaml_string()?.trim_end().to_string());
    }
    let _ = json;
    Ok(serde_json::to_string_pretty(value)?)
}

fn run(matches: &ArgMatches) -> CliResult<()> {
    let json = matches.get_flag("json");
    match matches.subcommand() {
        Some(("get", sub)) => {
            let path = required(sub, "path")?;
            let value = if sub.get_flag("fresh") {
                builder(matches)?.build_mutable()?.fetch(path)?
            } else {
                builder(matches)?.build()?.require(path)?
            };
            println!("{}", render(&value, json)?);
        }
        Some(("set", sub)) => {
            let path = required(sub, "path")?;
            let value = parse_value(required(sub, "value")?, sub.get_flag("structured"))?;
            builder(matches)?.bootstrap_mutable()?.set_value(path, value)?;
        }
        Some(("copy", sub)) => {
            let mut store = builder(matches)?.build_mutable()?;
            store.copy(required(sub, "src")?, required(sub, "dst")?)?;
        }
        Some(("delete", sub)) => {
            builder(matches)?
                .build_mutable()?
                .delete(required(sub, "path")?)?;
        }
        Some(("init", _)) => {
            builder(matches)?.bootstrap_mutable()?.init()?;
        }
        _ => unreachable!("subcommand_required prevents this"),
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> CliResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

fn main() -> ExitCode {
    init_tracing();
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
