//! Domain Avail Service
//!
//! Runs the availability engine from domain-avail-lib as an HTTP service
//! (`serve`, the default) or answers a single batch from the command line
//! (`check`).

mod routes;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};
use domain_avail_lib::{
    load_env_config, parse_duration_string, CheckConfig, ConfigManager, DomainChecker, EnvConfig,
    FileConfig, ServerConfig,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "domain_avail=info,domain_avail_lib=info";

/// Exit status for rejected input, mirroring the service's 400.
const EXIT_INPUT_ERROR: i32 = 2;

/// CLI arguments for domain-avail
#[derive(Parser, Debug)]
#[command(name = "domain-avail")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Domain availability microservice using DNS and WHOIS")]
#[command(
    long_about = "Answer whether domain names are free to register.\n\nA DNS address record means taken; otherwise the registry's WHOIS response is classified. Runs as an HTTP service by default."
)]
#[command(styles = STYLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve(ServeArgs),

    /// Check a `;`-separated list of domains and print JSON
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    #[command(flatten)]
    pub lookup: LookupArgs,
}

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Domains to check, e.g. "example.com;example.org"
    #[arg(value_name = "DOMAINS")]
    pub domains: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub lookup: LookupArgs,
}

/// Lookup settings shared by both commands.
#[derive(Args, Debug, Default, Clone)]
pub struct LookupArgs {
    /// Use this TOML config file instead of discovery
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the DNS pre-check and always ask WHOIS
    #[arg(long = "no-dns")]
    pub no_dns: bool,

    /// WHOIS referrals to follow (0 or 1)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=1))]
    pub follow: Option<u8>,

    /// Per-domain lookup timeout (e.g. "30s", "500ms")
    #[arg(short, long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Bound on lookups in flight per batch
    #[arg(long = "max-concurrency", value_name = "N", value_parser = parse_limit)]
    pub max_concurrency: Option<usize>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => run_server(args).await,
        Command::Check(args) => run_check(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the global tracing subscriber writing to stderr.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut server, check) = build_config(&args.lookup)?;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    let checker = DomainChecker::with_config(check)?;
    let app = routes::router(checker);

    let address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", address, e))?;

    info!(
        address = %address,
        version = env!("CARGO_PKG_VERSION"),
        "domain-avail listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn run_check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, check) = build_config(&args.lookup)?;
    let checker = DomainChecker::with_config(check)?;

    let results = match checker.check_param(Some(&args.domains)).await {
        Ok(results) => results,
        Err(e) if e.is_input_error() => {
            eprintln!("{}", e);
            process::exit(EXIT_INPUT_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{}", output);

    Ok(())
}

/// Layer defaults, config files, `DA_*` variables and CLI flags.
fn build_config(
    args: &LookupArgs,
) -> Result<(ServerConfig, CheckConfig), Box<dyn std::error::Error>> {
    let env_config = load_env_config();

    let explicit = args.config.clone().or_else(|| env_config.config.clone());
    let file_config = ConfigManager::new()
        .load(explicit.as_deref())
        .map_err(|e| format!("Failed to load configuration: {}", e))?;

    Ok(layer_config(&file_config, &env_config, args)?)
}

/// Pure layering step, lowest precedence first.
fn layer_config(
    file_config: &FileConfig,
    env_config: &EnvConfig,
    args: &LookupArgs,
) -> Result<(ServerConfig, CheckConfig), domain_avail_lib::DomainCheckError> {
    let mut server = ServerConfig::default();
    let mut check = CheckConfig::default();

    file_config.apply(&mut server, &mut check)?;
    env_config.apply(&mut server, &mut check);
    apply_cli_args(args, &mut check);

    Ok((server, check))
}

fn apply_cli_args(args: &LookupArgs, config: &mut CheckConfig) {
    if args.no_dns {
        config.dns_precheck = false;
    }
    if let Some(follow) = args.follow {
        config.follow = follow;
    }
    if let Some(timeout) = args.timeout {
        config.lookup_timeout = timeout;
    }
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = Some(limit);
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    parse_duration_string(value).ok_or_else(|| {
        format!(
            "invalid duration '{}'. Use a format like '500ms', '5s', '2m'",
            value
        )
    })
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{}' is not a positive integer", value)),
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_avail_lib::DEFAULT_PORT;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["domain-avail"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "domain-avail",
            "check",
            "a.com;b.org",
            "--no-dns",
            "--follow",
            "0",
            "--timeout",
            "5s",
            "--max-concurrency",
            "4",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Check(args)) => {
                assert_eq!(args.domains, "a.com;b.org");
                assert!(args.lookup.no_dns);
                assert_eq!(args.lookup.follow, Some(0));
                assert_eq!(args.lookup.timeout, Some(Duration::from_secs(5)));
                assert_eq!(args.lookup.max_concurrency, Some(4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_flags() {
        assert!(Cli::try_parse_from(["domain-avail", "check", "a.com", "--follow", "2"]).is_err());
        assert!(Cli::try_parse_from(["domain-avail", "serve", "--port", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["domain-avail", "check", "a.com", "--max-concurrency", "0"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["domain-avail", "check", "a.com", "--timeout", "soon"]).is_err()
        );
    }

    #[test]
    fn test_defaults_without_overrides() {
        let (server, check) = layer_config(
            &FileConfig::default(),
            &EnvConfig::default(),
            &LookupArgs::default(),
        )
        .unwrap();

        assert_eq!(server.bind_address(), format!("0.0.0.0:{}", DEFAULT_PORT));
        assert_eq!(check, CheckConfig::default());
    }

    #[test]
    fn test_layer_precedence() {
        let file_config: FileConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [lookup]
            follow = 0
            timeout = "20s"
            max_concurrency = 8
            "#,
        )
        .unwrap();
        let env_config = EnvConfig::from_lookup(|name| match name {
            "DA_PORT" => Some("9100".to_string()),
            "DA_TIMEOUT" => Some("15s".to_string()),
            _ => None,
        });
        let args = LookupArgs {
            timeout: Some(Duration::from_secs(5)),
            no_dns: true,
            ..Default::default()
        };

        let (server, check) = layer_config(&file_config, &env_config, &args).unwrap();

        assert_eq!(server.port, 9100);
        assert_eq!(check.follow, 0);
        assert_eq!(check.max_concurrency, Some(8));
        assert_eq!(check.lookup_timeout, Duration::from_secs(5));
        assert!(!check.dns_precheck);
    }
}
