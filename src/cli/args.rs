// src/cli/args.rs
use crate::checks::TcpCheck;
use crate::config::{Config, HealthOptions};
use crate::health::CheckConfig;
use crate::interval::Interval;
use std::path::PathBuf;

pub const DEFAULT_CHECK_URL: &str = "http://localhost:9000/health";
pub const DATABASE_CHECK: &str = "database";
pub const REDIS_CHECK: &str = "redis";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CliError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("option `{0}` requires a value")]
    MissingValue(String),

    #[error("invalid value `{value}` for `{option}`: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Serve(ServeArgs),
    Check { url: String },
    Help,
    Version,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServeArgs {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub config: Option<PathBuf>,
    pub check_db: Option<String>,
    pub check_redis: Option<String>,
    pub interval: Option<Interval>,
    pub quiet: bool,
}

impl ServeArgs {
    /// Command line values win over the file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(interval) = self.interval {
            config.interval = Some(interval);
        }
    }

    pub fn into_options(self, mut config: Config) -> HealthOptions {
        self.apply(&mut config);
        let mut options = HealthOptions::new(config);

        if let Some(address) = self.check_db {
            options = options.check_with(
                DATABASE_CHECK,
                CheckConfig::new(TcpCheck::new(address)).critical(true),
            );
        }
        if let Some(address) = self.check_redis {
            options = options.check(REDIS_CHECK, TcpCheck::redis(address));
        }
        options
    }
}

/// Parse everything after the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    // --help and --version win wherever they appear
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        return Ok(Command::Version);
    }

    let mut rest = args.into_iter();
    match rest.next().as_deref() {
        None => Ok(Command::Serve(ServeArgs::default())),
        Some("serve") => parse_serve(rest).map(Command::Serve),
        Some("check") => {
            let url = rest.next().unwrap_or_else(|| DEFAULT_CHECK_URL.to_string());
            match rest.next() {
                Some(extra) => Err(CliError::UnexpectedArgument(extra)),
                None => Ok(Command::Check { url }),
            }
        }
        Some("help") => Ok(Command::Help),
        Some(other) if other.starts_with('-') => {
            // flags without a command are serve flags
            parse_serve(std::iter::once(other.to_string()).chain(rest)).map(Command::Serve)
        }
        Some(other) => Err(CliError::UnknownCommand(other.to_string())),
    }
}

fn parse_serve(mut args: impl Iterator<Item = String>) -> Result<ServeArgs, CliError> {
    let mut parsed = ServeArgs::default();

    while let Some(arg) = args.next() {
        let (option, inline) = match arg.split_once('=') {
            Some((option, value)) if option.starts_with("--") => {
                (option.to_string(), Some(value.to_string()))
            }
            _ => (arg, None),
        };

        let mut value = || -> Result<String, CliError> {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| CliError::MissingValue(option.clone()))
        };

        match option.as_str() {
            "--port" | "-p" => {
                let raw = value()?;
                let port = raw.parse::<u16>().map_err(|e| CliError::InvalidValue {
                    option: option.clone(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                parsed.port = Some(port);
            }
            "--host" => parsed.host = Some(value()?),
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value()?)),
            "--check-db" => parsed.check_db = Some(address(&option, value()?)?),
            "--check-redis" => parsed.check_redis = Some(address(&option, value()?)?),
            "--interval" => {
                let raw = value()?;
                let interval = raw.parse::<Interval>().map_err(|e| CliError::InvalidValue {
                    option: option.clone(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                parsed.interval = Some(interval);
            }
            "--quiet" | "-q" => parsed.quiet = true,
            other if other.starts_with('-') => {
                return Err(CliError::UnknownOption(other.to_string()))
            }
            other => return Err(CliError::UnexpectedArgument(other.to_string())),
        }
    }

    Ok(parsed)
}

fn address(option: &str, raw: String) -> Result<String, CliError> {
    match raw.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(raw),
        _ => Err(CliError::InvalidValue {
            option: option.to_string(),
            value: raw,
            reason: "expected HOST:PORT".to_string(),
        }),
    }
}

pub fn usage() -> String {
    format!(
        "\
{name} {version}

USAGE:
    {name} [serve] [OPTIONS]
    {name} check [URL]

COMMANDS:
    serve    Start the health check server (default)
    check    Query a running server; exit 0 healthy, 1 degraded, 2 unhealthy, 3 error
             URL defaults to {url}

OPTIONS:
    -p, --port <PORT>          Port to listen on [default: 9000]
        --host <HOST>          Address to bind [default: 0.0.0.0]
    -c, --config <FILE>        YAML or JSON configuration file
        --check-db <ADDR>      Critical TCP check named `{db}`
        --check-redis <ADDR>   Redis PING check named `{redis}`
        --interval <INTERVAL>  Re-run checks in the background, e.g. 30s
    -q, --quiet                Only log warnings and errors
    -h, --help                 Print help
    -V, --version              Print version
",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        url = DEFAULT_CHECK_URL,
        db = DATABASE_CHECK,
        redis = REDIS_CHECK,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags() {
        let command = parse_args([
            "serve",
            "-p",
            "8081",
            "--host",
            "127.0.0.1",
            "--config=health.yaml",
            "--check-db",
            "localhost:5432",
            "--check-redis",
            "cache:6379",
            "--interval",
            "30s",
            "-q",
        ])
        .unwrap();

        let expected = ServeArgs {
            port: Some(8081),
            host: Some("127.0.0.1".to_string()),
            config: Some(PathBuf::from("health.yaml")),
            check_db: Some("localhost:5432".to_string()),
            check_redis: Some("cache:6379".to_string()),
            interval: Some("30s".parse().unwrap()),
            quiet: true,
        };
        assert_eq!(command, Command::Serve(expected));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            parse_args(Vec::<String>::new()).unwrap(),
            Command::Serve(ServeArgs::default())
        );
        assert_eq!(
            parse_args(["check"]).unwrap(),
            Command::Check {
                url: DEFAULT_CHECK_URL.to_string()
            }
        );
        assert_eq!(
            parse_args(["--port", "1234"]).unwrap(),
            Command::Serve(ServeArgs {
                port: Some(1234),
                ..ServeArgs::default()
            })
        );
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        assert_eq!(parse_args(["serve", "--port", "x", "-h"]).unwrap(), Command::Help);
        assert_eq!(parse_args(["check", "-V"]).unwrap(), Command::Version);
        assert!(usage().contains("--check-redis"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_args(["launch"]).unwrap_err(),
            CliError::UnknownCommand("launch".to_string())
        );
        assert_eq!(
            parse_args(["serve", "--port"]).unwrap_err(),
            CliError::MissingValue("--port".to_string())
        );
        assert!(matches!(
            parse_args(["serve", "--port", "70000"]).unwrap_err(),
            CliError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse_args(["serve", "--interval", "soon"]).unwrap_err(),
            CliError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse_args(["serve", "--interval", "1e20d"]).unwrap_err(),
            CliError::InvalidValue { .. }
        ));
        assert!(matches!(
            parse_args(["serve", "--check-db", "localhost"]).unwrap_err(),
            CliError::InvalidValue { .. }
        ));
        assert_eq!(
            parse_args(["serve", "--verbose"]).unwrap_err(),
            CliError::UnknownOption("--verbose".to_string())
        );
        assert_eq!(
            parse_args(["check", "http://a", "http://b"]).unwrap_err(),
            CliError::UnexpectedArgument("http://b".to_string())
        );
    }

    #[test]
    fn test_into_options_registers_checks() {
        let args = ServeArgs {
            port: Some(7000),
            check_db: Some("localhost:5432".to_string()),
            check_redis: Some("localhost:6379".to_string()),
            ..ServeArgs::default()
        };

        let options = args.into_options(Config::default());

        assert_eq!(options.config.server.port, 7000);
        assert_eq!(options.checks[DATABASE_CHECK].critical, Some(true));
        assert_eq!(options.checks[REDIS_CHECK].critical, None);
    }
}
