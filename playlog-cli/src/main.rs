use std::{error::Error, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use playlog::prelude::*;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod exec;

/// Load song-play event logs and song metadata into a star-schema warehouse
#[derive(Debug, Parser)]
#[command(name = "playlog", version, about, long_about = None)]
struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "PLAYLOG_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Log output format
    #[arg(
        long,
        global = true,
        env = "PLAYLOG_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Engine the statements run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Embedded DataFusion session, tables live for the duration of the command
    Local,
    /// Amazon Redshift over ODBC, needs the `[cluster]` section
    Redshift,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Path to the warehouse configuration file (.toml, .yml, .yaml or .json)
    #[arg(short, long, env = "PLAYLOG_CONFIG")]
    config: PathBuf,

    /// k=v list of parameters to substitute into the configuration file
    /// e.g. playlog run -c dwh.toml -p password=secret -p bucket=udacity-dend
    #[arg(short, long, value_parser = parse_key_val::<String, String>)]
    params: Option<Vec<(String, String)>>,
}

#[derive(Debug, Args)]
struct EngineArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Engine to run the statements on
    #[arg(long, value_enum, default_value_t = Engine::Redshift)]
    engine: Engine,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Drop and recreate all seven tables
    CreateTables {
        #[command(flatten)]
        args: EngineArgs,
    },

    /// Load the staging tables, then populate the fact and dimension tables
    Etl {
        #[command(flatten)]
        args: EngineArgs,
    },

    /// Recreate the staging tables, load them and populate the warehouse tables
    Run {
        #[command(flatten)]
        args: EngineArgs,

        /// Drop the warehouse tables too instead of appending to them
        #[arg(long)]
        reset: bool,

        /// Print the row count of every table afterwards
        #[arg(long)]
        summary: bool,
    },

    /// Print the rendered statements
    Sql {
        /// Only print the statements of this phase (drop, create, copy, insert)
        #[arg(long, value_parser = parse_phase)]
        phase: Option<Phase>,

        /// Dialect to render (redshift, datafusion)
        #[arg(long, default_value = "redshift")]
        dialect: Dialect,

        /// Configuration file, needed to render copy statements
        #[arg(short, long, env = "PLAYLOG_CONFIG")]
        config: Option<PathBuf>,

        /// k=v list of parameters to substitute into the configuration file
        #[arg(short, long, value_parser = parse_key_val::<String, String>)]
        params: Option<Vec<(String, String)>>,
    },

    /// Print the JSONPaths descriptor mapping event log fields to staging columns
    Jsonpaths,

    /// Print the row count of every table
    Summary {
        #[command(flatten)]
        args: EngineArgs,
    },
}

fn parse_key_val<T, U>(
    s: &str,
) -> std::result::Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}

fn parse_phase(s: &str) -> std::result::Result<Phase, String> {
    match s.to_ascii_lowercase().as_str() {
        "drop" => Ok(Phase::Drop),
        "create" => Ok(Phase::Create),
        "copy" => Ok(Phase::Copy),
        "insert" => Ok(Phase::Insert),
        other => Err(format!(
            "unknown phase '{other}' (expected drop, create, copy or insert)"
        )),
    }
}

fn init_tracing(level: Level, format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_format);

    match cli.command {
        Commands::CreateTables { args } => {
            exec::run(&args, Plan::CreateTables, false).await?;
        }
        Commands::Etl { args } => {
            exec::run(&args, Plan::Etl, false).await?;
        }
        Commands::Run {
            args,
            reset,
            summary,
        } => {
            exec::run(&args, Plan::Run { reset }, summary).await?;
        }
        Commands::Sql {
            phase,
            dialect,
            config,
            params,
        } => {
            let config = config
                .map(|config| exec::load_config(&ConfigArgs { config, params }))
                .transpose()?;

            exec::print_sql(dialect, phase, config.as_ref())?;
        }
        Commands::Jsonpaths => {
            exec::print_jsonpaths()?;
        }
        Commands::Summary { args } => {
            exec::summary(&args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "playlog", "run", "-c", "dwh.toml", "-p", "password=s3cr=t", "--engine", "local",
            "--reset",
        ])
        .unwrap();

        let Commands::Run {
            args,
            reset,
            summary,
        } = cli.command
        else {
            panic!("expected the run command");
        };

        assert!(reset);
        assert!(!summary);
        assert_eq!(args.engine, Engine::Local);
        assert_eq!(args.config.config, PathBuf::from("dwh.toml"));
        assert_eq!(
            args.config.params,
            Some(vec![("password".to_string(), "s3cr=t".to_string())])
        );
    }

    #[test]
    fn test_sql_arguments() {
        let cli = Cli::try_parse_from([
            "playlog", "sql", "--phase", "insert", "--dialect", "local",
        ])
        .unwrap();

        let Commands::Sql {
            phase,
            dialect,
            config,
            ..
        } = cli.command
        else {
            panic!("expected the sql command");
        };

        assert_eq!(phase, Some(Phase::Insert));
        assert_eq!(dialect, Dialect::DataFusion);
        assert_eq!(config, None);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Cli::try_parse_from(["playlog", "sql", "--phase", "truncate"]).is_err());
        assert!(
            Cli::try_parse_from(["playlog", "run", "-c", "dwh.toml", "-p", "novalue"]).is_err()
        );
        assert!(Cli::try_parse_from(["playlog", "etl"]).is_err());
    }
}
