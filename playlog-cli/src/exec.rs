use std::{collections::HashMap, sync::Arc};

use miette::{miette, IntoDiagnostic, Result};
use playlog::catalog::staging::jsonpaths;
use playlog::catalog::tables::{table, STAGING_EVENTS};
use playlog::prelude::*;
use tracing::{debug, info, warn};

use crate::{ConfigArgs, Engine, EngineArgs};

const ALL_PHASES: [Phase; 4] = [Phase::Drop, Phase::Create, Phase::Copy, Phase::Insert];

pub fn load_config(args: &ConfigArgs) -> Result<WarehouseConfig> {
    let format = format_from_path(&args.config);
    let params = HashMap::from_iter(args.params.clone().unwrap_or_default());

    debug!("Loading configuration from {}", args.config.display());
    let config = WarehouseConfig::from_file(&args.config, format, params)?;

    Ok(config)
}

fn connect(engine: Engine, config: &WarehouseConfig) -> Result<Box<dyn Warehouse>> {
    match engine {
        Engine::Local => {
            debug!("Creating SessionContext");
            Ok(Box::new(LocalWarehouse::new()))
        }
        #[cfg(feature = "odbc")]
        Engine::Redshift => {
            let cluster = config.cluster.as_ref().ok_or_else(|| {
                miette!(
                    help = "Add a [cluster] section with host, db_name, user and password",
                    "No cluster configured"
                )
            })?;

            info!("Connecting to {}:{}", cluster.host, cluster.port);
            Ok(Box::new(RedshiftWarehouse::connect(cluster)?))
        }
        #[cfg(not(feature = "odbc"))]
        Engine::Redshift => {
            let _ = config;
            Err(miette!(
                help = "Reinstall with: cargo install playlog-cli --features odbc\n\
                        Or run on the embedded engine with --engine local",
                "Redshift support is not enabled in this build of playlog-cli"
            ))
        }
    }
}

// Local tables only live as long as one command
fn check_engine(engine: Engine, plan: Plan) -> Result<()> {
    match (engine, plan) {
        (Engine::Local, Plan::CreateTables | Plan::Etl) => Err(miette!(
            help = "Use `playlog run --engine local` to create, load and transform in one go",
            "The local engine keeps no tables between commands"
        )),
        _ => Ok(()),
    }
}

pub async fn run(args: &EngineArgs, plan: Plan, print_summary: bool) -> Result<()> {
    check_engine(args.engine, plan)?;
    info!("Running {plan:?} on the {:?} engine", args.engine);

    let config = load_config(&args.config)?;
    let warehouse = connect(args.engine, &config)?;

    let progress_tracker = Arc::new(LoggingProgressTracker);
    let summary = run_plan(warehouse.as_ref(), plan, &config, Some(progress_tracker)).await?;

    debug!(run_id = %summary.run_id, "Run completed successfully");

    if print_summary {
        print_counts(warehouse.as_ref()).await?;
    }

    Ok(())
}

pub async fn summary(args: &EngineArgs) -> Result<()> {
    if args.engine == Engine::Local {
        return Err(miette!(
            help = "Use `playlog run --engine local --summary` to load and count in one go",
            "The local engine keeps no tables between commands"
        ));
    }

    let config = load_config(&args.config)?;
    let warehouse = connect(args.engine, &config)?;

    print_counts(warehouse.as_ref()).await
}

async fn print_counts(warehouse: &dyn Warehouse) -> Result<()> {
    let counts = table_row_counts(warehouse).await?;

    for count in counts {
        println!("{:<16}{:>12}", count.table, count.rows);
    }

    Ok(())
}

pub fn print_sql(
    dialect: Dialect,
    only: Option<Phase>,
    config: Option<&WarehouseConfig>,
) -> Result<()> {
    let catalog = Catalog::new(dialect);

    let phases = match only {
        Some(phase) => vec![phase],
        None => ALL_PHASES.to_vec(),
    };

    for phase in phases {
        // an explicit `--phase copy` without a configuration is an error instead
        if phase == Phase::Copy && config.is_none() && only.is_none() {
            warn!("Skipping copy statements, pass --config to render them");
            continue;
        }

        for statement in catalog.phase_statements(phase, config)? {
            println!("-- {} {}", statement.phase, statement.table);

            if let Some(source) = &statement.source {
                println!("-- {} reads {}", source.name, source.location);
            }

            println!("{};\n", statement.sql);
        }
    }

    Ok(())
}

pub fn print_jsonpaths() -> Result<()> {
    let events =
        table(STAGING_EVENTS).ok_or_else(|| miette!("Unknown table {STAGING_EVENTS}"))?;
    let descriptor = serde_json::to_string_pretty(&jsonpaths(events)).into_diagnostic()?;

    println!("{descriptor}");
    Ok(())
}
