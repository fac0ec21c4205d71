use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pgconverge_core::{Config, ResourceState, TableSpec};
use pgconverge_catalog::{CatalogAdapter, PostgresAdapter};
use pgconverge_engine::{
    plan_create, plan_update, CatalogLock, DdlStatement, Reconciler, ResourceData,
};

/// pgconverge - Declarative PostgreSQL table reconciliation
#[derive(Parser)]
#[command(name = "pgconverge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: pgconverge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the statements apply would issue
    Plan {
        /// Table declaration (TOML)
        decl: PathBuf,
    },

    /// Create or update the declared table
    Apply {
        /// Table declaration (TOML)
        decl: PathBuf,
    },

    /// Refresh stored state from the catalog
    Read {
        /// Table declaration (TOML)
        decl: PathBuf,
    },

    /// Check whether the declared table exists
    Exists {
        /// Table declaration (TOML)
        decl: PathBuf,
    },

    /// Adopt an existing table as the declaration's state
    Import {
        /// Table declaration (TOML)
        decl: PathBuf,

        /// Name of the existing table
        table: String,
    },

    /// Forget the declared table (the table itself is kept)
    Delete {
        /// Table declaration (TOML)
        decl: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("pgconverge.toml").exists() {
        Config::from_file(Path::new("pgconverge.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    let reconciler = connect(&config, cli.verbose).await?;

    match cli.command {
        Commands::Plan { decl } => plan_command(&reconciler, &config, &decl).await,
        Commands::Apply { decl } => apply_command(&reconciler, &config, &decl).await,
        Commands::Read { decl } => read_command(&reconciler, &config, &decl).await,
        Commands::Exists { decl } => exists_command(&reconciler, &config, &decl).await,
        Commands::Import { decl, table } => {
            import_command(&reconciler, &config, &decl, &table).await
        }
        Commands::Delete { decl } => delete_command(&reconciler, &config, &decl).await,
    }
}

/// Connect to the catalog described by the config and the PG* environment
async fn connect(config: &Config, verbose: bool) -> Result<Reconciler> {
    let mut connection = config.connection.clone();
    connection.fill_from_env()?;

    if verbose {
        eprintln!(
            "{} {}:{}...",
            "Connecting to".cyan(),
            connection.host.as_deref().unwrap_or("localhost"),
            connection.port.unwrap_or(5432)
        );
    }

    let adapter = PostgresAdapter::from_config(&connection)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to catalog: {}", e))?;

    adapter.test_connection().await
        .map_err(|e| anyhow::anyhow!("Failed to connect to catalog: {}", e))?;

    tracing::info!(adapter = adapter.name(), database = adapter.database(), "catalog connected");
    if verbose {
        eprintln!("{}", "✓ Connection successful".green());
    }

    Ok(Reconciler::new(Arc::new(adapter), CatalogLock::new()))
}

/// State file for a declaration: `<state_dir>/<decl stem>.json`
fn state_file(config: &Config, decl: &Path) -> Result<PathBuf> {
    let stem = decl
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid declaration path: {}", decl.display()))?;
    Ok(config.state_path().join(format!("{}.json", stem)))
}

/// Load the declaration and any stored state for it
fn load(config: &Config, decl: &Path) -> Result<(TableSpec, PathBuf, Option<ResourceState>)> {
    let desired = TableSpec::from_file(decl)?;
    let path = state_file(config, decl)?;
    let state = ResourceState::load(&path)?;
    Ok((desired, path, state))
}

/// Persist the resource, or drop its state when it has no identifier anymore
fn save(data: &ResourceData, path: &Path) -> Result<()> {
    match data.id() {
        Some(id) => ResourceState::new(id, data.get().clone()).save(path)?,
        None => ResourceState::remove(path)?,
    }
    Ok(())
}

fn print_statements<S: std::fmt::Display>(statements: &[S]) {
    if statements.is_empty() {
        println!("{}", "No changes. Table is up to date.".green());
        return;
    }
    for statement in statements {
        println!("  {} {}", "+".green(), statement);
    }
}

/// Build the resource for a declaration
///
/// Stored state whose table no longer exists is dropped, and the table is
/// treated as new.
async fn resolve(
    reconciler: &Reconciler,
    desired: TableSpec,
    state: Option<ResourceState>,
) -> Result<ResourceData> {
    if let Some(state) = state {
        let data = ResourceData::existing(&state.id, state.attributes, desired.clone());
        if reconciler.exists(&data).await? {
            return Ok(data);
        }
        tracing::warn!(table = %state.id, "stored table not found, it will be created");
    }
    Ok(ResourceData::new_resource(desired))
}

fn plan_for(data: &ResourceData) -> Result<Vec<DdlStatement>> {
    let plan = if data.is_new_resource() {
        plan_create(data.get())?
    } else {
        plan_update(data)?
    };
    Ok(plan)
}

/// Re-read the table after a failed apply; false when `data` could not be refreshed
async fn refresh_after_failure(reconciler: &Reconciler, data: &mut ResourceData) -> bool {
    if data.id().is_none() {
        return false;
    }
    match reconciler.read(data).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "could not refresh state after failed apply");
            false
        }
    }
}

/// Plan command - print the DDL apply would issue
async fn plan_command(reconciler: &Reconciler, config: &Config, decl: &Path) -> Result<()> {
    let (desired, _, state) = load(config, decl)?;
    let data = resolve(reconciler, desired, state).await?;
    let plan = plan_for(&data)?;

    println!("{} {}", "Plan for".bold(), data.get().name.cyan());
    print_statements(&plan);
    Ok(())
}

/// Apply command - create or update the table and store observed state
async fn apply_command(reconciler: &Reconciler, config: &Config, decl: &Path) -> Result<()> {
    let (desired, path, state) = load(config, decl)?;
    let mut data = resolve(reconciler, desired, state).await?;

    let result = if data.is_new_resource() {
        reconciler.create(&mut data).await
    } else {
        reconciler.update(&mut data).await
    };

    print_statements(data.applied_statements());

    if let Err(err) = result {
        // Store what the catalog holds now so the next apply resumes from it
        if refresh_after_failure(reconciler, &mut data).await {
            if let Err(e) = save(&data, &path) {
                tracing::warn!(error = %e, "could not store state after failed apply");
            }
        }
        return Err(err.into());
    }

    save(&data, &path)?;
    let Some(id) = data.id() else {
        return Err(anyhow::anyhow!(
            "Table '{}' disappeared during apply, state removed",
            data.get().name
        ));
    };

    println!(
        "{} {} ({} columns)",
        "✓ Applied".green().bold(),
        id,
        data.get().columns.len()
    );
    Ok(())
}

/// Read command - refresh stored state from the catalog
async fn read_command(reconciler: &Reconciler, config: &Config, decl: &Path) -> Result<()> {
    let (_, path, state) = load(config, decl)?;
    let state = state.ok_or_else(|| {
        anyhow::anyhow!("No state for {}. Run 'pgconverge apply' first.", decl.display())
    })?;

    let mut data = ResourceData::existing(&state.id, state.attributes.clone(), state.attributes);
    reconciler.read(&mut data).await?;
    save(&data, &path)?;

    match data.id() {
        Some(id) => {
            println!("{} {}", "Table".bold(), id.cyan());
            for column in &data.get().columns {
                println!(
                    "  {} {}{}{}",
                    column.name,
                    column.column_type,
                    column.max_length.map(|n| format!("({})", n)).unwrap_or_default(),
                    if column.nullable { "" } else { " NOT NULL" }
                );
            }
        }
        None => {
            println!("{} {} no longer exists, state removed", "⚠".yellow(), state.id);
        }
    }
    Ok(())
}

/// Exists command - print whether the declared table exists
async fn exists_command(reconciler: &Reconciler, config: &Config, decl: &Path) -> Result<()> {
    let (_, _, state) = load(config, decl)?;

    let exists = match state {
        Some(state) => reconciler.exists(&ResourceData::from_id(state.id)).await?,
        None => false,
    };

    println!("{}", exists);
    Ok(())
}

/// Import command - adopt an existing table
async fn import_command(
    reconciler: &Reconciler,
    config: &Config,
    decl: &Path,
    table: &str,
) -> Result<()> {
    let path = state_file(config, decl)?;

    let data = reconciler.import(table).await?;
    if data.id().is_none() {
        return Err(anyhow::anyhow!("Table '{}' does not exist", table));
    }
    save(&data, &path)?;

    println!(
        "{} {} ({} columns)",
        "✓ Imported".green().bold(),
        table,
        data.get().columns.len()
    );
    Ok(())
}

/// Delete command - forget the table; the catalog is not touched
async fn delete_command(reconciler: &Reconciler, config: &Config, decl: &Path) -> Result<()> {
    let (_, path, state) = load(config, decl)?;
    let Some(state) = state else {
        println!("{}", "Nothing to delete.".yellow());
        return Ok(());
    };

    let mut data = ResourceData::from_id(&state.id);
    reconciler.delete(&mut data).await?;
    save(&data, &path)?;

    println!(
        "{} table {} was kept in the database; drop it manually if needed",
        "⚠".yellow(),
        state.id.cyan()
    );
    Ok(())
}
