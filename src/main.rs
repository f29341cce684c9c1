// src/main.rs

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::info;

use smig::config::{self, CliOverrides};
use smig::db::client::DatabaseClient;
use smig::db::mock::MockClient;
#[cfg(feature = "surreal-client")]
use smig::db::surreal::{SurrealClient, SurrealConfig};
use smig::ir::Schema;
use smig::ledger::MIGRATIONS_TABLE;
use smig::manager::{MigrateOutcome, MigrationManager};
use smig::{mermaid, schema_file};

#[derive(Parser)]
#[command(name = "smig")]
#[command(author, version, about = "Schema-migration engine for multi-model databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database connection URL (default: ws://localhost:8000)
    #[arg(long, global = true)]
    url: Option<String>,
    /// Namespace (default: smig)
    #[arg(long, global = true)]
    namespace: Option<String>,
    /// Database name (default: smig)
    #[arg(long, global = true)]
    database: Option<String>,
    /// Username (default: root)
    #[arg(long, global = true)]
    username: Option<String>,
    /// Password (default: root)
    #[arg(long, global = true)]
    password: Option<String>,
    /// Path to the desired schema source (default: schema.toml)
    #[arg(long, global = true)]
    schema: Option<String>,
    /// Named environment from the config file
    #[arg(long, global = true)]
    env: Option<String>,
    /// Path to the config file (default: ./smig.config.toml)
    #[arg(long, global = true, default_value = "smig.config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff the desired schema against the live database and apply it
    Migrate {
        /// Message recorded alongside the applied migration
        #[arg(short, long)]
        message: Option<String>,
        #[arg(long)]
        debug: bool,
    },
    /// List applied migrations and report whether changes are pending
    Status,
    /// Reverse the most recent migration, a specific id, or a range back to an id
    Rollback {
        /// Roll back exactly this migration id
        #[arg(short = 'i', long, conflicts_with = "to")]
        id: Option<String>,
        /// Roll back every migration applied at or after this id
        #[arg(short = 't', long, conflicts_with = "id")]
        to: Option<String>,
        #[arg(long)]
        debug: bool,
    },
    /// Diff only; print or write the forward/reverse DDL without applying it
    Generate {
        /// Write the DDL here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        debug: bool,
    },
    /// Write a starter schema file
    Init {
        /// Output path; a `.rs` extension writes the compiled-in producer
        /// form, anything else writes the declarative TOML form
        #[arg(short, long, default_value = "schema.toml")]
        output: PathBuf,
    },
    /// Connect and execute a trivial ledger query
    Test,
    /// Print the resolved configuration and available environments
    Config {
        /// Show the resolved password instead of masking it
        #[arg(long)]
        show_secrets: bool,
    },
    /// Render the schema as a Mermaid ER diagram
    Mermaid {
        /// Write the diagram here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn command_debug(command: &Commands) -> bool {
    match command {
        Commands::Migrate { debug, .. } | Commands::Rollback { debug, .. } | Commands::Generate { debug, .. } => *debug,
        _ => false,
    }
}

fn resolve_config(cli: &Cli) -> Result<config::Config> {
    let overrides = CliOverrides {
        url: cli.url.clone(),
        namespace: cli.namespace.clone(),
        database: cli.database.clone(),
        username: cli.username.clone(),
        password: cli.password.clone(),
        schema: cli.schema.clone(),
        env: cli.env.clone(),
    };
    Ok(config::resolve(overrides, Some(&cli.config))?)
}

fn load_desired_schema(config: &config::Config) -> Result<Schema> {
    Ok(schema_file::load_schema_from_file(&config.schema)?)
}

#[cfg(feature = "surreal-client")]
fn build_client(config: &config::Config) -> Result<Box<dyn DatabaseClient>> {
    Ok(Box::new(SurrealClient::new(SurrealConfig {
        url: config.url.clone(),
        namespace: config.namespace.clone(),
        database: config.database.clone(),
        username: config.username.clone(),
        password: config.password.clone(),
    })?))
}

/// Without the `surreal-client` feature there is no real backend compiled
/// in at all, so commands that need a connection run against an in-memory
/// database instead of failing to build. `smig config` reports this via
/// `config.url` regardless; only an actual `connect()` touches the mock.
#[cfg(not(feature = "surreal-client"))]
fn build_client(_config: &config::Config) -> Result<Box<dyn DatabaseClient>> {
    Ok(Box::new(MockClient::new()))
}

fn build_manager(desired: Schema, config: &config::Config) -> Result<MigrationManager> {
    Ok(MigrationManager::new(desired, build_client(config)?))
}

/// Migration ids are namespaced with a `_migrations:` prefix; the CLI
/// accepts either form and prepends the prefix if missing.
fn namespaced_id(raw: &str) -> String {
    let prefix = format!("{MIGRATIONS_TABLE}:");
    if raw.starts_with(&prefix) {
        raw.to_string()
    } else {
        format!("{prefix}{raw}")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging_guard = smig::logging::init(command_debug(&cli.command), None);

    match &cli.command {
        Commands::Migrate { message, .. } => {
            let config = resolve_config(&cli)?;
            let desired = load_desired_schema(&config)?;
            let mut manager = build_manager(desired, &config)?;
            manager.connect()?;
            manager.initialize()?;

            match manager.migrate(message.clone())? {
                MigrateOutcome::Applied(migration) => {
                    info!("applied migration {}", migration.id.as_deref().unwrap_or("?"));
                    println!("Applied migration {}", migration.id.as_deref().unwrap_or("?"));
                    println!("{}", migration.up);
                }
                MigrateOutcome::NoChanges => {
                    println!("No changes.");
                }
            }
            manager.close()?;
            Ok(())
        }

        Commands::Status => {
            let config = resolve_config(&cli)?;
            let desired = load_desired_schema(&config)?;
            let mut manager = build_manager(desired, &config)?;
            manager.connect()?;
            manager.initialize()?;

            let migrations = manager.status()?;
            if migrations.is_empty() {
                println!("No migrations applied yet.");
            } else {
                println!("Applied migrations:");
                for m in &migrations {
                    println!(
                        "  [{}] {} - {}",
                        m.id.as_deref().unwrap_or("?"),
                        m.applied_at,
                        m.message.as_deref().unwrap_or("(no message)")
                    );
                }
            }
            if manager.has_changes()? {
                println!("Changes pending.");
            } else {
                println!("Up to date.");
            }
            manager.close()?;
            Ok(())
        }

        Commands::Rollback { id, to, .. } => {
            let config = resolve_config(&cli)?;
            let desired = load_desired_schema(&config)?;
            let mut manager = build_manager(desired, &config)?;
            manager.connect()?;
            manager.initialize()?;

            if let Some(to) = to {
                let anchor = namespaced_id(to);
                let rolled_back = manager.rollback_all_after(&anchor)?;
                println!("Rolled back {} migration(s).", rolled_back.len());
            } else {
                let target = id.as_deref().map(namespaced_id);
                let migration = manager.rollback(target.as_deref())?;
                println!("Rolled back migration {}", migration.id.as_deref().unwrap_or("?"));
            }
            manager.close()?;
            Ok(())
        }

        Commands::Generate { output, .. } => {
            let config = resolve_config(&cli)?;
            let desired = load_desired_schema(&config)?;
            let mut manager = build_manager(desired, &config)?;
            manager.connect()?;
            manager.initialize()?;

            let (up, down) = manager.generate()?;
            let rendered = format!("-- up\n{up}\n-- down\n{down}\n");
            match output {
                Some(path) => {
                    std::fs::write(path, &rendered)?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{rendered}"),
            }
            manager.close()?;
            Ok(())
        }

        Commands::Init { output } => {
            let is_rust = output.extension().is_some_and(|ext| ext == "rs");
            let contents = if is_rust { starter_schema_module() } else { schema_file::render_starter_toml() };
            std::fs::write(output, contents)?;
            println!("Wrote starter schema to {}", output.display());
            Ok(())
        }

        Commands::Test => {
            let config = resolve_config(&cli)?;
            let mut client = build_client(&config)?;
            client.connect()?;
            client.execute_query(&format!("SELECT * FROM {MIGRATIONS_TABLE} LIMIT 1;"))?;
            client.close()?;
            println!("Connection OK.");
            Ok(())
        }

        Commands::Config { show_secrets } => {
            let config = resolve_config(&cli)?;
            println!("{}", config.display(*show_secrets));

            let environments = config::list_environments(Some(&cli.config))?;
            if environments.is_empty() {
                println!("\nNo named environments declared.");
            } else {
                println!("\nAvailable environments: {}", environments.join(", "));
            }
            Ok(())
        }

        Commands::Mermaid { output } => {
            let config = resolve_config(&cli)?;
            let desired = load_desired_schema(&config)?;
            match output {
                Some(path) => {
                    mermaid::render_to_file(&desired, path)?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", mermaid::render(&desired)),
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "smig", &mut io::stdout());
            Ok(())
        }
    }
}

/// Content for `smig init`'s `.rs` output: a compiled-in schema module
/// (the primary producer form) plus the declarative TOML alternative as
/// a commented block underneath.
fn starter_schema_module() -> String {
    let toml_alternative = schema_file::render_starter_toml();
    let commented_toml: String = toml_alternative.lines().map(|line| format!("// {line}")).collect::<Vec<_>>().join("\n");

    format!(
        r#"// Starter schema for smig.
//
// This is the primary producer form: a plain function returning the IR.
// Load it however your binary wires up `smig::manager::MigrationManager`
// (there is nothing to "load from a path" at runtime; just call `schema()`).

pub fn schema() -> smig::ir::Schema {{
    smig::ir::Schema::builder()
        .table("user", |t| {{
            t.comment("created by `smig init`, edit freely").field("email", |f| {{
                f.type_of("string").assert("$value != NONE")
            }})
            .index("email_ix", |i| i.columns(["email"]).unique())
        }})
        .build()
        .expect("starter schema is always valid")
}}

// Declarative TOML alternative (the secondary producer form), loadable
// at runtime with `smig::schema_file::load_schema_from_file`:
//
{commented_toml}
"#
    )
}
