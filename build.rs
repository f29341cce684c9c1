// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("smig")
        .version(env!("CARGO_PKG_VERSION"))
        .author("smig Contributors")
        .about("Schema-migration engine for multi-model databases")
        .subcommand_required(true)
        .arg(Arg::new("url").long("url").global(true).help("Database connection URL"))
        .arg(Arg::new("namespace").long("namespace").global(true).help("Namespace"))
        .arg(Arg::new("database").long("database").global(true).help("Database name"))
        .arg(Arg::new("username").long("username").global(true).help("Username"))
        .arg(Arg::new("password").long("password").global(true).help("Password"))
        .arg(Arg::new("schema").long("schema").global(true).help("Path to the desired schema source"))
        .arg(Arg::new("env").long("env").global(true).help("Named environment from the config file"))
        .arg(Arg::new("config").long("config").global(true).default_value("smig.config.toml").help("Path to the config file"))
        .subcommand(
            Command::new("migrate")
                .about("Diff the desired schema against the live database and apply it")
                .arg(Arg::new("message").short('m').long("message").help("Message recorded alongside the applied migration"))
                .arg(Arg::new("debug").long("debug").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(Command::new("status").about("List applied migrations and report whether changes are pending"))
        .subcommand(
            Command::new("rollback")
                .about("Reverse the most recent migration, a specific id, or a range back to an id")
                .arg(Arg::new("id").short('i').long("id").help("Roll back exactly this migration id"))
                .arg(Arg::new("to").short('t').long("to").help("Roll back every migration applied at or after this id"))
                .arg(Arg::new("debug").long("debug").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("generate")
                .about("Diff only; print or write the forward/reverse DDL without applying it")
                .arg(Arg::new("output").short('o').long("output").help("Write the DDL here instead of printing it"))
                .arg(Arg::new("debug").long("debug").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("init")
                .about("Write a starter schema file")
                .arg(Arg::new("output").short('o').long("output").default_value("schema.toml")),
        )
        .subcommand(Command::new("test").about("Connect and execute a trivial ledger query"))
        .subcommand(
            Command::new("config")
                .about("Print the resolved configuration and available environments")
                .arg(Arg::new("show_secrets").long("show-secrets").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("mermaid")
                .about("Render the schema as a Mermaid ER diagram")
                .arg(Arg::new("output").short('o').long("output").help("Write the diagram here instead of printing it")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("smig.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
