//! Pommel CLI - Maven POM reactor linter and auto-fixer

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pommel::{
    format_fix_summary, load_ignore_list, Engine, JsonFormatter, OutputFormatter, Reactor,
    RuleRegistry, RulesCache, TextFormatter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pommel",
    version,
    about = "Maven POM reactor linter and auto-fixer",
    long_about = "Checks a reactor of pom.xml files against pluggable rules \
                  and optionally rewrites descriptors in place to fix what it finds."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check the reactor and report violations
    Check {
        /// Reactor root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Only run these rule ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        rules: Option<Vec<String>>,

        /// Project-level configuration file (default: <root>/.pommel.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Shared directory holding one <group-id>.yaml per group
        #[arg(long)]
        config_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Apply fixers and rewrite descriptors in place
    Fix {
        /// Reactor root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Only run these rule ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        rules: Option<Vec<String>>,

        /// Project-level configuration file (default: <root>/.pommel.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Shared directory holding one <group-id>.yaml per group
        #[arg(long)]
        config_dir: Option<PathBuf>,
    },

    /// List registered rules
    Rules,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let no_color = cli.no_color;

    match cli.command {
        Command::Check {
            root,
            rules,
            config,
            config_dir,
            format,
        } => {
            let (reactor, engine, cache) = setup(&root, rules, config, config_dir)?;
            let report = engine.check(&reactor, &cache)?;

            let formatter: Box<dyn OutputFormatter> = match format {
                Format::Text => Box::new(TextFormatter {
                    colored: !no_color,
                }),
                Format::Json => Box::new(JsonFormatter),
            };
            print!("{}", formatter.format(&report));

            Ok(report.exit_code())
        }

        Command::Fix {
            root,
            rules,
            config,
            config_dir,
        } => {
            let (reactor, engine, cache) = setup(&root, rules, config, config_dir)?;
            let outcome = engine.fix(&reactor, &cache)?;

            print!("{}", format_fix_summary(&outcome, !no_color));
            Ok(outcome.exit_code())
        }

        Command::Rules => {
            let registry = RuleRegistry::builtin();
            println!("Checkers:");
            for checker in registry.checkers() {
                println!("  {:<24} {}", checker.id(), checker.description());
            }
            println!("Fixers:");
            for fixer in registry.fixers() {
                println!(
                    "  {:<24} [order {}] {}",
                    fixer.id(),
                    fixer.order(),
                    fixer.description()
                );
            }
            Ok(0)
        }
    }
}

fn setup(
    root: &std::path::Path,
    rules: Option<Vec<String>>,
    config: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> anyhow::Result<(Reactor, Engine, RulesCache)> {
    let reactor = Reactor::discover(root)
        .with_context(|| format!("discovering reactor at {}", root.display()))?;

    let ignore = load_ignore_list(root);
    let project_file = config.unwrap_or_else(|| root.join(".pommel.yaml"));
    let cache = RulesCache::layered(config_dir, Some(project_file));

    let mut engine = Engine::new(RuleRegistry::builtin()).with_ignore(ignore);
    if let Some(ids) = rules {
        engine = engine.with_active(&ids);
    }

    Ok((reactor, engine, cache))
}
