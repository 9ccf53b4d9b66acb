use anyhow::{Context, Result, bail};
use quire_config::Config;
use quire_engine::invariants::{Violation, violations};
use quire_engine::{MarkupOptions, SessionOptions, interchange, io};
use std::path::{Path, PathBuf};
use std::{env, process};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Markup in, interchange JSON out
    Sanitize(PathBuf),
    /// Interchange JSON in, markup out
    Render(PathBuf),
    /// Report grammar violations of a stored document
    Validate(PathBuf),
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [command, path] => {
                let path = PathBuf::from(path);
                match command.as_str() {
                    "sanitize" => Some(Command::Sanitize(path)),
                    "render" => Some(Command::Render(path)),
                    "validate" => Some(Command::Validate(path)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        history_limit: config.history_limit,
        autosave_interval: config.autosave_interval(),
        markup: MarkupOptions {
            indent_step_px: config.indent_step_px,
        },
    }
}

fn run(command: &Command, config: &Config) -> Result<String> {
    let options = session_options(config);
    match command {
        Command::Sanitize(path) => {
            let path = config.resolve_document(path);
            let tree = io::read_document(&path, &options.markup)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(interchange::to_json(&tree)?)
        }
        Command::Render(path) => {
            let path = config.resolve_document(path);
            let tree = io::read_document(&path, &options.markup)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(quire_engine::render::to_markup_with(&tree, &options.markup))
        }
        Command::Validate(path) => {
            let path = config.resolve_document(path);
            let tree = io::read_document(&path, &options.markup)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let found = violations(&tree);
            if !found.is_empty() {
                bail!("{}", describe(&path, &found));
            }
            Ok(format!("{}: ok ({} nodes)", path.display(), tree.len()))
        }
    }
}

fn describe(path: &Path, found: &[Violation]) -> String {
    let mut lines = vec![format!("{}: {} problems", path.display(), found.len())];
    lines.extend(found.iter().map(|v| format!("  {v}")));
    lines.join("\n")
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = Command::parse(&args[1.min(args.len())..]) else {
        let program_name = args
            .first()
            .cloned()
            .unwrap_or_else(|| "quire-cli".to_string());
        eprintln!("Usage: {} <sanitize|render|validate> <file>", program_name);
        eprintln!("  sanitize <file.html>  print the cleaned document as JSON");
        eprintln!("  render <doc.json>     print a stored document as markup");
        eprintln!("  validate <doc.json>   check a stored document");
        process::exit(1);
    };

    let config = Config::load_or_default()?;
    log::info!("Config path: {}", Config::config_path().display());

    match run(&command, &config) {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
