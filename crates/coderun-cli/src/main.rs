use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coderun_core::{
    default_config_path, load_config, load_config_or_default, CodeRunner, Language, RunnerConfig,
};
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

mod repl;

#[derive(Parser, Debug)]
#[clap(name = "coderun", author, version, about = "Run JavaScript and Python snippets")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        long,
        short,
        global = true,
        help = "Configuration file (defaults to ~/.coderun/config.yaml when present)"
    )]
    config: Option<PathBuf>,

    #[clap(long, global = true, help = "Log level (overrides the config file)")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a snippet from a file, or from stdin when no file is given
    Run {
        #[clap(
            long,
            short,
            help = "Language: javascript or python (inferred from the file extension)"
        )]
        lang: Option<Language>,

        file: Option<PathBuf>,
    },
    /// Print the canned sample for a language
    Sample { lang: Language },
    /// Interactive session: edit a buffer and run it repeatedly
    Repl,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => load_config_or_default(&path).await?,
            None => RunnerConfig::default(),
        },
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .parse()
        .unwrap_or(LevelFilter::Info);
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Commands::Run { lang, file } => run_once(&config, lang, file.as_deref()).await,
        Commands::Sample { lang } => {
            println!("{}", lang.sample());
            Ok(())
        }
        Commands::Repl => {
            let runner = CodeRunner::new(&config)?;
            repl::run(&runner).await
        }
    }
}

async fn run_once(
    config: &RunnerConfig,
    lang: Option<Language>,
    file: Option<&Path>,
) -> Result<()> {
    let source = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut source = String::new();
            tokio::io::stdin().read_to_string(&mut source).await?;
            source
        }
    };

    let language = lang
        .or_else(|| file.and_then(language_from_extension))
        .unwrap_or(config.default_language);

    let runner = CodeRunner::new(config)?;
    runner.select_language(language);
    runner.set_source(source);
    let result = runner.run_current().await;

    print!("{}", runner.output().contents());
    std::io::stdout().flush()?;
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn language_from_extension(path: &Path) -> Option<Language> {
    match path.extension()?.to_str()? {
        "py" => Some(Language::Python),
        "js" | "mjs" | "cjs" => Some(Language::JavaScript),
        _ => None,
    }
}
