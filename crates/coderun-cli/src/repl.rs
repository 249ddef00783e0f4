//! Line-oriented interactive session.
//!
//! Plain lines are appended to the source buffer; lines starting with `:` are
//! commands. Globals and the Python namespace survive between `:run`s.

use anyhow::Result;
use coderun_core::{CodeRunner, Language, RuntimeLoader};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
:lang <javascript|python>  switch language (loads its sample, clears output)
:run                       run the buffer
:sample                    reload the current language's sample
:show                      print the buffer
:clear                     empty the buffer
:help                      this text
:quit                      leave";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Lang(Language),
    Run,
    Sample,
    Show,
    Clear,
    Help,
    Quit,
    Append(String),
    Invalid(String),
}

fn parse(line: &str) -> Command {
    let Some(command) = line.strip_prefix(':') else {
        return Command::Append(line.to_string());
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("lang"), Some(lang)) => match lang.parse::<Language>() {
            Ok(language) => Command::Lang(language),
            Err(err) => Command::Invalid(err.to_string()),
        },
        (Some("run"), None) => Command::Run,
        (Some("sample"), None) => Command::Sample,
        (Some("show"), None) => Command::Show,
        (Some("clear"), None) => Command::Clear,
        (Some("help"), None) => Command::Help,
        (Some("quit" | "q" | "exit"), None) => Command::Quit,
        _ => Command::Invalid(format!("Unknown command '{}', try :help", line)),
    }
}

pub async fn run<L: RuntimeLoader>(runner: &CodeRunner<L>) -> Result<()> {
    println!("coderun ({}) - :help for commands", runner.language());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}> ", runner.language());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse(&line) {
            Command::Lang(language) => {
                runner.select_language(language);
                println!("{}", runner.source());
            }
            Command::Run => {
                runner.run_current().await;
                print!("{}", runner.output().contents());
            }
            Command::Sample => {
                runner.select_language(runner.language());
                println!("{}", runner.source());
            }
            Command::Show => println!("{}", runner.source()),
            Command::Clear => runner.set_source(""),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Append(text) => {
                let end = runner.source().len();
                runner.select(end..end);
                runner.paste(&format!("{}\n", text));
            }
            Command::Invalid(message) => eprintln!("{}", message),
        }
    }

    Ok(())
}
