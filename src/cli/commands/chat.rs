//! Interactive terminal chat.

use crate::chat::{ChatSession, ChatState, Reply, FAILED_TURN_MESSAGE};
use crate::cli::preflight;
use crate::cli::{ChatServices, Output};
use crate::config::Settings;
use crate::error::Result as VidchatResult;
use anyhow::Result;
use console::style;
use std::future::Future;
use std::io::{self, BufRead, Write};

/// What the user asked for at the prompt.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Exit,
    Retry,
    /// `retry` typed while no question is pending.
    NothingToRetry,
    Ask(&'a str),
    Nothing,
}

fn parse_input(line: &str, state: ChatState) -> Command<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Command::Nothing
    } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        Command::Exit
    } else if trimmed.eq_ignore_ascii_case("retry") {
        match state {
            ChatState::AwaitingAnswer => Command::Retry,
            ChatState::Idle => Command::NothingToRetry,
        }
    } else {
        Command::Ask(trimmed)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    println!("\n{}", style(&settings.ui.title).bold().cyan());
    let services = ChatServices::start(&settings).await?;
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit.").dim()
    );

    let mut session = services.new_session();
    for turn in session.turns() {
        Output::turn(turn);
    }

    let thinking = settings.ui.thinking_message.as_str();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line, session.state()) {
            Command::Nothing => continue,
            Command::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Command::NothingToRetry => Output::info("Nothing to retry."),
            Command::Retry => {
                let result = with_spinner(thinking, session.retry()).await;
                show(&session, result);
            }
            Command::Ask(question) => {
                if session.state() == ChatState::AwaitingAnswer {
                    session.abandon()?;
                    println!("{}", style(FAILED_TURN_MESSAGE).dim());
                }
                let result = with_spinner(thinking, session.submit(question)).await;
                show(&session, result);
            }
        }
    }

    Ok(())
}

/// Await `fut` behind a spinner.
async fn with_spinner<F>(msg: &str, fut: F) -> VidchatResult<Reply>
where
    F: Future<Output = VidchatResult<Reply>>,
{
    let spinner = Output::spinner(msg);
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

fn show(session: &ChatSession, result: VidchatResult<Reply>) {
    match result {
        Ok(reply) => {
            if let Some(turn) = session.turns().last() {
                Output::turn(turn);
            }
            Output::sources(&reply.sources);
        }
        Err(e) => {
            Output::error(&format!("Error: {}", e));
            Output::info("Type 'retry' to ask again, or ask something else.");
        }
    }
}
