use log::error;

use crate::ai::Capability;
use crate::error::{AppError, GameError};
use crate::game_state::{AddOutcome, GameState};
use crate::process;
use crate::substance::{self, Substance};

/// Listing and search replies are chunked into messages of this many lines.
pub const PAGE_SIZE: usize = 10;

/// The commands the chat transport understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Process {
        image_url: String,
        symbols: Vec<String>,
    },
    Substances,
    Search {
        query: String,
    },
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("!process") {
            let mut parts = rest.split_whitespace();
            let image_url = parts.next()?.to_string();
            let symbols = parts.map(str::to_string).collect();
            return Some(Command::Process { image_url, symbols });
        }

        if line.starts_with("!substances") {
            return Some(Command::Substances);
        }

        if let Some(rest) = line.strip_prefix("!ssearch") {
            let query = rest.trim();
            if query.is_empty() {
                return None;
            }
            return Some(Command::Search {
                query: query.to_string(),
            });
        }

        None
    }
}

/// Runs one command against the world and returns the replies to send, in
/// order. Adapter failures propagate; the transport turns them into a reply
/// with [`error_reply`].
pub async fn dispatch<C: Capability>(
    state: &mut GameState,
    ai: &C,
    command: Command,
) -> Result<Vec<String>, AppError> {
    match command {
        Command::Process { image_url, symbols } => {
            run_process(state, ai, &image_url, &symbols).await
        }
        Command::Substances => Ok(list_substances(state)),
        Command::Search { query } => search_substances(state, ai, &query).await,
    }
}

async fn run_process<C: Capability>(
    state: &mut GameState,
    ai: &C,
    image_url: &str,
    symbols: &[String],
) -> Result<Vec<String>, AppError> {
    let mut selected: Vec<Substance> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match state.find_symbol(symbol) {
            Some(found) => selected.push(found.clone()),
            None => return Err(GameError::UnknownSymbol(symbol.clone()).into()),
        }
    }
    let selected_refs: Vec<&Substance> = selected.iter().collect();

    let report = process::describe_process(ai, image_url, &selected_refs).await?;

    let mut replies = Vec::new();
    if let Some(problems) = &report.problems {
        replies.push(problems.clone());
    }
    replies.push(report.process.clone());

    let results =
        process::perform_process(ai, &selected_refs, &report.process, report.problems.as_deref())
            .await?;

    if results.is_empty() {
        replies.push("The process failed.".to_string());
        return Ok(replies);
    }

    // Admission order is discovery order, so results are built and added
    // strictly in the order the process returned them.
    for name in &results {
        let candidate = substance::full_substance(ai, name).await?;
        if state.add(ai, candidate).await? == AddOutcome::Duplicate {
            replies.push(format!(
                "The substance {name} is a copy of another substance and won't be added."
            ));
        }
    }

    Ok(replies)
}

fn list_substances(state: &GameState) -> Vec<String> {
    state
        .substances()
        .chunks(PAGE_SIZE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|s| format!("**{}** - {}: {}\n", s.symbol, s.name, s.pictogram))
                .collect()
        })
        .collect()
}

async fn search_substances<C: Capability>(
    state: &GameState,
    ai: &C,
    query: &str,
) -> Result<Vec<String>, AppError> {
    let results = state.search(ai, query).await?;
    let pages = results
        .chunks(PAGE_SIZE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|s| format!("**{}** - {}: {} - _{}_\n", s.symbol, s.name, s.description, s.pictogram))
                .collect()
        })
        .collect();
    Ok(pages)
}

/// The broadcast sent for every admitted substance.
pub fn announcement(substance: &Substance) -> String {
    format!(
        "# {}\n**{}**\n{}\n_{}_",
        substance.symbol, substance.name, substance.description, substance.pictogram
    )
}

/// Turns a command failure into the reply the user sees.
pub fn error_reply(failure: &AppError) -> String {
    match failure {
        AppError::Game(GameError::UnknownSymbol(symbol)) => {
            format!("Substance {symbol} not found. Please try again.")
        }
        other => {
            error!("command failed: {other}");
            format!("Something went wrong: {other}")
        }
    }
}
