// src/bin/scenario_cli.rs
use anyhow::{anyhow, Result};
use dotenv::dotenv;
use log::{error, info};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use macro_scenarios::config::ClientConfig;
use macro_scenarios::models::{Horizon, Indicator};
use macro_scenarios::services::analysis::AnalysisClient;
use macro_scenarios::view::chat_client::ChatClient;
use macro_scenarios::view::render::{render_cards, render_selected};
use macro_scenarios::view::ScenarioBoard;

const HELP: &str = "commands:
  generate [instructions]          generate new scenarios
  cards                            list scenario cards
  select <n>                       select a card and load its parameters
  set <indicator> <months> <value> move a chart point (unemployment|gdp|oil|cpi, 6|12|18|24)
  show                             show the selected card's parameters
  quit";

enum Command {
    Generate(String),
    Cards,
    Select(usize),
    Set(Indicator, Horizon, f64),
    Show,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match head {
        "generate" | "g" => Ok(Command::Generate(rest.to_string())),
        "cards" | "c" => Ok(Command::Cards),
        "select" | "s" => rest
            .parse::<usize>()
            .map(Command::Select)
            .map_err(|_| anyhow!("usage: select <n>")),
        "set" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(anyhow!("usage: set <indicator> <months> <value>"));
            }
            let indicator = parts[0].parse::<Indicator>().map_err(|e| anyhow!(e))?;
            let horizon = parts[1]
                .trim_end_matches('m')
                .parse::<u32>()
                .ok()
                .and_then(Horizon::from_months)
                .ok_or_else(|| anyhow!("months must be one of 6, 12, 18, 24"))?;
            let value = parts[2]
                .parse::<f64>()
                .map_err(|_| anyhow!("value must be a number"))?;
            Ok(Command::Set(indicator, horizon, value))
        }
        "show" => Ok(Command::Show),
        "help" | "?" | "" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(anyhow!("unknown command '{}', try help", other)),
    }
}

async fn run(
    command: Command,
    board: &mut ScenarioBoard,
    chat: &ChatClient,
    analysis: &AnalysisClient,
) -> Result<()> {
    match command {
        Command::Generate(instructions) => {
            let count = board.generate(chat, &instructions).await?;
            println!("{} scenarios generated", count);
            print!("{}", render_cards(board));
        }
        Command::Cards => print!("{}", render_cards(board)),
        Command::Select(idx) => {
            board.select(analysis, idx).await?;
            print!("{}", render_selected(board));
        }
        Command::Set(indicator, horizon, value) => {
            let idx = board
                .selected()
                .ok_or_else(|| anyhow!("select a scenario first"))?;
            let stored = board.adjust(analysis, idx, indicator, horizon, value).await?;
            if stored != value {
                println!("{} at {}m snapped to {}", indicator, horizon.months(), stored);
            }
            print!("{}", render_selected(board));
        }
        Command::Show => print!("{}", render_selected(board)),
        Command::Help | Command::Quit => println!("{}", HELP),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = ClientConfig::from_env()?;
    info!(
        "Scenario server: {}, analysis backend: {}",
        config.server_url, config.analysis_url
    );
    let chat = ChatClient::new(&config.server_url);
    let analysis = AnalysisClient::new(config.analysis_url.clone());
    let mut board = ScenarioBoard::with_scales(config.scales.clone());

    println!("Economic Scenario Generator\n{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let command = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if let Err(e) = run(command, &mut board, &chat, &analysis).await {
            error!("Command failed: {:#}", e);
            println!("error: {:#}", e);
        }
    }

    Ok(())
}
