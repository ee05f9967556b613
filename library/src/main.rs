//! thlauncher command-line launcher
//!
//! ```text
//! thlauncher [games]                      List the library
//! thlauncher add <number> <title> <install-dir> <exe> [replay-dir]
//! thlauncher play <game>                  Count down, launch, wait for exit
//! thlauncher sessions [limit]             Recent play sessions
//! thlauncher replays                      Scan and list replays
//! thlauncher watch <replay-file>          Play a replay in its game
//! ```
//!
//! `<game>` is a number (`6`, `th06`), a library id (`#3`) or a title.

use anyhow::{Result, bail};
use std::env;
use thlauncher_core::config;
use thlauncher_library::app::App;
use thlauncher_library::app::format::{describe_event, game_line, replay_line, session_line};

const DEFAULT_SESSION_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Games,
    Add {
        number: u32,
        title: String,
        install_path: String,
        exe_name: String,
        replay_dir: String,
    },
    Play { game: String },
    Sessions { limit: usize },
    Replays,
    Watch { file_name: String },
    Help,
}

/// Parse command line args (including the program name).
fn parse_command(args: &[String]) -> Result<Command, String> {
    let mut args = args.iter().skip(1).map(String::as_str);
    let Some(command) = args.next() else {
        return Ok(Command::Games);
    };
    let rest: Vec<&str> = args.collect();

    match (command, rest.as_slice()) {
        ("games" | "list", []) => Ok(Command::Games),
        ("add", [number, title, install_path, exe_name, replay_dir @ ..]) if replay_dir.len() <= 1 => {
            let number = number
                .trim_start_matches("th")
                .parse()
                .map_err(|_| format!("Invalid game number '{}'", number))?;
            Ok(Command::Add {
                number,
                title: title.to_string(),
                install_path: install_path.to_string(),
                exe_name: exe_name.to_string(),
                replay_dir: replay_dir.first().unwrap_or(&"replay").to_string(),
            })
        }
        ("add", _) => Err("usage: thlauncher add <number> <title> <install-dir> <exe> [replay-dir]".to_string()),
        ("play", [game]) => Ok(Command::Play {
            game: game.to_string(),
        }),
        ("play", _) => Err("usage: thlauncher play <game>".to_string()),
        ("sessions", []) => Ok(Command::Sessions {
            limit: DEFAULT_SESSION_LIMIT,
        }),
        ("sessions", [limit]) => limit
            .parse()
            .map(|limit| Command::Sessions { limit })
            .map_err(|_| format!("Invalid session limit '{}'", limit)),
        ("replays", []) => Ok(Command::Replays),
        ("watch", [file_name]) => Ok(Command::Watch {
            file_name: file_name.to_string(),
        }),
        ("watch", _) => Err("usage: thlauncher watch <replay-file>".to_string()),
        ("-h" | "--help" | "help", _) => Ok(Command::Help),
        (other, _) => Err(format!("Unknown command '{}'. Try `thlauncher help`.", other)),
    }
}

fn print_help() {
    println!("thlauncher - Touhou game library launcher");
    println!();
    println!("  thlauncher [games]                 List the library");
    println!("  thlauncher add <number> <title> <install-dir> <exe> [replay-dir]");
    println!("  thlauncher play <game>             Count down, launch, wait for exit");
    println!("  thlauncher sessions [limit]        Recent play sessions");
    println!("  thlauncher replays                 Scan and list replays");
    println!("  thlauncher watch <replay-file>     Play a replay in its game");
}

fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Games => {
            let games = app.games();
            if games.is_empty() {
                println!("The library is empty. Add a game with `thlauncher add`.");
            }
            for game in &games {
                println!("{}", game_line(game));
            }
        }
        Command::Add {
            number,
            title,
            install_path,
            exe_name,
            replay_dir,
        } => {
            let game = app.add_game(number, &title, &install_path, &exe_name, &replay_dir)?;
            println!("{}", game_line(&game));
        }
        Command::Play { game } => {
            let game = app.find_game(&game)?;
            if game.executable_path().is_none() {
                bail!("{} has no executable configured", game.display_name());
            }
            println!("{}", game.display_name());
            let session = app.play(game, |event| println!("{}", describe_event(event)))?;
            tracing::debug!("Session {} closed", session.id);
        }
        Command::Sessions { limit } => {
            for session in app.recent_sessions(limit) {
                println!("{}", session_line(&session, &app.game_title(session.game_id)));
            }
        }
        Command::Replays => {
            let report = app.scan_replays(|event| tracing::debug!("{}", describe_event(event)))?;
            for replay in &report.replays {
                println!("{}", replay_line(replay));
            }
            for skipped in &report.skipped {
                eprintln!("skipped {}: {}", skipped.path.display(), skipped.error);
            }
        }
        Command::Watch { file_name } => {
            app.watch_replay(&file_name, |event| tracing::debug!("{}", describe_event(event)))?;
        }
        Command::Help => print_help(),
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        print_help();
        return Ok(());
    }

    let app = App::new(config::load())?;
    let result = run(&app, command);
    if let Err(e) = app.shutdown() {
        tracing::error!("Failed to close the library: {:#}", e);
    }
    result
}
