// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! F1 Mexicorn command-line client
//!
//! Signs in with Google, lists races, submits top-three predictions and
//! follows live standings changes.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use f1mexicorn_client::{
    config::Config,
    editor::RaceBoard,
    session::{LoginOutcome, SessionStatus},
    Client,
};
use futures_util::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "f1mexicorn", about = "F1 prediction game client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Google sign-in URL
    Login,
    /// Finish sign-in with the URL Google redirected to
    Callback { redirect_url: String },
    /// Show the signed-in user
    Whoami,
    /// List races, most recent first
    Races {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Predict the podium for a race (driver ids, 1st place first)
    Predict {
        race_id: u64,
        #[arg(num_args = 1..=3, required = true)]
        drivers: Vec<u64>,
    },
    /// Show the players who called a race
    Winners {
        #[arg(long)]
        session_key: Option<u64>,
    },
    /// Follow live standings changes for the latest race
    Watch,
    /// Forget the stored session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let client = Client::from_config(config).context("Failed to initialize client")?;

    match cli.command {
        Command::Login => match client.oauth.begin_login()? {
            Some(url) => println!("Open this URL to sign in:\n{}", url),
            None => println!("Already signed in"),
        },
        Command::Callback { redirect_url } => {
            let callback = client.oauth.callback_from_redirect(&redirect_url);
            match callback.complete().await {
                LoginOutcome::Authenticated(profile) => {
                    println!("Signed in as {} <{}>", profile.name, profile.email)
                }
                LoginOutcome::StateMismatch => bail!("Login state mismatch, start again with `login`"),
                LoginOutcome::ExchangeFailed(reason) => bail!("Login failed: {}", reason),
            }
        }
        Command::Whoami => {
            let snapshot = client.session.snapshot();
            match snapshot.profile {
                Some(profile) => println!("{} <{}>", profile.name, profile.email),
                None => println!("Not signed in ({:?})", snapshot.status),
            }
        }
        Command::Races { limit } => {
            require_login(&client)?;
            for race in client.api.sessions(limit).await? {
                println!(
                    "{:>5}  {}  {:<8} {}",
                    race.race_id, race.race_date, race.race_type, race.race_name
                );
            }
        }
        Command::Predict { race_id, drivers } => {
            let owner = require_login(&client)?;
            predict(&client, race_id, &drivers, &owner).await?;
        }
        Command::Winners { session_key } => {
            require_login(&client)?;
            let winners = client.api.winners(session_key).await?;
            if winners.is_empty() {
                println!("No winners yet");
            }
            for winner in winners {
                println!("{} <{}>", winner.username, winner.email);
            }
        }
        Command::Watch => {
            require_login(&client)?;
            watch(&client).await?;
        }
        Command::Logout => {
            client.session.logout()?;
            println!("Signed out");
        }
    }

    Ok(())
}

fn require_login(client: &Client) -> anyhow::Result<String> {
    let snapshot = client.session.snapshot();
    match (snapshot.status, snapshot.profile) {
        (SessionStatus::Authenticated, Some(profile)) => Ok(profile.email),
        _ => bail!("Not signed in, run `f1mexicorn login` first"),
    }
}

async fn predict(client: &Client, race_id: u64, picks: &[u64], owner: &str) -> anyhow::Result<()> {
    let races = client.api.sessions(None).await?;
    let race = races
        .into_iter()
        .find(|r| r.race_id == race_id)
        .with_context(|| format!("Unknown race {}", race_id))?;

    let roster = client.api.session_drivers(race_id).await?;
    let existing = client.api.guess(race_id).await?;
    let mut board = RaceBoard::new(race, existing.as_ref(), roster);

    let editor = board.editor_mut();
    for driver_id in editor
        .selection()
        .iter()
        .map(|d| d.driver_id)
        .collect::<Vec<_>>()
    {
        editor.move_to_pool(driver_id);
    }
    for (place, driver_id) in picks.iter().enumerate() {
        if !editor.move_to_selection(*driver_id, place) {
            bail!("Driver {} is not entered in race {}", driver_id, race_id);
        }
    }

    let stored = client.api.submit_guess(&board.to_guess(owner)).await?;
    println!(
        "Prediction saved for {}: {:?}",
        board.race().race_name,
        stored.positions()
    );
    Ok(())
}

async fn watch(client: &Client) -> anyhow::Result<()> {
    let race = client
        .api
        .latest_session()
        .await?
        .context("No races available")?;
    let roster = client.api.session_drivers(race.race_id).await?;
    let existing = client.api.guess(race.race_id).await?;
    let mut board = RaceBoard::new(race, existing.as_ref(), roster);

    let mut updates = client.live.connect().await?;
    println!("Watching {} (Ctrl-C to stop)", board.race().race_name);

    loop {
        tokio::select! {
            message = updates.next() => match message {
                Some(Ok(message)) => {
                    board.on_live_message(&message);
                    println!("{} | race finished: {}", message, board.race_finished());
                }
                // Dropping `updates` on return releases the connection
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    updates.close();
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("f1mexicorn_client=debug,info")),
        )
        .with(format)
        .init();
}
