//! studytimer - terminal front end for the study timer
//!
//! Account and goal management are one-shot subcommands. `start` runs an
//! interactive countdown that reads commands from stdin.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use studytimer_api::{FLAVOR_PALETTE, GoalUpdate, NewGoal, SessionView, resolve_flavor};
use studytimer_client::{ApiClient, AuthSession, Screen, SessionGate, TimerDriver};
use studytimer_config::load_config_or_default;
use studytimer_core::{CoreEvent, TimerEngine};
use studytimer_store::{KeyValueStore, SqliteStore};
use studytimer_util::{GoalId, StudyTimerError, default_config_path, format_countdown};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// studytimer - study goals with a countdown timer
#[derive(Parser, Debug)]
#[command(name = "studytimer")]
#[command(about = "Study goals with a countdown timer", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/studytimer/config.toml)
    #[arg(short, long, env = "STUDYTIMER_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Service URL override
    #[arg(long, env = "STUDYTIMER_API_URL")]
    api_url: Option<String>,

    /// Data directory override (or set STUDYTIMER_DATA_DIR env var)
    #[arg(short, long, env = "STUDYTIMER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget stored credentials
    Logout,
    /// List goals, newest first
    Goals,
    /// Add a goal
    Add {
        name: String,
        /// Target duration, HH:MM
        time: String,
    },
    /// Change a goal's name or duration
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Target duration, HH:MM
        #[arg(long)]
        time: Option<String>,
    },
    /// Delete a goal
    Delete { id: String },
    /// Run the countdown for a goal
    Start { id: Option<String> },
}

impl Command {
    fn screen(&self) -> Option<Screen> {
        match self {
            Command::Register { .. } | Command::Login { .. } | Command::Logout => None,
            Command::Goals | Command::Delete { .. } => Some(Screen::Home),
            Command::Add { .. } => Some(Screen::AddGoal),
            Command::Update { id, .. } => Some(Screen::UpdateGoal(GoalId::new(id.as_str()))),
            Command::Start { id } => Some(Screen::StartGoal(id.as_deref().map(GoalId::new))),
        }
    }
}

fn print_view(view: &SessionView) {
    let name = view.goal_name.as_deref().unwrap_or("-");
    let flavor = view.selected_flavor.as_deref().unwrap_or("none");
    let state = if view.running { "running" } else { "paused" };
    println!(
        "{}  {}  [{:>3.0}%]  {}  flavor: {}",
        name, view.display, view.fill_percent, state, flavor
    );
}

fn print_help() {
    println!("Commands:");
    println!("  flavor <1-8|name|#hex>   choose a fill");
    println!("  toggle                   start or pause");
    println!("  back                     leave (progress is kept)");
    println!("  discard                  leave and drop progress");
    println!("  yes / no                 answer the leave prompt");
    println!("  ok                       dismiss the completion notice");
    println!("Flavors:");
    for (i, (hex, name)) in FLAVOR_PALETTE.iter().enumerate() {
        println!("  {}. {} {}", i + 1, name, hex);
    }
}

/// Interactive countdown. Returns when the user leaves.
async fn run_timer(client: ApiClient, state: Arc<dyn KeyValueStore>, goal_id: Option<GoalId>) -> Result<()> {
    let engine = TimerEngine::new(goal_id, Arc::new(client), state);
    let driver = TimerDriver::new(engine);

    if driver.initialize().await?.is_none() {
        println!("No goal selected.");
        return Ok(());
    }

    let mut events = driver.subscribe();
    print_view(&driver.view().await);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(CoreEvent::Ticked { .. }) => print_view(&driver.view().await),
                Ok(CoreEvent::Completed { .. }) => {
                    print_view(&driver.view().await);
                    println!("Goal complete! Type 'ok' to continue.");
                }
                Ok(other) => debug!(event = ?other, "Timer event"),
                Err(_) => {}
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    driver.confirm_stop().await;
                    return Ok(());
                };
                let mut words = line.split_whitespace();
                match (words.next(), words.next()) {
                    (Some("flavor"), Some(choice)) => {
                        driver.select_flavor(resolve_flavor(choice)).await;
                        print_view(&driver.view().await);
                    }
                    (Some("toggle" | "t"), _) => match driver.toggle_running().await {
                        Ok(_) => print_view(&driver.view().await),
                        Err(e) => println!("{}", e),
                    },
                    (Some("back"), _) => {
                        if driver.request_stop().await.is_some() {
                            println!("Leave this timer? Progress is kept. (yes/no)");
                        } else {
                            driver.confirm_stop().await;
                            return Ok(());
                        }
                    }
                    (Some("yes" | "y"), _) if driver.view().await.stop_prompt => {
                        driver.confirm_stop().await;
                        return Ok(());
                    }
                    (Some("no" | "n"), _) => {
                        driver.cancel_stop().await;
                    }
                    (Some("discard"), _) => {
                        driver.discard_progress().await;
                        println!("Progress discarded.");
                        return Ok(());
                    }
                    (Some("ok"), _) => {
                        if driver.acknowledge_completion().await {
                            return Ok(());
                        }
                    }
                    (None, _) => print_view(&driver.view().await),
                    _ => print_help(),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                driver.confirm_stop().await;
                return Ok(());
            }
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let api_url = args.api_url.unwrap_or(settings.client.api_url);
    let data_dir = args.data_dir.unwrap_or(settings.client.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join("client.db");
    let state: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open local state {:?}", db_path))?,
    );

    let session = AuthSession::load(state.clone());
    let gate = SessionGate::new(session.clone());
    let client = ApiClient::new(api_url, session.clone())?;

    if let Some(screen) = args.command.screen() {
        if let Err(landed) = gate.enter(screen) {
            debug!(path = %landed.path(), "Redirected");
            bail!("You must be logged in. Run `studytimer login` first.");
        }
    }

    let result = dispatch(args.command, client, session.clone(), state).await;
    if let Err(e) = &result {
        // A rejected token is dropped so the next run lands on the login screen.
        if matches!(e.downcast_ref::<StudyTimerError>(), Some(StudyTimerError::Auth(_))) {
            let _ = session.sign_out();
        }
    }
    result
}

async fn dispatch(
    command: Command,
    client: ApiClient,
    session: AuthSession,
    state: Arc<dyn KeyValueStore>,
) -> Result<()> {
    match command {
        Command::Register { username, email, password } => {
            let response = client.register(&username, &email, &password).await?;
            println!("Registered and signed in as {} ({})", username, response.user_id);
        }
        Command::Login { email, password } => {
            let response = client.login(&email, &password).await?;
            println!("Signed in as {}", response.username);
        }
        Command::Logout => {
            session.sign_out()?;
            println!("Signed out");
        }
        Command::Goals => {
            let goals = client.list_goals().await?;
            if goals.is_empty() {
                println!("No goals yet. Add one with `studytimer add <name> <HH:MM>`.");
            }
            for goal in goals {
                println!(
                    "{}  {:<24} {}  ({})",
                    goal.id,
                    goal.goal_name,
                    goal.goal_time,
                    format_countdown(goal.total_seconds())
                );
            }
        }
        Command::Add { name, time } => {
            let goal = client.create_goal(&NewGoal::new(name, time)).await?;
            println!("Added {} ({})", goal.goal_name, goal.id);
        }
        Command::Update { id, name, time } => {
            let update = GoalUpdate {
                goal_name: name,
                goal_time: time,
            };
            let goal = client.update_goal(&GoalId::new(id), &update).await?;
            println!("Updated {}: {} {}", goal.id, goal.goal_name, goal.goal_time);
        }
        Command::Delete { id } => {
            let response = client.delete_goal(&GoalId::new(id)).await?;
            println!("{}", response.message);
        }
        Command::Start { id } => {
            run_timer(client, state, id.map(GoalId::new)).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "studytimer starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
