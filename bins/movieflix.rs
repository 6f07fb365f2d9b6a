use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use futures_util::StreamExt;
use gateway::{ApiError, ErrorKind};
use models::{Credentials, Movie, ProfilePatch, Registration, Session};
use service::{FavoriteError, HttpClient, SessionError};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse the movie catalog and manage your favorites")]
struct Cli {
    /// Print gateway metrics (prometheus text format) after the command
    #[arg(long, global = true)]
    metrics: bool,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in
    Register {
        username: String,
        #[arg(long, env = "MOVIEFLIX_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birthday: Option<String>,
    },
    Login {
        username: String,
        #[arg(long, env = "MOVIEFLIX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the current session
    Whoami,
    /// Re-fetch the profile from the server
    Refresh,
    Movies,
    Movie { id: String },
    Director { name: String },
    Genre { name: String },
    /// List favorite movies
    Favorites,
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Delete the account and clear the session
    Deregister {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoriteAction {
    Add { id: String },
    Remove { id: String },
    Toggle { id: String },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        birthday: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    if cli.json_logs {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }

    let run_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(event = "panic", %run_id, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = rt.block_on(async {
        match run(&cli.command).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let (kind, hint) = explain(&e);
                info!(%run_id, kind = kind.map(|k| k.as_str()).unwrap_or("other"), "command failed");
                eprintln!("error: {e}");
                if let Some(hint) = hint {
                    eprintln!("{hint}");
                }
                ExitCode::FAILURE
            }
        }
    });

    if cli.metrics {
        match gateway::observability::encode_metrics() {
            Ok(body) => print!("{body}"),
            Err(e) => {
                eprintln!("error: cannot encode metrics: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    code
}

async fn run(command: &Command) -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load_or_default()?;
    let client = service::connect(&cfg).await?;

    match command {
        Command::Register { username, password, email, birthday } => {
            let registration = Registration {
                username: username.clone(),
                password: password.clone(),
                email: email.clone(),
                birthday: birthday.clone(),
            };
            let session = client.sessions.register(&registration).await?;
            println!("registered and logged in as {}", session.username());
        }
        Command::Login { username, password } => {
            let session = client.sessions.login(&Credentials::new(username.as_str(), password.as_str())).await?;
            println!("logged in as {}", session.username());
        }
        Command::Logout => {
            client.sessions.logout().await?;
            println!("logged out");
        }
        Command::Whoami => match client.sessions.current_session().await {
            Some(session) => print_session(&session),
            None => println!("not logged in"),
        },
        Command::Refresh => print_session(&client.sessions.refresh_profile().await?),
        Command::Movies => {
            for movie in client.catalog.list_movies().await? {
                print_movie_line(&client, &movie).await;
            }
        }
        Command::Movie { id } => {
            let movie = client.catalog.get_movie(id).await?;
            println!("{}", serde_json::to_string_pretty(&movie)?);
            if client.favorites.is_favorite(&movie.id).await {
                println!("(favorite)");
            }
        }
        Command::Director { name } => {
            let director = client.catalog.get_director(name).await?;
            println!("{}", serde_json::to_string_pretty(&director)?);
        }
        Command::Genre { name } => {
            let genre = client.catalog.get_genre(name).await?;
            println!("{}", serde_json::to_string_pretty(&genre)?);
        }
        Command::Favorites => {
            let mut movies = client.favorites.load_favorite_movies().await?;
            while let Some((id, movie)) = movies.next().await {
                match movie {
                    Ok(movie) => println!("{id}\t{}", movie.title),
                    Err(e) => println!("{id}\t<unavailable: {}>", e.message),
                }
            }
        }
        Command::Favorite { action } => {
            let favorites = match action {
                FavoriteAction::Add { id } => client.favorites.add_favorite(id).await?,
                FavoriteAction::Remove { id } => client.favorites.remove_favorite(id).await?,
                FavoriteAction::Toggle { id } => client.favorites.toggle_favorite(id).await?,
            };
            let ids: Vec<&str> = favorites.iter().map(String::as_str).collect();
            println!("favorites: [{}]", ids.join(", "));
        }
        Command::Profile { action: ProfileAction::Update { username, email, birthday, password } } => {
            let patch = ProfilePatch {
                username: username.clone(),
                email: email.clone(),
                birthday: birthday.clone(),
                password: password.clone(),
            };
            print_session(&client.sessions.update_profile(&patch).await?);
        }
        Command::Deregister { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete the account without --yes");
            }
            client.sessions.deregister().await?;
            println!("account deleted");
        }
    }
    Ok(())
}

fn print_session(session: &Session) {
    let profile = &session.profile;
    println!("username: {}", profile.username);
    println!("email:    {}", profile.email);
    if let Some(birthday) = &profile.birthday {
        println!("birthday: {birthday}");
    }
    println!("favorites: [{}]", profile.favorite_ids().join(", "));
}

async fn print_movie_line(client: &HttpClient, movie: &Movie) {
    let star = if client.favorites.is_favorite(&movie.id).await { "*" } else { " " };
    println!("{star} {}\t{}\t{}", movie.id, movie.title, movie.director.name);
}

/// Error kind plus a hint on what the user can do about it.
fn explain(err: &anyhow::Error) -> (Option<ErrorKind>, Option<&'static str>) {
    let kind = if let Some(e) = err.downcast_ref::<SessionError>() {
        Some(e.kind())
    } else if let Some(e) = err.downcast_ref::<FavoriteError>() {
        Some(e.kind())
    } else {
        err.downcast_ref::<ApiError>().map(|e| e.kind)
    };
    let hint = kind.and_then(|kind| match kind {
        ErrorKind::Auth => Some("log in with `movieflix login <username>` and try again"),
        ErrorKind::Validation => Some("check the values you passed"),
        ErrorKind::NotFound => None,
        ErrorKind::Network => Some("could not reach the movie API; check MOVIEFLIX_API_URL and your connection"),
        ErrorKind::Server => Some("the movie API had a problem; try again later"),
        ErrorKind::Conflict => Some("that movie is already being updated; try again in a moment"),
        ErrorKind::Storage => Some("could not write the local session file; check MOVIEFLIX_SESSION_PATH"),
    });
    (kind, hint)
}
