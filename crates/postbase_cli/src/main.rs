//! Process entry point.
//!
//! # Responsibility
//! - Bootstrap logging and the store from environment configuration.
//! - Run a scripted sequence of repository calls and print the results.
//!
//! # Invariants
//! - Nothing touches the store when initialization fails; exit status is 1.

use log::{error, info};
use postbase_core::{
    init_logging, DataSource, LogConfig, NewPost, NewUser, PageRequest, PostRepository,
    SqlitePostRepository, SqliteUserRepository, StoreConfig, UserRepository,
};
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;

const DEMO_NAME: &str = "Thomas";
const DEMO_EMAIL: &str = "thomas@example.com";
const MISSING_EMAIL: &str = "alice@example.com";

fn main() -> ExitCode {
    let log_config = LogConfig::from_env();
    if let Err(err) = init_logging(&log_config.level, log_config.log_dir.as_deref()) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let source = match StoreConfig::from_env().and_then(DataSource::new) {
        Ok(source) => source,
        Err(err) => {
            error!("event=config_load module=cli status=error error={err}");
            eprintln!("invalid store configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = source.initialize() {
        error!("event=startup module=cli status=error error={err}");
        eprintln!("error during data source initialization: {err}");
        return ExitCode::FAILURE;
    }
    println!("data source has been initialized");

    match run_demo(&source) {
        Ok(()) => {
            info!("event=demo module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=demo module=cli status=error error={err}");
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(source: &DataSource) -> Result<(), Box<dyn Error>> {
    let users = SqliteUserRepository::new(source);
    let posts = SqlitePostRepository::new(source);

    let user = match users.find_by_email(DEMO_EMAIL, false)? {
        Some(existing) => {
            print_json("user already present", &existing)?;
            existing
        }
        None => {
            let created = users.create(&NewUser::new(DEMO_NAME, DEMO_EMAIL))?;
            print_json("user has been saved", &created)?;
            created
        }
    };

    if users.load_posts(user.id)?.is_empty() {
        for (title, content) in [
            ("Hello", "First post from the scripted run."),
            ("Second thoughts", "Another post owned by the same user."),
        ] {
            let post = posts.create(&NewPost::new(title, content, user.id))?;
            print_json("post has been saved", &post)?;
        }
    }

    print_json("all users", &users.find_all(false)?)?;

    match users.find_by_email(MISSING_EMAIL, false)? {
        Some(found) => print_json("found user by email", &found)?,
        None => println!("no user with email {MISSING_EMAIL}"),
    }

    print_json("posts with owner", &posts.find_by_user_id(user.id, true)?)?;

    let page = users.find_with_pagination(PageRequest::default(), true)?;
    println!(
        "page {} of {} ({} users total)",
        page.page,
        page.total_pages(),
        page.total
    );
    print_json("first page", &page.items)?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(label: &str, value: &T) -> serde_json::Result<()> {
    println!("{label}: {}", serde_json::to_string_pretty(value)?);
    Ok(())
}
