mod apply;
mod calendar;
mod clock;
mod config;
mod db;
mod error;
mod export;
mod models;
mod run;
mod sync;

use anyhow::Result;

const DEFAULT_USER: &str = "me";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }

    let config = config::Config::from_env()?;
    let mut db = db::Database::open(&config.db_path)?;
    ensure_default_account(&mut db)?;
    let user_id = ensure_default_user(&mut db)?;

    let session = run::Session {
        config: &config,
        user_id,
    };
    run::as_cli(&args, &mut db, &session)
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` replaces
/// the default filter entirely.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledgerloop=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_default_account(db: &mut db::Database) -> Result<()> {
    if db.get_accounts()?.is_empty() {
        let account = models::Account::new("Default".into(), models::AccountType::Checking);
        db.insert_account(&account)?;
    }
    Ok(())
}

/// The acting user for `apply` is whoever runs the binary.
fn ensure_default_user(db: &mut db::Database) -> Result<i64> {
    let name = std::env::var("USER")
        .ok()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    if let Some(id) = db.get_user_by_name(&name)?.and_then(|u| u.id) {
        return Ok(id);
    }
    let id = db.insert_user(&models::User::new(name.clone()))?;
    tracing::info!(user_id = id, name = %name, "created default user");
    Ok(id)
}
