use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
};
use sqlx::postgres::PgPoolOptions;

use repositories::{mail::SmtpMailer, referrals::ReferralRepository};

mod models;
mod repositories;
pub mod services;
pub mod settings;
#[cfg(test)]
mod test_utils;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let settings = settings::Settings::new(&args.config)?;
    init_logging(&args.log4rs)?;
    log::info!("Starting referral API.");

    let conn = PgPoolOptions::new()
        .max_connections(settings.postgres.max_connections)
        .connect(&settings.postgres.url)
        .await?;

    let store = Arc::new(ReferralRepository::new(conn));
    let mailer = Arc::new(SmtpMailer::new(&settings.mail)?);

    services::start_services(store, mailer, settings).await
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new(path).exists() {
        let stdout = ConsoleAppender::builder().build();
        let config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
        log4rs::init_config(config)?;
        log::warn!("{} not found, logging to console.", path);
        return Ok(());
    }

    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            log::info!("Logging initialized from {}.", path);
            Ok(())
        }
        Err(e) => {
            eprintln!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
