//! IDMC registration admin tool
//!
//! Main application entry point

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use idmc_registration::{
    cli::{CheckInArgs, Cli, Command, ConfirmArgs, LookupArgs, SeedArgs, StatsArgs, UndoCheckInArgs},
    config::Settings,
    database::{connection::{create_pool, run_migrations, DatabaseConfig}, DatabaseService},
    models::{Registration, RegistrationStatus},
    services::{parse_qr_code, SeedOptions, SeedOutcome, ServiceFactory},
    utils::{errors::ErrorSeverity, helpers::format_timestamp, logging},
    IdmcError,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level() {
        settings.logging.level = level.to_string();
    }

    // Initialize logging; the guard flushes the log file on exit
    let _guard = match logging::init_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Log a failed command at the level its error calls for and print what the
/// operator should see
fn report_error(e: &anyhow::Error) {
    let Some(domain) = e.downcast_ref::<IdmcError>() else {
        error!(error = %format!("{:#}", e), "Command failed");
        eprintln!("Error: {:#}", e);
        return;
    };

    let detail = format!("{:#}", e);
    match domain.severity() {
        ErrorSeverity::Critical | ErrorSeverity::Error => {
            error!(code = domain.code(), severity = %domain.severity(), error = %detail, "Command failed")
        }
        ErrorSeverity::Warning => warn!(code = domain.code(), error = %detail, "Command failed"),
        ErrorSeverity::Info => info!(code = domain.code(), error = %detail, "Command rejected"),
    }

    eprintln!("Error [{}]: {}", domain.code(), domain.user_message());
    if domain.is_recoverable() {
        eprintln!("This is usually temporary; run the command again.");
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };
    settings.validate()?;
    Ok(settings)
}

async fn connect(settings: &Settings, dry_run: bool) -> anyhow::Result<DatabaseService> {
    if dry_run {
        info!("Dry run: using an in-memory store");
        return Ok(DatabaseService::in_memory());
    }

    info!("Connecting to database...");
    let pool = create_pool(&DatabaseConfig::from(&settings.database))
        .await
        .context("connecting to PostgreSQL")?;
    Ok(DatabaseService::new(pool))
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    if let Command::Migrate = cli.command {
        let pool = create_pool(&DatabaseConfig::from(&settings.database))
            .await
            .context("connecting to PostgreSQL")?;
        run_migrations(&pool).await?;
        println!("Migrations applied");
        return Ok(());
    }

    let database = connect(&settings, cli.dry_run).await?;
    let services = ServiceFactory::new(&settings, database)?;

    match cli.command {
        Command::Migrate => Ok(()),
        Command::Seed(args) => handle_seed(&services, &args).await,
        Command::CheckIn(args) => handle_check_in(&services, &args).await,
        Command::UndoCheckIn(args) => handle_undo_check_in(&services, &args).await,
        Command::Lookup(args) => handle_lookup(&services, &args).await,
        Command::Stats(args) => handle_stats(&services, &args).await,
        Command::Confirm(args) => handle_confirm(&services, &args).await,
        Command::Health => handle_health(&services).await,
    }
}

async fn handle_seed(services: &ServiceFactory, args: &SeedArgs) -> anyhow::Result<()> {
    match services.seeder().run(&SeedOptions::from(args)).await? {
        SeedOutcome::Seeded(count) => println!("Seeded {} registrations", count),
        SeedOutcome::NoChanges => println!("No changes: registrations already exist (use --force or --clear)"),
    }
    Ok(())
}

async fn handle_check_in(services: &ServiceFactory, args: &CheckInArgs) -> anyhow::Result<()> {
    let checkin = &services.check_in_service;
    let registration = match args.attendee {
        Some(index) => {
            let parsed = parse_qr_code(&args.registration);
            let id = parsed.registration_id.unwrap_or_else(|| args.registration.trim().to_string());
            checkin.check_in_attendee(&id, index, &args.by).await?
        }
        None => checkin.check_in_from_qr(&args.registration, &args.by).await?,
    };

    print_check_in(&registration);
    Ok(())
}

async fn handle_undo_check_in(services: &ServiceFactory, args: &UndoCheckInArgs) -> anyhow::Result<()> {
    let registration = services
        .check_in_service
        .undo_check_in(args.registration_id.trim(), args.attendee, &args.by)
        .await?;

    print_check_in(&registration);
    Ok(())
}

async fn handle_lookup(services: &ServiceFactory, args: &LookupArgs) -> anyhow::Result<()> {
    let result = services.lookup_service.search_registrations(&args.query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.registrations.is_empty() {
        println!("No registrations match \"{}\"", args.query.trim());
        return Ok(());
    }

    println!("{} match(es) by {:?}", result.registrations.len(), result.matched_by);
    for registration in &result.registrations {
        println!(
            "  {}  {:<28} {:<22} {}/{} checked in",
            registration.id,
            registration.primary_attendee.full_name(),
            registration.status.as_str(),
            registration.checked_in_count(),
            registration.total_attendees(),
        );
    }
    Ok(())
}

async fn handle_stats(services: &ServiceFactory, args: &StatsArgs) -> anyhow::Result<()> {
    let stats = services.stats_service.dashboard_stats().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("IDMC dashboard ({})", format_timestamp(stats.generated_at));
        println!("=================================");
        println!("Registrations:       {}", stats.total_registrations);
        for (status, count) in &stats.by_status {
            println!("  {:<20} {}", status, count);
        }
        println!("Active attendees:    {}", stats.active_attendees);
        println!("Confirmed attendees: {}", stats.confirmed_attendees);
        println!("Confirmed revenue:   {}", stats.confirmed_revenue);
        println!("Pending revenue:     {}", stats.pending_revenue);
        println!(
            "Checked in:          {}/{} ({:.1}%)",
            stats.check_in.checked_in_attendees, stats.check_in.total_attendees, stats.check_in.percentage
        );
        println!("Open inquiries:      {}", stats.inquiries_awaiting_reply);
        for workshop in &stats.workshops {
            let capacity = workshop.capacity.map_or("-".to_string(), |c| c.to_string());
            println!(
                "  {:<36} {}/{} (+{} waitlisted)",
                workshop.title, workshop.registered_count, capacity, workshop.waitlisted
            );
        }
    }

    if args.sync {
        let result = services.stats_service.trigger_stats_sync().await?;
        println!("Stats sync: {}", if result.success { "ok" } else { "failed" });
    }
    Ok(())
}

async fn handle_confirm(services: &ServiceFactory, args: &ConfirmArgs) -> anyhow::Result<()> {
    let registration = services
        .registration_service
        .update_status(args.registration_id.trim(), RegistrationStatus::Confirmed, &args.by)
        .await?;

    let invoice = registration.invoice.as_ref().map_or("-", |invoice| invoice.number.as_str());
    println!("{} confirmed, invoice {}", registration.id, invoice);
    Ok(())
}

async fn handle_health(services: &ServiceFactory) -> anyhow::Result<()> {
    let status = services.health_check().await;
    println!("Database: {}", if status.database_healthy { "ok" } else { "unreachable" });
    match status.redis_healthy {
        Some(true) => println!("Redis:    ok"),
        Some(false) => println!("Redis:    unreachable"),
        None => println!("Redis:    disabled"),
    }

    if !status.is_healthy() {
        anyhow::bail!("unhealthy: {}", status.get_issues().join(", "));
    }
    Ok(())
}

fn print_check_in(registration: &Registration) {
    println!(
        "{}  {}  {}/{} checked in",
        registration.id,
        registration.primary_attendee.full_name(),
        registration.checked_in_count(),
        registration.total_attendees()
    );
    for slot in &registration.attendee_check_ins {
        let mark = if slot.checked_in { "x" } else { " " };
        println!("  [{}] {} {}", mark, slot.attendee_index, slot.name);
    }
}
