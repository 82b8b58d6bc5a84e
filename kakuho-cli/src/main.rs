use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kakuho::{
    AppData, ClientConfig, ClientMetrics, EventId, HttpClient, ReservationId, SeatGroupId,
    StageId, TicketTypeId,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

mod commands;

use commands::Context;

#[derive(Parser, Debug)]
#[command(name = "kakuho")]
#[command(about = "Command-line client for the Kakuho ticketing service")]
struct Args {
    /// Config file path (TOML, YAML or JSON)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Server base URL, overrides the config file
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Where the session token is kept between invocations
    #[arg(long = "token-path", default_value = ".kakuho-token")]
    token_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List upcoming events, or finished ones with --past
    Events {
        #[arg(long)]
        past: bool,
    },
    /// Stages of an event with remaining seats per ticket type
    Calendar { event_id: EventId },
    /// List reservations visible to the current user
    Reservations {
        #[arg(long)]
        event: Option<EventId>,
        #[arg(long)]
        stage: Option<StageId>,
    },
    /// Reserve seats of a ticket type
    Book {
        ticket_type_id: TicketTypeId,
        #[arg(short = 'n', long = "attendees", default_value = "1")]
        attendees: u32,
    },
    /// Change the ticket type or attendee count of a reservation
    Change {
        reservation_id: ReservationId,
        ticket_type_id: TicketTypeId,
        #[arg(short = 'n', long = "attendees")]
        attendees: u32,
    },
    /// Cancel a reservation
    Cancel { reservation_id: ReservationId },
    /// Scan a ticket QR payload at a stage's reception desk
    CheckIn {
        stage_id: StageId,
        qr: String,
        /// Only report the scan outcome, do not mark the reservation paid
        #[arg(long)]
        dry_run: bool,
    },
    /// Flip the paid flag of a reservation
    Paid { reservation_id: ReservationId },
    /// Set remaining capacity of seat groups, e.g. `12=40 13=0`
    Capacity {
        #[arg(value_parser = parse_capacity, required = true)]
        assignments: Vec<(SeatGroupId, u32)>,
    },
    /// Copy an event so that its first stage falls on the given date
    Duplicate {
        event_id: EventId,
        start_date: NaiveDate,
    },
    /// Delete an event and its stages, seat groups and ticket types
    DeleteEvent { event_id: EventId },
    /// Print client metrics in Prometheus text format
    ///
    /// Counters live in this process only, so the output reflects the
    /// session-restore load of this invocation.
    Metrics,
}

fn parse_capacity(raw: &str) -> std::result::Result<(SeatGroupId, u32), String> {
    let (id, capacity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SEAT_GROUP=CAPACITY, got {}", raw))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid seat group id {}: {}", id, e))?;
    let capacity = capacity
        .trim()
        .parse()
        .map_err(|e| format!("invalid capacity {}: {}", capacity, e))?;
    Ok((id, capacity))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    if config.token_path.is_none() {
        config = config.with_token_path(args.token_path);
    }

    info!("Using Kakuho server at {}", config.base_url);
    debug!("Client config: {:?}", config);

    let client = HttpClient::new(&config)?;
    let metrics = ClientMetrics::new()?;
    let app = Arc::new(AppData::new(Arc::new(client)).with_metrics(metrics.clone()));

    let ctx = Context {
        app,
        config,
        metrics,
    };

    if !matches!(args.command, Command::Login { .. } | Command::Logout) {
        ctx.require_session().await?;
    }

    match args.command {
        Command::Login { email, password } => commands::login(&ctx, &email, &password).await,
        Command::Logout => commands::logout(&ctx).await,
        Command::Whoami => commands::whoami(&ctx),
        Command::Events { past } => commands::events(&ctx, past),
        Command::Calendar { event_id } => commands::calendar(&ctx, event_id),
        Command::Reservations { event, stage } => commands::reservations(&ctx, event, stage),
        Command::Book {
            ticket_type_id,
            attendees,
        } => commands::book(&ctx, ticket_type_id, attendees).await,
        Command::Change {
            reservation_id,
            ticket_type_id,
            attendees,
        } => commands::change(&ctx, reservation_id, ticket_type_id, attendees).await,
        Command::Cancel { reservation_id } => commands::cancel(&ctx, reservation_id).await,
        Command::CheckIn {
            stage_id,
            qr,
            dry_run,
        } => commands::check_in(&ctx, stage_id, &qr, dry_run).await,
        Command::Paid { reservation_id } => commands::toggle_paid(&ctx, reservation_id).await,
        Command::Capacity { assignments } => commands::capacity(&ctx, assignments).await,
        Command::Duplicate {
            event_id,
            start_date,
        } => commands::duplicate(&ctx, event_id, start_date).await,
        Command::DeleteEvent { event_id } => commands::delete_event(&ctx, event_id).await,
        Command::Metrics => commands::metrics(&ctx),
    }
}
