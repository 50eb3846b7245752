use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use hostelflow::config::AppConfig;
use hostelflow::models::{offered_slots, unread_count, Booking, ProviderStatus, ServiceCatalogEntry};
use hostelflow::services::booking_form::BookingForm;
use hostelflow::services::clock::parse_user_date;
use hostelflow::services::conversation::ChatSession;
use hostelflow::services::coordinator::BookingCoordinator;
use hostelflow::services::history::BookingHistory;
use hostelflow::services::inbox::NotificationInbox;
use hostelflow::services::provider::ProviderDesk;
use hostelflow::session::Credential;
use hostelflow::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "hostelflow")]
#[command(about = "Book hostel services from the command line")]
struct Cli {
    /// Bearer token; overrides AUTH_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List bookable services
    Services,
    /// Show which slots are free for a service on a date
    Slots {
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: String,
    },
    /// Book a slot
    Book {
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: String,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Sign in and print the token to export as AUTH_TOKEN
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List your bookings
    Bookings,
    /// Cancel a booking
    Cancel {
        booking_id: String,
    },
    /// Move a booking to another date and slot of the same service
    Reschedule {
        booking_id: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: String,
    },
    /// Rate a completed booking (1-5)
    Rate {
        booking_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show the signed-in profile
    Profile,
    /// List bookings assigned to you as a service provider
    Assigned,
    /// Set an assigned booking to in_progress or completed
    Status {
        booking_id: String,
        #[arg(long, value_parser = ProviderStatus::parse)]
        status: ProviderStatus,
    },
    /// List your notifications
    Notifications {
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification as read
    Read {
        notification_id: String,
    },
    /// Talk to the booking assistant
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let state = Arc::new(AppState::from_config(config)?);
    if let Commands::Login { email, password } = &cli.command {
        let coordinator = BookingCoordinator::new(Arc::clone(&state));
        let profile = coordinator.login(email, password).await?;
        eprintln!("Signed in as {}.", profile.display_name());
        println!("AUTH_TOKEN={}", state.session.credential()?.token());
        return Ok(());
    }
    if let Some(token) = cli.token {
        state.session.sign_in(Credential::bearer(token), None);
    }
    anyhow::ensure!(
        state.session.is_signed_in(),
        "not signed in: pass --token or set AUTH_TOKEN"
    );

    match cli.command {
        Commands::Services => {
            let coordinator = BookingCoordinator::new(Arc::clone(&state));
            for service in coordinator.services().await? {
                println!(
                    "{:>4}  {:<20} {:>8.2}  {:<10} {}",
                    service.id,
                    service.name,
                    service.price,
                    service.duration,
                    service.availability_label()
                );
            }
        }
        Commands::Slots { service, date } => {
            let mut form = open_form(&state, &service).await?;
            form.select_date(parse_date(&state, &date)?).await?;
            for slot in form.intent().slots().unwrap_or(&[]) {
                let mark = if slot.available { "free" } else { "taken" };
                println!("{}  {mark}", slot.slot);
            }
        }
        Commands::Book {
            service,
            date,
            slot,
            instructions,
        } => {
            let mut form = open_form(&state, &service).await?;
            form.select_date(parse_date(&state, &date)?).await?;
            let slot = match_slot(&state, &slot)?;
            form.choose_slot(&slot).await?;
            if let Some(text) = instructions {
                form.set_instructions(&text);
            }
            let booking = form.submit().await?;
            print_booking(&booking);
        }
        Commands::Bookings => {
            let mut history = BookingHistory::new(Arc::clone(&state));
            let bookings = history.bookings().await?;
            if bookings.is_empty() {
                println!("No bookings yet.");
            }
            for booking in bookings {
                print_booking(booking);
            }
        }
        Commands::Cancel { booking_id } => {
            let mut history = BookingHistory::new(Arc::clone(&state));
            history.cancel(&booking_id).await?;
            println!("Booking {booking_id} cancelled.");
        }
        Commands::Reschedule {
            booking_id,
            date,
            slot,
        } => {
            let mut history = BookingHistory::new(Arc::clone(&state));
            let mut dialog = history.reschedule_dialog(&booking_id).await?;
            dialog.select_date(parse_date(&state, &date)?).await?;
            let slot = match_slot(&state, &slot)?;
            if let Err(e) = dialog.choose_slot(&slot).await {
                let free = dialog
                    .intent()
                    .slots()
                    .map(|s| offered_slots(s).join(", "))
                    .unwrap_or_default();
                anyhow::bail!("{e} Free slots: {free}");
            }
            let booking = dialog.submit().await?;
            print_booking(&booking);
        }
        Commands::Rate {
            booking_id,
            rating,
            comment,
        } => {
            let mut history = BookingHistory::new(Arc::clone(&state));
            history.rate(&booking_id, rating, comment).await?;
            println!("Thanks for rating booking {booking_id}.");
        }
        Commands::Profile => {
            let cred = state.session.credential()?;
            let profile = state.session.guard(state.backend.profile(&cred).await)?;
            println!(
                "{} <{}> room {}",
                profile.display_name(),
                profile.email,
                profile.room_number.as_deref().unwrap_or("-")
            );
            state.session.set_profile(profile);
        }
        Commands::Assigned => {
            let mut desk = ProviderDesk::new(Arc::clone(&state));
            let bookings = desk.bookings().await?;
            if bookings.is_empty() {
                println!("No bookings assigned.");
            }
            for booking in bookings {
                print_booking(booking);
            }
        }
        Commands::Status { booking_id, status } => {
            let mut desk = ProviderDesk::new(Arc::clone(&state));
            desk.update_status(&booking_id, status).await?;
            println!("Booking {booking_id} updated.");
        }
        Commands::Notifications { unread } => {
            let mut inbox = NotificationInbox::new(Arc::clone(&state));
            let list = inbox.notifications().await?;
            println!("{} unread", unread_count(list));
            for n in list.iter().filter(|n| !unread || !n.read) {
                let mark = if n.read { " " } else { "*" };
                println!(
                    "{mark} {:>4}  {}  {}",
                    n.id,
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.message
                );
            }
        }
        Commands::Read { notification_id } => {
            let mut inbox = NotificationInbox::new(Arc::clone(&state));
            inbox.mark_read(&notification_id).await?;
            println!("Notification {notification_id} marked as read.");
        }
        // Handled before the session check.
        Commands::Login { .. } => {}
        Commands::Chat => run_chat(state).await?,
    }

    Ok(())
}

async fn run_chat(state: Arc<AppState>) -> Result<()> {
    let mut chat = ChatSession::new(state);
    for message in chat.transcript() {
        println!("assistant> {}", message.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        for reply in chat.process_message(line).await {
            println!("assistant> {reply}");
        }
    }
    Ok(())
}

/// Accepts either a service id or its name.
async fn open_form(state: &Arc<AppState>, service: &str) -> Result<BookingForm> {
    let coordinator = BookingCoordinator::new(Arc::clone(state));
    let services = coordinator.services().await?;
    let entry: ServiceCatalogEntry = match services
        .into_iter()
        .find(|s| s.id == service || s.name.eq_ignore_ascii_case(service))
    {
        Some(entry) => entry,
        None => coordinator.resolve_service(service).await?,
    };
    Ok(BookingForm::new(Arc::clone(state), entry))
}

fn parse_date(state: &AppState, text: &str) -> Result<NaiveDate> {
    parse_user_date(text, state.clock.today())
        .with_context(|| format!("invalid date {text:?}, expected YYYY-MM-DD, today or tomorrow"))
}

fn match_slot(state: &AppState, input: &str) -> Result<String> {
    state
        .catalog
        .match_slot(input)
        .map(str::to_string)
        .with_context(|| {
            format!(
                "unknown slot {input:?}, expected one of: {}",
                state.catalog.slots().join(", ")
            )
        })
}

fn print_booking(booking: &Booking) {
    println!(
        "{:>6}  {:<16} {}  {}  {}{}",
        booking.id,
        booking.service.name,
        booking.date,
        booking.time_slot,
        booking.status.label(),
        booking
            .rating
            .map(|r| format!("  rated {r}/5"))
            .unwrap_or_default()
    );
}
