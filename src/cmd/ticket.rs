use std::future::Future;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use crate::cmd::Outcome;
use crate::cmd::prompt::confirm;
use crate::context::AppContext;
use crate::domain::status::{StatusFilter, TicketStatus};
use crate::domain::ticket::{
    FieldUpdate, NewTicket, StatusCounts, Ticket, TicketId, TicketPatch, filter_tickets,
    parse_deadline,
};
use crate::error::AppResult;
use crate::query::MutationKind;

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    #[command(subcommand)]
    pub command: TicketCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommand {
    /// List your tickets, newest first.
    List {
        /// Only show tickets with this status (all, in_progress, completed, blocked).
        #[arg(short, long, value_parser = parse_filter)]
        status: Option<StatusFilter>,
    },
    /// Create a ticket. New tickets start in progress.
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Deadline as YYYY-MM-DD or an RFC 3339 timestamp.
        #[arg(long)]
        deadline: String,
    },
    /// Change some fields of a ticket; the rest stay as they are.
    Update {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description.
        #[arg(long)]
        clear_description: bool,
        #[arg(long, value_parser = parse_deadline_arg)]
        deadline: Option<DateTime<Utc>>,
        #[arg(short, long, value_parser = parse_status)]
        status: Option<TicketStatus>,
    },
    /// Move a ticket to another status.
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: TicketStatus,
    },
    /// Delete a ticket permanently.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_status(value: &str) -> Result<TicketStatus, String> {
    TicketStatus::from_str(value)
        .ok_or_else(|| format!("unknown status '{value}' (in_progress, completed, blocked)"))
}

fn parse_filter(value: &str) -> Result<StatusFilter, String> {
    StatusFilter::from_str(value).ok_or_else(|| {
        format!("unknown status filter '{value}' (all, in_progress, completed, blocked)")
    })
}

fn parse_deadline_arg(value: &str) -> Result<DateTime<Utc>, String> {
    parse_deadline(value).map_err(|err| err.to_string())
}

pub async fn run(ctx: &AppContext, command: TicketCommand) -> AppResult<Outcome> {
    match command {
        TicketCommand::List { status } => {
            let filter = status.unwrap_or(ctx.config.default_filter);
            let tickets = ctx.tickets.tickets().await?;
            print!("{}", render_list(&tickets, filter, Utc::now()));
            Ok(Outcome::Done)
        }
        TicketCommand::Create {
            title,
            description,
            deadline,
        } => {
            let input = NewTicket {
                title,
                description,
                deadline: Some(deadline),
            };
            let created = with_progress(
                ctx,
                MutationKind::Create,
                ctx.tickets.create_ticket(input),
            )
            .await;
            Ok(show_ticket(created))
        }
        TicketCommand::Update {
            id,
            title,
            description,
            clear_description,
            deadline,
            status,
        } => {
            let description = match (description, clear_description) {
                (_, true) => FieldUpdate::Clear,
                (Some(text), false) => FieldUpdate::Set(text),
                (None, false) => FieldUpdate::Keep,
            };
            let patch = TicketPatch {
                title,
                description,
                deadline,
                status,
            };
            let updated = with_progress(
                ctx,
                MutationKind::Update,
                ctx.tickets.update_ticket(TicketId(id), patch),
            )
            .await;
            Ok(show_ticket(updated))
        }
        TicketCommand::Status { id, status } => {
            let updated = with_progress(
                ctx,
                MutationKind::Update,
                ctx.tickets.update_ticket(TicketId(id), TicketPatch::status(status)),
            )
            .await;
            Ok(show_ticket(updated))
        }
        TicketCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete ticket {id}? This cannot be undone."))? {
                println!("Cancelled.");
                return Ok(Outcome::Done);
            }
            let deleted = with_progress(
                ctx,
                MutationKind::Delete,
                ctx.tickets.delete_ticket(TicketId(id)),
            )
            .await;
            match deleted {
                Ok(()) => Ok(Outcome::Done),
                Err(_) => Ok(Outcome::Failed),
            }
        }
    }
}

/// Prints "Saving..." on stderr while the mutation is pending.
async fn with_progress<T>(
    ctx: &AppContext,
    kind: MutationKind,
    call: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    let mut state = ctx.tickets.subscribe(kind);
    let progress = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            if state.borrow_and_update().is_pending() {
                eprintln!("Saving...");
            }
        }
    });

    let result = call.await;
    progress.abort();
    result
}

// Mutation failures were already shown by the notifier.
fn show_ticket(result: AppResult<Ticket>) -> Outcome {
    match result {
        Ok(ticket) => {
            print!("{}", render_card(&ticket, Utc::now()));
            Outcome::Done
        }
        Err(_) => Outcome::Failed,
    }
}

pub fn render_list(tickets: &[Ticket], filter: StatusFilter, now: DateTime<Utc>) -> String {
    let counts = StatusCounts::from_tickets(tickets);
    let mut out = String::new();

    let mut bar = vec![marker(filter == StatusFilter::All, "All".to_string())];
    for status in TicketStatus::ALL {
        let label = format!("{} ({})", status.label(), counts.get(status));
        bar.push(marker(filter == StatusFilter::Only(status), label));
    }
    out.push_str(&bar.join("  "));
    out.push_str("\n\n");

    let visible = filter_tickets(tickets, filter);
    if visible.is_empty() {
        let (headline, hint) = match filter {
            StatusFilter::All => ("No tickets", "Create your first ticket to get started"),
            StatusFilter::Only(_) => ("No tickets in this category", "Try another filter"),
        };
        out.push_str(&format!("{headline}\n{hint}\n"));
        return out;
    }

    for ticket in visible {
        out.push_str(&render_card(ticket, now));
        out.push('\n');
    }
    out
}

fn marker(selected: bool, label: String) -> String {
    if selected { format!("[{label}]") } else { label }
}

pub fn render_card(ticket: &Ticket, now: DateTime<Utc>) -> String {
    let mut out = format!("{}  [{}]\n", ticket.title, ticket.status.label());
    out.push_str(&format!("  id: {}\n", ticket.id));
    if let Some(description) = &ticket.description {
        out.push_str(&format!("  {description}\n"));
    }

    let flag = if ticket.is_overdue(now) {
        " (overdue)"
    } else if ticket.is_due_today(now) {
        " (due today)"
    } else {
        ""
    };
    out.push_str(&format!(
        "  deadline: {}{flag}\n",
        ticket.deadline.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!(
        "  created: {}\n",
        ticket.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out
}
