use clap::Args;

use crate::context::AppContext;
use crate::domain::draft::TicketDraft;
use crate::domain::filter::{TicketFilter, TicketStats};
use crate::domain::ticket::{Category, Priority, Status, Ticket, TicketFields};
use crate::error::{AppError, AppResult};
use crate::workflow::draft::{SubmitOutcome, TicketForm};
use crate::workflow::tickets;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Serve the list from the local cache when possible.
    #[arg(long)]
    pub cached: bool,
    /// Only tickets with this status (abierto, en-progreso, resuelto, cerrado).
    #[arg(long)]
    pub status: Option<String>,
    /// Only tickets with this priority (baja, media, alta, critica).
    #[arg(long)]
    pub priority: Option<String>,
    /// Case-insensitive search over title and description.
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// tecnico, facturacion, consulta, bug or mejora.
    #[arg(long)]
    pub category: Option<String>,
    /// baja, media, alta or critica.
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
}

impl FormArgs {
    pub fn to_draft(&self) -> TicketDraft {
        TicketDraft {
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
            priority: self.priority.clone().unwrap_or_default(),
            user: self.user.clone().unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    pub id: u64,
    #[arg(long)]
    pub status: Option<String>,
    #[command(flatten)]
    pub fields: FormArgs,
}

impl UpdateArgs {
    fn to_patch(&self) -> TicketFields {
        TicketFields {
            title: self.fields.title.clone(),
            description: self.fields.description.clone(),
            category: self.fields.category.as_deref().map(Category::from_input),
            priority: self.fields.priority.as_deref().map(Priority::from_input),
            status: self.status.as_deref().map(Status::from_input),
            created_at: None,
            user: self.fields.user.clone(),
        }
    }
}

pub async fn list(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    let filter = TicketFilter {
        status: args.status.as_deref().map(Status::from_input),
        priority: args.priority.as_deref().map(Priority::from_input),
        search: args.search,
    };
    let listing = tickets::load_tickets(ctx, !args.cached, &filter).await?;

    print_stats(&listing.stats);
    if listing.tickets.is_empty() {
        if listing.stats.total == 0 {
            println!("No tickets yet.");
        } else {
            println!("No tickets match the current filters.");
        }
        return Ok(());
    }
    for ticket in &listing.tickets {
        print_summary(ticket);
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, id: u64) -> AppResult<()> {
    let ticket = tickets::show_ticket(ctx, id).await?;
    print_summary(&ticket);
    println!("  Category: {}", ticket.category);
    let created = match ticket.created_at.parse() {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => ticket.created_at.to_string(),
    };
    println!("  Created:  {created} by {}", ticket.user);
    println!();
    println!("{}", ticket.description);
    Ok(())
}

/// Fills the creation form from the flags (on top of any saved draft) and
/// submits it. Invalid input stays saved as a draft.
pub async fn add(ctx: &AppContext, args: FormArgs) -> AppResult<()> {
    let mut form = TicketForm::open(ctx);
    form.edit(|values| values.merge(args.to_draft()))?;
    submit_form(&mut form).await
}

pub async fn submit_form(form: &mut TicketForm) -> AppResult<()> {
    match form.submit().await? {
        SubmitOutcome::Created(ticket) => {
            print_summary(&ticket);
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for error in &errors {
                eprintln!("  {error}");
            }
            Err(AppError::Validation(format!(
                "{} field(s) need attention; progress kept as a draft",
                errors.len()
            )))
        }
    }
}

pub async fn update(ctx: &AppContext, args: UpdateArgs) -> AppResult<()> {
    let ticket = tickets::update_ticket(ctx, args.id, args.to_patch()).await?;
    print_summary(&ticket);
    Ok(())
}

pub async fn remove(ctx: &AppContext, id: u64) -> AppResult<()> {
    tickets::delete_ticket(ctx, id).await
}

fn print_stats(stats: &TicketStats) {
    println!(
        "Total: {}  Abiertos: {}  En Progreso: {}  Resueltos: {}",
        stats.total, stats.open, stats.in_progress, stats.resolved
    );
    println!();
}

pub fn print_summary(ticket: &Ticket) {
    println!(
        "#{:<4} [{}] [{}] {}",
        ticket.id, ticket.status, ticket.priority, ticket.title
    );
}
