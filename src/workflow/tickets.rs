use crate::context::AppContext;
use crate::domain::filter::{TicketFilter, TicketStats};
use crate::domain::ticket::{Status, Ticket, TicketFields};
use crate::error::{AppError, AppResult};

#[derive(Debug)]
pub struct TicketListing {
    /// Tickets passing the filter, in backend order.
    pub tickets: Vec<Ticket>,
    /// Counts over the whole collection, not just the filtered part.
    pub stats: TicketStats,
}

pub async fn load_tickets(
    ctx: &AppContext,
    refresh: bool,
    filter: &TicketFilter,
) -> AppResult<TicketListing> {
    let all = match ctx.tickets.get_all(refresh).await {
        Ok(all) => all,
        Err(err) => {
            ctx.notifier.danger("Error al cargar los tickets");
            return Err(err);
        }
    };

    let stats = TicketStats::from_tickets(&all);
    let tickets = all.into_iter().filter(|t| filter.matches(t)).collect();
    Ok(TicketListing { tickets, stats })
}

pub async fn show_ticket(ctx: &AppContext, id: u64) -> AppResult<Ticket> {
    ctx.tickets.get(id).await
}

pub async fn update_ticket(ctx: &AppContext, id: u64, patch: TicketFields) -> AppResult<Ticket> {
    if patch.is_empty() {
        return Err(AppError::Validation("nothing to update".to_string()));
    }
    let status_only = patch == TicketFields {
        status: patch.status.clone(),
        ..TicketFields::default()
    };

    match ctx.tickets.update(id, patch).await {
        Ok(ticket) if status_only => {
            ctx.notifier.success("Estado actualizado exitosamente");
            Ok(ticket)
        }
        Ok(ticket) => {
            ctx.notifier.success("Ticket actualizado exitosamente");
            Ok(ticket)
        }
        Err(err) => {
            if status_only {
                ctx.notifier.danger("Error al actualizar el estado");
            } else {
                ctx.notifier.danger("Error al actualizar el ticket");
            }
            Err(err)
        }
    }
}

pub async fn change_status(ctx: &AppContext, id: u64, status: Status) -> AppResult<Ticket> {
    update_ticket(ctx, id, TicketFields::status(status)).await
}

pub async fn delete_ticket(ctx: &AppContext, id: u64) -> AppResult<()> {
    match ctx.tickets.remove(id).await {
        Ok(()) => {
            ctx.notifier.success("Ticket eliminado exitosamente");
            Ok(())
        }
        Err(err) => {
            ctx.notifier.danger("Error al eliminar el ticket");
            Err(err)
        }
    }
}
