use crate::domain::ticket::{Priority, Status, Ticket};

/// Narrows the ticket list the way the list view does: by status, by priority
/// and by a case-insensitive search over title and description.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                ticket.title.to_lowercase().contains(&term)
                    || ticket.description.to_lowercase().contains(&term)
            }
        };
        let matches_status = self
            .status
            .as_ref()
            .is_none_or(|status| &ticket.status == status);
        let matches_priority = self
            .priority
            .as_ref()
            .is_none_or(|priority| &ticket.priority == priority);

        matches_search && matches_status && matches_priority
    }

    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|t| self.matches(t)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl TicketStats {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        tickets.iter().fold(
            Self {
                total: tickets.len(),
                ..Self::default()
            },
            |mut stats, ticket| {
                match ticket.status {
                    Status::Open => stats.open += 1,
                    Status::InProgress => stats.in_progress += 1,
                    Status::Resolved => stats.resolved += 1,
                    _ => {}
                }
                stats
            },
        )
    }
}
