use crate::context::AppContext;
use crate::domain::draft::{FieldError, TicketDraft};
use crate::domain::ticket::Ticket;
use crate::error::AppResult;
use crate::persisted::{Listener, PersistedState};

pub const DRAFT_KEY: &str = "ticket-draft";

#[derive(Debug)]
pub enum SubmitOutcome {
    Created(Ticket),
    Invalid(Vec<FieldError>),
}

/// The ticket creation form. Its values survive restarts through the draft
/// key and are cleared once a ticket is created.
pub struct TicketForm {
    ctx: AppContext,
    draft: PersistedState<Option<TicketDraft>>,
    values: TicketDraft,
}

impl TicketForm {
    /// Opens the form, restoring a saved draft when there is one.
    pub fn open(ctx: &AppContext) -> Self {
        let draft: PersistedState<Option<TicketDraft>> =
            PersistedState::open(ctx.storage.clone(), DRAFT_KEY, None);
        let values = match draft.get() {
            Some(saved) => {
                ctx.notifier.info("Se ha restaurado un borrador guardado");
                saved
            }
            None => TicketDraft::empty_for(&ctx.config.user_name),
        };

        Self {
            ctx: ctx.clone(),
            draft,
            values,
        }
    }

    pub fn values(&self) -> &TicketDraft {
        &self.values
    }

    pub fn saved_draft(&self) -> Option<TicketDraft> {
        self.draft.get()
    }

    /// Follows drafts saved by other instances sharing the same store.
    pub fn listen(&self) -> Listener {
        self.draft.listen()
    }

    /// Changes the form and saves it as a draft once it has content.
    pub fn edit(&mut self, change: impl FnOnce(&mut TicketDraft)) -> AppResult<()> {
        change(&mut self.values);
        if self.values.has_content() {
            self.draft.set(Some(self.values.clone()))?;
        }
        Ok(())
    }

    pub async fn submit(&mut self) -> AppResult<SubmitOutcome> {
        let errors = self.values.validate();
        if !errors.is_empty() {
            self.ctx
                .notifier
                .warning("Por favor corrige los errores en el formulario");
            return Ok(SubmitOutcome::Invalid(errors));
        }

        let ticket = match self.ctx.tickets.add(self.values.to_fields()).await {
            Ok(ticket) => ticket,
            Err(err) => {
                self.ctx
                    .notifier
                    .danger("Error al crear el ticket. Por favor intenta nuevamente.");
                return Err(err);
            }
        };

        self.ctx.notifier.success("¡Ticket creado exitosamente!");
        self.clear()?;
        Ok(SubmitOutcome::Created(ticket))
    }

    /// Empties the form and discards the saved draft.
    pub fn reset(&mut self) -> AppResult<()> {
        self.clear()
    }

    fn clear(&mut self) -> AppResult<()> {
        self.values = TicketDraft::empty_for(&self.ctx.config.user_name);
        self.draft.set(None)
    }
}
