use clap::{Args, Subcommand};

use crate::cmd::tickets::{FormArgs, submit_form};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::draft::TicketForm;

#[derive(Args, Debug, Clone)]
pub struct DraftArgs {
    #[command(subcommand)]
    pub command: DraftCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DraftCommand {
    /// Show the saved draft, if any.
    Show,
    /// Save form fields into the draft without submitting.
    Save(FormArgs),
    /// Submit the saved draft as a new ticket.
    Submit,
    /// Discard the saved draft.
    Clear,
}

pub async fn run(ctx: &AppContext, command: DraftCommand) -> AppResult<()> {
    let mut form = TicketForm::open(ctx);
    match command {
        DraftCommand::Show => {
            match form.saved_draft() {
                Some(draft) => {
                    println!("Title:       {}", draft.title);
                    println!("Description: {}", draft.description);
                    println!("Category:    {}", draft.category);
                    println!("Priority:    {}", draft.priority);
                    println!("User:        {}", draft.user);
                }
                None => println!("No draft saved."),
            }
            Ok(())
        }
        DraftCommand::Save(args) => {
            form.edit(|values| values.merge(args.to_draft()))?;
            if form.saved_draft().is_none() {
                println!("Nothing saved: a draft needs a title or a description.");
            }
            Ok(())
        }
        DraftCommand::Submit => submit_form(&mut form).await,
        DraftCommand::Clear => form.reset(),
    }
}
