use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ticket::{Category, Priority, TicketFields};

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 500;

/// The ticket creation form as the user left it. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketDraft {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "prioridad")]
    pub priority: String,
    #[serde(rename = "usuario")]
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Category,
    Priority,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Title => "titulo",
            FormField::Description => "descripcion",
            FormField::Category => "categoria",
            FormField::Priority => "prioridad",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.message)
    }
}

impl TicketDraft {
    pub fn empty_for(user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..Self::default()
        }
    }

    /// A draft is only worth keeping once the user has typed a title or a
    /// description.
    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.description.is_empty()
    }

    /// Overlays the non-empty fields of `other` onto this draft.
    pub fn merge(&mut self, other: TicketDraft) {
        for (target, value) in [
            (&mut self.title, other.title),
            (&mut self.description, other.description),
            (&mut self.category, other.category),
            (&mut self.priority, other.priority),
            (&mut self.user, other.user),
        ] {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let title = self.title.trim().chars().count();
        let title_error = if title == 0 {
            Some("El título es obligatorio")
        } else if title < TITLE_MIN {
            Some("El título debe tener al menos 5 caracteres")
        } else if title > TITLE_MAX {
            Some("El título no puede exceder 100 caracteres")
        } else {
            None
        };
        if let Some(message) = title_error {
            errors.push(FieldError {
                field: FormField::Title,
                message,
            });
        }

        let description = self.description.trim().chars().count();
        let description_error = if description == 0 {
            Some("La descripción es obligatoria")
        } else if description < DESCRIPTION_MIN {
            Some("La descripción debe tener al menos 10 caracteres")
        } else if description > DESCRIPTION_MAX {
            Some("La descripción no puede exceder 500 caracteres")
        } else {
            None
        };
        if let Some(message) = description_error {
            errors.push(FieldError {
                field: FormField::Description,
                message,
            });
        }

        if self.category.is_empty() {
            errors.push(FieldError {
                field: FormField::Category,
                message: "Debes seleccionar una categoría",
            });
        }
        if self.priority.is_empty() {
            errors.push(FieldError {
                field: FormField::Priority,
                message: "Debes seleccionar una prioridad",
            });
        }

        errors
    }

    /// Converts the form into the fields submitted on creation. Empty fields
    /// are left out so creation defaults apply.
    pub fn to_fields(&self) -> TicketFields {
        let present = |value: &str| Some(value.to_string()).filter(|v| !v.trim().is_empty());
        TicketFields {
            title: present(&self.title),
            description: present(&self.description),
            category: present(&self.category).map(|c| Category::from_input(&c)),
            priority: present(&self.priority).map(|p| Priority::from_input(&p)),
            status: None,
            created_at: None,
            user: present(&self.user),
        }
    }
}
