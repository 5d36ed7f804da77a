use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Título no especificado";
pub const DEFAULT_DESCRIPTION: &str = "Descripción no especificada";
pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_USER: &str = "Usuario Anónimo";

/// A support ticket as stored by the backend and mirrored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "prioridad")]
    pub priority: Priority,
    #[serde(rename = "estado")]
    pub status: Status,
    #[serde(rename = "fecha")]
    pub created_at: Timestamp,
    #[serde(rename = "usuario")]
    pub user: String,
}

impl Ticket {
    /// Builds a ticket from submitted fields, filling anything omitted.
    pub fn from_fields(id: u64, fields: TicketFields, now: DateTime<Utc>) -> Self {
        let fields = fields.with_defaults(now);
        Self {
            id,
            title: fields.title.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            category: fields.category.unwrap_or_else(Category::general),
            priority: fields.priority.unwrap_or(Priority::Medium),
            status: fields.status.unwrap_or(Status::Open),
            created_at: fields.created_at.unwrap_or_else(|| now.into()),
            user: fields.user.unwrap_or_default(),
        }
    }

    /// Overwrites the fields present in `fields`. `id` and `created_at` are
    /// never touched.
    pub fn apply(&mut self, fields: &TicketFields) {
        if let Some(title) = &fields.title {
            self.title = title.clone();
        }
        if let Some(description) = &fields.description {
            self.description = description.clone();
        }
        if let Some(category) = &fields.category {
            self.category = category.clone();
        }
        if let Some(priority) = &fields.priority {
            self.priority = priority.clone();
        }
        if let Some(status) = &fields.status {
            self.status = status.clone();
        }
        if let Some(user) = &fields.user {
            self.user = user.clone();
        }
    }
}

/// A partial ticket: the body of create and replace calls, and the patch
/// accepted by updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketFields {
    #[serde(rename = "titulo", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(rename = "prioridad", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl TicketFields {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Fills every absent or blank field with its creation default.
    pub fn with_defaults(self, now: DateTime<Utc>) -> Self {
        Self {
            title: Some(non_blank(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string())),
            description: Some(
                non_blank(self.description).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            ),
            category: Some(
                self.category
                    .filter(|c| !c.as_str().trim().is_empty())
                    .unwrap_or_else(Category::general),
            ),
            priority: Some(
                self.priority
                    .filter(|p| !p.as_str().trim().is_empty())
                    .unwrap_or(Priority::Medium),
            ),
            status: Some(
                self.status
                    .filter(|s| !s.as_str().trim().is_empty())
                    .unwrap_or(Status::Open),
            ),
            created_at: Some(self.created_at.unwrap_or_else(|| now.into())),
            user: Some(non_blank(self.user).unwrap_or_else(|| DEFAULT_USER.to_string())),
        }
    }

    /// Merges this patch onto `base`: present fields win, the rest come from
    /// `base`. The creation date always comes from `base`.
    pub fn merged_onto(&self, base: &Ticket) -> Self {
        let mut merged = base.clone();
        merged.apply(self);
        Self::from(merged)
    }

    /// Drops fields that must never change after creation.
    pub fn into_patch(self) -> Self {
        Self {
            created_at: None,
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Ticket> for TicketFields {
    fn from(ticket: Ticket) -> Self {
        Self {
            title: Some(ticket.title),
            description: Some(ticket.description),
            category: Some(ticket.category),
            priority: Some(ticket.priority),
            status: Some(ticket.status),
            created_at: Some(ticket.created_at),
            user: Some(ticket.user),
        }
    }
}

/// The `fecha` value exactly as the backend sent it, so an update echoes it
/// back byte for byte. Parsed only for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(&self.0) {
            return Some(at.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Open => "abierto",
            Status::InProgress => "en-progreso",
            Status::Resolved => "resuelto",
            Status::Closed => "cerrado",
            Status::Other(raw) => raw,
        }
    }

    /// Display label; unknown values are shown as they came.
    pub fn label(&self) -> &str {
        match self {
            Status::Open => "Abierto",
            Status::InProgress => "En Progreso",
            Status::Resolved => "Resuelto",
            Status::Closed => "Cerrado",
            Status::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Other(_))
    }

    /// Lenient parse for user input.
    pub fn from_input(value: &str) -> Self {
        Self::from(value.trim().to_lowercase())
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "abierto" => Status::Open,
            "en-progreso" => Status::InProgress,
            "resuelto" => Status::Resolved,
            "cerrado" => Status::Closed,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "baja",
            Priority::Medium => "media",
            Priority::High => "alta",
            Priority::Critical => "critica",
            Priority::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Priority::Low => "Baja",
            Priority::Medium => "Media",
            Priority::High => "Alta",
            Priority::Critical => "Crítica",
            Priority::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Priority::Other(_))
    }

    pub fn from_input(value: &str) -> Self {
        Self::from(value.trim().to_lowercase())
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.as_str() {
            "baja" => Priority::Low,
            "media" => Priority::Medium,
            "alta" => Priority::High,
            "critica" => Priority::Critical,
            _ => Priority::Other(value),
        }
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Technical,
    Billing,
    GeneralInquiry,
    BugReport,
    EnhancementRequest,
    Other(String),
}

impl Category {
    /// The value assigned when a ticket is created without a category. It is
    /// not one of the selectable categories.
    pub fn general() -> Self {
        Category::Other(DEFAULT_CATEGORY.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Technical => "tecnico",
            Category::Billing => "facturacion",
            Category::GeneralInquiry => "consulta",
            Category::BugReport => "bug",
            Category::EnhancementRequest => "mejora",
            Category::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Technical => "Soporte Técnico",
            Category::Billing => "Facturación",
            Category::GeneralInquiry => "Consulta General",
            Category::BugReport => "Reporte de Bug",
            Category::EnhancementRequest => "Solicitud de Mejora",
            Category::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    pub fn from_input(value: &str) -> Self {
        Self::from(value.trim().to_lowercase())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tecnico" => Category::Technical,
            "facturacion" => Category::Billing,
            "consulta" => Category::GeneralInquiry,
            "bug" => Category::BugReport,
            "mejora" => Category::EnhancementRequest,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
