// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::RecordId;

/// A lookup outside the catalog or a column's option list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown category {0:?} -- choose one of the catalog categories")]
    UnknownCategory(String),
    #[error("{value:?} is not an option for {field} -- re-select it")]
    UnknownOption { field: &'static str, value: String },
    #[error("column {0} takes a search term, not a value list")]
    NotDiscrete(&'static str),
}

/// Failure of one remote call, as reported by a [`crate::RecordService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("cannot reach record service: {0}")]
    Transport(String),
    #[error("record service timed out")]
    Timeout,
    #[error("record service returned status {0}")]
    Status(u16),
    #[error("decode record service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether an idempotent read may be retried after this failure.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status(code) => *code >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("load records failed, keeping last loaded data: {0}")]
pub struct LoadError(#[from] pub ServiceError);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("save failed: {0}")]
    Service(#[from] ServiceError),
    #[error("record {0} is not in the table -- reload and retry")]
    UnknownRecord(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Category,
    Name,
    Status,
    Reason,
    CreatedAt,
}

impl FormField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Name => "name",
            Self::Status => "status",
            Self::Reason => "reason",
            Self::CreatedAt => "create time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Field-level problems found before a submit reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn has(&self, field: FormField) -> bool {
        self.message_for(field).is_some()
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| format!("{}: {}", error.field.label(), error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Local precondition failures of a desk operation. Remote failures never
/// surface here; they become notices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeskError {
    #[error("current role cannot create, edit or delete records")]
    NotPermitted,
    #[error("a form is already open -- submit or cancel it first")]
    SessionAlreadyOpen,
    #[error("no form is open")]
    NoOpenSession,
    #[error("a submit is already in flight for this form")]
    SubmitInFlight,
    #[error("record {0} is not in the table")]
    UnknownRecord(RecordId),
    #[error("no delete is awaiting confirmation")]
    NoPendingDelete,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
