// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::{
    Category, FieldError, FormField, LookupError, Record, RecordId, SessionToken, Status,
    TentativeId, ValidationError, catalog, parse_timestamp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create { tentative_id: TentativeId },
    Edit { record_id: RecordId },
}

impl FormMode {
    /// Form title shown to the user.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Create { .. } => "新增",
            Self::Edit { .. } => "编辑",
        }
    }

    /// Id displayed in the form: tentative for a create, confirmed for an edit.
    pub const fn display_id(self) -> RecordId {
        match self {
            Self::Create { tentative_id } => tentative_id.preview(),
            Self::Edit { record_id } => record_id,
        }
    }
}

/// Typed working copy of a record. Select fields hold scalar values only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    pub category: Option<Category>,
    pub name: Option<String>,
    pub status: Option<Status>,
    pub reason: String,
    pub created_at: String,
}

impl RecordDraft {
    fn from_record(record: &Record) -> Self {
        Self {
            category: Some(record.category),
            name: Some(record.name.clone()),
            status: Some(record.status),
            reason: record.reason.clone(),
            created_at: record.created_at.clone(),
        }
    }
}

/// Draft values that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub category: Category,
    pub name: String,
    pub status: Status,
    pub reason: String,
    pub created_at: String,
}

impl ValidatedDraft {
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            category: self.category,
            name: self.name,
            status: self.status,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

/// One open create or edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSession {
    token: SessionToken,
    mode: FormMode,
    draft: RecordDraft,
    name_stale: bool,
    errors: Option<ValidationError>,
}

impl FormSession {
    pub(crate) fn create(
        token: SessionToken,
        tentative_id: TentativeId,
        created_at: String,
    ) -> Self {
        Self {
            token,
            mode: FormMode::Create { tentative_id },
            draft: RecordDraft {
                created_at,
                ..RecordDraft::default()
            },
            name_stale: false,
            errors: None,
        }
    }

    pub(crate) fn edit(token: SessionToken, record: &Record) -> Self {
        Self {
            token,
            mode: FormMode::Edit {
                record_id: record.id,
            },
            draft: RecordDraft::from_record(record),
            name_stale: false,
            errors: None,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    /// Set when a category change cleared the chosen name and no new name has
    /// been picked yet.
    pub fn name_needs_reselect(&self) -> bool {
        self.name_stale
    }

    /// Errors from the last rejected submit or lookup.
    pub fn errors(&self) -> Option<&ValidationError> {
        self.errors.as_ref()
    }

    pub fn name_options(&self) -> &'static [&'static str] {
        self.draft.category.map(catalog::allowed_items).unwrap_or(&[])
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        if self.draft.category == category {
            return;
        }
        self.draft.category = category;

        let keep_name = match (&self.draft.name, category) {
            (Some(name), Some(category)) => catalog::contains(category, name),
            (None, _) => true,
            (Some(_), None) => false,
        };
        if !keep_name {
            debug!(token = self.token.get(), "category change cleared item name");
            self.draft.name = None;
            self.name_stale = true;
        }
        self.clear_error(FormField::Category);
    }

    pub fn select_category(&mut self, label: &str) -> Result<(), LookupError> {
        match Category::parse(label) {
            Some(category) => {
                self.set_category(Some(category));
                Ok(())
            }
            None => {
                let error = LookupError::UnknownCategory(label.to_owned());
                self.record_error(FormField::Category, &error);
                Err(error)
            }
        }
    }

    pub fn select_name(&mut self, name: &str) -> Result<(), LookupError> {
        let name = name.trim();
        if !self.name_options().contains(&name) {
            let error = LookupError::UnknownOption {
                field: FormField::Name.label(),
                value: name.to_owned(),
            };
            self.record_error(FormField::Name, &error);
            return Err(error);
        }
        self.draft.name = Some(name.to_owned());
        self.name_stale = false;
        self.clear_error(FormField::Name);
        Ok(())
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.draft.status = status;
        self.clear_error(FormField::Status);
    }

    pub fn select_status(&mut self, label: &str) -> Result<(), LookupError> {
        match Status::parse(label) {
            Some(status) => {
                self.set_status(Some(status));
                Ok(())
            }
            None => {
                let error = LookupError::UnknownOption {
                    field: FormField::Status.label(),
                    value: label.to_owned(),
                };
                self.record_error(FormField::Status, &error);
                Err(error)
            }
        }
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.draft.reason = reason.into();
        self.clear_error(FormField::Reason);
    }

    pub fn set_created_at(&mut self, created_at: impl Into<String>) {
        self.draft.created_at = created_at.into();
        self.clear_error(FormField::CreatedAt);
    }

    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let mut fields = Vec::new();
        let draft = &self.draft;

        if draft.category.is_none() {
            fields.push(field_error(FormField::Category, "请选择类型"));
        }
        match (&draft.name, draft.category) {
            (None, _) => fields.push(field_error(FormField::Name, "请选择设备")),
            (Some(name), _) if name.trim().is_empty() => {
                fields.push(field_error(FormField::Name, "请选择设备"));
            }
            (Some(name), Some(category)) if !catalog::contains(category, name) => {
                fields.push(field_error(
                    FormField::Name,
                    format!("{name} 不属于 {}", category.as_str()),
                ));
            }
            _ => {}
        }
        if draft.status.is_none() {
            fields.push(field_error(FormField::Status, "请选择状态"));
        }
        if draft.reason.trim().is_empty() {
            fields.push(field_error(FormField::Reason, "请填写原因"));
        }
        if draft.created_at.trim().is_empty() {
            fields.push(field_error(FormField::CreatedAt, "请填写时间"));
        } else if parse_timestamp(&draft.created_at).is_none() {
            fields.push(field_error(
                FormField::CreatedAt,
                "时间格式应为 YYYY-MM-DD HH:MM:SS",
            ));
        }

        match (draft.category, &draft.name, draft.status) {
            (Some(category), Some(name), Some(status)) if fields.is_empty() => Ok(ValidatedDraft {
                category,
                name: name.trim().to_owned(),
                status,
                reason: draft.reason.clone(),
                created_at: draft.created_at.trim().to_owned(),
            }),
            _ => Err(ValidationError { fields }),
        }
    }

    pub(crate) fn set_errors(&mut self, errors: ValidationError) {
        self.errors = Some(errors);
    }

    fn record_error(&mut self, field: FormField, error: &LookupError) {
        let mut fields = self
            .errors
            .take()
            .map(|errors| errors.fields)
            .unwrap_or_default();
        fields.retain(|existing| existing.field != field);
        fields.push(field_error(field, error.to_string()));
        self.errors = Some(ValidationError { fields });
    }

    fn clear_error(&mut self, field: FormField) {
        if let Some(errors) = &mut self.errors {
            errors.fields.retain(|existing| existing.field != field);
            if errors.fields.is_empty() {
                self.errors = None;
            }
        }
    }
}

fn field_error(field: FormField, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}
