// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::{
    DeskError, FormMode, FormSession, Mutation, PersistError, Record, RecordId, RecordService,
    RecordStore, Role, ServiceError, SessionToken, TableView, now_timestamp,
};

pub const ADDED: &str = "添加成功";
pub const EDITED: &str = "编辑成功";
pub const DELETED: &str = "删除成功";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEvent {
    RecordsLoaded(usize),
    SessionOpened { token: SessionToken, mode: FormMode },
    SessionClosed(SessionToken),
    RecordAdded(RecordId),
    RecordEdited(RecordId),
    RecordDeleted(RecordId),
    DeleteRequested(RecordId),
    DeleteCancelled(RecordId),
    /// The completion's form is gone; the store still took the write.
    CompletionDetached(SessionToken),
    Notice(Notice),
}

/// A validated submit whose remote call has not run yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmit {
    token: SessionToken,
    mutation: Mutation,
}

impl PendingSubmit {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn record(&self) -> &Record {
        self.mutation.record()
    }

    pub fn run<S>(self, service: &S) -> SubmitCompletion
    where
        S: RecordService + ?Sized,
    {
        let outcome = self.mutation.send(service);
        SubmitCompletion {
            token: self.token,
            mutation: self.mutation,
            outcome,
        }
    }
}

/// Result of a remote submit, to be folded back with [`Desk::complete_submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCompletion {
    token: SessionToken,
    mutation: Mutation,
    outcome: Result<Option<RecordId>, ServiceError>,
}

impl SubmitCompletion {
    pub fn token(&self) -> SessionToken {
        self.token
    }
}

/// Coordinates the record store, the table view and the single form session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desk {
    role: Role,
    store: RecordStore,
    table: TableView,
    session: Option<FormSession>,
    in_flight: Option<SessionToken>,
    pending_delete: Option<RecordId>,
    next_token: u64,
    status_line: Option<Notice>,
}

impl Desk {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            store: RecordStore::new(),
            table: TableView::new(),
            session: None,
            in_flight: None,
            pending_delete: None,
            next_token: 1,
            status_line: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn can_mutate(&self) -> bool {
        self.role.can_mutate()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableView {
        &mut self.table
    }

    /// Records passing the active filters, in display order.
    pub fn rows(&self) -> Vec<&Record> {
        self.table.project(self.store.records())
    }

    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Result<&mut FormSession, DeskError> {
        self.session.as_mut().ok_or(DeskError::NoOpenSession)
    }

    pub fn pending_delete(&self) -> Option<RecordId> {
        self.pending_delete
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.status_line.as_ref()
    }

    pub fn refresh<S>(&mut self, service: &S) -> Vec<DeskEvent>
    where
        S: RecordService + ?Sized,
    {
        match self.store.load(service) {
            Ok(count) => vec![DeskEvent::RecordsLoaded(count)],
            Err(error) => vec![self.notify(NoticeLevel::Warning, error.to_string())],
        }
    }

    pub fn open_create(&mut self) -> Result<Vec<DeskEvent>, DeskError> {
        self.open_create_at(now_timestamp())
    }

    pub fn open_create_at(&mut self, created_at: String) -> Result<Vec<DeskEvent>, DeskError> {
        self.ensure_can_open()?;
        let token = self.issue_token();
        let session = FormSession::create(token, self.store.next_tentative_id(), created_at);
        Ok(self.open(session))
    }

    pub fn open_edit(&mut self, id: RecordId) -> Result<Vec<DeskEvent>, DeskError> {
        self.ensure_can_open()?;
        let record = self
            .store
            .get(id)
            .cloned()
            .ok_or(DeskError::UnknownRecord(id))?;
        let token = self.issue_token();
        Ok(self.open(FormSession::edit(token, &record)))
    }

    /// Discards the open draft without any remote effect.
    pub fn cancel_session(&mut self) -> Result<Vec<DeskEvent>, DeskError> {
        let session = self.session.take().ok_or(DeskError::NoOpenSession)?;
        debug!(token = session.token().get(), "form session cancelled");
        Ok(vec![DeskEvent::SessionClosed(session.token())])
    }

    /// Validates the open draft and detaches its remote call. Validation
    /// problems are also kept on the session for display.
    pub fn begin_submit(&mut self) -> Result<PendingSubmit, DeskError> {
        if !self.can_mutate() {
            return Err(DeskError::NotPermitted);
        }
        let session = self.session.as_mut().ok_or(DeskError::NoOpenSession)?;
        let token = session.token();
        if self.in_flight == Some(token) {
            return Err(DeskError::SubmitInFlight);
        }

        let draft = match session.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                debug!(token = token.get(), %errors, "submit rejected by validation");
                session.set_errors(errors.clone());
                return Err(errors.into());
            }
        };
        let mutation = match session.mode() {
            FormMode::Create { tentative_id } => Mutation::Insert {
                record: draft.into_record(tentative_id.preview()),
                tentative_id,
            },
            FormMode::Edit { record_id } => self
                .store
                .prepare_update(draft.into_record(record_id))
                .map_err(|_| DeskError::UnknownRecord(record_id))?,
        };

        self.in_flight = Some(token);
        Ok(PendingSubmit { token, mutation })
    }

    /// Folds a remote outcome back in. The store always reflects a confirmed
    /// write. The open form is closed, and success announced, only when it
    /// owns the completion: it is the submitting session, or an edit of the
    /// same record reopened meanwhile.
    pub fn complete_submit(&mut self, completion: SubmitCompletion) -> Vec<DeskEvent> {
        let SubmitCompletion {
            token,
            mutation,
            outcome,
        } = completion;
        if self.in_flight == Some(token) {
            self.in_flight = None;
        }
        let owner = self
            .session
            .as_ref()
            .filter(|session| owns_completion(session, token, &mutation))
            .map(FormSession::token);

        let mut events = Vec::new();
        if owner.is_none() {
            warn!(token = token.get(), "completion detached from its closed form");
            events.push(DeskEvent::CompletionDetached(token));
        }

        let assigned = match outcome {
            Ok(assigned) => assigned,
            Err(error) => {
                warn!(token = token.get(), %error, "submit failed");
                events.push(self.notify(NoticeLevel::Error, PersistError::from(error).to_string()));
                return events;
            }
        };

        let applied = match mutation {
            Mutation::Insert {
                record,
                tentative_id,
            } => {
                let id = self.store.apply_insert(record, tentative_id, assigned);
                info!(%id, "record added");
                Ok((DeskEvent::RecordAdded(id), ADDED))
            }
            Mutation::Update(record) => {
                let id = record.id;
                self.store.apply_update(record).map(|()| {
                    info!(%id, "record edited");
                    (DeskEvent::RecordEdited(id), EDITED)
                })
            }
            Mutation::Remove(record) => {
                let id = record.id;
                self.store.apply_remove(id);
                Ok((DeskEvent::RecordDeleted(id), DELETED))
            }
        };

        match applied {
            Ok((event, message)) => {
                events.push(event);
                if let Some(open) = owner {
                    self.session = None;
                    events.push(DeskEvent::SessionClosed(open));
                    events.push(self.notify(NoticeLevel::Success, message));
                }
            }
            Err(error) => {
                warn!(%error, "saved record vanished from the table");
                events.push(self.notify(NoticeLevel::Warning, error.to_string()));
            }
        }
        events
    }

    pub fn submit<S>(&mut self, service: &S) -> Result<Vec<DeskEvent>, DeskError>
    where
        S: RecordService + ?Sized,
    {
        let pending = self.begin_submit()?;
        Ok(self.complete_submit(pending.run(service)))
    }

    pub fn request_delete(&mut self, id: RecordId) -> Result<Vec<DeskEvent>, DeskError> {
        if !self.can_mutate() {
            return Err(DeskError::NotPermitted);
        }
        if self.store.get(id).is_none() {
            return Err(DeskError::UnknownRecord(id));
        }
        self.pending_delete = Some(id);
        debug!(%id, "delete awaiting confirmation");
        Ok(vec![DeskEvent::DeleteRequested(id)])
    }

    pub fn cancel_delete(&mut self) -> Result<Vec<DeskEvent>, DeskError> {
        let id = self.pending_delete.take().ok_or(DeskError::NoPendingDelete)?;
        Ok(vec![DeskEvent::DeleteCancelled(id)])
    }

    pub fn confirm_delete<S>(&mut self, service: &S) -> Result<Vec<DeskEvent>, DeskError>
    where
        S: RecordService + ?Sized,
    {
        if !self.can_mutate() {
            return Err(DeskError::NotPermitted);
        }
        let id = self.pending_delete.take().ok_or(DeskError::NoPendingDelete)?;
        let events = match self.store.remove(service, id) {
            Ok(Some(_)) => {
                info!(%id, "record deleted");
                vec![
                    DeskEvent::RecordDeleted(id),
                    self.notify(NoticeLevel::Success, DELETED),
                ]
            }
            Ok(None) => vec![self.notify(
                NoticeLevel::Warning,
                PersistError::UnknownRecord(id).to_string(),
            )],
            Err(error) => {
                warn!(%id, %error, "delete failed");
                vec![self.notify(NoticeLevel::Error, error.to_string())]
            }
        };
        Ok(events)
    }

    fn ensure_can_open(&self) -> Result<(), DeskError> {
        if !self.can_mutate() {
            return Err(DeskError::NotPermitted);
        }
        if self.session.is_some() {
            return Err(DeskError::SessionAlreadyOpen);
        }
        Ok(())
    }

    fn issue_token(&mut self) -> SessionToken {
        let token = SessionToken::new(self.next_token);
        self.next_token += 1;
        token
    }

    fn open(&mut self, session: FormSession) -> Vec<DeskEvent> {
        let event = DeskEvent::SessionOpened {
            token: session.token(),
            mode: session.mode(),
        };
        debug!(token = session.token().get(), mode = session.mode().title(), "form session opened");
        self.session = Some(session);
        vec![event]
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) -> DeskEvent {
        let notice = Notice {
            level,
            message: message.into(),
        };
        self.status_line = Some(notice.clone());
        DeskEvent::Notice(notice)
    }
}

fn owns_completion(session: &FormSession, token: SessionToken, mutation: &Mutation) -> bool {
    if session.token() == token {
        return true;
    }
    match (session.mode(), mutation) {
        (FormMode::Edit { record_id }, Mutation::Update(record)) => record_id == record.id,
        _ => false,
    }
}
