// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use equipdesk_app::{
    Column, Desk, DeskEvent, FormSession, NoticeLevel, RecordId, RecordService, Role,
    now_timestamp,
};
use std::io::Write;

use crate::{Command, FieldArgs, ListArgs};

/// Runs one CLI command against a desk backed by `service`.
pub struct DeskRuntime<'a> {
    desk: Desk,
    service: &'a dyn RecordService,
}

impl<'a> DeskRuntime<'a> {
    pub fn new(role: Role, service: &'a dyn RecordService) -> Self {
        Self {
            desk: Desk::new(role),
            service,
        }
    }

    pub fn run(&mut self, command: &Command, out: &mut dyn Write) -> Result<()> {
        report(self.desk.refresh(self.service), out)?;
        match command {
            Command::List(list) => self.list(list, out),
            Command::Add(fields) => self.add(fields, out),
            Command::Edit { id, fields } => self.edit(*id, fields, out),
            Command::Delete { id, confirmed } => self.delete(*id, *confirmed, out),
        }
    }

    fn list(&mut self, list: &ListArgs, out: &mut dyn Write) -> Result<()> {
        let table = self.desk.table_mut();
        let filters = table.filters_mut();
        filters
            .set_discrete_filter(Column::Category, &list.categories)
            .context("--category")?;
        filters
            .set_discrete_filter(Column::Name, &list.names)
            .context("--name (pick names from the filtered categories)")?;
        filters
            .set_discrete_filter(Column::Status, &list.statuses)
            .context("--status")?;
        if let Some((column, term)) = &list.search {
            filters.set_search_term(*column, term);
        }
        for (column, direction) in &list.sorts {
            table.set_sort(*column, *direction);
        }

        let labels: Vec<_> = Column::ALL.iter().map(|column| column.label()).collect();
        writeln!(out, "{}", labels.join("\t"))?;
        let rows = self.desk.rows();
        for record in &rows {
            let cells: Vec<String> = Column::ALL
                .iter()
                .map(|column| self.render_cell(*column, &column.cell_text(record)))
                .collect();
            writeln!(out, "{}", cells.join("\t"))?;
        }
        writeln!(out, "{} of {} records", rows.len(), self.desk.store().len())?;
        Ok(())
    }

    fn render_cell(&self, column: Column, text: &str) -> String {
        self.desk
            .table()
            .highlight(column, text)
            .into_iter()
            .map(|segment| {
                if segment.matched {
                    format!("[{}]", segment.text)
                } else {
                    segment.text
                }
            })
            .collect()
    }

    fn add(&mut self, fields: &FieldArgs, out: &mut dyn Write) -> Result<()> {
        let created_at = fields.time.clone().unwrap_or_else(now_timestamp);
        self.desk.open_create_at(created_at)?;
        apply_fields(self.desk.session_mut()?, fields)?;
        self.submit(out)
    }

    fn edit(&mut self, id: RecordId, fields: &FieldArgs, out: &mut dyn Write) -> Result<()> {
        self.desk
            .open_edit(id)
            .with_context(|| format!("edit record {id}"))?;
        let session = self.desk.session_mut()?;
        apply_fields(session, fields)?;
        if session.name_needs_reselect() {
            bail!(
                "category change cleared name for record {id} -- pass --name with one of: {}",
                session.name_options().join(", ")
            );
        }
        self.submit(out)
    }

    fn submit(&mut self, out: &mut dyn Write) -> Result<()> {
        let events = self.desk.submit(self.service)?;
        report(events, out)?;
        if self.desk.session().is_some() {
            bail!("record was not saved");
        }
        Ok(())
    }

    fn delete(&mut self, id: RecordId, confirmed: bool, out: &mut dyn Write) -> Result<()> {
        self.desk
            .request_delete(id)
            .with_context(|| format!("delete record {id}"))?;
        if !confirmed {
            self.desk.cancel_delete()?;
            bail!("deleting record {id} needs confirmation -- rerun with --yes");
        }
        let events = self.desk.confirm_delete(self.service)?;
        let deleted = events.contains(&DeskEvent::RecordDeleted(id));
        report(events, out)?;
        if !deleted {
            bail!("record {id} was not deleted");
        }
        Ok(())
    }
}

/// Prints notices: successes to `out`, problems to stderr.
fn report(events: Vec<DeskEvent>, out: &mut dyn Write) -> Result<()> {
    for event in events {
        if let DeskEvent::Notice(notice) = event {
            match notice.level {
                NoticeLevel::Success => writeln!(out, "{}", notice.message)?,
                NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
                NoticeLevel::Error => eprintln!("error: {}", notice.message),
            }
        }
    }
    Ok(())
}

fn apply_fields(session: &mut FormSession, fields: &FieldArgs) -> Result<()> {
    if let Some(category) = &fields.category {
        session.select_category(category)?;
    }
    if let Some(name) = &fields.name {
        session.select_name(name).map_err(|error| {
            anyhow!(
                "{error}; choose from: {}",
                session.name_options().join(", ")
            )
        })?;
    }
    if let Some(status) = &fields.status {
        session.select_status(status)?;
    }
    if let Some(reason) = &fields.reason {
        session.set_reason(reason.as_str());
    }
    if let Some(time) = &fields.time {
        session.set_created_at(time.as_str());
    }
    Ok(())
}
