// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-column search and multi-select filters over [`Record`]s.
//!
//! The item-name column has no options of its own: they are the catalog
//! union of whatever the category filter currently accepts.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{Category, LookupError, Record, Status, catalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Category,
    Name,
    Status,
    Reason,
    CreatedAt,
}

impl Column {
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::Category,
        Self::Name,
        Self::Status,
        Self::Reason,
        Self::CreatedAt,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Category => "type",
            Self::Name => "name",
            Self::Status => "status",
            Self::Reason => "reason",
            Self::CreatedAt => "createTime",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "type" | "category" => Some(Self::Category),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "reason" => Some(Self::Reason),
            "createtime" | "created" | "time" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub const fn is_discrete(self) -> bool {
        matches!(self, Self::Category | Self::Name | Self::Status)
    }

    pub fn cell_text(self, record: &Record) -> String {
        match self {
            Self::Id => record.id.to_string(),
            Self::Category => record.category.as_str().to_owned(),
            Self::Name => record.name.clone(),
            Self::Status => record.status.as_str().to_owned(),
            Self::Reason => record.reason.clone(),
            Self::CreatedAt => record.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    Search(String),
    Values(BTreeSet<String>),
}

impl ColumnFilter {
    fn matches(&self, cell: &str) -> bool {
        match self {
            Self::Search(term) => contains_ignore_case(cell, term),
            Self::Values(accepted) => accepted.contains(cell),
        }
    }
}

/// The single column whose search term is rendered highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHighlight {
    pub column: Column,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterEngine {
    filters: BTreeMap<Column, ColumnFilter>,
    highlight: Option<SearchHighlight>,
    name_options: Vec<&'static str>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self, column: Column) -> Option<&ColumnFilter> {
        self.filters.get(&column)
    }

    pub fn is_active(&self, column: Column) -> bool {
        self.filters.contains_key(&column)
    }

    pub fn highlight(&self) -> Option<&SearchHighlight> {
        self.highlight.as_ref()
    }

    pub fn name_options(&self) -> &[&'static str] {
        &self.name_options
    }

    /// Selectable values for a discrete column; empty for search-only columns.
    pub fn discrete_options(&self, column: Column) -> Vec<&'static str> {
        match column {
            Column::Category => Category::ALL.iter().map(|c| c.as_str()).collect(),
            Column::Status => Status::ALL.iter().map(|s| s.as_str()).collect(),
            Column::Name => self.name_options.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_search_term(&mut self, column: Column, term: &str) {
        if term.trim().is_empty() {
            self.clear_filter(column);
            return;
        }

        if column == Column::Category && self.is_active(Column::Category) {
            self.on_category_filter_changed([]);
        }
        self.filters
            .insert(column, ColumnFilter::Search(term.to_owned()));
        self.highlight = Some(SearchHighlight {
            column,
            term: term.to_owned(),
        });
        debug!(column = column.label(), term, "search term set");
    }

    pub fn clear_filter(&mut self, column: Column) {
        self.filters.remove(&column);
        if self
            .highlight
            .as_ref()
            .is_some_and(|highlight| highlight.column == column)
        {
            self.highlight = None;
        }
        if column == Column::Category {
            self.on_category_filter_changed([]);
        }
    }

    /// Replaces the accepted values of a discrete column. An empty set turns
    /// the column's filter off.
    pub fn set_discrete_filter<I, S>(
        &mut self,
        column: Column,
        values: I,
    ) -> Result<(), LookupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !column.is_discrete() {
            return Err(LookupError::NotDiscrete(column.label()));
        }

        let mut accepted = BTreeSet::new();
        let mut categories = Vec::new();
        for value in values {
            let value = value.as_ref().trim();
            match column {
                Column::Category => {
                    let category = Category::parse(value)
                        .ok_or_else(|| LookupError::UnknownCategory(value.to_owned()))?;
                    categories.push(category);
                }
                Column::Status if Status::parse(value).is_none() => {
                    return Err(unknown_option(column, value));
                }
                Column::Name if !self.name_options.iter().any(|option| *option == value) => {
                    return Err(unknown_option(column, value));
                }
                _ => {}
            }
            accepted.insert(value.to_owned());
        }

        if self
            .highlight
            .as_ref()
            .is_some_and(|highlight| highlight.column == column)
        {
            self.highlight = None;
        }
        if accepted.is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, ColumnFilter::Values(accepted));
        }
        if column == Column::Category {
            self.on_category_filter_changed(categories);
        }
        debug!(column = column.label(), "discrete filter set");
        Ok(())
    }

    /// Recomputes the item-name options from the accepted categories and drops
    /// accepted names that are no longer offered.
    pub fn on_category_filter_changed<I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = Category>,
    {
        self.name_options = catalog::union(categories);

        let Some(ColumnFilter::Values(accepted)) = self.filters.get_mut(&Column::Name) else {
            return;
        };
        let options = &self.name_options;
        accepted.retain(|name| options.iter().any(|option| *option == name.as_str()));
        if accepted.is_empty() {
            self.filters.remove(&Column::Name);
        }
    }

    pub fn evaluate(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(column, filter)| filter.matches(&column.cell_text(record)))
    }
}

fn unknown_option(column: Column, value: &str) -> LookupError {
    LookupError::UnknownOption {
        field: column.label(),
        value: value.to_owned(),
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
