// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::{Column, FilterEngine, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Column,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSegment {
    pub text: String,
    pub matched: bool,
}

/// Filter and sort state of the record table. Rows are always projected from
/// the store; the view never holds records itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    filters: FilterEngine,
    sorts: Vec<SortSpec>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &FilterEngine {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterEngine {
        &mut self.filters
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }

    /// Steps `column` through ascending, descending, and unsorted.
    pub fn cycle_sort(&mut self, column: Column) -> Option<SortDirection> {
        if let Some(index) = self.sorts.iter().position(|sort| sort.column == column) {
            match self.sorts[index].direction {
                SortDirection::Asc => {
                    self.sorts[index].direction = SortDirection::Desc;
                    Some(SortDirection::Desc)
                }
                SortDirection::Desc => {
                    self.sorts.remove(index);
                    None
                }
            }
        } else {
            self.sorts.push(SortSpec {
                column,
                direction: SortDirection::Asc,
            });
            Some(SortDirection::Asc)
        }
    }

    pub fn set_sort(&mut self, column: Column, direction: SortDirection) {
        self.sorts.retain(|sort| sort.column != column);
        self.sorts.push(SortSpec { column, direction });
    }

    pub fn project<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut rows: Vec<&Record> = records
            .iter()
            .filter(|record| self.filters.evaluate(record))
            .collect();

        if !self.sorts.is_empty() {
            rows.sort_by(|left, right| {
                for sort in &self.sorts {
                    let order = match compare_column(sort.column, left, right) {
                        // Unparseable timestamps sink regardless of direction.
                        Some(order) => match sort.direction {
                            SortDirection::Asc => order,
                            SortDirection::Desc => order.reverse(),
                        },
                        None => missing_last(sort.column, left, right),
                    };
                    if order != Ordering::Equal {
                        return order;
                    }
                }
                right.id.cmp(&left.id)
            });
        }

        rows
    }

    /// Splits a cell into matched and plain runs when `column` holds the
    /// highlighted search term; otherwise returns the text as one plain run.
    pub fn highlight(&self, column: Column, text: &str) -> Vec<HighlightSegment> {
        match self.filters.highlight() {
            Some(highlight) if highlight.column == column => {
                split_matches(text, &highlight.term)
            }
            _ => vec![HighlightSegment {
                text: text.to_owned(),
                matched: false,
            }],
        }
    }
}

fn compare_column(column: Column, left: &Record, right: &Record) -> Option<Ordering> {
    match column {
        Column::Id => Some(left.id.cmp(&right.id)),
        Column::Category => Some(text_order(left.category.as_str(), right.category.as_str())),
        Column::Name => Some(text_order(&left.name, &right.name)),
        Column::Status => Some(text_order(left.status.as_str(), right.status.as_str())),
        Column::Reason => Some(text_order(&left.reason, &right.reason)),
        Column::CreatedAt => match (left.created_at_time(), right.created_at_time()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => None,
        },
    }
}

fn text_order(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

fn missing_last(column: Column, left: &Record, right: &Record) -> Ordering {
    if column != Column::CreatedAt {
        return Ordering::Equal;
    }
    match (left.created_at_time(), right.created_at_time()) {
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn split_matches(text: &str, term: &str) -> Vec<HighlightSegment> {
    let haystack: Vec<char> = text.chars().collect();
    let needle: Vec<char> = term.chars().collect();
    let mut segments = Vec::new();
    if needle.is_empty() {
        segments.push(HighlightSegment {
            text: text.to_owned(),
            matched: false,
        });
        return segments;
    }

    let mut plain = String::new();
    let mut index = 0;
    while index < haystack.len() {
        let end = index + needle.len();
        if end <= haystack.len() && chars_eq_ignore_case(&haystack[index..end], &needle) {
            if !plain.is_empty() {
                segments.push(HighlightSegment {
                    text: std::mem::take(&mut plain),
                    matched: false,
                });
            }
            segments.push(HighlightSegment {
                text: haystack[index..end].iter().collect(),
                matched: true,
            });
            index = end;
            continue;
        }
        plain.push(haystack[index]);
        index += 1;
    }
    if !plain.is_empty() || segments.is_empty() {
        segments.push(HighlightSegment {
            text: plain,
            matched: false,
        });
    }
    segments
}

fn chars_eq_ignore_case(left: &[char], right: &[char]) -> bool {
    left.iter()
        .zip(right)
        .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
}
