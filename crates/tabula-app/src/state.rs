// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FilterSpec, SortSpec};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterAxis {
    #[default]
    Unfiltered,
    Filtered(FilterSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortAxis {
    #[default]
    Unsorted,
    Sorted(SortSpec),
}

/// The two independent axes a grid moves along. Every combination is
/// valid, including filtered and sorted at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridState {
    pub filter: FilterAxis,
    pub sort: SortAxis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCommand {
    ApplyFilter(FilterSpec),
    ClearFilter,
    ApplySort(SortSpec),
    ClearSort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    FilterChanged(Option<FilterSpec>),
    SortChanged(Option<SortSpec>),
}

impl GridState {
    pub fn dispatch(&mut self, command: GridCommand) -> Vec<StateEvent> {
        match command {
            GridCommand::ApplyFilter(spec) if spec.pattern.is_empty() => self.set_filter(None),
            GridCommand::ApplyFilter(spec) => self.set_filter(Some(spec)),
            GridCommand::ClearFilter => self.set_filter(None),
            GridCommand::ApplySort(spec) => self.set_sort(Some(spec)),
            GridCommand::ClearSort => self.set_sort(None),
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.filter, FilterAxis::Filtered(_))
    }

    pub fn is_sorted(&self) -> bool {
        matches!(self.sort, SortAxis::Sorted(_))
    }

    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        match &self.filter {
            FilterAxis::Filtered(spec) => Some(spec),
            FilterAxis::Unfiltered => None,
        }
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        match self.sort {
            SortAxis::Sorted(spec) => Some(spec),
            SortAxis::Unsorted => None,
        }
    }

    fn set_filter(&mut self, spec: Option<FilterSpec>) -> Vec<StateEvent> {
        let next = match spec.clone() {
            Some(spec) => FilterAxis::Filtered(spec),
            None => FilterAxis::Unfiltered,
        };
        if next == self.filter {
            return Vec::new();
        }
        self.filter = next;
        vec![StateEvent::FilterChanged(spec)]
    }

    fn set_sort(&mut self, spec: Option<SortSpec>) -> Vec<StateEvent> {
        let next = match spec {
            Some(spec) => SortAxis::Sorted(spec),
            None => SortAxis::Unsorted,
        };
        if next == self.sort {
            return Vec::new();
        }
        self.sort = next;
        vec![StateEvent::SortChanged(spec)]
    }
}
