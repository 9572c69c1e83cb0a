//! Table Model (席)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Venue identifier
pub type StoreId = i64;

/// Guest name used when a table is seated without one
pub const ANONYMOUS_GUEST: &str = "無記名";

/// Top-left corner on the floor canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Empty,
    Occupied,
}

/// Occupant of a seated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub guest_name: String,
    #[serde(default)]
    pub cast_names: BTreeSet<String>,
    pub entry_time: Option<NaiveDateTime>,
    /// Free text (初回 / 再来 / 指名 ...)
    pub visit_type: Option<String>,
}

/// Table entity: floor layout plus the current occupant.
///
/// `guest_name` is the single source of occupancy; [`Table::status`] is derived
/// from it and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Stable key, unique per store
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    /// Floor page (1-based)
    pub page_number: u32,
    pub visible: bool,

    // -- Occupancy --
    pub guest_name: Option<String>,
    #[serde(default)]
    pub cast_names: BTreeSet<String>,
    pub entry_time: Option<NaiveDateTime>,
    pub visit_type: Option<String>,
}

impl Table {
    /// New visible, empty table at the canvas origin
    pub fn new(name: impl Into<String>, size: Size, page_number: u32) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            position: Position::default(),
            size,
            page_number,
            visible: true,
            guest_name: None,
            cast_names: BTreeSet::new(),
            entry_time: None,
            visit_type: None,
        }
    }

    pub fn status(&self) -> TableStatus {
        if self.guest_name.is_some() {
            TableStatus::Occupied
        } else {
            TableStatus::Empty
        }
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.guest_name.is_some()
    }

    /// Label shown on the floor: display name when set, otherwise the key
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Current occupant, if any
    pub fn occupancy(&self) -> Option<Occupancy> {
        self.guest_name.as_ref().map(|guest| Occupancy {
            guest_name: guest.clone(),
            cast_names: self.cast_names.clone(),
            entry_time: self.entry_time,
            visit_type: self.visit_type.clone(),
        })
    }

    /// Install an occupant, replacing any previous one
    pub fn occupy(&mut self, occupancy: Occupancy) {
        self.guest_name = Some(occupancy.guest_name);
        self.cast_names = occupancy.cast_names;
        self.entry_time = occupancy.entry_time;
        self.visit_type = occupancy.visit_type;
    }

    /// Drop all occupant fields; layout is untouched
    pub fn vacate(&mut self) {
        self.guest_name = None;
        self.cast_names.clear();
        self.entry_time = None;
        self.visit_type = None;
    }
}

/// Create table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCreate {
    pub name: String,
    pub size: Option<Size>,
    pub page_number: Option<u32>,
}

/// Seat / update occupant payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatRequest {
    pub guest_name: Option<String>,
    #[serde(default)]
    pub cast_names: BTreeSet<String>,
    pub visit_type: Option<String>,
    /// Defaults to "now" rounded to five minutes
    pub entry_time: Option<NaiveDateTime>,
}
