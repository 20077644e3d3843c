//! Global resource-booking ledger: a term-scoped record of which
//! `(resource, day, period)` slots are taken, shared by independent
//! faculty-scoped planning runs so they don't double-book rooms or
//! lecturers.

use crate::error::{BookingKeyDisplay, PlannerError};
use crate::types::{Assignment, FacultyId, Weekday};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Room,
    Lecturer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingKey {
    pub resource_kind: ResourceKind,
    pub resource_id: String,
    pub term: u8,
    pub academic_year: String,
    pub day: Weekday,
    pub period: u8,
}

impl std::fmt::Display for BookingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}:{}:T{}:{}:{}:P{}",
            self.resource_kind, self.resource_id, self.term, self.academic_year, self.day, self.period
        )
    }
}

#[derive(Debug, Clone)]
pub struct BookingEntry {
    pub key: BookingKey,
    pub faculty: FacultyId,
    pub generation_id: String,
    pub booked_at: DateTime<Utc>,
}

fn assignment_keys(
    assignment: &Assignment,
    term: u8,
    academic_year: &str,
) -> (BookingKey, BookingKey) {
    let room_key = BookingKey {
        resource_kind: ResourceKind::Room,
        resource_id: assignment.room_number.clone(),
        term,
        academic_year: academic_year.to_string(),
        day: assignment.time_slot.day,
        period: assignment.time_slot.period,
    };
    let lecturer_key = BookingKey {
        resource_kind: ResourceKind::Lecturer,
        resource_id: assignment.lecturer_id.0.clone(),
        term,
        academic_year: academic_year.to_string(),
        day: assignment.time_slot.day,
        period: assignment.time_slot.period,
    };
    (room_key, lecturer_key)
}

/// A booking record scoped to one `(term, academic_year)`. The entry map
/// itself doubles as the per-run in-memory cache the spec calls for:
/// there is no separate cache to go stale, since every read and write
/// goes through the same map.
pub struct BookingLedger {
    term: u8,
    academic_year: String,
    entries: HashMap<BookingKey, BookingEntry>,
    by_faculty: HashMap<String, HashSet<BookingKey>>,
}

impl BookingLedger {
    pub fn new(term: u8, academic_year: impl Into<String>) -> Self {
        Self {
            term,
            academic_year: academic_year.into(),
            entries: HashMap::new(),
            by_faculty: HashMap::new(),
        }
    }

    pub fn term(&self) -> u8 {
        self.term
    }

    pub fn academic_year(&self) -> &str {
        &self.academic_year
    }

    pub fn is_available(&self, kind: ResourceKind, resource_id: &str, day: Weekday, period: u8) -> bool {
        let key = BookingKey {
            resource_kind: kind,
            resource_id: resource_id.to_string(),
            term: self.term,
            academic_year: self.academic_year.clone(),
            day,
            period,
        };
        !self.entries.contains_key(&key)
    }

    fn insert_entry(&mut self, key: BookingKey, faculty: &FacultyId, generation_id: &str) {
        self.by_faculty
            .entry(faculty.0.clone())
            .or_default()
            .insert(key.clone());
        self.entries.insert(
            key.clone(),
            BookingEntry {
                key,
                faculty: faculty.clone(),
                generation_id: generation_id.to_string(),
                booked_at: Utc::now(),
            },
        );
    }

    /// Atomically inserts the room and lecturer booking for one
    /// assignment. Rejects (no partial insert) if either already exists.
    pub fn reserve(
        &mut self,
        assignment: &Assignment,
        faculty: &FacultyId,
        generation_id: &str,
    ) -> Result<(), PlannerError> {
        let (room_key, lecturer_key) = assignment_keys(assignment, self.term, &self.academic_year);
        if self.entries.contains_key(&room_key) {
            return Err(PlannerError::ConcurrentModification {
                key: BookingKeyDisplay(room_key.to_string()),
            });
        }
        if self.entries.contains_key(&lecturer_key) {
            return Err(PlannerError::ConcurrentModification {
                key: BookingKeyDisplay(lecturer_key.to_string()),
            });
        }
        self.insert_entry(room_key, faculty, generation_id);
        self.insert_entry(lecturer_key, faculty, generation_id);
        Ok(())
    }

    /// Inserts all assignments' bookings in one batch: either every entry
    /// lands, or (on any conflict) none do.
    pub fn commit_many(
        &mut self,
        assignments: &[Assignment],
        faculty: &FacultyId,
        generation_id: &str,
    ) -> Result<(), PlannerError> {
        let mut keys = Vec::with_capacity(assignments.len() * 2);
        for assignment in assignments {
            let (room_key, lecturer_key) = assignment_keys(assignment, self.term, &self.academic_year);
            if self.entries.contains_key(&room_key) {
                return Err(PlannerError::ConcurrentModification {
                    key: BookingKeyDisplay(room_key.to_string()),
                });
            }
            if self.entries.contains_key(&lecturer_key) {
                return Err(PlannerError::ConcurrentModification {
                    key: BookingKeyDisplay(lecturer_key.to_string()),
                });
            }
            keys.push(room_key);
            keys.push(lecturer_key);
        }

        for key in keys {
            self.insert_entry(key, faculty, generation_id);
        }
        Ok(())
    }

    /// Deletes all of `faculty`'s bookings for this `(term, year)`.
    pub fn discard_faculty(&mut self, faculty: &FacultyId) -> usize {
        let Some(keys) = self.by_faculty.remove(&faculty.0) else {
            return 0;
        };
        let count = keys.len();
        for key in keys {
            self.entries.remove(&key);
        }
        count
    }

    /// All bookings belonging to faculties other than `faculty`, for a CSP
    /// run to pre-mark as unavailable before search begins.
    pub fn other_faculty_bookings(&self, faculty: &FacultyId) -> impl Iterator<Item = &BookingEntry> {
        self.entries
            .values()
            .filter(move |entry| entry.faculty.0 != faculty.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
