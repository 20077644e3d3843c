use super::ids::{CourseId, LecturerId, ProgramId, RoomId, VariableId};
use super::time_slot::TimeSlot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One CSP unknown: a session of `course` for `program` that needs a
/// `(day, period, lecturer, room)` binding. Produced `sessions_required`
/// times per `(program, course)` pair.
#[derive(Debug, Clone)]
pub struct SchedulingVariable {
    pub id: VariableId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub session_number: u32,
    pub term: u8,
    /// Pruned domain of candidate time slots, keyed by `(day, period)`.
    pub time_slots: Vec<TimeSlot>,
    /// Pruned domain of qualified, available lecturers.
    pub lecturers: Vec<LecturerId>,
    /// Pruned domain of type- and capacity-suitable rooms.
    pub rooms: Vec<RoomId>,
    /// Per-lecturer surviving time slots, for part-time availability.
    pub lecturer_time_slots: HashMap<LecturerId, Vec<TimeSlot>>,
    pub assignment: Option<Assignment>,
}

impl SchedulingVariable {
    pub fn domain_size(&self) -> usize {
        let lecturer_slot_total: usize = self
            .lecturers
            .iter()
            .map(|l| {
                self.lecturer_time_slots
                    .get(l)
                    .map(|s| s.len())
                    .unwrap_or(self.time_slots.len())
            })
            .sum();
        self.time_slots.len() * self.lecturers.len().max(1) * self.rooms.len().max(1)
            + lecturer_slot_total
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment.is_some()
    }
}

/// A concrete binding of one session to a lecturer, a room, and a time slot.
/// Immutable once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub variable_id: VariableId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub lecturer_id: LecturerId,
    pub room_number: String,
    pub time_slot: TimeSlot,
    pub term: u8,
    pub session_number: u32,
}
