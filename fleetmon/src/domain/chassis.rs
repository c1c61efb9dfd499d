//! Chassis entity and the full-fleet grid committed by the collector.

use super::{Board, BoardStatus, BOARDS_PER_CHASSIS, CHASSIS_COUNT};

/// One physical 14-slot enclosure.
///
/// Chassis number 0 means "uninitialised": fleet-level counters and lookups
/// skip such entries. The topology factory assigns numbers 1..=9 at startup
/// and every slot is populated before the first reader runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chassis {
    number: u8,
    name: String,
    boards: [Board; BOARDS_PER_CHASSIS],
}

impl Chassis {
    pub fn new(number: u8, name: impl Into<String>, boards: [Board; BOARDS_PER_CHASSIS]) -> Self {
        Self {
            number,
            name: name.into(),
            boards,
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.number != 0
    }

    pub fn boards(&self) -> &[Board; BOARDS_PER_CHASSIS] {
        &self.boards
    }

    pub fn boards_mut(&mut self) -> &mut [Board; BOARDS_PER_CHASSIS] {
        &mut self.boards
    }

    /// Board in a 1-based slot, if the slot number is valid.
    pub fn board_by_slot(&self, slot: u8) -> Option<&Board> {
        if slot == 0 {
            return None;
        }
        self.boards.get(slot as usize - 1)
    }

    pub fn board_by_address(&self, address: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.address() == address)
    }

    pub fn count_normal_boards(&self) -> usize {
        self.boards
            .iter()
            .filter(|b| b.status() == BoardStatus::Normal)
            .count()
    }

    pub fn count_abnormal_boards(&self) -> usize {
        self.boards.iter().filter(|b| b.is_abnormal()).count()
    }

    pub fn count_offline_boards(&self) -> usize {
        self.boards
            .iter()
            .filter(|b| b.status() == BoardStatus::Offline)
            .count()
    }

    /// Total tasks across the compute boards of this chassis.
    pub fn count_tasks(&self) -> usize {
        self.boards
            .iter()
            .filter(|b| b.can_run_tasks())
            .map(|b| b.task_count())
            .sum()
    }
}

/// The point-in-time view of all nine chassis.
///
/// This is the unit the chassis store publishes and the collector commits:
/// readers always observe a whole grid from a single commit, never a mix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChassisGrid {
    chassis: [Chassis; CHASSIS_COUNT],
}

impl ChassisGrid {
    pub fn new(chassis: [Chassis; CHASSIS_COUNT]) -> Self {
        Self { chassis }
    }

    /// All slots, including any uninitialised ones.
    pub fn chassis(&self) -> &[Chassis; CHASSIS_COUNT] {
        &self.chassis
    }

    pub fn chassis_mut(&mut self) -> &mut [Chassis; CHASSIS_COUNT] {
        &mut self.chassis
    }

    /// Initialised chassis only, in chassis-number order.
    pub fn iter_initialized(&self) -> impl Iterator<Item = &Chassis> {
        self.chassis.iter().filter(|c| c.is_initialized())
    }

    /// Chassis by 1-based number; skips uninitialised entries.
    pub fn by_number(&self, number: u8) -> Option<&Chassis> {
        if number == 0 || number as usize > CHASSIS_COUNT {
            return None;
        }
        let chassis = &self.chassis[number as usize - 1];
        chassis.is_initialized().then_some(chassis)
    }

    /// The chassis hosting the board with the given address.
    pub fn by_board_address(&self, address: &str) -> Option<&Chassis> {
        self.iter_initialized()
            .find(|c| c.board_by_address(address).is_some())
    }

    pub fn count_total_boards(&self) -> usize {
        self.iter_initialized().count() * BOARDS_PER_CHASSIS
    }

    pub fn count_normal_boards(&self) -> usize {
        self.iter_initialized().map(|c| c.count_normal_boards()).sum()
    }

    pub fn count_abnormal_boards(&self) -> usize {
        self.iter_initialized()
            .map(|c| c.count_abnormal_boards())
            .sum()
    }

    pub fn count_offline_boards(&self) -> usize {
        self.iter_initialized()
            .map(|c| c.count_offline_boards())
            .sum()
    }

    pub fn count_tasks(&self) -> usize {
        self.iter_initialized().map(|c| c.count_tasks()).sum()
    }
}
