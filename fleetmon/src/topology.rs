//! Topology factory: materialises the fixed chassis/board inventory.
//!
//! The installation shape is fixed at nine chassis of fourteen slots. The
//! factory runs once at startup, assigns every board its address and
//! slot-derived kind, and hands the grid to the chassis store. Nothing is
//! ever created or destroyed afterwards; the collector only mutates status
//! and task lists.

use crate::config::HardwareSettings;
use crate::domain::{Board, Chassis, ChassisGrid, BOARDS_PER_CHASSIS, CHASSIS_COUNT};

/// Build the full chassis grid from the hardware settings.
///
/// Chassis are named `chassis-01` .. `chassis-09`. Board addresses follow
/// `ip_base_pattern` with `%d` replaced by the chassis number, then
/// `.{ip_offset + slot}` appended: the default pattern `192.168.%d` with
/// offset 100 yields `192.168.3.104` for chassis 3, slot 4.
///
/// If the settings ask for fewer chassis than the grid holds, the remaining
/// entries stay uninitialised (chassis number 0) and are skipped by every
/// reader.
pub fn build_topology(settings: &HardwareSettings) -> ChassisGrid {
    let mut grid = ChassisGrid::default();
    let count = (settings.chassis_count as usize).min(CHASSIS_COUNT);

    for index in 0..count {
        let number = index as u8 + 1;
        let base = settings
            .ip_base_pattern
            .replacen("%d", &number.to_string(), 1);

        let boards: [Board; BOARDS_PER_CHASSIS] = std::array::from_fn(|slot_index| {
            let slot = slot_index as u8 + 1;
            let address = format!("{base}.{}", settings.ip_offset + slot as u32);
            Board::new(address, slot)
        });

        grid.chassis_mut()[index] = Chassis::new(number, format!("chassis-{number:02}"), boards);
    }

    grid
}
