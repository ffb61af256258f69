//! Look-ahead velocity planning.
//!
//! Junction speeds are capped when a Block is queued. After every enqueue the
//! window of Blocks not yet executing is replanned: a reverse pass makes sure
//! every Block can still brake to a stop at the end of the queue, a forward
//! pass limits each entry to what the previous Block can reach, and finally
//! every trapezoid is recomputed.

use libm::sqrtf;

use super::axis::NUM_AXES;
use super::block::Block;

/// What the previously queued Block looked like at cruise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionRef {
    /// Signed per-axis cruise velocity (mm/s).
    pub velocity: [f32; NUM_AXES],
    /// Cruise speed (mm/s).
    pub speed: f32,
}

impl From<&Block> for JunctionRef {
    fn from(block: &Block) -> Self {
        Self {
            velocity: block.nominal_velocity,
            speed: block.nominal_speed,
        }
    }
}

/// How the first Block of a planning window begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Start {
    /// From rest.
    Standstill,
    /// Behind an executing Block that will leave at this speed.
    Pinned(f32),
}

/// Largest entry speed for `block` following `prev` within `max_jerk`.
///
/// The full velocity vector change across the junction is held to
/// `max_jerk`. Any speed up to the Block's safe speed is always allowed.
pub fn max_junction_speed(prev: Option<&JunctionRef>, block: &Block, max_jerk: f32) -> f32 {
    let Some(prev) = prev else {
        return block.safe_speed;
    };

    let jerk = sqrtf(
        block
            .nominal_velocity
            .iter()
            .zip(prev.velocity.iter())
            .map(|(cur, prev)| (cur - prev) * (cur - prev))
            .sum(),
    );

    let mut speed = block.nominal_speed.min(prev.speed);
    if jerk > max_jerk {
        speed *= max_jerk / jerk;
    }

    speed.max(block.safe_speed.min(prev.speed))
}

/// Speed reachable after `distance` mm from `speed` at `accel`.
#[inline]
pub fn max_allowable_speed(accel: f32, speed: f32, distance: f32) -> f32 {
    sqrtf(speed * speed + 2.0 * accel * distance)
}

/// Lowest speed a Block can brake down to from its entry speed.
#[inline]
fn braking_floor(block: &Block) -> f32 {
    let shed = 2.0 * block.acceleration * block.millimeters;
    sqrtf((block.entry_speed * block.entry_speed - shed).max(0.0))
}

/// Raise exits that a pinned entry cannot brake down to.
///
/// The raised exit carries into the next Block's entry, capped at its nominal
/// speed. Where the cap bites, the junction takes a speed step below the
/// exit instead of the Block overrunning its length.
fn carry_overspeed(blocks: &mut [Block]) {
    for i in 0..blocks.len() {
        let block = &blocks[i];
        let brake = max_allowable_speed(block.acceleration, block.exit_speed, block.millimeters);
        if block.entry_speed <= brake * (1.0 + 1e-4) {
            continue;
        }

        let floor = braking_floor(block);
        blocks[i].exit_speed = floor;
        if let Some(next) = blocks.get_mut(i + 1) {
            next.entry_speed = next.entry_speed.max(floor.min(next.nominal_speed));
        }
    }
}

/// Plan entry, exit and trapezoid of a contiguous run of Blocks.
///
/// The last Block is planned to end at its safe speed unless a pinned entry
/// leaves it too fast to get there. Deterministic: planning an already planned
/// window leaves it unchanged.
pub fn plan_window(blocks: &mut [Block], start: Start, min_step_rate: u32) {
    let Some(last) = blocks.len().checked_sub(1) else {
        return;
    };

    // Reverse pass
    let mut exit = blocks[last].safe_speed;
    for block in blocks.iter_mut().rev() {
        block.entry_speed = block
            .max_entry_speed
            .min(max_allowable_speed(block.acceleration, exit, block.millimeters));
        exit = block.entry_speed;
    }

    let first = &mut blocks[0];
    first.entry_speed = match start {
        Start::Standstill => first.entry_speed.min(first.safe_speed),
        Start::Pinned(speed) => speed,
    }
    .min(first.nominal_speed);

    // Forward pass
    for i in 1..blocks.len() {
        let prev = &blocks[i - 1];
        let reachable = max_allowable_speed(prev.acceleration, prev.entry_speed, prev.millimeters);
        let block = &mut blocks[i];
        block.entry_speed = block.entry_speed.min(reachable);
    }

    for i in 0..last {
        blocks[i].exit_speed = blocks[i + 1].entry_speed;
    }
    let tail = &mut blocks[last];
    tail.exit_speed = tail.safe_speed.min(max_allowable_speed(
        tail.acceleration,
        tail.entry_speed,
        tail.millimeters,
    ));

    if let Start::Pinned(_) = start {
        carry_overspeed(blocks);
    }

    for block in blocks.iter_mut() {
        block.recalculate_trapezoid(min_step_rate);
    }
}
