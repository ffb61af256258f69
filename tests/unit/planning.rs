//! Unit tests for translation and look-ahead planning.

use stepper_planner::motion::planner::{plan_window, Start};
use stepper_planner::motion::{RateTable, Translator};
use stepper_planner::{Block, MachineConfig, MmPerSec, MoveRequest, TimerConfig};

/// Translate and commit a chain of requests the way the planner does.
fn translate_all(config: &MachineConfig, requests: &[MoveRequest]) -> Vec<Block> {
    let mut translator = Translator::new();
    let mut blocks = Vec::new();
    for request in requests {
        if let Some(translation) = translator.translate(request, config).expect("valid request") {
            translator.commit(&translation);
            blocks.push(translation.block);
        }
    }
    blocks
}

/// Test that a right-angle corner is held to the jerk limit.
#[test]
fn test_corner_junction_speed() {
    let config = MachineConfig::default();
    let blocks = translate_all(
        &config,
        &[
            MoveRequest::absolute().x(10.0),
            MoveRequest::absolute().y(10.0),
        ],
    );

    // 25 mm/s on both legs: |(0, 25) - (25, 0)| = 35.36, scaled to 20
    assert!((blocks[1].max_entry_speed - 14.142).abs() < 1e-2);
    assert_eq!(blocks[0].max_entry_speed, blocks[0].safe_speed);
}

/// Test the planned speeds of a square path chain end to end.
#[test]
fn test_square_path_plan() {
    let config = MachineConfig::default();
    let feed = MmPerSec(100.0);
    let mut blocks = translate_all(
        &config,
        &[
            MoveRequest::absolute().x(20.0).feedrate(feed),
            MoveRequest::absolute().y(20.0).feedrate(feed),
            MoveRequest::absolute().x(0.0).feedrate(feed),
            MoveRequest::absolute().y(0.0).feedrate(feed),
        ],
    );
    plan_window(&mut blocks, Start::Standstill, config.timer.min_step_rate);

    assert_eq!(blocks[0].entry_speed, blocks[0].safe_speed);
    assert_eq!(blocks[3].exit_speed, blocks[3].safe_speed);
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].exit_speed, pair[1].entry_speed);
        // |(0, 100) - (100, 0)| = 141.4, so corners run at 100 * 20 / 141.4
        assert!((pair[1].entry_speed - 14.142).abs() < 1e-2);
    }
    for block in &blocks {
        assert!(block.initial_rate <= block.nominal_rate);
        assert!(block.final_rate <= block.nominal_rate);
        assert!(block.accelerate_until <= block.decelerate_after);
        assert!(block.decelerate_after <= block.step_event_count);
        assert!(block.decelerate_after - block.accelerate_until > 0);
    }
}

/// Test that a short move between fast neighbours still brakes in time.
#[test]
fn test_short_block_limits_neighbours() {
    let config = MachineConfig::default();
    let feed = MmPerSec(200.0);
    let mut blocks = translate_all(
        &config,
        &[
            MoveRequest::absolute().x(50.0).feedrate(feed),
            MoveRequest::absolute().x(50.1).feedrate(feed),
        ],
    );
    plan_window(&mut blocks, Start::Standstill, config.timer.min_step_rate);

    // 0.1 mm at 3000 mm/s² brakes from at most sqrt(10² + 2 * 3000 * 0.1)
    let reachable = (10.0f32 * 10.0 + 2.0 * 3000.0 * 0.1).sqrt();
    assert!(blocks[1].entry_speed <= reachable + 1e-3);
    assert_eq!(blocks[0].exit_speed, blocks[1].entry_speed);
}

/// Test that the pinned start is honoured exactly.
#[test]
fn test_pinned_start() {
    let config = MachineConfig::default();
    let mut blocks = translate_all(
        &config,
        &[
            MoveRequest::absolute().x(10.0).feedrate(MmPerSec(50.0)),
            MoveRequest::absolute().x(20.0).feedrate(MmPerSec(50.0)),
        ],
    );
    plan_window(&mut blocks[1..], Start::Pinned(25.0), config.timer.min_step_rate);

    assert_eq!(blocks[1].entry_speed, 25.0);
    assert_eq!(blocks[1].initial_rate, 2000);
}

/// Test the rate table against exact division.
#[test]
fn test_rate_table_accuracy() {
    let config = TimerConfig::default();
    let table = RateTable::new(&config);

    for rate in [120, 500, 1_000, 2_047, 2_048, 5_000, 20_000, 40_000] {
        let exact = config.frequency_hz as f32 / rate as f32;
        let period = table.period(rate) as f32;
        assert!(
            (period - exact).abs() / exact < 0.01,
            "rate {rate}: period {period}, exact {exact}"
        );
    }

    // Below the floor every rate maps to the floor's period
    assert_eq!(table.period(1), table.period(120));
    assert_eq!(table.period(u32::MAX), table.period(65_535));
}
