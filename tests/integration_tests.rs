//! Integration tests for stepper-planner.
//!
//! These tests drive the complete path from configuration through planning
//! to simulated step generation.

use stepper_planner::hal::sim::{run_until_idle, SimIo, VirtualTimer};
use stepper_planner::hal::StepTimer;
use stepper_planner::motion::LimitSide;
use stepper_planner::{
    parse_config, AbortReport, Axis, BufferError, ConfigError, Error, MachineConfig, MmPerSec,
    MotionCore, MotionPhase, MoveRequest, Submission, TickOutcome,
};

// =============================================================================
// Test configuration data
// =============================================================================

const MACHINE_CONFIG: &str = r#"
[planner]
max_jerk_mm_per_sec = 20.0

[timer]
frequency_hz = 2000000
min_step_rate = 120

[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 3000.0
[axes.x.endstops]
min = true
max = true

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 95.0
max_feedrate_mm_per_sec = 45.0
max_acceleration_mm_per_sec2 = 3000.0
"#;

fn feed(mm_per_min: f32) -> Option<MmPerSec> {
    Some(MmPerSec::from_mm_per_min(mm_per_min))
}

fn to_x(mm: f32, mm_per_min: f32) -> MoveRequest {
    MoveRequest {
        feedrate: feed(mm_per_min),
        ..MoveRequest::absolute().x(mm)
    }
}

// =============================================================================
// End-to-end planning and execution
// =============================================================================

#[test]
fn collinear_moves_blend_and_land_exactly() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<16> = MotionCore::new();
    let config = parse_config(MACHINE_CONFIG).expect("config should parse");
    let (mut planner, mut stepper) = core.split(config, SimIo::new(), &timer).unwrap();

    // A(0) → B(10) → C(30) → D(35) along X
    assert_eq!(planner.submit(&to_x(10.0, 3000.0)), Ok(Submission::Queued));
    assert_eq!(planner.submit(&to_x(30.0, 6000.0)), Ok(Submission::Queued));
    assert_eq!(planner.submit(&to_x(35.0, 1500.0)), Ok(Submission::Queued));
    assert!(timer.is_armed());

    let blocks = planner.snapshot();
    assert_eq!(blocks.len(), 3);

    // Start and end at the safe speed
    assert!((blocks[0].entry_speed - 10.0).abs() < 1e-4);
    assert!((blocks[2].exit_speed - 10.0).abs() < 1e-4);

    // 50 → 100 mm/s is a 50 mm/s jump, scaled to the 20 mm/s jerk limit
    assert!((blocks[1].entry_speed - 20.0).abs() < 1e-3);
    // 100 → 25 mm/s falls back to the safe speed
    assert!((blocks[2].entry_speed - 10.0).abs() < 1e-3);

    for pair in blocks.windows(2) {
        assert_eq!(pair[0].exit_speed, pair[1].entry_speed);
    }
    for block in &blocks {
        assert!(block.entry_speed <= block.nominal_speed);
        assert!(block.accelerate_until <= block.decelerate_after);
        assert!(block.decelerate_after <= block.step_event_count);
    }

    let mut max_rate = 0;
    let mut ticks = 0;
    while timer.fire() {
        if stepper.tick() == TickOutcome::Idle {
            break;
        }
        max_rate = max_rate.max(stepper.current_rate());
        ticks += 1;
    }

    assert_eq!(ticks, 2800);
    assert!(max_rate <= 8000);
    assert_eq!(planner.position_steps(), [2800, 0, 0, 0]);
    assert!((planner.position()[0].value() - 35.0).abs() < 1e-4);
    assert_eq!(stepper.io().position, [2800, 0, 0, 0]);
    assert!(!planner.is_moving());
    assert!(!stepper.is_executing());
    assert_eq!(stepper.phase(), MotionPhase::Complete);
}

#[test]
fn diagonal_move_steps_every_axis() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let (mut planner, mut stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    let request = MoveRequest::absolute().x(10.0).y(-5.0).z(1.0).e(2.0);
    planner.submit(&request).unwrap();
    run_until_idle(&mut stepper, &timer, 100_000);

    assert_eq!(planner.position_steps(), [800, -400, 400, 190]);
    assert_eq!(stepper.io().position, [800, -400, 400, 190]);
    assert_eq!(stepper.io().enable_high, [Some(false); 4]);
}

#[test]
fn relative_moves_accumulate_from_planned_position() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let (mut planner, mut stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    for _ in 0..4 {
        planner.submit(&MoveRequest::relative().x(2.5)).unwrap();
    }
    assert!((planner.planned_position()[0].value() - 10.0).abs() < 1e-4);
    assert_eq!(planner.position_steps(), [0; 4]);

    run_until_idle(&mut stepper, &timer, 100_000);
    assert_eq!(planner.position_steps()[0], 800);
}

// =============================================================================
// Endstop abort and replan
// =============================================================================

#[test]
fn endstop_truncates_block_and_replans_queue() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let config = parse_config(MACHINE_CONFIG).unwrap();
    let io = SimIo::new().with_limit(Axis::X, LimitSide::Max, 400, true);
    let (mut planner, mut stepper) = core.split(config, io, &timer).unwrap();

    // 1000 X steps, the switch trips after 400
    planner.submit(&MoveRequest::absolute().x(12.5)).unwrap();
    planner.submit(&MoveRequest::absolute().y(10.0)).unwrap();
    planner.submit(&MoveRequest::absolute().x(2.5)).unwrap();
    assert_eq!(planner.snapshot()[0].step_event_count, 1000);

    run_until_idle(&mut stepper, &timer, 10_000);

    assert_eq!(planner.position_steps(), [400, 0, 0, 0]);
    assert_eq!(stepper.io().pulses[0], 400);
    assert!(!timer.is_armed());
    // Later Blocks wait for the main loop
    assert_eq!(planner.queued(), 2);
    assert!(!planner.is_moving());

    let report = planner.poll().expect("abort should be reported");
    assert_eq!(
        report,
        AbortReport {
            axes: [true, false, false, false],
            position: [400, 0, 0, 0],
            resubmitted: 2,
            dropped: 0,
        }
    );
    assert!(planner.poll().is_none());
    assert!(planner.is_moving());

    // The Y move now starts from X=400 and leaves X alone
    let blocks = planner.snapshot();
    assert_eq!(blocks[0].start_position, [400, 0, 0, 0]);
    assert_eq!(blocks[0].steps, [0, 800, 0, 0]);
    assert_eq!(blocks[1].steps, [200, 0, 0, 0]);

    run_until_idle(&mut stepper, &timer, 10_000);
    assert_eq!(planner.position_steps(), [200, 800, 0, 0]);
    assert_eq!(stepper.io().position, [200, 800, 0, 0]);
}

#[test]
fn abort_is_serviced_by_next_submit() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let config = parse_config(MACHINE_CONFIG).unwrap();
    let io = SimIo::new().with_limit(Axis::X, LimitSide::Max, 80, true);
    let (mut planner, mut stepper) = core.split(config, io, &timer).unwrap();

    planner.submit(&MoveRequest::absolute().x(5.0)).unwrap();
    planner.submit(&MoveRequest::absolute().x(6.0)).unwrap();
    run_until_idle(&mut stepper, &timer, 10_000);
    assert_eq!(planner.position_steps()[0], 80);

    // Queue the Y move; the pending abort is serviced first
    assert_eq!(
        planner.submit(&MoveRequest::absolute().y(1.0)),
        Ok(Submission::Queued)
    );
    assert_eq!(planner.queued(), 2);

    // The re-translated X=6 move runs into the same switch without travel
    run_until_idle(&mut stepper, &timer, 10_000);
    assert_eq!(planner.position_steps(), [80, 0, 0, 0]);

    let report = planner.poll().expect("abort should be reported");
    assert_eq!(report.axes, [true, false, false, false]);
    assert_eq!(report.position, [80, 0, 0, 0]);
    assert_eq!(report.resubmitted, 1);
    assert_eq!(report.dropped, 0);

    run_until_idle(&mut stepper, &timer, 10_000);
    assert_eq!(planner.position_steps(), [80, 80, 0, 0]);
    assert_eq!(stepper.io().pulses, [80, 80, 0, 0]);
}

#[test]
fn disabled_endstops_are_not_sampled() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let config = parse_config(MACHINE_CONFIG).unwrap();
    let io = SimIo::new().with_limit(Axis::X, LimitSide::Max, 10, true);
    let (mut planner, mut stepper) = core.split(config, io, &timer).unwrap();

    planner.set_endstops_enabled(false);
    planner.submit(&MoveRequest::absolute().x(1.0)).unwrap();
    run_until_idle(&mut stepper, &timer, 10_000);

    assert_eq!(planner.position_steps()[0], 80);
    assert_eq!(stepper.io().limit_reads, 0);
    assert!(planner.poll().is_none());
}

// =============================================================================
// Backpressure
// =============================================================================

#[test]
fn full_buffer_rejects_without_mutation() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<4> = MotionCore::new();
    let (mut planner, mut stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    for i in 1..=4 {
        planner.submit(&MoveRequest::absolute().x(i as f32)).unwrap();
    }
    assert_eq!(planner.free_capacity(), 0);

    let before = planner.snapshot();
    let planned = planner.planned_position();
    let rejected = planner.submit(&MoveRequest::absolute().x(50.0));

    assert_eq!(rejected, Err(Error::Buffer(BufferError::Full { capacity: 4 })));
    assert_eq!(planner.snapshot(), before);
    assert_eq!(planner.planned_position(), planned);

    // Retry succeeds once the head Block retires
    while planner.free_capacity() == 0 {
        assert!(timer.fire());
        stepper.tick();
    }
    assert_eq!(planner.submit(&MoveRequest::absolute().x(50.0)), Ok(Submission::Queued));
}

// =============================================================================
// Planner determinism
// =============================================================================

#[test]
fn replanning_without_enqueue_changes_nothing() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<16> = MotionCore::new();
    let (mut planner, _stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    let path = [(10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (1.0, 1.0), (30.0, 2.0)];
    for (x, y) in path {
        planner
            .submit(&MoveRequest::absolute().x(x).y(y).feedrate(MmPerSec(120.0)))
            .unwrap();
    }

    let first = planner.snapshot();
    planner.plan();
    planner.plan();
    assert_eq!(planner.snapshot(), first);
}

#[test]
fn busy_head_is_never_replanned() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let (mut planner, mut stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    planner.submit(&to_x(20.0, 6000.0)).unwrap();
    timer.fire();
    stepper.tick();
    assert!(stepper.is_executing());
    let executing = planner.snapshot()[0];

    // Appending raises what the head could exit at, but it is latched
    planner.submit(&to_x(40.0, 6000.0)).unwrap();
    let blocks = planner.snapshot();
    assert_eq!(blocks[0], executing);
    assert_eq!(blocks[1].entry_speed, executing.exit_speed);
}

#[test]
fn slow_move_behind_latched_head_keeps_braking_feasible() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<8> = MotionCore::new();
    let config = MachineConfig::default();
    let max_jerk = config.planner.max_jerk.0;
    let (mut planner, mut stepper) = core.split(config, SimIo::new(), &timer).unwrap();

    planner.submit(&MoveRequest::absolute().x(10.0).feedrate(MmPerSec(100.0))).unwrap();
    planner.submit(&MoveRequest::absolute().x(10.1).feedrate(MmPerSec(100.0))).unwrap();
    timer.fire();
    stepper.tick();
    let executing = planner.snapshot()[0];

    // The short middle Block was planned as the tail; now it has to slow down
    planner.submit(&MoveRequest::absolute().x(10.2).feedrate(MmPerSec(1.0))).unwrap();
    let blocks = planner.snapshot();
    let (middle, slow) = (blocks[1], blocks[2]);

    assert_eq!(middle.entry_speed, executing.exit_speed);
    let brake = (middle.exit_speed.powi(2) + 2.0 * middle.acceleration * middle.millimeters).sqrt();
    assert!(middle.entry_speed <= brake * 1.0001, "{} > {}", middle.entry_speed, brake);
    assert!(middle.final_rate < middle.initial_rate);
    assert!(slow.entry_speed <= slow.nominal_speed);
    assert!(middle.exit_speed - slow.entry_speed <= max_jerk);

    run_until_idle(&mut stepper, &timer, 10_000);
    assert_eq!(planner.position_steps()[0], 816);
}

// =============================================================================
// Configuration workflow
// =============================================================================

#[test]
fn invalid_config_is_rejected_at_split() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<4> = MotionCore::new();
    let mut config = MachineConfig::default();
    config.axes.e.max_acceleration.0 = 0.0;

    let result = core.split(config, SimIo::new(), &timer);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAcceleration { axis: Axis::E, .. }))
    ));
}

#[test]
fn runtime_config_updates_keep_prior_values_on_error() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<4> = MotionCore::new();
    let (mut planner, _stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    assert!(planner.set_max_jerk(MmPerSec(-1.0)).is_err());
    assert_eq!(planner.config().planner.max_jerk, MmPerSec(20.0));

    let mut y = *planner.config().axis(Axis::Y);
    y.steps_per_mm = f32::INFINITY;
    assert!(planner.set_axis_config(Axis::Y, y).is_err());
    assert_eq!(planner.config().axis(Axis::Y).steps_per_mm, 80.0);

    y.steps_per_mm = 160.0;
    planner.set_axis_config(Axis::Y, y).unwrap();
    planner.submit(&MoveRequest::absolute().y(1.0)).unwrap();
    assert_eq!(planner.snapshot()[0].steps[1], 160);
}

#[test]
fn pin_faults_are_counted_not_raised() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<4> = MotionCore::new();
    let (mut planner, mut stepper) = core
        .split(MachineConfig::default(), SimIo::new().failing(), &timer)
        .unwrap();

    planner.submit(&MoveRequest::absolute().y(0.5)).unwrap();
    let ticks = run_until_idle(&mut stepper, &timer, 1_000);

    assert_eq!(ticks, 40);
    assert_eq!(planner.position_steps()[1], 40);
    // enable + direction + 40 pulses
    assert_eq!(planner.io_faults(), 42);
}

#[test]
fn dropped_and_invalid_requests_leave_queue_empty() {
    let timer = VirtualTimer::new();
    let mut core: MotionCore<4> = MotionCore::new();
    let (mut planner, _stepper) = core
        .split(MachineConfig::default(), SimIo::new(), &timer)
        .unwrap();

    assert_eq!(
        planner.submit(&MoveRequest::absolute().x(0.001)),
        Ok(Submission::Dropped)
    );
    assert!(planner
        .submit(&MoveRequest::absolute().x(1.0).feedrate(MmPerSec(f32::NAN)))
        .is_err());
    assert_eq!(planner.queued(), 0);
    assert!(!timer.is_armed());
}
