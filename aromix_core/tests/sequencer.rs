use aromix_core::actuator::ActuatorDriver;
use aromix_core::mocks::{MemoryStore, NullActuators};
use aromix_core::{
    validate, Command, Limits, MessageKind, OdorId, RecipeCatalog, SequenceError, Sequencer,
    SequencerState, ValidCommand,
};

fn catalog() -> RecipeCatalog {
    RecipeCatalog::new(Box::new(MemoryStore::default()))
}

fn sequencer() -> Sequencer<NullActuators> {
    Sequencer::new(ActuatorDriver::new(NullActuators))
}

fn odor_command(odor: OdorId, intensity: u8, duration_s: u16) -> ValidCommand {
    let cmd = Command {
        kind: MessageKind::OdorCommand as u8,
        odor,
        intensity,
        duration_s,
        pump_config: [0; 5],
        timestamp: 0,
        checksum: 0,
    }
    .sealed();
    validate(&cmd, &Limits::default()).expect("test command should validate")
}

fn stop_command() -> ValidCommand {
    let cmd = Command {
        kind: MessageKind::EmergencyStop as u8,
        odor: OdorId::new(0),
        intensity: 0,
        duration_s: 0,
        pump_config: [0; 5],
        timestamp: 0,
        checksum: 0,
    }
    .sealed();
    validate(&cmd, &Limits::default()).expect("stop should validate")
}

#[test]
fn full_intensity_applies_the_recipe_ratios_verbatim() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::COFFEE, 100, 60), &catalog, 0)
        .expect("dispatch");

    assert_eq!(seq.state(), SequencerState::Running);
    let snap = seq.snapshot();
    assert_eq!(snap.pump_speeds, [80, 0, 0, 0, 20]);
    assert_eq!(snap.valve_open, [true, false, false, false, true]);
    // intensity 100 -> PWM 255 -> 100%
    assert_eq!(snap.fan_speeds, [100, 100]);
}

#[test]
fn half_intensity_floors_each_pump_target() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::COFFEE, 50, 60), &catalog, 0)
        .expect("dispatch");

    let snap = seq.snapshot();
    assert_eq!(snap.pump_speeds, [40, 0, 0, 0, 10]);
    // intensity 50 -> PWM 127 -> 49%
    assert_eq!(snap.fan_speeds, [49, 49]);
}

#[test]
fn zero_intensity_runs_with_everything_scaled_to_zero() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::MIXED, 0, 10), &catalog, 0)
        .expect("dispatch");

    assert_eq!(seq.state(), SequencerState::Running);
    let snap = seq.snapshot();
    assert_eq!(snap.pump_speeds, [0; 5]);
    // Valve states come from the recipe, not the intensity.
    assert_eq!(snap.valve_open, [true, true, true, true, false]);
    assert_eq!(snap.fan_speeds, [0, 0]);
}

#[test]
fn recipe_miss_fails_closed() {
    let catalog = catalog();
    let mut seq = sequencer();

    // 0x0A is in the addressable range but has no recipe.
    let err = seq
        .dispatch(&odor_command(OdorId::new(0x0A), 100, 60), &catalog, 0)
        .unwrap_err();

    assert!(matches!(err, SequenceError::Recipe(_)));
    assert_eq!(seq.state(), SequencerState::Error);
    assert!(seq.snapshot().is_all_off());
    assert_eq!(seq.deadline_ms(), None);
}

#[test]
fn error_state_is_recovered_by_the_next_valid_command() {
    let catalog = catalog();
    let mut seq = sequencer();

    let _ = seq.dispatch(&odor_command(OdorId::new(0x0A), 100, 60), &catalog, 0);
    assert_eq!(seq.state(), SequencerState::Error);

    seq.dispatch(&odor_command(OdorId::LEMON, 100, 60), &catalog, 0)
        .expect("recovery dispatch");
    assert_eq!(seq.state(), SequencerState::Running);
    assert_eq!(seq.snapshot().pump_speeds, [0, 0, 85, 0, 15]);
}

#[test]
fn emergency_stop_while_running_bypasses_the_timer() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::COFFEE, 100, 300), &catalog, 0)
        .expect("dispatch");
    assert_eq!(seq.snapshot().pump_speeds[0], 80);
    assert!(seq.deadline_ms().is_some());

    seq.dispatch(&stop_command(), &catalog, 1)
        .expect("emergency stop");

    assert_eq!(seq.state(), SequencerState::Idle);
    assert_eq!(seq.snapshot().pump_speeds[0], 0);
    assert!(seq.snapshot().is_all_off());
    assert_eq!(seq.deadline_ms(), None);
}

#[test]
fn emergency_stop_is_safe_from_idle() {
    let catalog = catalog();
    let mut seq = sequencer();
    seq.dispatch(&stop_command(), &catalog, 0).expect("stop");
    assert_eq!(seq.state(), SequencerState::Idle);
    assert!(seq.snapshot().is_all_off());
}

#[test]
fn timer_expiry_stops_generation_exactly_once() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::COFFEE, 100, 2), &catalog, 0)
        .expect("dispatch");

    assert!(!seq.tick(1_999).expect("tick before deadline"));
    assert_eq!(seq.state(), SequencerState::Running);

    assert!(seq.tick(2_000).expect("tick at deadline"));
    assert_eq!(seq.state(), SequencerState::Idle);
    assert!(seq.snapshot().is_all_off());

    // Already disarmed; nothing further happens.
    assert!(!seq.tick(10_000).expect("tick after deadline"));
}

#[test]
fn zero_duration_expires_on_the_next_tick() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::MINT, 80, 0), &catalog, 500)
        .expect("dispatch");
    assert!(seq.tick(500).expect("tick"));
    assert_eq!(seq.state(), SequencerState::Idle);
}

#[test]
fn a_second_command_while_running_restarts_the_generation() {
    let catalog = catalog();
    let mut seq = sequencer();

    seq.dispatch(&odor_command(OdorId::COFFEE, 100, 300), &catalog, 0)
        .expect("first dispatch");
    let first_deadline = seq.deadline_ms().expect("armed");

    seq.dispatch(&odor_command(OdorId::MINT, 50, 10), &catalog, 1_000)
        .expect("second dispatch");

    assert_eq!(seq.state(), SequencerState::Running);
    let snap = seq.snapshot();
    // Mint at half intensity, with no residue of the coffee targets.
    assert_eq!(snap.pump_speeds, [0, 0, 0, 40, 10]);
    assert_eq!(snap.valve_open, [false, false, false, true, true]);
    let second_deadline = seq.deadline_ms().expect("re-armed");
    assert_ne!(first_deadline, second_deadline);
    assert_eq!(second_deadline, 1_000 + 10_000);
}
