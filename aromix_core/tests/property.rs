use aromix_core::actuator::pwm_to_percent;
use aromix_core::sequencer::{fan_pwm, scale_ratio};
use aromix_core::{
    validate, Command, Limits, MessageKind, OdorId, StatusCode, SystemMonitor, ValidationError,
    ERROR_LOG_CAPACITY, FRAME_LEN,
};
use proptest::prelude::*;

prop_compose! {
    fn sealed_command()(
        kind in prop_oneof![
            Just(MessageKind::OdorCommand as u8),
            Just(MessageKind::EmergencyStop as u8),
        ],
        odor in 0x01..=0x10u8,
        intensity in 0..=100u8,
        duration_s in 0..=300u16,
        pump_config in proptest::array::uniform5(any::<u8>()),
        timestamp in any::<u32>(),
    ) -> Command {
        Command {
            kind,
            odor: OdorId::new(odor),
            intensity,
            duration_s,
            pump_config,
            timestamp,
            checksum: 0,
        }
        .sealed()
    }
}

proptest! {
    #[test]
    fn sealed_commands_always_validate(cmd in sealed_command()) {
        prop_assert!(validate(&cmd, &Limits::default()).is_ok());
    }

    #[test]
    fn any_single_bit_flip_reports_as_corruption(
        cmd in sealed_command(),
        byte in 0..FRAME_LEN,
        bit in 0..8u32,
    ) {
        let mut frame = cmd.encode();
        frame[byte] ^= 1u8 << bit;
        let decoded = Command::decode(&frame);
        let is_checksum_err = matches!(
            validate(&decoded, &Limits::default()),
            Err(ValidationError::Checksum { .. })
        );
        prop_assert!(is_checksum_err);
    }

    #[test]
    fn codec_round_trips_any_frame(frame in proptest::array::uniform16(any::<u8>())) {
        let decoded = Command::decode(&frame);
        prop_assert_eq!(decoded.encode(), frame);
    }

    #[test]
    fn pump_targets_never_exceed_ratio_or_intensity(
        ratio in 0..=100u8,
        intensity in 0..=100u8,
    ) {
        let target = scale_ratio(ratio, intensity);
        prop_assert!(target <= ratio);
        prop_assert!(target <= intensity);
    }

    #[test]
    fn fan_normalization_never_amplifies_intensity(intensity in 0..=100u8) {
        let percent = pwm_to_percent(fan_pwm(intensity));
        prop_assert!(percent <= intensity);
        // The two floor divisions lose at most two percentage points.
        prop_assert!(u16::from(percent) + 2 >= u16::from(intensity));
    }

    #[test]
    fn error_log_is_a_sliding_window(raw_codes in proptest::collection::vec(0..=9u8, 0..100)) {
        let codes: Vec<StatusCode> = raw_codes
            .iter()
            .map(|&c| StatusCode::from_u8(c).expect("0..=9 are all valid codes"))
            .collect();

        let mut monitor = SystemMonitor::new(0, 5000);
        for &code in &codes {
            monitor.log_error(code);
        }

        let log = monitor.error_log();
        prop_assert!(log.len() <= ERROR_LOG_CAPACITY);
        let expected_start = codes.len().saturating_sub(ERROR_LOG_CAPACITY);
        prop_assert_eq!(log, codes[expected_start..].to_vec());
    }
}
