use ch224q_rs::data_types::{
    AvsReadback, Protocol, RequestFlags, StandardVoltage, VoltageMode, VoltageRequest,
};
use ch224q_rs::registers::{
    AvsHighBits, StatusBits, avs_mv_to_regs, avs_regs_to_mv, code_to_current_ma, decode_protocol, pd_active,
    pps_code_to_mv, pps_mv_to_code, standard_from_code, standard_from_mv,
};

#[test]
fn protocol_priority_highest_bit_wins() {
    let cases = [
        (0b0000_0000, Protocol::None),
        (0b0000_0001, Protocol::Bc),
        (0b0000_0011, Protocol::Qc2),
        (0b0000_0111, Protocol::Qc3),
        (0b0000_1111, Protocol::Ucpd),
        (0b0001_0001, Protocol::UcpdEpr),
        (0b0001_1111, Protocol::UcpdEpr),
    ];
    for (raw, expected) in cases {
        assert_eq!(decode_protocol(StatusBits::from_bits_truncate(raw)), expected, "raw={raw:#010b}");
    }
}

#[test]
fn pd_gate_accepts_either_pd_bit() {
    assert!(pd_active(StatusBits::SPR));
    assert!(pd_active(StatusBits::EPR));
    assert!(!pd_active(StatusBits::QC3 | StatusBits::QC2 | StatusBits::BC));
}

#[test]
fn current_uses_50ma_steps() {
    assert_eq!(code_to_current_ma(40), 2_000);
    assert_eq!(code_to_current_ma(0), 0);
    assert_eq!(code_to_current_ma(255), 12_750);
}

#[test]
fn pps_quantizes_by_truncation() {
    assert_eq!(pps_mv_to_code(9_500), Some(95));
    assert_eq!(pps_mv_to_code(9_599), Some(95));
    assert_eq!(pps_mv_to_code(3_300), Some(33));
    assert_eq!(pps_mv_to_code(25_599), Some(255));
    assert_eq!(pps_code_to_mv(95), 9_500);
}

#[test]
fn pps_code_must_fit_one_byte() {
    assert_eq!(pps_mv_to_code(25_600), None);
    assert_eq!(pps_mv_to_code(28_000), None);
}

#[test]
fn avs_split_sets_enable_bit() {
    // 28 V -> 280 steps = 0x118: low 0x18, high 0x01 | EN
    let (low, high) = avs_mv_to_regs(28_000);
    assert_eq!(low, 0x18);
    assert_eq!(high, 0x01 | AvsHighBits::EN.bits());

    let (low, high) = avs_mv_to_regs(15_050);
    assert_eq!(low, 150);
    assert_eq!(high, AvsHighBits::EN.bits());
}

#[test]
fn avs_readback_interpretations() {
    // Combined: ((0x01 << 8) | 0x18) * 100 = 28 000 mV, enable bit ignored.
    assert_eq!(avs_regs_to_mv(AvsReadback::Combined, 0x18, 0x81), Some(28_000));
    // Legacy discards the low byte.
    assert_eq!(avs_regs_to_mv(AvsReadback::Legacy, 0x18, 0x00), Some(0));
    assert_eq!(avs_regs_to_mv(AvsReadback::Legacy, 0x00, 0x01), Some(25_600));
    // Legacy wraps in 16 bits: (2 << 8) * 100 = 51 200; (3 << 8) * 100 = 76 800 -> 11 264
    assert_eq!(avs_regs_to_mv(AvsReadback::Legacy, 0x00, 0x03), Some(11_264));
    // Combined refuses values that do not fit.
    assert_eq!(avs_regs_to_mv(AvsReadback::Combined, 0xFF, 0x7F), None);
}

#[test]
fn standard_levels_map_both_ways() {
    for (i, level) in StandardVoltage::ALL.into_iter().enumerate() {
        assert_eq!(level.code(), i as u8);
        assert_eq!(standard_from_code(level.code()), Some(level));
        assert_eq!(standard_from_mv(level.millivolts()), Some(level));
    }
    assert_eq!(standard_from_mv(13_000), None);
    assert_eq!(standard_from_code(6), None);
}

#[test]
fn request_flags_select_mode() {
    let req = VoltageRequest::from_flags(9_000, RequestFlags::USE_AVS | RequestFlags::USE_PPS);
    assert_eq!(req.mode, VoltageMode::Avs);
    assert!(!req.allow_high_voltage);

    let req = VoltageRequest::from_flags(21_000, RequestFlags::USE_PPS | RequestFlags::ENABLE_HV);
    assert_eq!(req.mode, VoltageMode::Pps);
    assert!(req.allow_high_voltage);
    assert_eq!(req.flags(), RequestFlags::USE_PPS | RequestFlags::ENABLE_HV);

    let req = VoltageRequest::from_flags(5_000, RequestFlags::empty());
    assert_eq!(req.mode, VoltageMode::Standard);
}
