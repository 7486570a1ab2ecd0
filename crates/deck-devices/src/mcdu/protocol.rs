//! WinWing MCDU HID protocol: layouts, identifiers, and frame codecs.
//!
//! Input: 25-byte reports with a 96-bit key bitmask at bytes 1..13 and
//! two 16-bit little-endian ambient light sensors at bytes 17..21. The
//! unit also emits 14-byte frames after LED writes, which are ignored.
//!
//! Output: 14-byte control messages for LEDs and brightness channels, and
//! display payloads chunked into 64-byte `0xF2` frames of 63 payload
//! bytes each.

use crate::error::DeviceError;

/// WinWing USB vendor id.
pub const VENDOR_WINWING: u16 = 0x4098;

/// MCDU product ids by seat position.
pub mod product_ids {
    /// Captain-side MCDU.
    pub const MCDU_CAPTAIN: u16 = 0xBB36;
    /// First-officer MCDU.
    pub const MCDU_FIRST_OFFICER: u16 = 0xBB3E;
    /// Observer MCDU.
    pub const MCDU_OBSERVER: u16 = 0xBB3A;
}

pub const INPUT_REPORT_LEN: usize = 25;
/// LED acknowledgement frames the unit sends back; not key data.
pub const ACK_REPORT_LEN: usize = 14;

const KEY_MASK_OFFSET: usize = 1;
const KEY_MASK_BYTES: usize = 12;
const SENSOR_LEFT_OFFSET: usize = 17;
const SENSOR_RIGHT_OFFSET: usize = 19;

/// Key names in hardware bit order. The bit index in the input report's
/// key mask is the index into this table.
pub const KEY_NAMES: &[&str] = &[
    "LSK1L", "LSK2L", "LSK3L", "LSK4L", "LSK5L", "LSK6L",
    "LSK1R", "LSK2R", "LSK3R", "LSK4R", "LSK5R", "LSK6R",
    "DIR", "PROG", "PERF", "INIT", "DATA", "FPLN",
    "RAD_NAV", "FUEL_PRED", "SEC_FPLN", "ATC_COMM", "MENU", "AIRPORT",
    "SLEW_LEFT", "SLEW_UP", "SLEW_RIGHT", "SLEW_DOWN",
    "KEY_1", "KEY_2", "KEY_3", "KEY_4", "KEY_5", "KEY_6", "KEY_7", "KEY_8", "KEY_9",
    "DOT", "KEY_0", "PLUS_MINUS",
    "KEY_A", "KEY_B", "KEY_C", "KEY_D", "KEY_E", "KEY_F", "KEY_G",
    "KEY_H", "KEY_I", "KEY_J", "KEY_K", "KEY_L", "KEY_M", "KEY_N",
    "KEY_O", "KEY_P", "KEY_Q", "KEY_R", "KEY_S", "KEY_T", "KEY_U",
    "KEY_V", "KEY_W", "KEY_X", "KEY_Y", "KEY_Z",
    "SLASH", "SP", "OVFY", "CLR",
    "BRT", "DIM",
];

/// Annunciator LED identifiers on the control interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Fail = 0x08,
    Fm = 0x09,
    Mcdu = 0x0A,
    Menu = 0x0B,
    Fm1 = 0x0C,
    Ind = 0x0D,
    Rdy = 0x0E,
    Status = 0x0F,
    Fm2 = 0x10,
}

impl Led {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FAIL" => Some(Led::Fail),
            "FM" => Some(Led::Fm),
            "MCDU" => Some(Led::Mcdu),
            "MENU" => Some(Led::Menu),
            "FM1" => Some(Led::Fm1),
            "IND" => Some(Led::Ind),
            "RDY" => Some(Led::Rdy),
            "STATUS" => Some(Led::Status),
            "FM2" => Some(Led::Fm2),
            _ => None,
        }
    }

    /// Every annunciator, for turn-everything-off sweeps.
    pub const ALL: &'static [Led] = &[
        Led::Fail,
        Led::Fm,
        Led::Mcdu,
        Led::Menu,
        Led::Fm1,
        Led::Ind,
        Led::Rdy,
        Led::Status,
        Led::Fm2,
    ];
}

/// Brightness channels addressable as device values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessChannel {
    /// Keyboard backlight.
    Backlight = 0x00,
    /// LCD backlight.
    ScreenBacklight = 0x01,
    /// Annunciator LED brightness.
    LedBrightness = 0x02,
}

impl BrightnessChannel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Backlight" => Some(BrightnessChannel::Backlight),
            "ScreenBacklight" => Some(BrightnessChannel::ScreenBacklight),
            "LedBrightness" => Some(BrightnessChannel::LedBrightness),
            _ => None,
        }
    }
}

/// Decoded input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFrame {
    /// 96-bit key state, bit index per [`KEY_NAMES`].
    pub key_mask: u128,
    pub ambient_left: u16,
    pub ambient_right: u16,
}

/// Parse a 25-byte input report.
pub fn parse_input_report(data: &[u8], model: &str) -> Result<InputFrame, DeviceError> {
    if data.len() != INPUT_REPORT_LEN {
        return Err(DeviceError::InvalidReport {
            model: model.to_string(),
            expected: INPUT_REPORT_LEN,
            actual: data.len(),
        });
    }

    let mut key_mask: u128 = 0;
    for (i, byte) in data
        .iter()
        .skip(KEY_MASK_OFFSET)
        .take(KEY_MASK_BYTES)
        .enumerate()
    {
        key_mask |= u128::from(*byte) << (8 * i);
    }

    Ok(InputFrame {
        key_mask,
        ambient_left: read_u16_le(data, SENSOR_LEFT_OFFSET),
        ambient_right: read_u16_le(data, SENSOR_RIGHT_OFFSET),
    })
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    let lo = data.get(offset).copied().unwrap_or(0);
    let hi = data.get(offset + 1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

/// Key edges between two consecutive key masks: `(key name, pressed)`.
pub fn key_transitions(previous: u128, current: u128) -> Vec<(&'static str, bool)> {
    let mut transitions = Vec::new();
    let changed = previous ^ current;
    for (index, name) in KEY_NAMES.iter().enumerate() {
        let bit = 1u128 << index;
        if changed & bit != 0 {
            transitions.push((*name, current & bit != 0));
        }
    }
    transitions
}

const CONTROL_FRAME_LEN: usize = 14;

fn control_frame(target: u8, value: u8) -> [u8; CONTROL_FRAME_LEN] {
    [
        0x02, 0x32, 0xBB, 0x00, 0x00, 0x03, 0x49, target, value, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]
}

/// LED on/off control frame.
pub fn led_frame(led: Led, on: bool) -> [u8; CONTROL_FRAME_LEN] {
    control_frame(led as u8, u8::from(on))
}

/// Brightness control frame; `level` is the raw 0-255 hardware level.
pub fn brightness_frame(channel: BrightnessChannel, level: u8) -> [u8; CONTROL_FRAME_LEN] {
    control_frame(channel as u8, level)
}

/// Scale a configured value to a hardware brightness level. Values in
/// `[0, 1]` are treated as ratios; anything above is clamped to 0-255.
pub fn brightness_level(value: f64) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value <= 1.0 {
        (value * 255.0).round() as u8
    } else {
        value.min(255.0) as u8
    }
}

const DISPLAY_FRAME_LEN: usize = 64;
const DISPLAY_CHUNK_LEN: usize = 63;
const DISPLAY_FRAME_TYPE: u8 = 0xF2;

/// Chunk a display payload into 64-byte `0xF2` frames, zero-padding the
/// final chunk.
pub fn chunk_display_payload(payload: &[u8]) -> Vec<[u8; DISPLAY_FRAME_LEN]> {
    payload
        .chunks(DISPLAY_CHUNK_LEN)
        .map(|chunk| {
            let mut frame = [0u8; DISPLAY_FRAME_LEN];
            frame[0] = DISPLAY_FRAME_TYPE;
            frame[1..=chunk.len()].copy_from_slice(chunk);
            frame
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with_mask(mask: u128) -> Vec<u8> {
        let mut data = vec![0u8; INPUT_REPORT_LEN];
        for i in 0..KEY_MASK_BYTES {
            data[KEY_MASK_OFFSET + i] = ((mask >> (8 * i)) & 0xFF) as u8;
        }
        data
    }

    #[test]
    fn key_names_fit_the_mask() {
        assert!(KEY_NAMES.len() <= KEY_MASK_BYTES * 8);
    }

    #[test]
    fn key_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in KEY_NAMES {
            assert!(seen.insert(name), "duplicate key name {name}");
        }
    }

    #[test]
    fn parses_key_mask_little_endian() {
        let mut data = report_with_mask(0);
        data[KEY_MASK_OFFSET] = 0x01; // bit 0 = LSK1L
        data[KEY_MASK_OFFSET + 1] = 0x80; // bit 15 = INIT

        let frame = parse_input_report(&data, "MCDU").unwrap();
        assert_eq!(frame.key_mask & 1, 1);
        assert_ne!(frame.key_mask & (1 << 15), 0);
    }

    #[test]
    fn parses_ambient_sensors() {
        let mut data = report_with_mask(0);
        data[SENSOR_LEFT_OFFSET] = 0x34;
        data[SENSOR_LEFT_OFFSET + 1] = 0x12;
        data[SENSOR_RIGHT_OFFSET] = 0x78;
        data[SENSOR_RIGHT_OFFSET + 1] = 0x56;

        let frame = parse_input_report(&data, "MCDU").unwrap();
        assert_eq!(frame.ambient_left, 0x1234);
        assert_eq!(frame.ambient_right, 0x5678);
    }

    #[test]
    fn wrong_length_report_is_an_error() {
        let err = parse_input_report(&[0u8; ACK_REPORT_LEN], "MCDU").unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidReport {
                expected: INPUT_REPORT_LEN,
                actual: ACK_REPORT_LEN,
                ..
            }
        ));
    }

    #[test]
    fn transitions_report_press_and_release_edges() {
        let previous = 0u128;
        let current = 0b1u128; // LSK1L down

        let down = key_transitions(previous, current);
        assert_eq!(down, vec![("LSK1L", true)]);

        let up = key_transitions(current, 0);
        assert_eq!(up, vec![("LSK1L", false)]);
    }

    #[test]
    fn unchanged_mask_yields_no_transitions() {
        let mask = 0b1010u128;
        assert!(key_transitions(mask, mask).is_empty());
    }

    #[test]
    fn simultaneous_presses_all_reported() {
        let current = 0b11u128; // LSK1L + LSK2L
        let transitions = key_transitions(0, current);
        assert_eq!(transitions.len(), 2);
        assert!(transitions.contains(&("LSK1L", true)));
        assert!(transitions.contains(&("LSK2L", true)));
    }

    #[test]
    fn led_frame_layout() {
        let frame = led_frame(Led::Fail, true);
        assert_eq!(frame[0], 0x02);
        assert_eq!(frame[6], 0x49);
        assert_eq!(frame[7], 0x08);
        assert_eq!(frame[8], 1);

        let off = led_frame(Led::Rdy, false);
        assert_eq!(off[7], 0x0E);
        assert_eq!(off[8], 0);
    }

    #[test]
    fn brightness_frame_layout() {
        let frame = brightness_frame(BrightnessChannel::ScreenBacklight, 200);
        assert_eq!(frame[7], 0x01);
        assert_eq!(frame[8], 200);
    }

    #[test]
    fn brightness_level_scaling() {
        assert_eq!(brightness_level(0.0), 0);
        assert_eq!(brightness_level(0.5), 128);
        assert_eq!(brightness_level(1.0), 255);
        assert_eq!(brightness_level(180.0), 180);
        assert_eq!(brightness_level(9999.0), 255);
        assert_eq!(brightness_level(-3.0), 0);
        assert_eq!(brightness_level(f64::NAN), 0);
    }

    #[test]
    fn led_names_round_trip() {
        for led in Led::ALL {
            let name = match led {
                Led::Fail => "FAIL",
                Led::Fm => "FM",
                Led::Mcdu => "MCDU",
                Led::Menu => "MENU",
                Led::Fm1 => "FM1",
                Led::Ind => "IND",
                Led::Rdy => "RDY",
                Led::Status => "STATUS",
                Led::Fm2 => "FM2",
            };
            assert_eq!(Led::from_name(name), Some(*led));
        }
        assert_eq!(Led::from_name("NOPE"), None);
    }

    #[test]
    fn display_chunks_are_framed_and_padded() {
        let payload = vec![0xABu8; 100];
        let frames = chunk_display_payload(&payload);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f[0] == DISPLAY_FRAME_TYPE));
        assert_eq!(frames[0][1..], [0xAB; 63]);
        // Second chunk holds the remaining 37 bytes then zero padding.
        assert_eq!(frames[1][1..38], [0xAB; 37]);
        assert_eq!(frames[1][38..], [0u8; 26]);
    }

    #[test]
    fn empty_payload_produces_no_frames() {
        assert!(chunk_display_payload(&[]).is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics_on_arbitrary_bytes(
                data in proptest::collection::vec(any::<u8>(), 0..64)
            ) {
                let _ = parse_input_report(&data, "MCDU");
            }

            #[test]
            fn transitions_are_symmetric(previous in any::<u128>(), current in any::<u128>()) {
                let forward = key_transitions(previous, current);
                let backward = key_transitions(current, previous);
                prop_assert_eq!(forward.len(), backward.len());
            }

            #[test]
            fn chunking_preserves_payload(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
                let frames = chunk_display_payload(&payload);
                let mut rebuilt: Vec<u8> = frames.iter().flat_map(|f| f[1..].iter().copied()).collect();
                rebuilt.truncate(payload.len());
                prop_assert_eq!(rebuilt, payload);
            }

            #[test]
            fn brightness_level_never_panics(value in proptest::num::f64::ANY) {
                let _ = brightness_level(value);
            }
        }
    }
}
