//! Bus timing parameters and the preset tables used to resolve them.
//!
//! Classic controllers are programmed through the two SJA1000-style bus timing
//! registers (BTR0/BTR1) and only accept a fixed set of bitrates.
//!
//! CAN-FD controllers take, for each phase (arbitration and data), a bitrate plus
//! segment lengths expressed in the driver's native resolution. When a bitrate has
//! a preset, any value supplied by the caller overrides the preset value; without a
//! preset every value must be supplied.
use crate::error::TimingError;

//==================================================================================CLASSIC
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Register pair programming a classic controller for one bitrate.
pub struct ClassicPreset {
    pub bitrate: u32,
    pub btr0: u8,
    pub btr1: u8,
}

/// BTR0/BTR1 values for the classic bitrates (16 MHz controller clock).
pub const CLASSIC_PRESETS: [ClassicPreset; 9] = [
    ClassicPreset { bitrate: 10_000, btr0: 0x31, btr1: 0x1C },
    ClassicPreset { bitrate: 20_000, btr0: 0x18, btr1: 0x1C },
    ClassicPreset { bitrate: 50_000, btr0: 0x09, btr1: 0x1C },
    ClassicPreset { bitrate: 100_000, btr0: 0x04, btr1: 0x1C },
    ClassicPreset { bitrate: 125_000, btr0: 0x03, btr1: 0x1C },
    ClassicPreset { bitrate: 250_000, btr0: 0x01, btr1: 0x1C },
    ClassicPreset { bitrate: 500_000, btr0: 0x00, btr1: 0x1C },
    ClassicPreset { bitrate: 800_000, btr0: 0x00, btr1: 0x16 },
    ClassicPreset { bitrate: 1_000_000, btr0: 0x00, btr1: 0x14 },
];

/// Looks up the register pair for a classic bitrate.
pub fn classic_preset(bitrate: u32) -> Result<ClassicPreset, TimingError> {
    CLASSIC_PRESETS
        .iter()
        .find(|preset| preset.bitrate == bitrate)
        .copied()
        .ok_or(TimingError::UnsupportedBitrate { bitrate })
}

//==================================================================================FD
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Timing of one CAN-FD phase.
pub struct BitTiming {
    /// Bitrate in bit/s.
    pub bitrate: u32,
    /// Time segment before the sample point.
    pub tseg1: u16,
    /// Time segment after the sample point.
    pub tseg2: u16,
    /// Synchronization jump width.
    pub sjw: u16,
    /// Secondary sample point (transmitter delay compensation). Zero disables it.
    pub ssp: u16,
}

const fn timing(bitrate: u32, tseg1: u16, tseg2: u16, sjw: u16, ssp: u16) -> BitTiming {
    BitTiming {
        bitrate,
        tseg1,
        tseg2,
        sjw,
        ssp,
    }
}

/// Arbitration-phase presets (80 % sample point).
pub const ARBITRATION_PRESETS: [BitTiming; 3] = [
    timing(250_000, 6400, 1600, 1600, 0),
    timing(500_000, 6400, 1600, 1600, 0),
    timing(1_000_000, 6400, 1600, 1600, 0),
];

/// Data-phase presets.
pub const DATA_PRESETS: [BitTiming; 10] = [
    timing(500_000, 6400, 1600, 1600, 6400),
    timing(833_333, 1600, 400, 400, 1620),
    timing(1_000_000, 1600, 400, 400, 1600),
    timing(1_538_461, 1000, 300, 300, 1040),
    timing(2_000_000, 1600, 400, 400, 1600),
    timing(4_000_000, 800, 200, 200, 800),
    timing(5_000_000, 600, 200, 200, 600),
    timing(6_666_666, 400, 200, 200, 402),
    timing(8_000_000, 400, 100, 100, 250),
    timing(10_000_000, 300, 100, 100, 200),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Caller-supplied values for one phase; `None` keeps the preset value.
pub struct TimingOverrides {
    pub tseg1: Option<u16>,
    pub tseg2: Option<u16>,
    pub sjw: Option<u16>,
    pub ssp: Option<u16>,
}

impl BitTiming {
    /// Resolves the timing of a phase from a preset table and caller overrides.
    ///
    /// - Bitrate found in `presets`: every `Some` override replaces the preset value.
    /// - Bitrate without preset: `tseg1`, `tseg2` and `sjw` are mandatory, `ssp`
    ///   defaults to 0.
    ///
    /// Segments and jump width must be non-zero.
    pub fn resolve(
        presets: &[BitTiming],
        bitrate: u32,
        overrides: TimingOverrides,
    ) -> Result<Self, TimingError> {
        let resolved = match presets.iter().find(|preset| preset.bitrate == bitrate) {
            Some(preset) => BitTiming {
                bitrate,
                tseg1: overrides.tseg1.unwrap_or(preset.tseg1),
                tseg2: overrides.tseg2.unwrap_or(preset.tseg2),
                sjw: overrides.sjw.unwrap_or(preset.sjw),
                ssp: overrides.ssp.unwrap_or(preset.ssp),
            },
            None => BitTiming {
                bitrate,
                tseg1: required(overrides.tseg1, "tseg1", bitrate)?,
                tseg2: required(overrides.tseg2, "tseg2", bitrate)?,
                sjw: required(overrides.sjw, "sjw", bitrate)?,
                ssp: overrides.ssp.unwrap_or(0),
            },
        };

        for (field, value) in [
            ("tseg1", resolved.tseg1),
            ("tseg2", resolved.tseg2),
            ("sjw", resolved.sjw),
        ] {
            if value == 0 {
                return Err(TimingError::ZeroValue { field });
            }
        }
        Ok(resolved)
    }

    /// Sample point position in per mille of the bit time.
    pub fn sample_point_permille(&self) -> u16 {
        let total = self.tseg1 as u32 + self.tseg2 as u32;
        if total == 0 {
            return 0;
        }
        (self.tseg1 as u32 * 1000 / total) as u16
    }
}

fn required(value: Option<u16>, field: &'static str, bitrate: u32) -> Result<u16, TimingError> {
    value.ok_or(TimingError::MissingValue { field, bitrate })
}
