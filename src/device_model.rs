/// Full-scale voltage and top ADC code used to turn raw counts into volts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub full_scale_volts: f64,
    pub adc_max_code: f64,
}

impl Calibration {
    pub fn new(full_scale_volts: f64, adc_max_code: f64) -> Self {
        Self {
            full_scale_volts,
            adc_max_code,
        }
    }

    /// Volts per ADC count.
    pub fn volts_per_count(&self) -> f64 {
        self.full_scale_volts / self.adc_max_code
    }

    /// Convert a raw magnitude to amplitude in volts. The device reports half
    /// the amplitude, hence the factor of two.
    pub fn raw_to_amplitude(&self, raw: f64) -> f64 {
        2.0 * raw * self.volts_per_count()
    }

    /// Convert a raw input signal reading to volts.
    pub fn raw_to_voltage(&self, raw: f64) -> f64 {
        raw * self.volts_per_count()
    }
}

/// The board running the lock-in firmware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DeviceModel {
    /// 12-bit ADC, DAC-driven internal reference.
    #[default]
    Teensy35,
    /// 10-bit ADC, external reference only.
    Teensy40,
    Custom {
        calibration: Calibration,
        internal_reference: bool,
    },
}

impl DeviceModel {
    const FULL_SCALE_VOLTS: f64 = 3.3;
    const TEENSY35_MAX_CODE: f64 = 4096.0;
    const TEENSY40_MAX_CODE: f64 = 1023.0;

    // Internal reference synthesis on the 3.5: a sine table stepped by a
    // timer derived from the core clock.
    const MCU_HZ: f64 = 120e6;
    const SINE_TABLE_LEN: f64 = 300.0;

    pub fn calibration(&self) -> Calibration {
        match self {
            DeviceModel::Teensy35 => {
                Calibration::new(Self::FULL_SCALE_VOLTS, Self::TEENSY35_MAX_CODE)
            }
            DeviceModel::Teensy40 => {
                Calibration::new(Self::FULL_SCALE_VOLTS, Self::TEENSY40_MAX_CODE)
            }
            DeviceModel::Custom { calibration, .. } => *calibration,
        }
    }

    pub fn has_internal_reference(&self) -> bool {
        match self {
            DeviceModel::Teensy35 => true,
            DeviceModel::Teensy40 => false,
            DeviceModel::Custom {
                internal_reference, ..
            } => *internal_reference,
        }
    }

    /// Frequency the device will actually generate when asked for
    /// `requested_hz`, after the timer divider is rounded down.
    ///
    /// `None` when the board has no internal reference or the request cannot
    /// be synthesized.
    pub fn actual_internal_frequency(&self, requested_hz: u32) -> Option<f64> {
        if !self.has_internal_reference() || requested_hz == 0 {
            return None;
        }
        let periods = (Self::MCU_HZ / (f64::from(requested_hz) * Self::SINE_TABLE_LEN)).floor();
        if periods < 1.0 {
            return None;
        }
        Some(Self::MCU_HZ / (periods * Self::SINE_TABLE_LEN))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceModel::Teensy35 => "Teensy 3.5",
            DeviceModel::Teensy40 => "Teensy 4.0",
            DeviceModel::Custom { .. } => "custom",
        }
    }
}
