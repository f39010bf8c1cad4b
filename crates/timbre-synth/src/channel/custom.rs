//! Controllers with no SF2 modulator source.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomController {
    /// Fine tuning in cents (RPN 0/1).
    ChannelTuning,
    /// Coarse tuning in semitones (RPN 0/2).
    ChannelTuningSemitones,
    /// Additional transpose in cents, set through the API.
    ChannelTransposeFine,
    /// Scale applied to modulation wheel depth (RPN 0/5).
    ModulationMultiplier,
    /// Key shift in semitones applied before zone lookup.
    ChannelKeyShift,
}

impl CustomController {
    pub const COUNT: usize = 5;

    pub const ALL: [CustomController; Self::COUNT] = [
        CustomController::ChannelTuning,
        CustomController::ChannelTuningSemitones,
        CustomController::ChannelTransposeFine,
        CustomController::ModulationMultiplier,
        CustomController::ChannelKeyShift,
    ];

    pub fn default_value(self) -> f64 {
        match self {
            CustomController::ModulationMultiplier => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomControllers {
    values: [f64; CustomController::COUNT],
}

impl Default for CustomControllers {
    fn default() -> Self {
        let mut values = [0.0; CustomController::COUNT];
        for controller in CustomController::ALL {
            values[controller as usize] = controller.default_value();
        }
        Self { values }
    }
}

impl CustomControllers {
    #[inline]
    pub fn get(&self, controller: CustomController) -> f64 {
        self.values[controller as usize]
    }

    #[inline]
    pub fn set(&mut self, controller: CustomController, value: f64) {
        self.values[controller as usize] = value;
    }

    /// Tuning and transpose in cents contributed by this table.
    pub fn tuning_cents(&self) -> f64 {
        self.get(CustomController::ChannelTuning)
            + self.get(CustomController::ChannelTuningSemitones) * 100.0
            + self.get(CustomController::ChannelTransposeFine)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_tuning_sum() {
        let mut custom = CustomControllers::default();
        assert_eq!(custom.get(CustomController::ModulationMultiplier), 1.0);
        custom.set(CustomController::ChannelTuning, 12.5);
        custom.set(CustomController::ChannelTuningSemitones, -2.0);
        custom.set(CustomController::ChannelTransposeFine, 3.0);
        assert_eq!(custom.tuning_cents(), 12.5 - 200.0 + 3.0);
        custom.reset();
        assert_eq!(custom, CustomControllers::default());
    }
}
