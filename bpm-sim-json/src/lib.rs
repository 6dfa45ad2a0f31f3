//! bpm-sim-json contains the JSON schemas used by bpm-sim to describe a bank
//! of simulated BPM channels and the firmware coefficients synthesized for it.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// Bank design JSON schema.
///
/// This JSON schema describes the physical parameters of a bank of simulated
/// BPM channels. All frequencies are given in the same units as the sampling
/// frequency (MHz in the default design); they are normalized to the sampling
/// frequency before synthesis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BankDesign {
    /// Simulator sampling frequency.
    pub sampling_frequency: f64,
    /// Simulation mode.
    pub mode: BpmMode,
    /// Cavity resonators, one per channel.
    ///
    /// This is only used in cavity mode.
    #[serde(default)]
    pub resonators: Vec<Resonator>,
    /// Number of channels in stripline mode.
    #[serde(default = "default_stripline_channels")]
    pub stripline_channels: u32,
    /// Bandpass filter that shapes every channel.
    pub filter: BandpassFilter,
    /// Relative tolerance of the filter center frequency.
    ///
    /// Each channel gets its own filter center frequency, drawn at random
    /// within this relative tolerance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_tolerance: Option<f64>,
    /// Relative tolerance of the resonator frequencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resonator_tolerance: Option<f64>,
    /// Simulator period in clock cycles.
    ///
    /// The period can be a non-integer number of clock cycles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_cycles: Option<f64>,
}

fn default_stripline_channels() -> u32 {
    4
}

/// Cavity resonator JSON schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resonator {
    /// Resonant frequency.
    ///
    /// A frequency of zero indicates a channel without resonator (for
    /// instance, a spare channel), which only carries the bandpass filter
    /// response.
    pub frequency: f64,
    /// Resonator 3 dB bandwidth.
    ///
    /// The quality factor of the resonator is `frequency / bandwidth`.
    pub bandwidth: f64,
}

impl Resonator {
    /// Gives the quality factor of the resonator.
    pub fn quality_factor(&self) -> f64 {
        if self.bandwidth > 0.0 {
            self.frequency / self.bandwidth
        } else {
            0.0
        }
    }
}

/// Bandpass filter JSON schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BandpassFilter {
    /// Passband center frequency.
    pub center: f64,
    /// Passband width.
    pub bandwidth: f64,
    /// Order of the lowpass prototype.
    pub order: u32,
    /// Chebyshev passband ripple in dB.
    ///
    /// If this is not present, a Butterworth prototype is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ripple_db: Option<f64>,
}

/// BPM simulation mode.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BpmMode {
    /// Cavity BPM.
    ///
    /// Each channel is a cavity resonator cascaded with the bandpass filter.
    Cavity,
    /// Stripline BPM.
    ///
    /// Each channel is only the bandpass filter.
    Stripline,
}

macro_rules! impl_str_conv {
    ($ty:ty, $($s:expr => $v:ident),*) => {
        impl std::str::FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, ()> {
                Ok(match s {
                    $(
                        $s => <$ty>::$v,
                    )*
                        _ => return Err(()),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", match self {
                    $(
                        <$ty>::$v => $s,
                    )*
                })
            }
        }
    }
}

impl_str_conv!(BpmMode,
               "cavity" => Cavity,
               "stripline" => Stripline);

impl Default for BankDesign {
    /// The design used for the simulator in the BPM firmware.
    ///
    /// The channels are mapped to spare, V, U and reference. The sampling
    /// frequency is 370 MHz. One beam cycle takes 370 * 1400 / 1300 clock
    /// cycles; the simulator period keeps its fractional part on top of 320
    /// cycles so that the simulator is frozen before the next trigger.
    fn default() -> BankDesign {
        BankDesign {
            sampling_frequency: 370.0,
            mode: BpmMode::Cavity,
            resonators: vec![
                Resonator {
                    frequency: 0.0,
                    bandwidth: 0.0,
                },
                Resonator {
                    frequency: 38.2,
                    bandwidth: 2.1,
                },
                Resonator {
                    frequency: 30.3,
                    bandwidth: 1.25,
                },
                Resonator {
                    frequency: 37.2,
                    bandwidth: 3.3,
                },
            ],
            stripline_channels: default_stripline_channels(),
            filter: BandpassFilter {
                center: (49.2 + 22.3) / 2.0,
                bandwidth: 49.2 - 22.3,
                order: 4,
                ripple_db: Some(0.5),
            },
            filter_tolerance: None,
            resonator_tolerance: None,
            period_cycles: Some(320.0 + 6.0 / 13.0),
        }
    }
}

/// Bank coefficients JSON schema.
///
/// This JSON schema contains the firmware coefficients synthesized for a bank
/// design, ready to be written to the simulator coefficient arrays.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BankCoefficients {
    /// Simulation mode of the bank.
    pub mode: BpmMode,
    /// Seed used for the per-channel frequency jitter.
    pub seed: u64,
    /// Polynomial approximation order.
    pub polynomial_order: u32,
    /// Coefficients of each channel.
    pub channels: Vec<ChannelCoefficients>,
}

/// Channel coefficients JSON schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelCoefficients {
    /// Number of complex first-order sections.
    pub sections: u32,
    /// Worst-case response of the polynomial evaluator.
    ///
    /// This is at most 1.0.
    pub max_poly_response: f64,
    /// Filter coefficients (numerator taps, B0 and B1/2 for each section).
    pub filter_coefficients: Vec<i32>,
    /// Interleaved polynomial coefficients.
    pub polynomial_coefficients: Vec<i32>,
    /// Validation summary, if validation was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,
}

/// Validation summary JSON schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    /// Lag used for the validation.
    pub lag: f64,
    /// Peak magnitude of the superposed fixed-point response.
    pub superposition_peak: i32,
    /// Peak magnitude of the worst single section.
    pub worst_section_peak: i32,
    /// Index of the worst section.
    pub worst_section: u32,
    /// Maximum deviation between the exact and the approximated responses.
    pub max_approximation_error: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_str_conv() {
        assert_eq!("cavity".parse::<BpmMode>(), Ok(BpmMode::Cavity));
        assert_eq!("stripline".parse::<BpmMode>(), Ok(BpmMode::Stripline));
        assert!("button".parse::<BpmMode>().is_err());
        assert_eq!(BpmMode::Stripline.to_string(), "stripline");
    }

    #[test]
    fn default_design_json() {
        let design = BankDesign::default();
        let json = serde_json::to_string(&design).unwrap();
        let parsed: BankDesign = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, design);
        assert_eq!(parsed.resonators.len(), 4);
        assert_eq!(parsed.resonators[0].quality_factor(), 0.0);
        assert!((parsed.resonators[1].quality_factor() - 38.2 / 2.1).abs() < 1e-12);
    }

    #[test]
    fn minimal_stripline_design() {
        let json = r#"{
            "sampling_frequency": 370.0,
            "mode": "Stripline",
            "filter": { "center": 35.75, "bandwidth": 26.9, "order": 4 }
        }"#;
        let design: BankDesign = serde_json::from_str(json).unwrap();
        assert_eq!(design.mode, BpmMode::Stripline);
        assert_eq!(design.stripline_channels, 4);
        assert!(design.resonators.is_empty());
        assert_eq!(design.filter.ripple_db, None);
        assert_eq!(design.period_cycles, None);
    }
}
