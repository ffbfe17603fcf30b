//! Sampling models driven by a periodic sampling clock.
//!
//! The clock is a square wave of frequency `fs` and duty cycle `dc`,
//! rescaled to `[0, 1]`:
//!
//! ```text
//! w(t) = 0.5·square(2π·fs·t, dc) + 0.5
//! ```
//!
//! | Mode              | Output                                              |
//! |-------------------|-----------------------------------------------------|
//! | `NoSample`        | input unchanged                                     |
//! | `Natural`         | `x[i]·w[i]`                                         |
//! | `SampleAndHold`   | last `x[i]` seen while `w[i] > 0.5`, from `x[0]`    |
//!
//! A disabled sampler passes its input through regardless of mode.

use crate::error::{DspError, DspResult};
use crate::fft::{centered_frequencies, FftEngine};
use lib_types::response::SpectralView;
use lib_types::units::Hertz;
use lib_types::waveform::square;
use tracing::debug;

/// How the input is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingMode {
    /// Zero-order hold of the input during the high phase of the clock.
    SampleAndHold,
    /// Amplitude modulation of the input by the clock.
    Natural,
    /// Pass-through.
    NoSample,
}

impl TryFrom<u8> for SamplingMode {
    type Error = DspError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::SampleAndHold),
            1 => Ok(Self::Natural),
            2 => Ok(Self::NoSample),
            _ => Err(DspError::InvalidConfig(format!(
                "sampling mode index {} out of range 0..=2",
                index
            ))),
        }
    }
}

/// Everything computed by the last [`Sampler::sample`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingAnalysis {
    /// Time vector the input was sampled on.
    pub time: Vec<f64>,

    /// Centred frequency axis shared by both spectra.
    pub frequency_hz: Vec<f64>,

    /// Sampling clock in `[0, 1]`.
    pub waveform: Vec<f64>,

    /// Spectrum of the sampling clock.
    pub waveform_spectrum: SpectralView,

    /// Sampled output.
    pub sampled: Vec<f64>,

    /// Spectrum of the sampled output.
    pub sampled_spectrum: SpectralView,
}

/// A sampling stage.
#[derive(Clone, Debug)]
pub struct Sampler {
    frequency: Hertz,
    duty_cycle: f64,
    mode: SamplingMode,
    enabled: bool,
    analysis: Option<SamplingAnalysis>,
    /// Reused across calls; pipelines resample the same grid length.
    spectra: FftEngine,
}

impl Sampler {
    /// Create an enabled sampler, validating `fs > 0` and `0 ≤ dc ≤ 1`.
    pub fn try_new(frequency: Hertz, duty_cycle: f64, mode: SamplingMode) -> DspResult<Self> {
        validate_frequency(frequency)?;
        validate_duty_cycle(duty_cycle)?;
        Ok(Self {
            frequency,
            duty_cycle,
            mode,
            enabled: true,
            analysis: None,
            spectra: FftEngine::new(),
        })
    }

    /// Create an enabled sampler.
    ///
    /// # Panics
    ///
    /// Panics if `fs ≤ 0` or `dc` is outside `[0, 1]`.
    pub fn new(frequency: Hertz, duty_cycle: f64, mode: SamplingMode) -> Self {
        match Self::try_new(frequency, duty_cycle, mode) {
            Ok(sampler) => sampler,
            Err(e) => panic!("invalid sampler configuration: {}", e),
        }
    }

    pub fn frequency(&self) -> Hertz {
        self.frequency
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_frequency(&mut self, frequency: Hertz) -> DspResult<()> {
        validate_frequency(frequency)?;
        self.frequency = frequency;
        Ok(())
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: f64) -> DspResult<()> {
        validate_duty_cycle(duty_cycle)?;
        self.duty_cycle = duty_cycle;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: SamplingMode) {
        self.mode = mode;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Results of the last [`sample`](Self::sample) call.
    pub fn analysis(&self) -> Option<&SamplingAnalysis> {
        self.analysis.as_ref()
    }

    /// Sampling clock values at each time point.
    pub fn waveform(&self, time: &[f64]) -> Vec<f64> {
        let omega = self.frequency.angular();
        time.iter()
            .map(|&t| 0.5 * square(omega * t, self.duty_cycle) + 0.5)
            .collect()
    }

    /// Sample `input` on `time` and return the sampled signal.
    ///
    /// The clock, both spectra and the output are stored as a fresh
    /// [`SamplingAnalysis`], replacing the previous one. The frequency axis
    /// uses the spacing of the first two time points.
    pub fn sample(&mut self, input: &[f64], time: &[f64]) -> DspResult<Vec<f64>> {
        if input.len() != time.len() {
            return Err(DspError::LengthMismatch {
                expected: time.len(),
                actual: input.len(),
            });
        }
        if input.is_empty() {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }

        let spacing = if time.len() >= 2 { time[1] - time[0] } else { 1.0 };
        if !(spacing > 0.0) {
            return Err(DspError::NonMonotonicTime { index: 1 });
        }

        debug!(
            fs = self.frequency.0,
            duty = self.duty_cycle,
            mode = ?self.mode,
            enabled = self.enabled,
            samples = input.len(),
            "Sampling signal"
        );

        let frequency_hz = centered_frequencies(time.len(), spacing);
        let waveform = self.waveform(time);

        let sampled: Vec<f64> = match (self.enabled, self.mode) {
            (false, _) | (true, SamplingMode::NoSample) => input.to_vec(),
            (true, SamplingMode::Natural) => input
                .iter()
                .zip(waveform.iter())
                .map(|(x, w)| x * w)
                .collect(),
            (true, SamplingMode::SampleAndHold) => {
                let mut held = input[0];
                input
                    .iter()
                    .zip(waveform.iter())
                    .map(|(&x, &w)| {
                        if w > 0.5 {
                            held = x;
                        }
                        held
                    })
                    .collect()
            }
        };

        let waveform_spectrum = self.spectra.centered_spectrum(&waveform)?;
        let waveform_spectrum = SpectralView::from_spectrum(frequency_hz.clone(), &waveform_spectrum);
        let sampled_spectrum = self.spectra.centered_spectrum(&sampled)?;
        let sampled_spectrum = SpectralView::from_spectrum(frequency_hz.clone(), &sampled_spectrum);

        self.analysis = Some(SamplingAnalysis {
            time: time.to_vec(),
            frequency_hz,
            waveform,
            waveform_spectrum,
            sampled: sampled.clone(),
            sampled_spectrum,
        });

        Ok(sampled)
    }
}

fn validate_frequency(frequency: Hertz) -> DspResult<()> {
    if frequency.0 > 0.0 && frequency.0.is_finite() {
        Ok(())
    } else {
        Err(DspError::InvalidConfig(format!(
            "sampling frequency must be positive, got {} Hz",
            frequency.0
        )))
    }
}

fn validate_duty_cycle(duty_cycle: f64) -> DspResult<()> {
    if (0.0..=1.0).contains(&duty_cycle) {
        Ok(())
    } else {
        Err(DspError::InvalidConfig(format!(
            "duty cycle must be within [0, 1], got {}",
            duty_cycle
        )))
    }
}

/// Zero-order-hold reconstruction of sparse samples on a dense grid.
///
/// For each dense time, the cursor first advances past every sparse sample
/// whose time has been reached, then the value under the cursor is held.
/// Dense times before the first sparse sample take the first value.
pub fn sample_and_hold(
    sparse_time: &[f64],
    sparse_values: &[f64],
    dense_time: &[f64],
) -> DspResult<Vec<f64>> {
    if sparse_time.len() != sparse_values.len() {
        return Err(DspError::LengthMismatch {
            expected: sparse_time.len(),
            actual: sparse_values.len(),
        });
    }
    if sparse_time.is_empty() {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }
    if let Some(index) = sparse_time.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(DspError::NonMonotonicTime { index: index + 1 });
    }

    let mut cursor = 0;
    Ok(dense_time
        .iter()
        .map(|&t| {
            while cursor + 1 < sparse_time.len() && t >= sparse_time[cursor + 1] {
                cursor += 1;
            }
            sparse_values[cursor]
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (0..50).map(|i| i as f64 * 0.02).collect()
    }

    #[test]
    fn test_pass_through_no_sample_and_disabled() {
        let t = grid();
        let x: Vec<f64> = t.iter().map(|t| (7.0 * t).sin() + 0.3).collect();

        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::NoSample);
        assert_eq!(sampler.sample(&x, &t).unwrap(), x);

        for mode in [SamplingMode::Natural, SamplingMode::SampleAndHold] {
            let mut sampler = Sampler::new(Hertz(10.0), 0.5, mode);
            sampler.set_enabled(false);
            assert_eq!(sampler.sample(&x, &t).unwrap(), x);
        }

        // A single sample also passes through
        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::NoSample);
        assert_eq!(sampler.sample(&[4.0], &[0.0]).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_sample_and_hold_follows_clock() {
        let t = grid();
        let x: Vec<f64> = t.iter().map(|t| 1.0 + t).collect();

        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::SampleAndHold);
        let y = sampler.sample(&x, &t).unwrap();
        let w = sampler.analysis().unwrap().waveform.clone();

        assert_eq!(y.len(), x.len());
        assert_eq!(y[0], x[0]);
        for i in 1..y.len() {
            if w[i] > 0.5 {
                assert_eq!(y[i], x[i]);
            } else {
                assert_eq!(y[i], y[i - 1], "held value changed at low clock index {}", i);
            }
        }

        // At the first high sample of each period the output equals the input
        for i in 1..w.len() {
            if w[i] > 0.5 && w[i - 1] <= 0.5 {
                assert_eq!(y[i], x[i]);
            }
        }

        // 50% duty: roughly half the clock samples are high
        let high = w.iter().filter(|&&v| v > 0.5).count();
        assert!((20..=30).contains(&high), "high samples: {}", high);
    }

    #[test]
    fn test_natural_sampling_multiplies() {
        let t = grid();
        let x: Vec<f64> = t.iter().map(|t| 2.0 - t).collect();
        let mut sampler = Sampler::new(Hertz(10.0), 0.3, SamplingMode::Natural);
        let y = sampler.sample(&x, &t).unwrap();
        let w = &sampler.analysis().unwrap().waveform;
        for i in 0..x.len() {
            assert_eq!(y[i], x[i] * w[i]);
            assert!(w[i] == 0.0 || w[i] == 1.0);
        }
    }

    #[test]
    fn test_analysis_lengths() {
        let t = grid();
        let x = vec![1.0; t.len()];
        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::SampleAndHold);
        sampler.sample(&x, &t).unwrap();

        let analysis = sampler.analysis().unwrap();
        let n = t.len();
        assert_eq!(analysis.frequency_hz.len(), n);
        assert_eq!(analysis.waveform_spectrum.len(), n);
        assert_eq!(analysis.waveform_spectrum.group_delay.len(), n);
        assert_eq!(analysis.sampled_spectrum.magnitude.len(), n);
        // n = 50, spacing 0.02 s: axis runs from -25 Hz in 1 Hz steps
        assert!((analysis.frequency_hz[0] + 25.0).abs() < 1e-9);
        assert!((analysis.frequency_hz[1] - analysis.frequency_hz[0] - 1.0).abs() < 1e-9);
        // Constant input: all energy at DC
        assert!((analysis.sampled_spectrum.magnitude[n / 2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_analysis_replaced_each_call() {
        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::Natural);
        sampler.sample(&[1.0, 2.0, 3.0], &[0.0, 0.01, 0.02]).unwrap();
        sampler.sample(&[1.0, 2.0], &[0.0, 0.01]).unwrap();
        assert_eq!(sampler.analysis().unwrap().time, vec![0.0, 0.01]);
    }

    #[test]
    fn test_repeated_sampling_matches() {
        let t = grid();
        let x: Vec<f64> = t.iter().map(|t| (3.0 * t).cos()).collect();
        let mut sampler = Sampler::new(Hertz(10.0), 0.4, SamplingMode::SampleAndHold);

        let first = sampler.sample(&x, &t).unwrap();
        let first_mag = sampler.analysis().unwrap().sampled_spectrum.magnitude.clone();
        let second = sampler.sample(&x, &t).unwrap();
        assert_eq!(first, second);

        let mut copy = sampler.clone();
        let third = copy.sample(&x, &t).unwrap();
        assert_eq!(first, third);

        for analysis in [sampler.analysis().unwrap(), copy.analysis().unwrap()] {
            for (a, b) in analysis.sampled_spectrum.magnitude.iter().zip(&first_mag) {
                assert!((a - b).abs() < 1e-12);
            }
        }

        // A different grid length on the same sampler plans a new transform
        sampler.sample(&x[..37], &t[..37]).unwrap();
        assert_eq!(sampler.analysis().unwrap().sampled_spectrum.len(), 37);
    }

    #[test]
    fn test_configuration_validation() {
        assert!(matches!(
            Sampler::try_new(Hertz(0.0), 0.5, SamplingMode::Natural),
            Err(DspError::InvalidConfig(_))
        ));
        assert!(matches!(
            Sampler::try_new(Hertz(10.0), 1.5, SamplingMode::Natural),
            Err(DspError::InvalidConfig(_))
        ));
        assert!(matches!(SamplingMode::try_from(3), Err(DspError::InvalidConfig(_))));
        assert_eq!(SamplingMode::try_from(0).unwrap(), SamplingMode::SampleAndHold);
        assert_eq!(SamplingMode::try_from(1).unwrap(), SamplingMode::Natural);
        assert_eq!(SamplingMode::try_from(2).unwrap(), SamplingMode::NoSample);

        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::Natural);
        assert!(sampler.set_duty_cycle(-0.1).is_err());
        assert_eq!(sampler.duty_cycle(), 0.5);
        assert!(sampler.set_frequency(Hertz(-1.0)).is_err());
        assert_eq!(sampler.frequency(), Hertz(10.0));
    }

    #[test]
    #[should_panic]
    fn test_new_panics_on_bad_duty() {
        let _ = Sampler::new(Hertz(10.0), 2.0, SamplingMode::Natural);
    }

    #[test]
    fn test_sample_errors() {
        let mut sampler = Sampler::new(Hertz(10.0), 0.5, SamplingMode::Natural);
        assert!(matches!(
            sampler.sample(&[1.0], &[0.0, 1.0]),
            Err(DspError::LengthMismatch { .. })
        ));
        assert!(matches!(
            sampler.sample(&[], &[]),
            Err(DspError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_sample_and_hold_reconstruction() {
        let y = sample_and_hold(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0], &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5])
            .unwrap();
        assert_eq!(y, vec![5.0, 5.0, 6.0, 6.0, 7.0, 7.0]);
    }

    #[test]
    fn test_sample_and_hold_unaligned_grid() {
        let y = sample_and_hold(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0], &[-0.5, 0.9, 1.1, 3.7]).unwrap();
        assert_eq!(y, vec![5.0, 5.0, 6.0, 7.0]);

        assert!(matches!(
            sample_and_hold(&[0.0, 0.0], &[1.0, 2.0], &[0.0]),
            Err(DspError::NonMonotonicTime { index: 1 })
        ));
    }
}
