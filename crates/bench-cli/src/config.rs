//! Pipeline configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::{FrequencyGrid, TransferFunction};
use lib_types::units::{Hertz, Seconds};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run name, echoed into the summary.
    pub name: String,

    /// Input signal and time grid.
    pub input: InputConfig,

    /// Shared sampling clock.
    pub sampling: SamplingConfig,

    /// Filter ahead of the samplers.
    #[serde(default)]
    pub anti_alias: FilterStageConfig,

    /// Filter after the samplers.
    #[serde(default)]
    pub reconstruction: FilterStageConfig,

    #[serde(default)]
    pub sample_hold: StageToggle,

    #[serde(default)]
    pub natural: StageToggle,

    /// Frequency sweep used for the filter stages' Bode responses.
    #[serde(default)]
    pub bode: BodeConfig,
}

/// Input signal expression over `t` and its time grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    pub expression: String,

    #[serde(default)]
    pub t_start: f64,

    pub t_stop: f64,

    /// Grid spacing; defaults to a hundred points per sampling period.
    #[serde(default)]
    pub t_step: Option<f64>,
}

/// Sampling clock parameters shared by both samplers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Sampling frequency (Hz).
    pub frequency: f64,

    #[serde(default = "default_duty")]
    pub sample_hold_duty: f64,

    #[serde(default = "default_duty")]
    pub natural_duty: f64,
}

fn default_duty() -> f64 { 0.5 }

/// On/off switch for a sampler stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for StageToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool { true }

/// A filter stage: one of three ways to give the transfer function.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterStageConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Scale the stage to unit DC (or high-frequency) gain.
    #[serde(default)]
    pub normalize: bool,

    /// Rational expression in `s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Numerator coefficients, highest power first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerator: Option<Vec<f64>>,

    /// Denominator coefficients, highest power first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<Vec<f64>>,

    /// Zeros as `[re, im]` pairs (rad/s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeros: Option<Vec<[f64; 2]>>,

    /// Poles as `[re, im]` pairs (rad/s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poles: Option<Vec<[f64; 2]>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
}

/// Bode sweep parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodeConfig {
    #[serde(default = "default_start_decade")]
    pub start_decade: f64,

    #[serde(default = "default_stop_decade")]
    pub stop_decade: f64,

    #[serde(default = "default_points")]
    pub points: usize,

    #[serde(default)]
    pub db: bool,
}

fn default_start_decade() -> f64 { -2.0 }
fn default_stop_decade() -> f64 { 6.0 }
fn default_points() -> usize { 10_000 }

impl Default for BodeConfig {
    fn default() -> Self {
        Self {
            start_decade: default_start_decade(),
            stop_decade: default_stop_decade(),
            points: default_points(),
            db: false,
        }
    }
}

impl BodeConfig {
    pub fn grid(&self) -> FrequencyGrid {
        FrequencyGrid::Log {
            start_decade: self.start_decade,
            stop_decade: self.stop_decade,
            points: self.points,
        }
    }
}

fn to_complex(pairs: &[[f64; 2]]) -> Vec<Complex64> {
    pairs.iter().map(|[re, im]| Complex64::new(*re, *im)).collect()
}

impl FilterStageConfig {
    /// Build the stage's transfer function from whichever form was given.
    pub fn transfer_function(&self, label: &str) -> Result<TransferFunction> {
        match (
            &self.expression,
            (&self.numerator, &self.denominator),
            (&self.zeros, &self.poles),
        ) {
            (Some(text), (None, None), (None, None)) => {
                TransferFunction::from_expression(text, self.normalize)
                    .with_context(|| format!("{} expression {:?} is invalid", label, text))
            }
            (None, (Some(num), Some(den)), (None, None)) => {
                TransferFunction::from_nd(num, den, self.normalize)
                    .with_context(|| format!("{} coefficients are invalid", label))
            }
            (None, (None, None), (Some(zeros), Some(poles))) => Ok(TransferFunction::from_zpk(
                &to_complex(zeros),
                &to_complex(poles),
                self.gain.unwrap_or(1.0),
                self.normalize,
            )),
            _ => anyhow::bail!(
                "{} must give exactly one of: expression, numerator+denominator, zeros+poles+gain",
                label
            ),
        }
    }
}

impl PipelineConfig {
    pub fn sampling_frequency(&self) -> Hertz {
        Hertz(self.sampling.frequency)
    }

    /// Time step of the simulation grid.
    pub fn time_step(&self) -> Seconds {
        match self.input.t_step {
            Some(step) => Seconds(step),
            None => self.sampling_frequency().to_period() / 100.0,
        }
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content, path.extension().map_or(false, |e| e == "json"))?;

    validate_config(&config)?;

    Ok(config)
}

fn parse_config(content: &str, json: bool) -> Result<PipelineConfig> {
    if json {
        serde_json::from_str(content).with_context(|| "Failed to parse config as JSON")
    } else {
        toml::from_str(content).with_context(|| "Failed to parse config as TOML")
    }
}

/// Validate configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    let input = &config.input;
    if !(input.t_start >= 0.0) {
        anyhow::bail!("input.t_start must be non-negative (got {})", input.t_start);
    }
    if !(input.t_start < input.t_stop) {
        anyhow::bail!(
            "input.t_start must be below input.t_stop (got {} >= {})",
            input.t_start,
            input.t_stop
        );
    }

    let sampling = &config.sampling;
    if !(sampling.frequency > 0.0 && sampling.frequency.is_finite()) {
        anyhow::bail!("sampling.frequency must be positive (got {})", sampling.frequency);
    }
    for (label, duty) in [
        ("sampling.sample_hold_duty", sampling.sample_hold_duty),
        ("sampling.natural_duty", sampling.natural_duty),
    ] {
        if !(0.0..=1.0).contains(&duty) {
            anyhow::bail!("{} must be within [0, 1] (got {})", label, duty);
        }
    }

    if let Some(step) = input.t_step {
        if !(step > 0.0) {
            anyhow::bail!("input.t_step must be positive (got {})", step);
        }
    }

    // Each grid point becomes a sample; refuse grids that would not fit in memory
    let points = (input.t_stop - input.t_start) / config.time_step().0;
    if points > 1e8 {
        anyhow::bail!("time grid would hold {:.0} points; raise input.t_step", points);
    }

    if !(config.bode.points >= 1 && config.bode.start_decade <= config.bode.stop_decade) {
        anyhow::bail!(
            "bode sweep needs at least one point and start_decade <= stop_decade"
        );
    }

    for (label, stage) in [
        ("anti_alias", &config.anti_alias),
        ("reconstruction", &config.reconstruction),
    ] {
        if stage.enabled {
            stage.transfer_function(label)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPELINE: &str = r#"
name = "audio"

[input]
expression = "sin(2*pi*1000*t)"
t_stop = 0.01

[sampling]
frequency = 8000.0

[anti_alias]
enabled = true
normalize = true
expression = "1/(s/20000 + 1)"

[reconstruction]
enabled = true
zeros = []
poles = [[-25000.0, 0.0]]
gain = 25000.0

[natural]
enabled = false
"#;

    #[test]
    fn test_parse_toml() {
        let config = parse_config(PIPELINE, false).unwrap();
        validate_config(&config).unwrap();

        assert_eq!(config.name, "audio");
        assert!(config.sample_hold.enabled);
        assert!(!config.natural.enabled);
        assert_eq!(config.sampling.sample_hold_duty, 0.5);
        assert!((config.time_step().0 - 1.25e-6).abs() < 1e-15);
        assert_eq!(config.bode.points, 10_000);

        let tf = config.reconstruction.transfer_function("reconstruction").unwrap();
        assert_eq!(tf.poles().len(), 1);
        assert!((tf.evaluate(Complex64::new(0.0, 0.0)).re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "name": "json",
            "input": {"expression": "square(2*pi*50*t)", "t_stop": 0.1, "t_step": 1e-4},
            "sampling": {"frequency": 500.0},
            "anti_alias": {"enabled": true, "numerator": [1.0], "denominator": [1.0, 1.0]}
        }"#;
        let config = parse_config(json, true).unwrap();
        validate_config(&config).unwrap();
        assert!((config.time_step().0 - 1e-4).abs() < 1e-18);
        assert!(!config.reconstruction.enabled);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = parse_config(PIPELINE, false).unwrap();
        config.sampling.frequency = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = parse_config(PIPELINE, false).unwrap();
        config.sampling.natural_duty = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = parse_config(PIPELINE, false).unwrap();
        config.input.t_start = 0.02;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_filter_stage_needs_one_form() {
        let stage = FilterStageConfig {
            enabled: true,
            expression: Some("1/(s+1)".into()),
            numerator: Some(vec![1.0]),
            denominator: Some(vec![1.0, 1.0]),
            ..Default::default()
        };
        assert!(stage.transfer_function("anti_alias").is_err());

        let empty = FilterStageConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(empty.transfer_function("anti_alias").is_err());
    }
}
