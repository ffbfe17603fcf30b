//! Pipeline orchestration.
//!
//! The input signal flows through five stages on one shared time grid:
//! input, anti-alias filter, sample-and-hold, natural sampling and
//! reconstruction filter. A disabled stage hands its input on unchanged.

use crate::config::{FilterStageConfig, PipelineConfig};
use anyhow::{Context, Result};
use lib_dsp::fft::centered_frequencies;
use lib_dsp::{BodeRequest, Sampler, SamplingMode, TransferFunction};
use lib_types::response::{BodeResponse, SpectralView};
use lib_types::units::Seconds;
use lib_types::waveform::{time_grid, Waveform};
use serde::Serialize;

/// Output of one pipeline stage.
#[derive(Clone, Debug, Serialize)]
pub struct StageResult {
    /// File-name friendly stage name.
    pub name: &'static str,

    pub enabled: bool,

    /// Time-domain output on the shared grid.
    pub output: Waveform,

    /// Centred spectrum of `output`.
    pub spectrum: SpectralView,

    /// Frequency response, filter stages only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bode: Option<BodeResponse>,

    /// Classification label, filter stages only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

/// Results of a full pipeline run.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineResults {
    pub name: String,
    pub time: Vec<f64>,
    pub stages: Vec<StageResult>,
}

/// A filter stage ready to run.
struct FilterStage {
    name: &'static str,
    transfer_function: Option<TransferFunction>,
}

impl FilterStage {
    fn new(name: &'static str, config: &FilterStageConfig) -> Result<Self> {
        let transfer_function = if config.enabled {
            Some(config.transfer_function(name)?)
        } else {
            None
        };
        Ok(Self {
            name,
            transfer_function,
        })
    }
}

/// Pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    input: Sampler,
    anti_alias: FilterStage,
    sample_hold: Sampler,
    natural: Sampler,
    reconstruction: FilterStage,
}

impl Pipeline {
    /// Build every stage from the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fs = config.sampling_frequency();

        let input = Sampler::try_new(fs, 0.5, SamplingMode::NoSample)?;

        let mut sample_hold =
            Sampler::try_new(fs, config.sampling.sample_hold_duty, SamplingMode::SampleAndHold)
                .context("Invalid sample-and-hold settings")?;
        sample_hold.set_enabled(config.sample_hold.enabled);

        let mut natural = Sampler::try_new(fs, config.sampling.natural_duty, SamplingMode::Natural)
            .context("Invalid natural sampling settings")?;
        natural.set_enabled(config.natural.enabled);

        let anti_alias = FilterStage::new("anti_alias", &config.anti_alias)?;
        let reconstruction = FilterStage::new("reconstruction", &config.reconstruction)?;

        Ok(Self {
            config,
            input,
            anti_alias,
            sample_hold,
            natural,
            reconstruction,
        })
    }

    /// Run the pipeline.
    pub fn run(&mut self) -> Result<PipelineResults> {
        tracing::info!("Starting pipeline: {}", self.config.name);

        let time = time_grid(
            Seconds(self.config.input.t_start),
            Seconds(self.config.input.t_stop),
            self.config.time_step(),
        );
        if time.is_empty() {
            anyhow::bail!("Time grid is empty");
        }
        tracing::info!(
            "Time grid: {} points, dt = {:.3e} s",
            time.len(),
            self.config.time_step().0
        );

        let signal = lib_expr::evaluate_signal(&self.config.input.expression, &time)
            .with_context(|| format!("Failed to evaluate input {:?}", self.config.input.expression))?;

        let request = BodeRequest {
            grid: self.config.bode.grid(),
            in_db: self.config.bode.db,
        };

        let mut stages = Vec::with_capacity(5);

        let signal = Waveform::new(signal, self.config.time_step(), Seconds(time[0]));

        let input = run_sampler(&mut self.input, "input", &signal, &time)?;
        let anti_alias = run_filter(&self.anti_alias, &request, &input.output, &time)?;
        let sample_hold = run_sampler(&mut self.sample_hold, "sample_hold", &anti_alias.output, &time)?;
        let natural = run_sampler(&mut self.natural, "natural", &sample_hold.output, &time)?;
        let reconstruction = run_filter(&self.reconstruction, &request, &natural.output, &time)?;

        stages.extend([input, anti_alias, sample_hold, natural, reconstruction]);

        for stage in &stages {
            tracing::debug!(
                stage = stage.name,
                enabled = stage.enabled,
                peak_to_peak = stage.output.peak_to_peak(),
                rms = stage.output.rms(),
                "Stage complete"
            );
        }

        tracing::info!("Pipeline complete");
        Ok(PipelineResults {
            name: self.config.name.clone(),
            time,
            stages,
        })
    }
}

fn run_sampler(
    sampler: &mut Sampler,
    name: &'static str,
    input: &Waveform,
    time: &[f64],
) -> Result<StageResult> {
    let output = sampler
        .sample(&input.samples, time)
        .with_context(|| format!("Stage {} failed", name))?;

    let spectrum = sampler
        .analysis()
        .map(|a| a.sampled_spectrum.clone())
        .unwrap_or_default();

    Ok(StageResult {
        name,
        enabled: sampler.is_enabled(),
        output: input.with_samples(output),
        spectrum,
        bode: None,
        classification: None,
    })
}

fn run_filter(
    stage: &FilterStage,
    request: &BodeRequest,
    input: &Waveform,
    time: &[f64],
) -> Result<StageResult> {
    let (output, bode, classification) = match &stage.transfer_function {
        Some(tf) => {
            let output = tf
                .simulate_input_signal(&input.samples, time)
                .with_context(|| format!("Stage {} failed to simulate", stage.name))?;
            let class = tf.classify();
            tracing::info!("{}: {}", stage.name, class.label);
            (output, Some(tf.bode(request)), Some(class.label))
        }
        None => (input.samples.clone(), None, None),
    };

    let spacing = if time.len() >= 2 { time[1] - time[0] } else { 1.0 };
    let spectrum = SpectralView::from_spectrum(
        centered_frequencies(time.len(), spacing),
        &TransferFunction::spectrum(&output)?,
    );

    Ok(StageResult {
        name: stage.name,
        enabled: stage.transfer_function.is_some(),
        output: input.with_samples(output),
        spectrum,
        bode,
        classification,
    })
}
