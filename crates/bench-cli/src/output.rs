//! Result output formatting and writing.

use crate::orchestrator::{PipelineResults, StageResult};
use crate::OutputFormat;
use anyhow::Result;
use lib_types::response::BodeResponse;
use std::io::Write;
use std::path::Path;

/// Write pipeline results to the output directory.
pub fn write_results(results: &PipelineResults, output_dir: &Path, format: OutputFormat) -> Result<()> {
    for stage in &results.stages {
        let time_path = output_dir.join(format!("{}_time.csv", stage.name));
        let mut f = std::fs::File::create(&time_path)?;
        writeln!(f, "time_s,value")?;
        for (t, v) in results.time.iter().zip(stage.output.samples.iter()) {
            writeln!(f, "{},{}", t, v)?;
        }

        let spectrum_path = output_dir.join(format!("{}_spectrum.csv", stage.name));
        let mut f = std::fs::File::create(&spectrum_path)?;
        writeln!(f, "frequency_hz,magnitude,phase_deg,group_delay")?;
        let s = &stage.spectrum;
        for i in 0..s.len() {
            writeln!(
                f,
                "{},{},{},{}",
                s.frequency_hz[i], s.magnitude[i], s.phase_deg[i], s.group_delay[i]
            )?;
        }

        if let Some(bode) = &stage.bode {
            let bode_path = output_dir.join(format!("{}_bode.csv", stage.name));
            let mut f = std::fs::File::create(&bode_path)?;
            write_bode_csv(&mut f, bode)?;
        }

        tracing::debug!("Wrote stage {} to {:?}", stage.name, output_dir);
    }

    let extension = match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
    };
    let summary_path = output_dir.join(format!("summary.{}", extension));
    let mut f = std::fs::File::create(&summary_path)?;

    match format {
        OutputFormat::Text => {
            writeln!(f, "Filter-Bench Pipeline Summary")?;
            writeln!(f, "=============================")?;
            writeln!(f)?;
            writeln!(f, "Name:    {}", results.name)?;
            writeln!(f, "Samples: {}", results.time.len())?;
            writeln!(f, "Duration: {:.6e} s", duration_s(results))?;
            writeln!(f)?;
            for stage in &results.stages {
                writeln!(f, "{}", text_line(stage))?;
            }
        }
        OutputFormat::Json => {
            let stages: Vec<_> = results
                .stages
                .iter()
                .map(|stage| {
                    serde_json::json!({
                        "name": stage.name,
                        "enabled": stage.enabled,
                        "peak_to_peak": stage.output.peak_to_peak(),
                        "rms": stage.output.rms(),
                        "spectral_peak_hz": stage.spectrum.peak().map(|(f, _)| f),
                        "classification": stage.classification,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "name": results.name,
                "samples": results.time.len(),
                "duration_s": duration_s(results),
                "stages": stages,
            });
            writeln!(f, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(f, "stage,enabled,peak_to_peak,rms,spectral_peak_hz,classification")?;
            for stage in &results.stages {
                writeln!(
                    f,
                    "{},{},{},{},{},{}",
                    stage.name,
                    stage.enabled,
                    stage.output.peak_to_peak(),
                    stage.output.rms(),
                    stage.spectrum.peak().map_or(f64::NAN, |(freq, _)| freq),
                    stage.classification.as_deref().unwrap_or("")
                )?;
            }
        }
    }

    tracing::info!("Wrote summary to {:?}", summary_path);

    Ok(())
}

/// Write a Bode response as CSV.
pub fn write_bode_csv(w: &mut impl Write, bode: &BodeResponse) -> Result<()> {
    let gain_header = if bode.in_db { "gain_db" } else { "gain" };
    writeln!(w, "frequency_hz,{},phase_deg,group_delay_s", gain_header)?;
    for i in 0..bode.len() {
        writeln!(
            w,
            "{},{},{},{}",
            bode.frequency_hz[i], bode.gain[i], bode.phase_deg[i], bode.group_delay[i]
        )?;
    }
    Ok(())
}

/// Span of the shared time grid, one step past the last sample.
fn duration_s(results: &PipelineResults) -> f64 {
    results.stages.first().map_or(0.0, |stage| stage.output.duration().0)
}

fn text_line(stage: &StageResult) -> String {
    let state = if stage.enabled { "on " } else { "off" };
    let mut line = format!(
        "  {:<15} [{}] p-p {:.6}  rms {:.6}",
        stage.name,
        state,
        stage.output.peak_to_peak(),
        stage.output.rms()
    );
    if let Some(label) = &stage.classification {
        line.push_str(&format!("  ({})", label));
    }
    line
}

/// Print results to stdout.
pub fn print_results(results: &PipelineResults) {
    println!("\n=== Pipeline Results: {} ===\n", results.name);
    for stage in &results.stages {
        println!("{}", text_line(stage));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bode_csv_layout() {
        let bode = BodeResponse {
            frequency_hz: vec![1.0, 10.0],
            gain: vec![0.0, -3.0],
            phase_deg: vec![-1.0, -45.0],
            group_delay: vec![1e-3, 5e-4],
            in_db: true,
        };
        let mut buf = Vec::new();
        write_bode_csv(&mut buf, &bode).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "frequency_hz,gain_db,phase_deg,group_delay_s");
        assert_eq!(lines[2], "10,-3,-45,0.0005");
        assert_eq!(lines.len(), 3);
    }
}
