//! indicatif rendering of workflow progress

use indicatif::{ProgressBar, ProgressStyle};
use tapecart_core::{Phase, Progress};

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Reading => "Reading",
        Phase::Writing => "Writing",
        Phase::Validating => "Validating",
    }
}

/// Create a progress bar with a phase label
fn create_progress_bar_with_phase(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Progress observer drawing one bar per workflow phase
pub struct IndicatifProgress {
    current_bar: Option<ProgressBar>,
    phase: Option<Phase>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            current_bar: None,
            phase: None,
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for IndicatifProgress {
    fn start(&mut self, phase: Phase, total_bytes: u64) {
        let label = phase_label(phase);
        self.phase = Some(phase);
        self.current_bar = Some(
            create_progress_bar_with_phase(total_bytes, label)
                .unwrap_or_else(|_| ProgressBar::new(total_bytes)),
        );
    }

    fn update(&mut self, done_bytes: u64) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(done_bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            let label = self.phase.take().map_or("Transfer", phase_label);
            pb.finish_with_message(format!("{} complete", label));
        }
    }
}

impl Drop for IndicatifProgress {
    // Leave a failed bar where it stopped instead of clearing it
    fn drop(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.abandon();
        }
    }
}
