//! Fixed settings of the command-line front end.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct PitchShiftConfig {
    /// Output pitch relative to input; below 1 lowers the pitch.
    pub pitch_ratio: f32,
    /// Analysis frame duration.
    pub frame_duration_ms: u32,
    /// Inserted before the input file's extension to name the output.
    pub output_suffix: String,
}

impl Default for PitchShiftConfig {
    fn default() -> Self {
        Self {
            pitch_ratio: 0.9,
            frame_duration_ms: 50,
            output_suffix: "_out".to_string(),
        }
    }
}

impl PitchShiftConfig {
    /// Frame length for `sample_rate`, rounded up to an even number of samples.
    pub fn frame_size(&self, sample_rate: u32) -> usize {
        let frame_size = sample_rate as usize * self.frame_duration_ms as usize / 1000;
        frame_size + frame_size % 2
    }

    /// `dir/name.ext` becomes `dir/name{suffix}.ext`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!("{}{}", stem, self.output_suffix);
        if let Some(ext) = input.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        input.with_file_name(name)
    }
}
