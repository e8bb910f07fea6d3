use std::{path::Path, process::ExitCode, time::Instant};

use pitchshift::{power, wav, PitchShiftConfig, PitchShifter};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let Some(file) = std::env::args().nth(1) else {
        eprintln!("usage: pitchshift <input.wav>");
        return ExitCode::from(2);
    };

    match run(Path::new(&file), &PitchShiftConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, config: &PitchShiftConfig) -> pitchshift::Result<()> {
    let (sample_rate, samples) = wav::load(input)?;
    let mut buf: Vec<f32> = samples.iter().map(|&x| wav::to_sample(x)).collect();
    tracing::info!(
        sample_rate,
        samples = buf.len(),
        rms = power(&buf),
        "loaded {}",
        input.display()
    );

    let start = Instant::now();
    let mut shifter = PitchShifter::new(config.frame_size(sample_rate), sample_rate)?;
    shifter.process_in_place(config.pitch_ratio, &mut buf);
    tracing::info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        rms = power(&buf),
        "shifted pitch by {}",
        config.pitch_ratio
    );

    let output = config.output_path(input);
    let samples: Vec<i16> = buf.iter().map(|&x| wav::from_sample(x)).collect();
    wav::save(&output, sample_rate, &samples)?;
    tracing::info!("wrote {}", output.display());
    Ok(())
}
