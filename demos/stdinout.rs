// parec -r --raw --format=s16ne --channels=1 --rate=44100 | cargo run --release --example stdinout 2> /dev/null | pacat --raw --format=s16ne --channels=1 --rate=44100

use std::io::{Read, Write};

use pitchshift::{wav, PitchShiftConfig, PitchShifter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let sample_rate = 44100;
    let config = PitchShiftConfig::default();
    let mut shifter = PitchShifter::<f32>::new(config.frame_size(sample_rate), sample_rate)?;
    tracing::info!(latency = shifter.latency(), "streaming");

    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut bytes = vec![0u8; 2 * 1024];
    let mut pending = None;
    loop {
        let size = stdin.read(&mut bytes)?;
        if size == 0 {
            break;
        }

        let mut chunk = Vec::with_capacity(size + 1);
        chunk.extend(pending.take());
        chunk.extend_from_slice(&bytes[..size]);
        if chunk.len() % 2 == 1 {
            pending = chunk.pop();
        }

        let mut buf: Vec<f32> = chunk
            .chunks_exact(2)
            .map(|c| wav::to_sample(i16::from_ne_bytes([c[0], c[1]])))
            .collect();
        shifter.process_in_place(config.pitch_ratio, &mut buf);

        let out: Vec<u8> = buf
            .iter()
            .flat_map(|&x| wav::from_sample(x).to_ne_bytes())
            .collect();
        stdout.write_all(&out)?;
        stdout.flush()?;
    }
    Ok(())
}
