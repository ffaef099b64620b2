use std::{env, time::Instant};

use hound::{WavReader, WavWriter};
use parfilt::{Coefficients, FilterState, SosFilter, filter_sequential};

const NUM_BLOCKS: usize = 64;
const BLOCK_LEN: usize = 8;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --a1=<coeff> --a2=<coeff> [--b1=<coeff>] [--b2=<coeff>] <input.wav> <output.wav>",
            args[0]
        );
        std::process::exit(1);
    }

    let mut coeffs = Coefficients {
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };
    let mut paths = Vec::new();

    for arg in &args[1..] {
        if let Some(value) = arg.strip_prefix("--a1=") {
            coeffs.a1 = parse_coeff("a1", value);
        } else if let Some(value) = arg.strip_prefix("--a2=") {
            coeffs.a2 = parse_coeff("a2", value);
        } else if let Some(value) = arg.strip_prefix("--b1=") {
            coeffs.b1 = parse_coeff("b1", value);
        } else if let Some(value) = arg.strip_prefix("--b2=") {
            coeffs.b2 = parse_coeff("b2", value);
        } else {
            paths.push(arg.clone());
        }
    }

    if paths.len() != 2 {
        eprintln!("Expected exactly one input and one output path");
        std::process::exit(1);
    }
    let input_path = &paths[0];
    let output_path = &paths[1];

    // Read input WAV file.
    let mut reader = WavReader::open(input_path).unwrap();
    let spec = reader.spec();

    println!(
        "Input: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap() as f64).collect(),
        hound::SampleFormat::Int => {
            // Convert integer samples to f64 in range [-1.0, 1.0]
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.unwrap() as f64 / max_value)
                .collect()
        }
    };

    let num_channels = spec.channels as usize;
    let num_frames = samples.len() / num_channels;
    println!("Input frames: {}", num_frames);

    let input_size_mib = (samples.len() * size_of::<f64>()) as f64 / (1024.0 * 1024.0);

    // Deinterleave, filter every channel on its own, reinterleave.
    let start = Instant::now();
    let mut filtered = vec![0.0f64; samples.len()];
    for channel in 0..num_channels {
        let channel_samples: Vec<f64> = (0..num_frames)
            .map(|frame| samples[frame * num_channels + channel])
            .collect();

        let channel_output = filter_channel(&channel_samples, coeffs);

        for (frame, value) in channel_output.into_iter().enumerate() {
            filtered[frame * num_channels + channel] = value;
        }
    }
    let elapsed = start.elapsed();

    let elapsed_secs = elapsed.as_secs_f64();
    let throughput_mib_per_sec = input_size_mib / elapsed_secs;
    println!(
        "Filtering took {:.3} ms ({:.2} MiB/s)",
        elapsed_secs * 1000.0,
        throughput_mib_per_sec
    );

    let output_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(output_path, output_spec).unwrap();

    for &sample in &filtered {
        writer.write_sample(sample as f32).unwrap();
    }

    writer.finalize().unwrap();

    println!("Done! Written to {output_path}");
}

fn parse_coeff(name: &str, value: &str) -> f64 {
    match value.parse::<f64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("Invalid value for --{name}: {value}");
            std::process::exit(1);
        }
    }
}

/// Filter one channel chunk by chunk, finishing the tail sequentially with
/// the carried state.
fn filter_channel(samples: &[f64], coeffs: Coefficients) -> Vec<f64> {
    let mut filter = SosFilter::new(NUM_BLOCKS, BLOCK_LEN, coeffs, FilterState::default())
        .expect("valid block shape");
    let chunk_size = filter.chunk_size();

    let mut output = Vec::with_capacity(samples.len());
    let mut chunks = samples.chunks_exact(chunk_size);

    for chunk in &mut chunks {
        output.extend_from_slice(&filter.process(chunk).expect("chunk size matches"));
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut state = filter.state();
        output.extend_from_slice(&filter_sequential(tail, coeffs, &mut state));
    }

    output
}
