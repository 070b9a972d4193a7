// Normal mode acquisition example
//
// Streams a full capture, prints trailing averages and optionally saves the
// series as CSV.

use clap::{Parser, ValueEnum};
use lockin_rs::export;
use lockin_rs::{
    trailing_averages, Acquired, AcquisitionConfig, DeviceModel, FilterOrder, LockInAmp,
    RunEvent, TrailingPercent,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    T35,
    T40,
}

#[derive(Parser)]
#[command(name = "acquire")]
#[command(version = "1.0")]
#[command(about = "Run one lock-in capture and report amplitude and phase")]
struct Args {
    /// Serial port of the device (auto-detected if omitted)
    #[arg(short, long)]
    port: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Model::T35)]
    model: Model,

    /// Use the internal reference at this frequency (Hz) instead of an external one
    #[arg(long)]
    internal_hz: Option<u32>,

    /// Frequency count duration for the external reference (ms)
    #[arg(long, default_value_t = 5000)]
    count_ms: u32,

    /// Sampling rate (Hz)
    #[arg(short, long, default_value_t = 10_000)]
    sample_rate: u32,

    /// Number of points to measure (max 15000)
    #[arg(short = 'n', long, default_value_t = 10_000)]
    points: u32,

    /// Low pass corner frequency (Hz)
    #[arg(long, default_value_t = 5)]
    cutoff: u32,

    /// Filter stages (1-4)
    #[arg(long, default_value_t = 1)]
    order: u32,

    /// Percent of the most recent points used to average
    #[arg(long, default_value_t = 75)]
    percent: u32,

    /// Save the series to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let model = match args.model {
        Model::T35 => DeviceModel::Teensy35,
        Model::T40 => DeviceModel::Teensy40,
    };

    let builder = match args.internal_hz {
        Some(hz) => AcquisitionConfig::internal_reference(hz),
        None => AcquisitionConfig::external_reference(args.count_ms),
    };
    let config = builder
        .sample_rate(args.sample_rate)
        .sample_count(args.points)
        .low_pass(args.cutoff, FilterOrder::try_from(args.order)?)
        .build()?;

    let mut amp = LockInAmp::connect(args.port.as_deref(), model)?;
    println!("------------------------");

    let outcome = amp.run(&config, &mut |event: &RunEvent| println!("{}", event));
    let (data, _) = outcome.into_result()?;

    let Acquired::Series { series, report } = data else {
        return Err("device answered with a fast-mode aggregate".into());
    };
    if report.shortfall() > 0 {
        println!("Could not read all lines, {} missing", report.shortfall());
    }

    let calibration = model.calibration();
    let mean_signal = series
        .iter()
        .map(|s| calibration.raw_to_voltage(s.signal))
        .sum::<f64>()
        / series.len().max(1) as f64;
    println!("Mean Input Signal: {} V", mean_signal);

    let averages = trailing_averages(
        &series,
        TrailingPercent::new(args.percent),
        &calibration,
    )?;
    println!("Average Measured Amplitude: {} V", averages.amplitude_volts);
    println!("Average Measured Phase: {} rad", averages.phase_radians);

    if let Some(path) = args.output {
        export::write_csv(&series, BufWriter::new(File::create(&path)?))?;
        println!("Saved {} samples to {}", series.len(), path.display());
    }

    Ok(())
}
