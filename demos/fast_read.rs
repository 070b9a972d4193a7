// Fast mode example
//
// Lets the device average on its side and prints the single aggregate it
// returns, repeating a number of times.

use clap::Parser;
use lockin_rs::{
    Acquired, AcquisitionConfig, Averages, DeviceModel, FilterOrder, LockInAmp, ProtocolSettings,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fast_read")]
#[command(version = "1.0")]
#[command(about = "Repeated fast-mode lock-in readings")]
struct Args {
    /// Serial port of the device (auto-detected if omitted)
    #[arg(short, long)]
    port: Option<String>,

    /// Board model
    #[arg(short, long, default_value = "t35", value_parser = ["t35", "t40"])]
    model: String,

    /// Frequency count duration of the external reference in milliseconds
    #[arg(short, long, default_value_t = 5000)]
    duration: u32,

    /// Number of readings to take
    #[arg(short, long, default_value_t = 10)]
    repeat: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let model = match args.model.as_str() {
        "t40" => DeviceModel::Teensy40,
        _ => DeviceModel::Teensy35,
    };

    let config = AcquisitionConfig::external_reference(args.duration)
        .low_pass(5, FilterOrder::Second)
        .fast_mode()
        .build()?;

    let mut amp = LockInAmp::connect(args.port.as_deref(), model)?
        .with_settings(ProtocolSettings::default().with_silence_budget(Duration::from_secs(30)));
    println!("Connected to {}", model.as_str());

    for n in 1..=args.repeat {
        match amp.run_logged(&config).into_result() {
            Ok((Acquired::Fast(fast), measured)) => {
                let averages = Averages::from_fast(&fast, &model.calibration());
                println!(
                    "[{:>3}] ref {:>10} Hz | amplitude {:.4} V | phase {:.4} rad",
                    n,
                    measured.map_or("?".to_string(), |hz| format!("{:.2}", hz)),
                    averages.amplitude_volts,
                    averages.phase_radians
                );
            }
            Ok(_) => eprintln!("[{:>3}] unexpected normal-mode data", n),
            Err(e) => eprintln!("[{:>3}] {} ({:?})", n, e, e.kind()),
        }
    }

    amp.into_channel().close();
    Ok(())
}
