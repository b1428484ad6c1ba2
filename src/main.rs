use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use homemeter_rs::p1::{decode_capture, FrameOutcome};
use homemeter_rs::{init_logger, log_info, MeasurementSink, OutputFormat, P1Config, WriterSink};
use std::path::PathBuf;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "homemeter-cli")]
#[command(about = "Read DHT22, water meter and DSMR P1 inputs")]
struct Cli {
    /// Output encoding for measurements
    #[arg(short, long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Line,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => OutputFormat::Json,
            Format::Line => OutputFormat::LineProtocol,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Read a DHT22 sensor (requires the raspberry-pi feature)
    Dht22 {
        #[arg(long, default_value = "22")]
        pin: u8,
        /// Seconds between readings
        #[arg(long, default_value = "10")]
        interval: u64,
    },
    /// Count water meter pulses (requires the raspberry-pi feature)
    Watermeter {
        #[arg(long, default_value = "17")]
        pin: u8,
    },
    /// Read telegrams from a P1 serial port
    P1 {
        #[arg(short, long, default_value = "/dev/ttyUSB0")]
        port: String,
        #[arg(short, long, default_value = "115200")]
        baud: u32,
    },
    /// Decode a recorded P1 capture file
    Decode { file: PathBuf },
}

fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_info("Interrupted, shutting down");
            let _ = tx.send(true);
        }
    });
    rx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut sink = WriterSink::new(std::io::stdout(), cli.format.into());

    match cli.command {
        Commands::Dht22 { pin, interval } => {
            let config = homemeter_rs::Dht22Config {
                pin,
                poll_interval: std::time::Duration::from_secs(interval),
            };
            run_dht22(&config, &mut sink).await?;
        }
        Commands::Watermeter { pin } => {
            let config = homemeter_rs::WatermeterConfig { pin };
            run_watermeter(&config, &mut sink).await?;
        }
        Commands::P1 { port, baud } => {
            let config = P1Config { port, baud };
            let stats = homemeter_rs::read_p1(&config, &mut sink, shutdown_on_ctrl_c())
                .await
                .with_context(|| format!("reading P1 telegrams from {}", config.port))?;
            log_info(&format!("P1 session ended: {} telegrams", stats.frames_ok));
        }
        Commands::Decode { file } => {
            let outcomes = decode_capture(&file)
                .with_context(|| format!("decoding capture {}", file.display()))?;
            for outcome in outcomes {
                match outcome {
                    FrameOutcome::Packet(packet) => sink.add_fields(packet.to_measurement()),
                    FrameOutcome::Rejected(error) => sink.add_error(&error),
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "raspberry-pi")]
async fn run_dht22(
    config: &homemeter_rs::Dht22Config,
    sink: &mut WriterSink<std::io::Stdout>,
) -> anyhow::Result<()> {
    homemeter_rs::read_dht22(config, sink, shutdown_on_ctrl_c())
        .await
        .with_context(|| format!("reading DHT22 on GPIO {}", config.pin))?;
    Ok(())
}

#[cfg(not(feature = "raspberry-pi"))]
async fn run_dht22(
    _config: &homemeter_rs::Dht22Config,
    _sink: &mut WriterSink<std::io::Stdout>,
) -> anyhow::Result<()> {
    anyhow::bail!("GPIO support not compiled in; rebuild with --features raspberry-pi")
}

#[cfg(feature = "raspberry-pi")]
async fn run_watermeter(
    config: &homemeter_rs::WatermeterConfig,
    sink: &mut WriterSink<std::io::Stdout>,
) -> anyhow::Result<()> {
    homemeter_rs::read_watermeter(config, sink, shutdown_on_ctrl_c())
        .await
        .with_context(|| format!("counting pulses on GPIO {}", config.pin))?;
    Ok(())
}

#[cfg(not(feature = "raspberry-pi"))]
async fn run_watermeter(
    _config: &homemeter_rs::WatermeterConfig,
    _sink: &mut WriterSink<std::io::Stdout>,
) -> anyhow::Result<()> {
    anyhow::bail!("GPIO support not compiled in; rebuild with --features raspberry-pi")
}
