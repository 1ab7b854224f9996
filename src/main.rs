// src/main.rs
//! Ride Recorder - GPS route recording CLI

use clap::{Parser, Subcommand};
use ride_recorder::{
    config::RecorderConfig,
    display::{TerminalStatusDisplay, TrackStatus},
    error::{RecorderError, Result},
    geo::polyline_length_km,
    gps::{GpsdSource, LocationSource, NmeaSerialSource},
    persist::{FileRouteStore, RouteFormat},
    tracker::RouteRecorder,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

#[derive(Parser)]
#[command(name = "ride-recorder", version, about = "Record GPS routes from gpsd or a serial receiver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a route until Ctrl+C, then summarize and save it
    Record {
        /// Location source: "gpsd" or "serial"
        #[arg(long)]
        source: Option<String>,
        /// gpsd host
        #[arg(long)]
        host: Option<String>,
        /// gpsd port
        #[arg(long)]
        port: Option<u16>,
        /// Serial device path, e.g. /dev/ttyUSB0
        #[arg(long)]
        serial_port: Option<String>,
        /// Serial baudrate
        #[arg(long)]
        baudrate: Option<u32>,
        /// Directory finished routes are written to
        #[arg(long, default_value = "routes")]
        out: PathBuf,
        /// Output format: json, gpx, or geojson
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// List available serial ports
    Ports,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Record {
            source,
            host,
            port,
            serial_port,
            baudrate,
            out,
            format,
        } => {
            let mut config = RecorderConfig::load().unwrap_or_default();
            if let Some(source) = source {
                config.source_type = source;
            }
            if let Some(host) = host {
                config.gpsd_host = Some(host);
            }
            if let Some(port) = port {
                config.gpsd_port = Some(port);
            }
            if let Some(serial_port) = serial_port {
                config.serial_port = Some(serial_port);
            }
            if let Some(baudrate) = baudrate {
                config.serial_baudrate = Some(baudrate);
            }

            let route_format: RouteFormat = format.parse()?;
            record(config, out, route_format).await
        }
        Commands::Ports => list_serial_ports(),
    }
}

async fn record(config: RecorderConfig, out: PathBuf, format: RouteFormat) -> Result<()> {
    let (source, source_name) = open_source(&config).await?;

    let status = Arc::new(RwLock::new(TrackStatus {
        source: source_name.clone(),
        ..Default::default()
    }));
    let running = Arc::new(AtomicBool::new(true));

    let mut recorder = RouteRecorder::new(config);

    let track_status = Arc::clone(&status);
    recorder.set_on_track_update(move |points| {
        let mut status = track_status.write().unwrap();
        status.point_count = points.len();
        status.last_point = points.last().copied();
        status.distance_km = polyline_length_km(points);
    });

    let tick_status = Arc::clone(&status);
    recorder.set_on_tick(move |elapsed| {
        tick_status.write().unwrap().elapsed_secs = elapsed;
    });

    recorder.start(source.as_ref())?;
    status.write().unwrap().recording = true;
    println!("Recording from {} - press Ctrl+C to stop", source_name);

    // Ctrl+C ends the display loop, then the session is stopped and saved
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let display = TerminalStatusDisplay::new();
    display.run(Arc::clone(&status), running).await?;

    let store = FileRouteStore::new(out, format);
    match recorder.stop(&store).await {
        Ok(summary) => {
            println!("{}", summary.title);
            println!("  {}", summary.description);
            println!(
                "  {} over {} points, difficulty: {}",
                summary.distance_label,
                summary.points.len(),
                summary.difficulty.as_str()
            );
            Ok(())
        }
        Err(RecorderError::InsufficientTrackData) => {
            println!("Not enough track data recorded; nothing saved.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn open_source(config: &RecorderConfig) -> Result<(Box<dyn LocationSource>, String)> {
    match config.source_type.as_str() {
        "serial" => {
            let port = config
                .serial_port
                .clone()
                .ok_or_else(|| RecorderError::Other("No serial port configured".to_string()))?;
            let baudrate = config.serial_baudrate.unwrap_or(9600);
            println!("Opening GPS receiver on {} at {} baud...", port, baudrate);
            let source = NmeaSerialSource::open(&port, baudrate)?;
            Ok((Box::new(source), format!("serial {}", port)))
        }
        "gpsd" => {
            let host = config
                .gpsd_host
                .clone()
                .unwrap_or_else(|| "localhost".to_string());
            let port = config.gpsd_port.unwrap_or(2947);
            println!("Connecting to gpsd at {}:{}...", host, port);
            let source = GpsdSource::connect(&host, port).await?;
            Ok((Box::new(source), format!("gpsd {}:{}", host, port)))
        }
        other => Err(RecorderError::Other(format!(
            "Unknown source type: {}",
            other
        ))),
    }
}

/// List available serial ports
fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| RecorderError::Other(format!("Failed to list serial ports: {}", e)))?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
