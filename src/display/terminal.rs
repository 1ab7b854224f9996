// src/display/terminal.rs
//! Terminal-based live recording status

use crate::error::{RecorderError, Result};
use crate::geo::TrackPoint;
use crate::tracker::summary::format_duration;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::time::sleep;

/// Shared snapshot the recorder hooks write and the display reads.
#[derive(Debug, Clone, Default)]
pub struct TrackStatus {
    pub recording: bool,
    pub elapsed_secs: u64,
    pub distance_km: f64,
    pub point_count: usize,
    pub last_point: Option<TrackPoint>,
    pub source: String,
}

pub struct TerminalStatusDisplay;

impl TerminalStatusDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Full-screen status loop; returns when `running` is cleared.
    pub async fn run(
        &self,
        status: Arc<RwLock<TrackStatus>>,
        running: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap).map_err(RecorderError::Io)?;

        while running.load(Ordering::Relaxed) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).map_err(RecorderError::Io)?;

            let snapshot = status.read().unwrap().clone();
            self.render(&mut stdout, &snapshot)?;

            stdout.flush().map_err(RecorderError::Io)?;
            sleep(Duration::from_secs(1)).await;
        }

        execute!(stdout, Show, EnableLineWrap).map_err(RecorderError::Io)?;
        println!("\nShutting down...");
        Ok(())
    }

    fn render(&self, stdout: &mut impl Write, status: &TrackStatus) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Ride Recorder - GPS Route Tracking"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(RecorderError::Io)?;

        let state = if status.recording {
            "RECORDING"
        } else {
            "waiting for fix source"
        };
        execute!(
            stdout,
            Print(format!("State: {} ({})\n\n", state, status.source))
        )
        .map_err(RecorderError::Io)?;

        self.render_session_section(stdout, status)?;
        self.render_position_section(stdout, status)?;

        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to stop and save"),
            Print("\n"),
            ResetColor
        )
        .map_err(RecorderError::Io)?;

        Ok(())
    }

    fn render_session_section(&self, stdout: &mut impl Write, status: &TrackStatus) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("SESSION:\n"),
            ResetColor
        )
        .map_err(RecorderError::Io)?;

        execute!(
            stdout,
            Print(format!(
                "  Elapsed:   {:>12}\n",
                format_duration(status.elapsed_secs)
            )),
            Print(format!("  Distance:  {:>9.2} km\n", status.distance_km)),
            Print(format!("  Points:    {:>12}\n\n", status.point_count))
        )
        .map_err(RecorderError::Io)?;

        Ok(())
    }

    fn render_position_section(&self, stdout: &mut impl Write, status: &TrackStatus) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("POSITION:\n"),
            ResetColor
        )
        .map_err(RecorderError::Io)?;

        match &status.last_point {
            Some(point) => {
                execute!(
                    stdout,
                    Print(format!("  Latitude:  {:>12.6}\n", point.latitude)),
                    Print(format!("  Longitude: {:>12.6}\n\n", point.longitude))
                )
                .map_err(RecorderError::Io)?;
            }
            None => {
                execute!(stdout, Print("  No fix accepted yet\n\n")).map_err(RecorderError::Io)?;
            }
        }

        Ok(())
    }
}

impl Default for TerminalStatusDisplay {
    fn default() -> Self {
        Self::new()
    }
}
