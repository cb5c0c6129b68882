//! Tab-separated metric log (`charts.txt`).
//!
//! One header row, then one row per recorded sub-step. The file is consumed
//! by external comparison/plotting scripts, never read back by the adapter.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

const HEADER: &str = "AvgTravelTime\tAvgSpeed\tNumVehicles\tNumWaitingVehicles\tNumRunningVehicles";

/// One recorded sub-step.
#[derive(Debug, Clone, Copy)]
pub struct ChartRow {
    pub average_travel_time: f64,
    pub average_speed: f64,
    pub vehicles: u32,
    pub waiting_vehicles: u32,
    pub running_vehicles: u32,
}

/// Append-only writer for `charts.txt`.
pub struct ChartWriter {
    writer: BufWriter<File>,
}

impl ChartWriter {
    /// Creates the file and writes the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", HEADER)?;
        Ok(Self { writer })
    }

    /// Appends one row.
    pub fn record(&mut self, row: &ChartRow) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}",
            row.average_travel_time,
            row.average_speed,
            row.vehicles,
            row.waiting_vehicles,
            row.running_vehicles
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.txt");

        let mut charts = ChartWriter::create(&path).unwrap();
        charts
            .record(&ChartRow {
                average_travel_time: 12.5,
                average_speed: 6.25,
                vehicles: 10,
                waiting_vehicles: 4,
                running_vehicles: 6,
            })
            .unwrap();
        charts.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(lines.next(), Some("12.5\t6.25\t10\t4\t6"));
        assert_eq!(lines.next(), None);
    }
}
