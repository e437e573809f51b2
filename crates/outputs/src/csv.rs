//! CSV file output
//!
//! Appends one row per cycle. The header is written before the first row
//! of each run, and rows are matched to it by column title. When a frame
//! brings new columns (a GPS that only gets a fix later) they are added
//! after the existing ones and the header is written again.

use crate::calibration;
use crate::print::metadata_lines;
use airpi_core::template;
use airpi_core::{Calibration, Frame, Output, PluginContext, PluginDescriptor, PluginInstance, PluginParams, Reading, RunMetadata};
use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("csvoutput", "CSV file")
    .description("Append readings to a CSV file")
    .required(&["outputdir", "outputfile"])
    .optional(&["calibration"]);

const FILE_DATE_FORMAT: &str = "%Y%m%d-%H%M";

/// Flatten a frame into `(column title, cell)` pairs
fn columns(frame: &Frame) -> Vec<(String, String)> {
    let mut cells = Vec::with_capacity(frame.len());
    for reading in frame {
        match reading {
            Reading::Value(r) => {
                let title = format!(
                    "{} {} ({}) ({})",
                    r.sensor,
                    r.name,
                    r.symbol,
                    r.reading_type.as_str()
                );
                let cell = r.value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string());
                cells.push((title, cell));
            }
            Reading::Location(l) => {
                for (axis, value) in [
                    ("Latitude", l.latitude),
                    ("Longitude", l.longitude),
                    ("Altitude", l.altitude),
                ] {
                    cells.push((format!("{} {} ({}) (sample)", l.sensor, l.name, axis), value.to_string()));
                }
            }
        }
    }
    cells
}

pub struct CsvOutput {
    path: PathBuf,
    file: BufWriter<File>,
    calibration: Option<Arc<Calibration>>,
    /// Column titles of the last header written
    header: Option<Vec<String>>,
}

impl CsvOutput {
    pub fn open(path: impl Into<PathBuf>, calibration: Option<Arc<Calibration>>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        log::info!("Writing CSV data to {}", path.display());
        Ok(Self {
            path,
            file: BufWriter::new(file),
            calibration,
            header: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&mut self, titles: &[String]) -> Result<()> {
        let mut line = String::from("\"Date and time\",\"Unix time\"");
        for title in titles {
            line.push_str(&format!(",\"{}\"", title));
        }
        writeln!(self.file, "{}", line)?;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let cells = columns(frame);
        let mut titles = self.header.take().unwrap_or_default();
        let known = titles.len();
        for (title, _) in &cells {
            if !titles.contains(title) {
                titles.push(title.clone());
            }
        }
        if known == 0 || titles.len() > known {
            if known > 0 {
                log::info!("{}: new columns, writing a new header", self.path.display());
            }
            self.write_header(&titles)?;
        }

        let by_title: HashMap<&str, &str> = cells.iter().map(|(t, c)| (t.as_str(), c.as_str())).collect();
        let unix_time = frame.sampled_at.timestamp_millis() as f64 / 1000.0;
        let mut line = format!("\"{}\",{}", frame.sampled_at.format("%Y-%m-%d %H:%M:%S%.6f"), unix_time);
        for title in &titles {
            line.push(',');
            line.push_str(by_title.get(title.as_str()).copied().unwrap_or(""));
        }
        self.header = Some(titles);
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}

impl Output for CsvOutput {
    fn output_data(&mut self, frame: &Frame) -> Result<bool> {
        match self.calibration.clone() {
            Some(cal) => self.write_frame(&cal.calibrate(frame))?,
            None => self.write_frame(frame)?,
        }
        Ok(true)
    }

    /// Metadata goes into the file itself; there is nothing for the banner
    fn output_metadata(&mut self, metadata: &RunMetadata) -> Option<String> {
        let result = metadata_lines(metadata)
            .iter()
            .try_for_each(|(label, value)| writeln!(self.file, "\"{}\",\"{}\"", label, value))
            .and_then(|_| self.file.flush());
        if let Err(e) = result {
            log::warn!("Failed to write metadata to {}: {}", self.path.display(), e);
        }
        None
    }
}

impl Drop for CsvOutput {
    fn drop(&mut self) {
        let _ = self.file.flush();
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let dir = params.require("outputdir")?;
    let name = params.require("outputfile")?;

    let mut values = HashMap::new();
    values.insert("date", Local::now().format(FILE_DATE_FORMAT).to_string());
    values.insert("hostname", context.metadata().pi_name.clone());
    let name = template::expand(name, &values);

    let output = CsvOutput::open(Path::new(dir).join(name), calibration::requested(params, context))?;
    Ok(PluginInstance::Output(Box::new(output)))
}
