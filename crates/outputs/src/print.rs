//! Console output
//!
//! `format = friendly` prints one aligned line per reading followed by a
//! rule; any other format prints a single CSV row per cycle.

use crate::calibration;
use airpi_core::{Calibration, Frame, Output, PluginContext, PluginDescriptor, PluginInstance, PluginParams, Reading, RunMetadata};
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("print", "Print")
    .description("Print readings to the terminal")
    .required(&["format"])
    .optional(&["calibration"]);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LABEL_WIDTH: usize = 17;
const RULE: &str = "==========================================================";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Friendly,
    Csv,
}

/// Round for display: whole numbers above 10000, one decimal above 1000,
/// two below.
pub fn display_value(value: Option<f64>) -> String {
    match value {
        None => "None".to_string(),
        Some(v) if v > 10000.0 => format!("{}", v.round() as i64),
        Some(v) if v > 1000.0 => format!("{}", (v * 10.0).round() / 10.0),
        Some(v) => format!("{}", (v * 100.0).round() / 100.0),
    }
}

/// The metadata banner lines
pub fn metadata_lines(metadata: &RunMetadata) -> [(&'static str, String); 4] {
    [
        ("Run started", metadata.start_time_text()),
        ("Operator", metadata.operator.clone()),
        ("Raspberry Pi name", metadata.pi_name.clone()),
        ("Raspberry Pi ID", metadata.pi_id.clone()),
    ]
}

pub struct PrintOutput<W: Write + Send> {
    format: Format,
    calibration: Option<Arc<Calibration>>,
    out: W,
}

impl<W: Write + Send> PrintOutput<W> {
    fn render(&self, frame: &Frame) -> String {
        let time = frame.sampled_at.format(TIME_FORMAT);
        match self.format {
            Format::Csv => {
                let mut line = format!("\"{}\"", time);
                for reading in frame {
                    line.push(',');
                    match reading {
                        Reading::Value(r) => line.push_str(&display_value(r.value)),
                        Reading::Location(l) => {
                            line.push_str(&format!("{} {} {}", l.latitude, l.longitude, l.altitude))
                        }
                    }
                }
                line.push('\n');
                line
            }
            Format::Friendly => {
                let mut text = format!("{:<width$}: {}\n", "Time", time, width = LABEL_WIDTH);
                for reading in frame {
                    match reading {
                        Reading::Value(r) => {
                            let label = format!("{:<width$}", r.name, width = LABEL_WIDTH).replace('_', " ");
                            text.push_str(&format!("{}: {:<8} {}\n", label, display_value(r.value), r.symbol));
                        }
                        Reading::Location(l) => {
                            text.push_str(&format!(
                                "{:<width$}: {:.5}, {:.5} at {:.1} m ({:?}, {:?})\n",
                                l.name,
                                l.latitude,
                                l.longitude,
                                l.altitude,
                                l.disposition,
                                l.exposure,
                                width = LABEL_WIDTH
                            ));
                        }
                    }
                }
                text.push_str(RULE);
                text.push('\n');
                text
            }
        }
    }
}

impl<W: Write + Send> Output for PrintOutput<W> {
    fn output_data(&mut self, frame: &Frame) -> Result<bool> {
        let text = match &self.calibration {
            Some(cal) => self.render(&cal.calibrate(frame)),
            None => self.render(frame),
        };
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(true)
    }

    fn output_metadata(&mut self, metadata: &RunMetadata) -> Option<String> {
        Some(
            metadata_lines(metadata)
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let format = match params.require("format")?.trim().to_ascii_lowercase().as_str() {
        "csv" => Format::Csv,
        _ => Format::Friendly,
    };
    Ok(PluginInstance::Output(Box::new(PrintOutput {
        format,
        calibration: calibration::requested(params, context),
        out: std::io::stdout(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airpi_core::ReadingType;
    use airpi_types::ValueReading;
    use chrono::{Local, TimeZone};

    fn frame() -> Frame {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let mut frame = Frame::new(1, at);
        for (name, value, symbol) in [
            ("Temperature", Some(21.637), "C"),
            ("Light_Level", Some(1234.56), "Ohms"),
            ("Air_Quality", None, "Ohms"),
        ] {
            frame.readings.push(Reading::Value(ValueReading {
                name: name.to_string(),
                sensor: "Test".to_string(),
                value,
                unit: String::new(),
                symbol: symbol.to_string(),
                description: String::new(),
                reading_type: ReadingType::Sample,
            }));
        }
        frame
    }

    #[test]
    fn test_display_rounding() {
        assert_eq!(display_value(Some(21.637)), "21.64");
        assert_eq!(display_value(Some(1234.56)), "1234.6");
        assert_eq!(display_value(Some(54321.7)), "54322");
        assert_eq!(display_value(None), "None");
    }

    #[test]
    fn test_friendly_layout() {
        let mut output = PrintOutput {
            format: Format::Friendly,
            calibration: None,
            out: Vec::new(),
        };
        assert!(output.output_data(&frame()).unwrap());

        let text = String::from_utf8(output.out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Time             : 2024-03-01 12:30:00");
        assert_eq!(lines[1], "Temperature      : 21.64    C");
        assert_eq!(lines[2], "Light Level      : 1234.6   Ohms");
        assert_eq!(lines[3], "Air Quality      : None     Ohms");
        assert_eq!(lines[4], RULE);
    }

    #[test]
    fn test_csv_row() {
        let mut output = PrintOutput {
            format: Format::Csv,
            calibration: None,
            out: Vec::new(),
        };
        output.output_data(&frame()).unwrap();
        let text = String::from_utf8(output.out).unwrap();
        assert_eq!(text, "\"2024-03-01 12:30:00\",21.64,1234.6,None\n");
    }

    #[test]
    fn test_metadata_text() {
        let mut output = PrintOutput {
            format: Format::Friendly,
            calibration: None,
            out: Vec::new(),
        };
        let metadata = RunMetadata::new("Alice", "airpi-01", "00000000abcdef01");
        let text = output.output_metadata(&metadata).unwrap();
        assert!(text.contains("Operator: Alice"));
        assert!(text.ends_with("Raspberry Pi ID: 00000000abcdef01"));
    }
}
