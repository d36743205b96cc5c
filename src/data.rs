//! CSV export of parsed forecast series.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::bucket::ReferenceZone;
use crate::series::WeatherReport;

const CSV_HEADER: [&str; 5] = ["series", "time_utc", "time_local", "index", "value_c"];
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Writes every point of `report` as one row, creating the parent directory.
pub fn to_csv(report: &WeatherReport, zone: ReferenceZone, file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
    }
    let file = File::create(file_path)
        .map_err(|err| format!("Failed to create CSV {}: {err}", file_path.display()))?;
    write_csv(report, zone, BufWriter::new(file))
        .map_err(|err| format!("Failed to write CSV {}: {err}", file_path.display()))
}

/// Serialises `report` into any writer.
pub fn write_csv<W: Write>(
    report: &WeatherReport,
    zone: ReferenceZone,
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for series in report.series() {
        for point in &series.points {
            writer.write_record([
                series.label.clone(),
                point.time.to_rfc3339(),
                zone.local(point.time).format(LOCAL_TIME_FORMAT).to_string(),
                point.index.to_string(),
                point.value.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::series::{DEW_POINT_LABEL, TEMPERATURE_LABEL, TimeSeries};

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn writes_one_row_per_point() {
        let report = WeatherReport {
            temperature: TimeSeries::from_samples(
                TEMPERATURE_LABEL,
                [(utc("2024-03-09T05:00:00Z"), 4.5), (utc("2024-03-09T06:00:00Z"), 5.0)],
            ),
            dew_point: TimeSeries::from_samples(
                DEW_POINT_LABEL,
                [(utc("2024-03-09T05:00:00Z"), -1.0)],
            ),
        };
        let mut buffer = Vec::new();
        write_csv(&report, ReferenceZone::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "series,time_utc,time_local,index,value_c");
        assert_eq!(
            lines[1],
            "Temperature,2024-03-09T05:00:00+00:00,2024-03-09 00:00,0,4.5"
        );
        assert_eq!(lines[3], "Dew Point,2024-03-09T05:00:00+00:00,2024-03-09 00:00,0,-1");
        assert_eq!(lines.len(), 4);
    }
}
