//! CSV and JSON writers for light curves, events and trajectories.

use crate::error::Result;
use crate::sim::system::TrajectorySample;
use crate::transit::synthesizer::FluxSample;
use serde::Serialize;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Writes `time,flux,flux_noisy` rows.
pub fn write_flux_csv(path: &Path, series: &[FluxSample]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for sample in series {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} flux samples to {:?}", series.len(), path);
    Ok(())
}

/// Writes `time, body0_x, body0_y[, body0_z], body1_x, ...` rows.
pub fn write_trajectory_csv(path: &Path, trajectory: &[TrajectorySample]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    if let Some(first) = trajectory.first() {
        let axes = ["x", "y", "z"];
        let mut header = vec!["time".to_string()];
        for (i, position) in first.positions.iter().enumerate() {
            for axis in axes.iter().take(position.len()) {
                header.push(format!("body{i}_{axis}"));
            }
        }
        writer.write_record(&header)?;
    }
    for sample in trajectory {
        let mut record = vec![sample.time.to_string()];
        for position in sample.positions.iter() {
            record.extend(position.iter().map(|x| x.to_string()));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} trajectory samples to {:?}", trajectory.len(), path);
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::detector::TransitEvent;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("transit_sim_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn flux_csv_has_header_and_rows() {
        let dir = scratch_dir("flux");
        let path = dir.join("lc.csv");
        let series = vec![
            FluxSample {
                time: 0.,
                flux: 1.,
                flux_noisy: 1.5,
            },
            FluxSample {
                time: 60.,
                flux: 0.25,
                flux_noisy: 0.5,
            },
        ];
        write_flux_csv(&path, &series).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["time,flux,flux_noisy", "0.0,1.0,1.5", "60.0,0.25,0.5"]);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn trajectory_csv_names_columns_per_body() {
        let dir = scratch_dir("trajectory");
        let path = dir.join("nested").join("positions.csv");
        let trajectory = vec![TrajectorySample {
            time: 1.,
            positions: vec![vec![0., 0.], vec![2., 3.]],
        }];
        write_trajectory_csv(&path, &trajectory).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,body0_x,body0_y,body1_x,body1_y");
        assert_eq!(lines[1], "1,0,0,2,3");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn events_round_trip_through_json() {
        let dir = scratch_dir("events");
        let path = dir.join("events.json");
        let events = vec![TransitEvent {
            start_time: 10.,
            end_time: 20.,
            duration: 10.,
            depth: 0.01,
        }];
        write_json(&path, &events).unwrap();
        let read: Vec<TransitEvent> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, events);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
