use gps_logic::{Reading, SpeedUnit, path_distance};

fn format_speed(reading: &Reading, unit: SpeedUnit) -> String {
    reading
        .speed_in(unit)
        .map(|s| format!("{s:.2} {}", unit.label()))
        .unwrap_or_else(|| "-".to_string())
}

fn format_time(reading: &Reading) -> String {
    reading
        .recorded_at()
        .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| reading.timestamp_millis.to_string())
}

/// One line summary of a reading
pub fn format_reading(reading: &Reading, unit: SpeedUnit) -> String {
    format!(
        "[{}] {:.6}, {:.6} @ {}",
        format_time(reading),
        reading.latitude,
        reading.longitude,
        format_speed(reading, unit)
    )
}

/// Render the whole history as a table, with a total distance at the bottom
pub fn history_table(history: &[Reading], unit: SpeedUnit) -> String {
    let mut lines = Vec::with_capacity(history.len() + 2);

    lines.push(format!(
        "{:>4}  {:<12}  {:>11}  {:>11}  {:>14}",
        "#", "Time", "Latitude", "Longitude", "Speed"
    ));

    lines.extend(history.iter().enumerate().map(|(i, reading)| {
        format!(
            "{:>4}  {:<12}  {:>11.6}  {:>11.6}  {:>14}",
            i + 1,
            format_time(reading),
            reading.latitude,
            reading.longitude,
            format_speed(reading, unit)
        )
    }));

    lines.push(format!(
        "{} readings, {:.1} m travelled",
        history.len(),
        path_distance(history)
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(longitude: f64, timestamp_millis: i64, speed: Option<f64>) -> Reading {
        Reading {
            latitude: 0.0,
            longitude,
            timestamp_millis,
            speed,
        }
    }

    #[test]
    fn test_format_reading() {
        let line = format_reading(&reading(1.5, 0, Some(10.0)), SpeedUnit::KilometersPerHour);
        assert_eq!(line, "[00:00:00.000] 0.000000, 1.500000 @ 36.00 km/h");

        let line = format_reading(&reading(1.5, 1500, None), SpeedUnit::MetersPerSecond);
        assert_eq!(line, "[00:00:01.500] 0.000000, 1.500000 @ -");
    }

    #[test]
    fn test_history_table() {
        let history = [reading(0.0, 0, None), reading(1.0, 1000, Some(5.0))];
        let table = history_table(&history, SpeedUnit::MetersPerSecond);
        let lines = table.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Latitude"));
        assert!(lines[1].trim_start().starts_with('1'));
        assert!(lines[2].ends_with("5.00 m/s"));
        assert_eq!(lines[3], "2 readings, 111194.9 m travelled");
    }

    #[test]
    fn test_empty_history_table() {
        let table = history_table(&[], SpeedUnit::MetersPerSecond);
        assert_eq!(table.lines().count(), 2);
        assert!(table.starts_with("   #  Time"));
        assert!(table.ends_with("0 readings, 0.0 m travelled"));
    }
}
