//! Reading sessions and athlete batches from JSON or CSV files

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::batch::AthleteEntry;
use crate::models::{Session, SessionRow};

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("csv") => Ok(InputFormat::Csv),
            _ => bail!(
                "Unsupported input file {} (expected .json or .csv)",
                path.display()
            ),
        }
    }
}

/// Parse session rows from CSV with a `date,rpe,duration_minutes[,program]` header
pub fn parse_session_csv<R: std::io::Read>(reader: R) -> Result<Vec<SessionRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize::<SessionRow>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid session row {}", i + 1)))
        .collect()
}

/// Read and validate sessions from a JSON array or a CSV file.
///
/// The first invalid row fails the whole file.
pub fn read_sessions(path: &Path) -> Result<Vec<Session>> {
    let rows = match InputFormat::from_path(path)? {
        InputFormat::Json => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<Vec<SessionRow>>(&content)
                .with_context(|| format!("Failed to parse sessions from {}", path.display()))?
        }
        InputFormat::Csv => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            parse_session_csv(file)?
        }
    };

    let sessions = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            Session::try_from(row).with_context(|| format!("Rejected session row {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(path = %path.display(), sessions = sessions.len(), "Read sessions");
    Ok(sessions)
}

/// Read a JSON array of athletes for batch analysis.
///
/// Only a file that is not a JSON array fails as a whole. Each athlete is
/// decoded on its own, so a bad entry is kept as `AthleteEntry::Malformed`.
pub fn read_athletes(path: &Path) -> Result<Vec<AthleteEntry>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse athletes from {}", path.display()))?;

    let athletes: Vec<AthleteEntry> = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| AthleteEntry::from_json(i, value))
        .collect();

    debug!(path = %path.display(), athletes = athletes.len(), "Read athletes");
    Ok(athletes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::from_path(&PathBuf::from("log.JSON")).unwrap(),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::from_path(&PathBuf::from("log.csv")).unwrap(),
            InputFormat::Csv
        );
        assert!(InputFormat::from_path(&PathBuf::from("log.fit")).is_err());
        assert!(InputFormat::from_path(&PathBuf::from("log")).is_err());
    }

    #[test]
    fn test_csv_rows() {
        let data = "date,rpe,duration_minutes,program\n\
                    2024-09-01,5,60,gpp\n\
                    2024-09-02, 8 ,45.5,\n";

        let rows = parse_session_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].program.as_deref(), Some("gpp"));
        assert_eq!(rows[1].rpe, 8);
        assert_eq!(rows[1].duration_minutes, dec!(45.5));
        assert_eq!(rows[1].program, None);
    }

    #[test]
    fn test_read_sessions_from_files() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("sessions.csv");
        fs::write(&csv_path, "date,rpe,duration_minutes\n2024-09-01,5,60\n").unwrap();
        let sessions = read_sessions(&csv_path).unwrap();
        assert_eq!(sessions[0].load(), dec!(60));

        let json_path = dir.path().join("sessions.json");
        fs::write(
            &json_path,
            r#"[{"date": "2024-09-01", "rpe": 8, "duration_minutes": 30}]"#,
        )
        .unwrap();
        let sessions = read_sessions(&json_path).unwrap();
        assert_eq!(sessions[0].load(), dec!(50));
    }

    #[test]
    fn test_invalid_rpe_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.csv");
        fs::write(&path, "date,rpe,duration_minutes\n2024-09-01,12,60\n").unwrap();

        assert!(read_sessions(&path).is_err());
    }

    #[test]
    fn test_read_athletes_keeps_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("athletes.json");
        fs::write(
            &path,
            r#"[
  {"athlete_id": "good", "sessions": [{"date": "2024-09-01", "rpe": 5, "duration_minutes": 60}]},
  {"athlete_id": "bad", "readiness": [{"date": "2024-09-01", "resting_heart_rate": "high", "vertical_jump_cm": 50}]}
]"#,
        )
        .unwrap();

        let athletes = read_athletes(&path).unwrap();

        assert_eq!(athletes.len(), 2);
        assert!(matches!(&athletes[0], AthleteEntry::Parsed(input) if input.sessions.len() == 1));
        assert!(matches!(
            &athletes[1],
            AthleteEntry::Malformed { athlete_id, .. } if athlete_id == "bad"
        ));

        fs::write(&path, r#"{"athlete_id": "not-a-list"}"#).unwrap();
        assert!(read_athletes(&path).is_err());
    }
}
