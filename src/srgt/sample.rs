use crate::utils::{open_table_reader, Result};
use crossbeam_channel::Sender;
use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

/// One manifest entry: a sample and its forward/reverse count tables
#[derive(Debug, Clone)]
pub struct SamplePair {
    pub id: String,
    pub forward_path: PathBuf,
    pub reverse_path: PathBuf,
}

impl SamplePair {
    pub fn from_line(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 3;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != EXPECTED_FIELD_COUNT {
            return Err(format!(
                "Expected {} fields in the format 'sample_id forward_csv reverse_csv', found {}: {}",
                EXPECTED_FIELD_COUNT,
                fields.len(),
                line
            ));
        }
        Ok(SamplePair {
            id: fields[0].to_string(),
            forward_path: PathBuf::from(fields[1]),
            reverse_path: PathBuf::from(fields[2]),
        })
    }
}

/// Streams manifest entries into a channel; malformed lines are sent as
/// errors without stopping the stream
pub fn stream_samples_into_channel(manifest_path: &Path, sender: Sender<Result<SamplePair>>) {
    let reader = match open_table_reader(manifest_path) {
        Ok(reader) => reader,
        Err(err) => {
            sender
                .send(Err(format!("Manifest: {}", err)))
                .expect("Failed to send error through channel");
            return;
        }
    };

    for (line_number, result_line) in reader.lines().enumerate() {
        let line = match result_line {
            Ok(line) => line,
            Err(err) => {
                let error = format!("Error at manifest line {}: {}", line_number + 1, err);
                sender
                    .send(Err(error))
                    .expect("Failed to send error through channel");
                return;
            }
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let sample = SamplePair::from_line(&line)
            .map_err(|e| format!("Error at manifest line {}: {}", line_number + 1, e));
        sender
            .send(sample)
            .expect("Failed to send sample through channel");
    }
}
