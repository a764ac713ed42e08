use crate::cli::ValidateArgs;
use crate::srgt::classify::ZygosityModel;
use crate::srgt::distribution::RepeatDistribution;
use crate::srgt::sample::SamplePair;
use crate::utils::{open_table_reader, Result};
use std::io::BufRead;

/// Checks every manifest entry without genotyping: both distributions must
/// load, pass the shape checks, and conserve their totals under collapse.
/// The classifier artifact, when given, must deserialize and validate.
pub fn validate(args: ValidateArgs) -> Result<()> {
    if let Some(model_path) = &args.model_path {
        ZygosityModel::from_path(model_path)?;
        log::info!("Classifier artifact OK: {}", model_path.display());
    }

    let reader = open_table_reader(&args.manifest_path)?;
    let mut error_count = 0;
    let mut success_count = 0;
    let mut read_totals = Vec::new();

    for (line_number, result_line) in reader.lines().enumerate() {
        let line = result_line
            .map_err(|e| format!("Error at manifest line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let outcome = SamplePair::from_line(&line).and_then(|sample| {
            let total = validate_sample(&sample)?;
            Ok((sample.id, total))
        });
        match outcome {
            Ok((sample_id, total)) => {
                log::info!("{}: OK ({} forward reads)", sample_id, total);
                read_totals.push(total);
                success_count += 1;
            }
            Err(e) => {
                log::error!("Manifest line {}: {}", line_number + 1, e);
                error_count += 1;
            }
        }
    }

    if !read_totals.is_empty() {
        let stats = calculate_stats(&read_totals);
        log::info!(
            "Forward reads per sample - Range: [{},{}], Median: {:.2}, Mean: {:.2}, StdDev: {:.2}",
            stats.min,
            stats.max,
            stats.median,
            stats.mean,
            stats.std_dev
        );
    }

    let total = success_count + error_count;
    match error_count {
        0 => {
            log::info!("Validation successful. Samples pass={}", success_count);
            Ok(())
        }
        _ => Err(format!(
            "Validation failed. Samples pass={} ({:.2}%), fail={} ({:.2}%)",
            success_count,
            (success_count as f64 / total as f64) * 100.0,
            error_count,
            (error_count as f64 / total as f64) * 100.0
        )),
    }
}

/// Returns the sample's forward read total on success
fn validate_sample(sample: &SamplePair) -> Result<u64> {
    let forward = RepeatDistribution::from_path(&sample.forward_path)?;
    let reverse = RepeatDistribution::from_path(&sample.reverse_path)?;

    for (direction, dist) in [("forward", &forward), ("reverse", &reverse)] {
        let collapsed = dist.collapse()?;
        let collapsed_total: u64 = collapsed.iter().map(|&n| n as u64).sum();
        if collapsed_total != dist.total_reads() {
            return Err(format!(
                "{} distribution loses reads under collapse: {} != {}",
                direction,
                collapsed_total,
                dist.total_reads()
            ));
        }
    }
    Ok(forward.total_reads())
}

fn calculate_stats(data: &[u64]) -> Stats {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    let len = sorted.len();
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) as f64 / 2.0
    } else {
        sorted[len / 2] as f64
    };
    let sum: u64 = sorted.iter().sum();
    let mean = sum as f64 / len as f64;
    let std_dev = (sorted
        .iter()
        .map(|&x| (x as f64 - mean).powi(2))
        .sum::<f64>()
        / len as f64)
        .sqrt();
    Stats {
        min: *sorted.first().unwrap_or(&0),
        max: *sorted.last().unwrap_or(&0),
        mean,
        median,
        std_dev,
    }
}

struct Stats {
    min: u64,
    max: u64,
    mean: f64,
    median: f64,
    std_dev: f64,
}
