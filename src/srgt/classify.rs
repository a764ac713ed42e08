use crate::utils::Result;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
}

impl FromStr for Zygosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HOMO" => Ok(Zygosity::Homozygous),
            "HETERO" => Ok(Zygosity::Heterozygous),
            _ => Err(format!("Unknown zygosity label: {}", s)),
        }
    }
}

impl Zygosity {
    /// Number of CCG peaks expected under this zygosity state
    pub fn peak_target(&self) -> usize {
        match self {
            Zygosity::Homozygous => 1,
            Zygosity::Heterozygous => 2,
        }
    }
}

/// One pairwise decision function of a one-vs-one linear classifier
#[derive(Debug, Deserialize)]
struct PairwiseMachine {
    first: usize,
    second: usize,
    weights: Vec<f64>,
    intercept: f64,
}

/// Pre-trained one-vs-one linear classifier over collapsed CCG distributions.
/// Training happens offline; this artifact only supports inference.
#[derive(Debug, Deserialize)]
pub struct ZygosityModel {
    classes: Vec<String>,
    num_features: usize,
    machines: Vec<PairwiseMachine>,
}

impl ZygosityModel {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let model: ZygosityModel = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| format!("Malformed classifier artifact {}: {}", path.display(), e))?;
        model.validate().map_err(|e| {
            format!(
                "Invalid classifier artifact {}: {}",
                path.display(),
                e
            )
        })?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let num_classes = self.classes.len();
        if num_classes < 2 {
            return Err(format!("Expected at least 2 classes, got {}", num_classes));
        }
        let expected_machines = num_classes * (num_classes - 1) / 2;
        if self.machines.len() != expected_machines {
            return Err(format!(
                "Expected {} pairwise machines for {} classes, got {}",
                expected_machines,
                num_classes,
                self.machines.len()
            ));
        }
        for (index, machine) in self.machines.iter().enumerate() {
            if machine.weights.len() != self.num_features {
                return Err(format!(
                    "Machine {} has {} weights, expected {}",
                    index,
                    machine.weights.len(),
                    self.num_features
                ));
            }
            if machine.first >= num_classes || machine.second >= num_classes {
                return Err(format!("Machine {} references an unknown class", index));
            }
        }
        Ok(())
    }

    /// Predicts the zygosity label for a collapsed CCG distribution.
    /// The input is L2-normalized before evaluating the decision functions;
    /// each pairwise machine casts one vote and ties are broken by the
    /// accumulated decision margin.
    pub fn predict(&self, counts: &[u32]) -> Result<&str> {
        if counts.len() != self.num_features {
            return Err(format!(
                "Classifier expects {} features, got {}",
                self.num_features,
                counts.len()
            ));
        }
        let features = l2_normalize(counts);

        let mut votes = vec![0usize; self.classes.len()];
        let mut margins = vec![0.0f64; self.classes.len()];
        for machine in &self.machines {
            let decision: f64 = machine
                .weights
                .iter()
                .zip(&features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
                + machine.intercept;
            if decision > 0.0 {
                votes[machine.second] += 1;
            } else {
                votes[machine.first] += 1;
            }
            margins[machine.first] -= decision;
            margins[machine.second] += decision;
        }

        let winner = (0..self.classes.len())
            .max_by(|&a, &b| {
                (votes[a], margins[a])
                    .partial_cmp(&(votes[b], margins[b]))
                    .expect("non-finite decision margin")
            })
            .expect("validated model has at least two classes");
        Ok(&self.classes[winner])
    }
}

fn l2_normalize(counts: &[u32]) -> Vec<f64> {
    let norm: f64 = counts
        .iter()
        .map(|&n| (n as f64) * (n as f64))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&n| n as f64 / norm).collect()
}
