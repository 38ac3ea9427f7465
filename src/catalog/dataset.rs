use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dataset name of the form `/experiment/processing/tier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetPath {
    pub experiment: String,
    pub processing: String,
    pub tier: String,
}

impl DatasetPath {
    pub fn new(experiment: &str, processing: &str, tier: &str) -> Result<Self> {
        let parts = [experiment, processing, tier];
        for (label, part) in ["experiment", "processing", "tier"].iter().zip(parts) {
            if part.trim().is_empty() || part.contains('/') {
                return Err(Error::invalid(format!(
                    "invalid {label} '{part}': must be non-empty and contain no '/'"
                )));
            }
        }
        Ok(Self {
            experiment: experiment.trim().to_string(),
            processing: processing.trim().to_string(),
            tier: tier.trim().to_string(),
        })
    }
}

impl FromStr for DatasetPath {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split('/').collect();
        match parts.as_slice() {
            ["", experiment, processing, tier] => Self::new(experiment, processing, tier),
            _ => Err(Error::invalid(format!(
                "unable to parse dataset '{raw}', expected /experiment/processing/tier"
            ))),
        }
    }
}

impl fmt::Display for DatasetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.experiment, self.processing, self.tier)
    }
}
