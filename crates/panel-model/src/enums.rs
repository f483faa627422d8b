use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a sample plays in the analytical run.
///
/// QC filtering keys on this together with [`AssayRole`]: reproducibility
/// statistics are computed over pooled references, study conclusions over
/// study samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleType {
    /// A sample collected from a study subject.
    StudySample,
    /// A pool of study samples, re-injected for precision monitoring.
    StudyPool,
    /// A reference material from outside the study.
    ExternalReference,
    /// A reference material specific to the measurement method.
    MethodReference,
    /// A blank carried through the sample-preparation procedure.
    ProceduralBlank,
}

impl SampleType {
    /// Canonical name as stored in metadata tables and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::StudySample => "Study Sample",
            SampleType::StudyPool => "Study Pool",
            SampleType::ExternalReference => "External Reference",
            SampleType::MethodReference => "Method Reference",
            SampleType::ProceduralBlank => "Procedural Blank",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "STUDY SAMPLE" => Ok(SampleType::StudySample),
            "STUDY POOL" => Ok(SampleType::StudyPool),
            "EXTERNAL REFERENCE" => Ok(SampleType::ExternalReference),
            "METHOD REFERENCE" => Ok(SampleType::MethodReference),
            "PROCEDURAL BLANK" => Ok(SampleType::ProceduralBlank),
            _ => Err(format!("Unknown sample type: {}", s)),
        }
    }
}

/// Purpose of an acquisition within the assay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssayRole {
    /// A study measurement.
    Assay,
    /// Repeated measurement of the same material to gauge precision.
    PrecisionReference,
    /// A dilution-series measurement to gauge response linearity.
    LinearityReference,
    /// A blank acquisition.
    Blank,
}

impl AssayRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssayRole::Assay => "Assay",
            AssayRole::PrecisionReference => "Precision Reference",
            AssayRole::LinearityReference => "Linearity Reference",
            AssayRole::Blank => "Blank",
        }
    }
}

impl fmt::Display for AssayRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssayRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "ASSAY" => Ok(AssayRole::Assay),
            "PRECISION REFERENCE" => Ok(AssayRole::PrecisionReference),
            "LINEARITY REFERENCE" => Ok(AssayRole::LinearityReference),
            "BLANK" => Ok(AssayRole::Blank),
            _ => Err(format!("Unknown assay role: {}", s)),
        }
    }
}

/// Exactitude of the quantification procedure for a feature.
///
/// [`QuantificationType::Monitored`] marks estimate-only features reported
/// for relative information; the censor passes them through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantificationType {
    /// Quantified against a full calibration curve.
    IsQuantified,
    /// Quantified against the feature's own labelled analogue.
    QuantOwnLabeledAnalogue,
    /// Quantified against another compound's labelled analogue.
    QuantAltLabeledAnalogue,
    /// Quantified by some other documented procedure.
    QuantOther,
    /// Monitored for relative information only, no calibration.
    Monitored,
}

impl QuantificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantificationType::IsQuantified => "Quantified with IS",
            QuantificationType::QuantOwnLabeledAnalogue => {
                "Quantified and validated with own labeled analogue"
            }
            QuantificationType::QuantAltLabeledAnalogue => {
                "Quantified and validated with alternative labeled analogue"
            }
            QuantificationType::QuantOther => "Other quantification",
            QuantificationType::Monitored => "Monitored for relative information",
        }
    }

    /// All variants, in declaration order.
    pub fn all() -> [QuantificationType; 5] {
        [
            QuantificationType::IsQuantified,
            QuantificationType::QuantOwnLabeledAnalogue,
            QuantificationType::QuantAltLabeledAnalogue,
            QuantificationType::QuantOther,
            QuantificationType::Monitored,
        ]
    }
}

impl fmt::Display for QuantificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuantificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "QUANTIFIED WITH IS" => Ok(QuantificationType::IsQuantified),
            "QUANTIFIED AND VALIDATED WITH OWN LABELED ANALOGUE" => {
                Ok(QuantificationType::QuantOwnLabeledAnalogue)
            }
            "QUANTIFIED AND VALIDATED WITH ALTERNATIVE LABELED ANALOGUE" => {
                Ok(QuantificationType::QuantAltLabeledAnalogue)
            }
            "OTHER QUANTIFICATION" => Ok(QuantificationType::QuantOther),
            "MONITORED FOR RELATIVE INFORMATION" => Ok(QuantificationType::Monitored),
            _ => Err(format!("Unknown quantification type: {}", s)),
        }
    }
}

/// Calibration approach used to derive a feature's concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationMethod {
    /// Backcalculated against an internal standard.
    BackcalculatedIs,
    /// Calibrated without an internal standard.
    NoIs,
    /// No calibration performed (monitored features).
    NoCalibration,
    /// Some other documented calibration procedure.
    OtherCalibration,
}

impl CalibrationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationMethod::BackcalculatedIs => "Backcalculated with Internal Standard",
            CalibrationMethod::NoIs => "No Internal Standard",
            CalibrationMethod::NoCalibration => "No calibration",
            CalibrationMethod::OtherCalibration => "Other calibration method",
        }
    }
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CalibrationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "BACKCALCULATED WITH INTERNAL STANDARD" => Ok(CalibrationMethod::BackcalculatedIs),
            "NO INTERNAL STANDARD" => Ok(CalibrationMethod::NoIs),
            "NO CALIBRATION" => Ok(CalibrationMethod::NoCalibration),
            "OTHER CALIBRATION METHOD" => Ok(CalibrationMethod::OtherCalibration),
            _ => Err(format!("Unknown calibration method: {}", s)),
        }
    }
}

/// Kind of variable axis a dataset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    /// Named, discrete features (targeted panels).
    Discrete,
    /// A sampled continuum (full-resolution spectra).
    Continuum,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Discrete => "Discrete",
            VariableType::Continuum => "Continuum",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "DISCRETE" => Ok(VariableType::Discrete),
            "CONTINUUM" => Ok(VariableType::Continuum),
            _ => Err(format!("Unknown variable type: {}", s)),
        }
    }
}

/// Case-insensitive comparison form shared by the `FromStr` impls.
fn normalise(s: &str) -> String {
    s.trim().to_uppercase()
}
