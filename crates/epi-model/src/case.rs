//! Case-level categories: age buckets, gender classes and aggregate measures.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound used for the open-ended `60+` bucket so that every bucket is
/// an inclusive `[lo, hi]` range.
pub const AGE_SENTINEL_MAX: i64 = 200;

/// Fixed, ordered age categories used in every age breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "0-4")]
    Age0To4,
    #[serde(rename = "5-9")]
    Age5To9,
    #[serde(rename = "10-14")]
    Age10To14,
    #[serde(rename = "15-19")]
    Age15To19,
    #[serde(rename = "20-24")]
    Age20To24,
    #[serde(rename = "25-44")]
    Age25To44,
    #[serde(rename = "45-59")]
    Age45To59,
    #[serde(rename = "60+")]
    Age60Plus,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 8] = [
        AgeBucket::Age0To4,
        AgeBucket::Age5To9,
        AgeBucket::Age10To14,
        AgeBucket::Age15To19,
        AgeBucket::Age20To24,
        AgeBucket::Age25To44,
        AgeBucket::Age45To59,
        AgeBucket::Age60Plus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::Age0To4 => "0-4",
            AgeBucket::Age5To9 => "5-9",
            AgeBucket::Age10To14 => "10-14",
            AgeBucket::Age15To19 => "15-19",
            AgeBucket::Age20To24 => "20-24",
            AgeBucket::Age25To44 => "25-44",
            AgeBucket::Age45To59 => "45-59",
            AgeBucket::Age60Plus => "60+",
        }
    }

    /// Inclusive `(lo, hi)` bounds in years.
    pub fn bounds(self) -> (i64, i64) {
        match self {
            AgeBucket::Age0To4 => (0, 4),
            AgeBucket::Age5To9 => (5, 9),
            AgeBucket::Age10To14 => (10, 14),
            AgeBucket::Age15To19 => (15, 19),
            AgeBucket::Age20To24 => (20, 24),
            AgeBucket::Age25To44 => (25, 44),
            AgeBucket::Age45To59 => (45, 59),
            AgeBucket::Age60Plus => (60, AGE_SENTINEL_MAX),
        }
    }

    /// The bucket containing `age`, or `None` when it falls outside every range.
    pub fn for_age(age: i64) -> Option<AgeBucket> {
        Self::ALL.into_iter().find(|bucket| {
            let (lo, hi) = bucket.bounds();
            (lo..=hi).contains(&age)
        })
    }

    pub fn from_label(label: &str) -> Option<AgeBucket> {
        let label = label.trim();
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }

    /// Canonical category order for merging age series.
    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|b| b.label().to_string()).collect()
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const MALE_SYNONYMS: &[&str] = &["m", "male", "man", "1", "ชาย", "เพศชาย"];
const FEMALE_SYNONYMS: &[&str] = &["f", "female", "woman", "2", "หญิง", "เพศหญิง"];

/// Three-way partition of the free-text gender field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];

    /// Classify a raw value. Trimmed and case-insensitive; anything that is
    /// not a known male or female spelling is `Unknown`.
    pub fn classify(raw: &str) -> Gender {
        let key = raw.trim().to_lowercase();
        if MALE_SYNONYMS.contains(&key.as_str()) {
            Gender::Male
        } else if FEMALE_SYNONYMS.contains(&key.as_str()) {
            Gender::Female
        } else {
            Gender::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|g| g.as_str().to_string()).collect()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is being counted, which also decides the date column filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Cases whose onset date falls in the range.
    #[default]
    Patients,
    /// Cases with a non-null death date inside the range.
    Deaths,
}

impl Measure {
    pub fn as_str(self) -> &'static str {
        match self {
            Measure::Patients => "patients",
            Measure::Deaths => "deaths",
        }
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patients" | "patient" | "cases" => Ok(Measure::Patients),
            "deaths" | "death" => Ok(Measure::Deaths),
            other => Err(format!("unknown measure: {other}")),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single case as stored in a fact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub disease_code: Option<String>,
    pub province_id: i64,
    pub gender: Option<String>,
    pub age_years: Option<i64>,
    pub onset_date: NaiveDate,
    /// Presence marks the case as a death.
    pub death_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_the_expected_edges() {
        assert_eq!(AgeBucket::for_age(0), Some(AgeBucket::Age0To4));
        assert_eq!(AgeBucket::for_age(4), Some(AgeBucket::Age0To4));
        assert_eq!(AgeBucket::for_age(5), Some(AgeBucket::Age5To9));
        assert_eq!(AgeBucket::for_age(24), Some(AgeBucket::Age20To24));
        assert_eq!(AgeBucket::for_age(25), Some(AgeBucket::Age25To44));
        assert_eq!(AgeBucket::for_age(59), Some(AgeBucket::Age45To59));
        assert_eq!(AgeBucket::for_age(60), Some(AgeBucket::Age60Plus));
        assert_eq!(AgeBucket::for_age(200), Some(AgeBucket::Age60Plus));
        assert_eq!(AgeBucket::for_age(201), None);
        assert_eq!(AgeBucket::for_age(-1), None);
    }

    #[test]
    fn bucket_labels_round_trip() {
        for bucket in AgeBucket::ALL {
            assert_eq!(AgeBucket::from_label(bucket.label()), Some(bucket));
        }
        assert_eq!(AgeBucket::from_label("65+"), None);
    }

    #[test]
    fn gender_classification() {
        assert_eq!(Gender::classify("M"), Gender::Male);
        assert_eq!(Gender::classify("  male "), Gender::Male);
        assert_eq!(Gender::classify("ชาย"), Gender::Male);
        assert_eq!(Gender::classify("F"), Gender::Female);
        assert_eq!(Gender::classify("หญิง"), Gender::Female);
        assert_eq!(Gender::classify("X"), Gender::Unknown);
        assert_eq!(Gender::classify(""), Gender::Unknown);
    }

    #[test]
    fn measure_parses() {
        assert_eq!("Deaths".parse::<Measure>(), Ok(Measure::Deaths));
        assert_eq!("patients".parse::<Measure>(), Ok(Measure::Patients));
        assert!("visits".parse::<Measure>().is_err());
    }
}
