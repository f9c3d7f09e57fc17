// src/models/job.rs

//! Job posting types, from raw provider payloads to the canonical record.
//!
//! Provider responses are deeply nested and partially typed. Each response
//! shape is lifted into its own intermediate value here so the field
//! fallback logic in the normalizer never touches raw JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the easy-apply variant inside a detail payload's `applyMethod`.
pub const EASY_APPLY_KEY: &str = "com.linkedin.voyager.jobs.ComplexOnsiteApply";

/// Key of the external-apply variant inside a detail payload's `applyMethod`.
pub const OFFSITE_APPLY_KEY: &str = "com.linkedin.voyager.jobs.OffsiteApply";

/// One item from a page of the search operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Posting time hint in epoch millis
    pub posted_time: Option<i64>,
    pub expire_time: Option<i64>,
    pub reposted: Option<bool>,
}

impl SearchResult {
    /// Lift one search element. Returns `None` when no identifier can be found.
    ///
    /// The identifier is `id` when present, otherwise the last `:`-separated
    /// segment of `entityUrn`.
    pub fn from_payload(value: &Value) -> Option<Self> {
        let job_id = id_from(value.get("id"))
            .or_else(|| {
                text(value, &["entityUrn"])
                    .and_then(|urn| urn.rsplit(':').next().map(str::to_string))
            })
            .filter(|id| !id.is_empty())?;

        Some(Self {
            job_id,
            title: text(value, &["title"]),
            company: text(value, &["companyName"]),
            location: text(value, &["formattedLocation"]),
            posted_time: millis(value, &["listedAt"]),
            expire_time: millis(value, &["expireAt"]),
            reposted: value.get("repostedJob").and_then(Value::as_bool),
        })
    }
}

/// Extended fields from the detail lookup of one item.
///
/// Every nested variant the normalizer may fall back on is kept as its own
/// field; nothing is merged at this stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub company_name: Option<String>,
    /// `companyDetails.companyName`
    pub company_details_name: Option<String>,
    /// `companyDetails.company.name`
    pub company_details_company_name: Option<String>,
    pub formatted_location: Option<String>,
    pub location_description: Option<String>,
    /// `location.city`
    pub location_city: Option<String>,
    pub employment_type: Option<String>,
    pub seniority_level: Option<String>,
    pub industries: Vec<String>,
    pub job_functions: Vec<String>,
    pub workplace_types: Vec<String>,
    pub description: Option<String>,
    pub easy_apply_url: Option<String>,
    pub company_apply_url: Option<String>,
    pub listed_at: Option<i64>,
    pub expire_at: Option<i64>,
}

impl DetailRecord {
    /// Lift a detail payload.
    ///
    /// A payload carrying an embedded `status` other than 200 is the
    /// provider's soft failure and yields an empty record.
    pub fn from_payload(value: &Value) -> Self {
        if let Some(status) = value.get("status").and_then(Value::as_i64) {
            if status != 200 {
                return Self::default();
            }
        }

        Self {
            company_name: text(value, &["companyName"]),
            company_details_name: text(value, &["companyDetails", "companyName"]),
            company_details_company_name: text(value, &["companyDetails", "company", "name"]),
            formatted_location: text(value, &["formattedLocation"]),
            location_description: text(value, &["locationDescription"]),
            location_city: text(value, &["location", "city"]),
            employment_type: text(value, &["formattedEmploymentStatus"]),
            seniority_level: text(value, &["formattedExperienceLevel"]),
            industries: strings(value.get("formattedIndustries")),
            job_functions: strings(value.get("formattedJobFunctions")),
            workplace_types: strings(value.get("workplaceTypes")),
            description: text(value, &["description", "text"]),
            easy_apply_url: text(value, &["applyMethod", EASY_APPLY_KEY, "easyApplyUrl"]),
            company_apply_url: text(value, &["applyMethod", OFFSITE_APPLY_KEY, "companyApplyUrl"]),
            listed_at: millis(value, &["listedAt"]),
            expire_at: millis(value, &["expireAt"]),
        }
    }
}

/// Skill names from the sub-resource lookup of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet {
    /// `None` when the payload carries no match-status list at all.
    pub skills: Option<Vec<String>>,
    /// `company.name`, the last company fallback
    pub company_name: Option<String>,
}

impl SkillSet {
    pub const UNKNOWN_SKILL: &'static str = "Unknown Skill";

    pub fn from_payload(value: &Value) -> Self {
        let skills = value
            .get("skillMatchStatuses")
            .and_then(Value::as_array)
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|status| {
                        text(status, &["skill", "name"])
                            .unwrap_or_else(|| Self::UNKNOWN_SKILL.to_string())
                    })
                    .collect()
            });

        Self {
            skills,
            company_name: text(value, &["company", "name"]),
        }
    }
}

/// Workplace arrangement, mapped from the provider's workplace URNs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkplaceType {
    OnSite,
    Remote,
    Hybrid,
    #[default]
    Unknown,
}

impl WorkplaceType {
    const URNS: [(&'static str, WorkplaceType); 3] = [
        ("urn:li:fs_workplaceType:1", WorkplaceType::OnSite),
        ("urn:li:fs_workplaceType:2", WorkplaceType::Remote),
        ("urn:li:fs_workplaceType:3", WorkplaceType::Hybrid),
    ];

    /// Map the first URN of a posting. Unknown or missing URNs never fail.
    ///
    /// `Unknown` is labelled `N/A` to match previously written partitions.
    pub fn from_urns(urns: &[String]) -> Self {
        urns.first()
            .and_then(|urn| {
                Self::URNS
                    .iter()
                    .find(|(known, _)| *known == urn.as_str())
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSite => "On-site",
            Self::Remote => "Remote",
            Self::Hybrid => "Hybrid",
            Self::Unknown => "N/A",
        }
    }
}

impl fmt::Display for WorkplaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkplaceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "On-site" => Self::OnSite,
            "Remote" => Self::Remote,
            "Hybrid" => Self::Hybrid,
            _ => Self::Unknown,
        })
    }
}

/// Canonical output record, one row of a partition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedJobRecord {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub seniority_level: Option<String>,
    pub industries: Vec<String>,
    pub job_functions: Vec<String>,
    pub workplace_type: WorkplaceType,
    pub description: Option<String>,
    pub skills: Vec<String>,
    pub job_url: String,
    pub reposted: Option<bool>,
    /// Epoch millis
    pub posted_time: Option<i64>,
    /// Epoch millis
    pub expire_time: Option<i64>,
    pub apply_url: Option<String>,
}

// --- Payload helpers ---

/// Follow `path` through nested objects and return a non-blank string.
fn text(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Epoch millis may arrive as a JSON integer or float.
fn millis(value: &Value, path: &[&str]) -> Option<i64> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current
        .as_i64()
        .or_else(|| current.as_f64().map(|f| f as i64))
}

fn id_from(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
