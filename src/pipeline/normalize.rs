// src/pipeline/normalize.rs

//! Mapping of provider values into the canonical job record.

use crate::models::{DetailRecord, NormalizedJobRecord, SearchResult, SkillSet, WorkplaceType};

/// Placeholder for a field no source could provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Single skills value when the provider lists none.
pub const SKILLS_NOT_LISTED: &str = "Skills not listed";

/// Pure mapping of search, detail and skills values into one record.
///
/// Fallback order per field is fixed; previously written partitions were
/// produced with the same order.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    job_url_base: String,
}

impl RecordNormalizer {
    pub fn new(job_url_base: impl Into<String>) -> Self {
        Self {
            job_url_base: job_url_base.into(),
        }
    }

    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.job_url_base.trim_end_matches('/'), job_id)
    }

    pub fn normalize(
        &self,
        item: &SearchResult,
        detail: &DetailRecord,
        skills: &SkillSet,
    ) -> NormalizedJobRecord {
        let company = first_of([
            &item.company,
            &detail.company_name,
            &detail.company_details_name,
            &detail.company_details_company_name,
            &skills.company_name,
        ]);
        let location = first_of([
            &item.location,
            &detail.formatted_location,
            &detail.location_description,
            &detail.location_city,
        ]);
        let apply_url = first_of([&detail.easy_apply_url, &detail.company_apply_url]);

        let skills = match &skills.skills {
            Some(names) => names.clone(),
            None => vec![SKILLS_NOT_LISTED.to_string()],
        };

        NormalizedJobRecord {
            job_id: item.job_id.clone(),
            title: first_of([&item.title]),
            company,
            location,
            employment_type: first_of([&detail.employment_type]),
            seniority_level: first_of([&detail.seniority_level]),
            industries: detail.industries.clone(),
            job_functions: detail.job_functions.clone(),
            workplace_type: WorkplaceType::from_urns(&detail.workplace_types),
            description: first_of([&detail.description]),
            skills,
            job_url: self.job_url(&item.job_id),
            reposted: item.reposted,
            posted_time: item.posted_time.or(detail.listed_at),
            expire_time: item.expire_time.or(detail.expire_at),
            apply_url,
        }
    }
}

/// First non-blank candidate, else the `N/A` placeholder.
fn first_of<const N: usize>(candidates: [&Option<String>; N]) -> Option<String> {
    let value = candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> RecordNormalizer {
        RecordNormalizer::new("https://www.linkedin.com/jobs/view/")
    }

    fn bare_item(job_id: &str) -> SearchResult {
        SearchResult {
            job_id: job_id.to_string(),
            title: None,
            company: None,
            location: None,
            posted_time: None,
            expire_time: None,
            reposted: None,
        }
    }

    #[test]
    fn test_search_hint_wins() {
        let mut item = bare_item("1");
        item.company = Some("From Search".into());
        let detail = DetailRecord {
            company_name: Some("From Detail".into()),
            ..DetailRecord::default()
        };

        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.company.as_deref(), Some("From Search"));
    }

    #[test]
    fn test_company_fallback_order() {
        let item = bare_item("1");
        let skills = SkillSet {
            skills: None,
            company_name: Some("From Skills".into()),
        };

        let mut detail = DetailRecord {
            company_details_name: Some("Details.companyName".into()),
            company_details_company_name: Some("Details.company.name".into()),
            ..DetailRecord::default()
        };
        let record = normalizer().normalize(&item, &detail, &skills);
        assert_eq!(record.company.as_deref(), Some("Details.companyName"));

        detail.company_details_name = None;
        let record = normalizer().normalize(&item, &detail, &skills);
        assert_eq!(record.company.as_deref(), Some("Details.company.name"));

        detail.company_details_company_name = None;
        let record = normalizer().normalize(&item, &detail, &skills);
        assert_eq!(record.company.as_deref(), Some("From Skills"));

        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.company.as_deref(), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_location_fallback_order() {
        let item = bare_item("1");
        let mut detail = DetailRecord {
            location_description: Some("Greater Sydney".into()),
            location_city: Some("Sydney".into()),
            ..DetailRecord::default()
        };
        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.location.as_deref(), Some("Greater Sydney"));

        detail.location_description = Some("   ".into());
        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.location.as_deref(), Some("Sydney"));
    }

    #[test]
    fn test_apply_url_prefers_easy_apply() {
        let item = bare_item("1");
        let mut detail = DetailRecord {
            easy_apply_url: Some("https://easy".into()),
            company_apply_url: Some("https://company".into()),
            ..DetailRecord::default()
        };
        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.apply_url.as_deref(), Some("https://easy"));

        detail.easy_apply_url = None;
        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.apply_url.as_deref(), Some("https://company"));

        detail.company_apply_url = None;
        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.apply_url.as_deref(), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_defaults_when_everything_missing() {
        let record =
            normalizer().normalize(&bare_item("77"), &DetailRecord::default(), &SkillSet::default());

        assert_eq!(record.job_id, "77");
        assert_eq!(record.job_url, "https://www.linkedin.com/jobs/view/77");
        assert_eq!(record.title.as_deref(), Some(NOT_AVAILABLE));
        assert_eq!(record.employment_type.as_deref(), Some(NOT_AVAILABLE));
        assert_eq!(record.skills, vec![SKILLS_NOT_LISTED.to_string()]);
        assert_eq!(record.workplace_type, WorkplaceType::Unknown);
        assert!(record.industries.is_empty());
        assert!(record.posted_time.is_none());
        assert!(record.reposted.is_none());
    }

    #[test]
    fn test_empty_skill_list_is_kept() {
        let skills = SkillSet {
            skills: Some(vec![]),
            company_name: None,
        };
        let record = normalizer().normalize(&bare_item("1"), &DetailRecord::default(), &skills);
        assert!(record.skills.is_empty());
    }

    #[test]
    fn test_times_fall_back_to_detail() {
        let mut item = bare_item("1");
        item.expire_time = Some(2_000);
        let detail = DetailRecord {
            listed_at: Some(1_000),
            expire_at: Some(3_000),
            workplace_types: vec!["urn:li:fs_workplaceType:2".into()],
            ..DetailRecord::default()
        };

        let record = normalizer().normalize(&item, &detail, &SkillSet::default());
        assert_eq!(record.posted_time, Some(1_000));
        assert_eq!(record.expire_time, Some(2_000));
        assert_eq!(record.workplace_type, WorkplaceType::Remote);
    }
}
