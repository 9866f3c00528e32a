use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub location: String,
    pub website: Option<String>,
}

/// Canonical job listing. Only ever produced by the normalizer, never mutated
/// afterwards. Array fields are always present (possibly empty) and
/// `posted_at` is always a valid instant, so display code needs no null checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: Company,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub description: String,
    pub url: String,
    pub source_url: String,
    pub posted_at: DateTime<Utc>,
    pub remote: bool,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub skills: Vec<String>,
}

/// Current search specification. `None` means "no constraint", not "empty".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    pub query: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub remote: Option<bool>,
    pub experience: Option<String>,
    pub radius: Option<u32>,
}

/// Partial filter change; `Some` fields are merged into the current filter,
/// `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub query: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub remote: Option<bool>,
    pub experience: Option<String>,
    pub radius: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Newest,
    Oldest,
    Location,
}

impl SortKey {
    /// The upstream sort directive for this key.
    pub fn as_param(self) -> &'static str {
        match self {
            SortKey::Newest => "publication_date:desc",
            SortKey::Oldest => "publication_date:asc",
            SortKey::Location => "workplace-address.municipality:asc",
        }
    }

    /// Parses a user-facing sort name. Unrecognized names mean "upstream
    /// default order", so this returns `None` rather than erroring.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "location" => Some(SortKey::Location),
            _ => None,
        }
    }
}

/// Pagination block, recomputed from every fetch result and never stored
/// independently of one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_jobs: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_jobs: 0,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

impl Pagination {
    /// Derives the block from a fetch result. `has_next_page` and
    /// `has_prev_page` are computed here and nowhere else.
    pub fn from_fetch(page: usize, total_jobs: usize, limit: usize) -> Self {
        let total_pages = if limit == 0 { 0 } else { total_jobs.div_ceil(limit) };
        Self {
            current_page: page,
            total_pages,
            total_jobs,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Viewed,
    Interviewing,
    Offered,
    Rejected,
    Withdrawn,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Viewed => "Viewed",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        };
        f.write_str(s)
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "applied" => Ok(ApplicationStatus::Applied),
            "viewed" => Ok(ApplicationStatus::Viewed),
            "interviewing" => Ok(ApplicationStatus::Interviewing),
            "offered" => Ok(ApplicationStatus::Offered),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            _ => Err(format!(
                "Unknown status '{}'. Available: applied, viewed, interviewing, offered, rejected, withdrawn",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub date: DateTime<Utc>,
    pub status: ApplicationStatus,
}

// --- User profile ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub job_alerts: bool,
    pub location_radius: u32,
    pub categories: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            job_alerts: true,
            location_radius: 50,
            categories: vec![],
            salary_min: None,
            salary_max: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub languages: Vec<Language>,
    pub preferences: Preferences,
}

/// Shallow profile merge; `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_flags_middle_page() {
        let p = Pagination::from_fetch(2, 35, 10);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn test_pagination_flags_first_and_last() {
        let first = Pagination::from_fetch(1, 35, 10);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let last = Pagination::from_fetch(4, 35, 10);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn test_pagination_empty_result() {
        let p = Pagination::from_fetch(1, 0, 10);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("newest"), Some(SortKey::Newest));
        assert_eq!(SortKey::parse("oldest"), Some(SortKey::Oldest));
        assert_eq!(SortKey::parse("location"), Some(SortKey::Location));
        assert_eq!(SortKey::parse("relevance"), None);
    }

    #[test]
    fn test_application_status_round_trip() {
        for name in ["applied", "viewed", "interviewing", "offered", "rejected", "withdrawn"] {
            let status: ApplicationStatus = name.parse().unwrap();
            assert_eq!(status.to_string().to_lowercase(), name);
        }
        assert!("ghosted".parse::<ApplicationStatus>().is_err());
    }
}
