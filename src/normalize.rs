//! Normalization of raw search hits into [`JobPosting`].
//!
//! The upstream payload is modeled with every field optional; `normalize` is
//! total and fills an explicit default for each missing field so downstream
//! code never sees an absent value.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Company, JobPosting};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEmployer {
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkplaceAddress {
    pub municipality: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    // Kept as a raw JSON value: only an explicit boolean `true` counts as
    // remote, anything else (absent, string "true", null) does not.
    pub remote_work: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLabel {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDescription {
    pub text: Option<String>,
}

/// One hit as returned by the search API, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJobHit {
    pub id: Option<String>,
    pub headline: Option<String>,
    pub employer: Option<RawEmployer>,
    pub workplace_address: Option<RawWorkplaceAddress>,
    pub occupation: Option<RawLabel>,
    pub employment_type: Option<RawLabel>,
    pub description: Option<RawDescription>,
    pub webpage_url: Option<String>,
    pub publication_date: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
}

/// Parses the API's publication date, falling back to "now" when the field is
/// absent or unparseable. Never fails.
fn parse_posted_at(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    // The API commonly returns bare timestamps without an offset.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return naive.and_utc();
    }
    tracing::debug!(raw, "unparseable publication date, substituting now");
    Utc::now()
}

/// Converts one raw hit into a canonical [`JobPosting`]. Total: every missing
/// upstream field becomes an explicit default, never an absent one.
pub fn normalize(raw: RawJobHit) -> JobPosting {
    let employer = raw.employer.unwrap_or_default();
    let address = raw.workplace_address.unwrap_or_default();

    let location = address
        .municipality
        .clone()
        .unwrap_or_else(|| "Unknown Location".to_string());
    let remote = matches!(address.remote_work, Some(Value::Bool(true)));
    let url = raw.webpage_url.unwrap_or_default();

    JobPosting {
        id: raw.id.unwrap_or_default(),
        title: raw.headline.unwrap_or_else(|| "No title".to_string()),
        company: Company {
            id: employer.id.unwrap_or_default(),
            name: employer.name.unwrap_or_else(|| "Unknown Company".to_string()),
            logo: employer.logo_url,
            location: location.clone(),
            website: employer.website,
        },
        location,
        category: raw
            .occupation
            .and_then(|o| o.label)
            .unwrap_or_else(|| "Uncategorized".to_string()),
        job_type: raw
            .employment_type
            .and_then(|t| t.label)
            .unwrap_or_else(|| "Unknown Type".to_string()),
        description: raw.description.and_then(|d| d.text).unwrap_or_default(),
        source_url: url.clone(),
        url,
        posted_at: parse_posted_at(raw.publication_date.as_deref()),
        remote,
        responsibilities: raw.responsibilities.unwrap_or_default(),
        requirements: raw.requirements.unwrap_or_default(),
        benefits: raw.benefits.unwrap_or_default(),
        skills: raw.skills.unwrap_or_default(),
    }
}
