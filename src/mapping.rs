//! Translation of user-facing filter labels into the JobTech search API's
//! vocabulary (occupation field codes and employment-type codes).

/// Occupation-code synonyms per category. A category with several codes is
/// sent upstream as an OR-disjunction of all of them.
const CATEGORY_MAPPING: &[(&str, &[&str])] = &[
    (
        "IT",
        &[
            "programmerare",
            "systemutvecklare",
            "it-sakerhetsspecialist",
            "natverkstekniker",
            "systemtekniker",
            "supporttekniker",
            "systemadministrator",
            "systemanalytiker",
            "it-arkitekt",
            "systemforvaltare",
            "testledare",
            "spelutvecklare",
            "webbutvecklare",
            "webbmaster",
            "webbadministrator",
        ],
    ),
    ("Healthcare", &["sjukskoterska", "vardpersonal"]),
    ("Education", &["larare", "pedagog"]),
    ("Engineering", &["ingenjor", "tekniker"]),
    ("Finance", &["ekonomi", "redovisning"]),
    ("Sales", &["forsaljning", "inkop"]),
    ("Marketing", &["marknadsforing", "kommunikation"]),
    ("Customer Service", &["kundservice", "support"]),
    ("Administration", &["administration", "kontor"]),
    ("Other", &["ovrigt"]),
];

const EMPLOYMENT_TYPE_MAPPING: &[(&str, &str)] = &[
    ("Full-time", "heltid"),
    ("Part-time", "deltid"),
    ("Permanent", "tillsvidare"),
    ("Temporary", "vikariat"),
    ("Summer job", "sommarjobb"),
    ("Internship", "praktik"),
    ("Contract", "projektanstallning"),
];

/// Sentinel category/type meaning "no constraint".
pub const ALL: &str = "All";

/// Maps a category label to the API's occupation field code(s).
///
/// Returns `None` for no category or the "All" sentinel, so the caller can
/// omit the parameter entirely. Unknown labels pass through unchanged; the
/// upstream then treats them as a literal (probably non-matching) code.
pub fn occupation_field_code(category: Option<&str>) -> Option<String> {
    let category = category?;
    if category == ALL {
        return None;
    }
    match CATEGORY_MAPPING.iter().find(|(name, _)| *name == category) {
        Some((_, codes)) => Some(codes.join(" OR ")),
        None => Some(category.to_string()),
    }
}

/// Maps a job type label to the API's employment-type code. Same contract as
/// [`occupation_field_code`]: `None` means "send nothing", unknown labels
/// pass through.
pub fn employment_type_code(job_type: Option<&str>) -> Option<String> {
    let job_type = job_type?;
    if job_type == ALL {
        return None;
    }
    match EMPLOYMENT_TYPE_MAPPING.iter().find(|(name, _)| *name == job_type) {
        Some((_, code)) => Some((*code).to_string()),
        None => Some(job_type.to_string()),
    }
}
