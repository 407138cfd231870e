use crate::domains::Domain;

/// Scheme and host-prefix combination tried for a domain's homepage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateTemplate {
    pub scheme: &'static str,
    pub www: bool,
}

impl CandidateTemplate {
    /// Instantiates this template for `domain`
    pub fn url_for(&self, domain: &Domain) -> String {
        let prefix = if self.www { "www." } else { "" };
        format!("{}://{}{}/", self.scheme, prefix, domain.as_str())
    }
}

/// Candidate templates in preference order
pub const CANDIDATE_TEMPLATES: [CandidateTemplate; 4] = [
    CandidateTemplate {
        scheme: "https",
        www: true,
    },
    CandidateTemplate {
        scheme: "https",
        www: false,
    },
    CandidateTemplate {
        scheme: "http",
        www: true,
    },
    CandidateTemplate {
        scheme: "http",
        www: false,
    },
];

/// Returns the homepage URLs to try for `domain`, most preferred first
///
/// # Examples
///
/// ```
/// use homepage_harvest::crawler::candidate_urls;
/// use homepage_harvest::domains::Domain;
///
/// let domain = Domain::parse("example.com").unwrap();
/// assert_eq!(
///     candidate_urls(&domain),
///     vec![
///         "https://www.example.com/",
///         "https://example.com/",
///         "http://www.example.com/",
///         "http://example.com/",
///     ]
/// );
/// ```
pub fn candidate_urls(domain: &Domain) -> Vec<String> {
    CANDIDATE_TEMPLATES
        .iter()
        .map(|template| template.url_for(domain))
        .collect()
}
