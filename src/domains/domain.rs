use std::fmt;

/// A normalized domain: trimmed and lowercased
///
/// The domain is the identity key for every outcome record. It is never
/// modified after it has been read from the input list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    /// Normalizes a raw host string
    ///
    /// Returns `None` for blank input.
    ///
    /// # Examples
    ///
    /// ```
    /// use homepage_harvest::domains::Domain;
    ///
    /// let domain = Domain::parse("  Example.COM ").unwrap();
    /// assert_eq!(domain.as_str(), "example.com");
    /// assert!(Domain::parse("   ").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The filesystem-safe stem used to name this domain's records
    pub fn file_stem(&self) -> String {
        sanitize_filename(&self.0)
    }

    /// The key this domain is looked up under in the resume index
    pub fn resume_key(&self) -> String {
        self.file_stem().to_lowercase()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapses every run of characters other than Unicode word characters,
/// `.` and `-` into one `_`
///
/// Word characters are Unicode letters, digits and `_`, so internationalized
/// names keep their readable form.
///
/// # Examples
///
/// ```
/// use homepage_harvest::domains::sanitize_filename;
///
/// assert_eq!(sanitize_filename("example.com"), "example.com");
/// assert_eq!(sanitize_filename("host:8080/a b"), "host_8080_a_b");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.trim().chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out
}
