/// Splitting a fully-qualified domain into record label and apex
///
/// The apex (registrable domain) comes from a [`SuffixList`]. When a public
/// suffix list file is configured, or installed under `/usr/share/publicsuffix`,
/// it is parsed into [`PublicSuffixList`]; otherwise [`TwoLabel`] takes the
/// last two labels, which is wrong for multi-label suffixes such as `co.uk`.
use crate::error::{Error, Result};
use publicsuffix::{List, Psl};
use std::fs;
use std::path::Path;

/// Source of registrable domains
pub trait SuffixList {
    /// Registrable domain of `domain`, or `None` when `domain` is itself a
    /// public suffix.
    fn registrable_domain(&self, domain: &str) -> Option<String>;
}

/// Naive fallback: the apex is the last two labels
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoLabel;

impl SuffixList for TwoLabel {
    fn registrable_domain(&self, domain: &str) -> Option<String> {
        let parts: Vec<&str> = domain.rsplitn(3, '.').collect();
        if parts.len() < 2 {
            return None;
        }
        Some(format!("{}.{}", parts[1], parts[0]))
    }
}

/// Rules from a Mozilla public suffix list file
pub struct PublicSuffixList {
    list: List,
}

impl PublicSuffixList {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read suffix list '{}': {}", path, e)))?;
        Self::parse(&content)
            .map_err(|e| Error::config(format!("invalid suffix list '{}': {}", path, e)))
    }

    /// Parse the list format: `//` comments, one rule per line, `*.` for
    /// wildcards and `!` for exceptions.
    pub fn parse(content: &str) -> std::result::Result<Self, publicsuffix::Error> {
        Ok(PublicSuffixList {
            list: content.parse()?,
        })
    }
}

impl SuffixList for PublicSuffixList {
    fn registrable_domain(&self, domain: &str) -> Option<String> {
        let lowered = domain.to_ascii_lowercase();
        let registrable = self.list.domain(lowered.as_bytes())?;
        let count = registrable.as_bytes().split(|b| *b == b'.').count();

        // Same labels, in the caller's spelling
        let labels: Vec<&str> = domain.split('.').collect();
        let skip = labels.len().checked_sub(count)?;
        Some(labels[skip..].join("."))
    }
}

/// Public suffix lists installed by distribution packages (`publicsuffix`)
pub const SYSTEM_SUFFIX_LISTS: [&str; 2] = [
    "/usr/share/publicsuffix/public_suffix_list.dat",
    "/usr/share/publicsuffix/effective_tld_names.dat",
];

/// Build the suffix list named in the configuration. Without one, the first
/// system list that loads is used, then the two-label fallback.
pub fn load_suffix_list(path: Option<&str>) -> Result<Box<dyn SuffixList>> {
    load_suffix_list_from(path, &SYSTEM_SUFFIX_LISTS)
}

fn load_suffix_list_from(path: Option<&str>, system: &[&str]) -> Result<Box<dyn SuffixList>> {
    if let Some(path) = path {
        let list = PublicSuffixList::from_file(path)?;
        log::debug!("Loaded public suffix list from {}", path);
        return Ok(Box::new(list));
    }

    for candidate in system {
        if !Path::new(candidate).is_file() {
            continue;
        }
        match PublicSuffixList::from_file(candidate) {
            Ok(list) => {
                log::debug!("Loaded public suffix list from {}", candidate);
                return Ok(Box::new(list));
            }
            Err(e) => log::warn!("Skipping system suffix list: {}", e),
        }
    }

    log::debug!("No public suffix list found, using the last two labels as apex");
    Ok(Box::new(TwoLabel))
}

/// The domain being updated, with its record label and apex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub domain: String,
    pub record: String,
    pub apex: String,
}

impl Target {
    pub fn is_apex(&self) -> bool {
        self.record == "@"
    }

    /// Record label as a provider spells it, using `apex_name` for the apex.
    pub fn label_or<'a>(&'a self, apex_name: &'a str) -> &'a str {
        if self.is_apex() {
            apex_name
        } else {
            &self.record
        }
    }
}

/// Split `domain` into `(record, apex)`. Pure, no network access.
pub fn split(domain: &str, suffixes: &dyn SuffixList) -> Target {
    let apex = suffixes
        .registrable_domain(domain)
        .unwrap_or_else(|| domain.to_string());
    let prefix = domain.strip_suffix(apex.as_str()).unwrap_or_default();
    let record = match prefix.trim_matches('.') {
        "" => "@",
        label => label,
    };

    Target {
        domain: domain.to_string(),
        record: record.to_string(),
        apex,
    }
}

/// Reject domains that cannot name an A record.
pub fn validate(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("domain is required (use --domain)"));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(Error::config(format!(
            "'{}' is not a fully-qualified domain",
            domain
        )));
    }
    for label in labels {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::config(format!("'{}' has an invalid label", domain)));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "'{}' contains characters not allowed in a hostname",
                domain
            )));
        }
    }
    Ok(())
}
