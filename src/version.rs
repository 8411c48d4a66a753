//! Target version parsing and the Version Filter.
//!
//! A `MAJOR.MINOR.PATCH` string becomes the integer key `MAJOR*100+MINOR`;
//! entries whose `minAPIVersion` exceeds the key are skipped. Filtering keeps
//! document order and is monotonic in the target key.

use crate::catalog::RegistryPath;
use crate::error::{GenError, GenResult};
use crate::normalize::NormalizedEntry;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Largest major version whose key still fits in a `u32`.
pub const MAX_MAJOR: u32 = (u32::MAX - 99) / 100;

impl ApiVersion {
    /// Integer key entries are compared against (`3.7.2` → `307`).
    ///
    /// Parsing bounds `major` by [`MAX_MAJOR`] and `minor` below 100.
    pub fn key(&self) -> u32 {
        self.major * 100 + self.minor
    }
}

impl FromStr for ApiVersion {
    type Err = GenError;

    fn from_str(value: &str) -> GenResult<Self> {
        let malformed = |reason: String| GenError::MalformedVersion {
            version: value.to_string(),
            reason,
        };

        let components: Vec<&str> = value.trim().split('.').collect();
        if components.len() != 3 {
            return Err(malformed(format!(
                "expected MAJOR.MINOR.PATCH, found {} component(s)",
                components.len()
            )));
        }

        let mut parsed = [0u32; 3];
        for (slot, component) in parsed.iter_mut().zip(&components) {
            *slot = component
                .parse()
                .map_err(|_| malformed(format!("component '{component}' is not a number")))?;
        }
        if parsed[0] > MAX_MAJOR {
            return Err(malformed(format!(
                "major version {} exceeds {MAX_MAJOR}",
                parsed[0]
            )));
        }
        if parsed[1] >= 100 {
            return Err(malformed(format!(
                "minor version {} must be below 100",
                parsed[1]
            )));
        }

        Ok(Self {
            major: parsed[0],
            minor: parsed[1],
            patch: parsed[2],
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Anything the filter can gate on a minimum API key.
pub trait VersionGated {
    fn min_api_version(&self) -> u32;
    fn gate_path(&self) -> &RegistryPath;
}

impl VersionGated for NormalizedEntry {
    fn min_api_version(&self) -> u32 {
        self.entry.min_api_version
    }

    fn gate_path(&self) -> &RegistryPath {
        &self.doc_path
    }
}

/// Why an entry was left out of a generation run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkipNotice {
    pub path: RegistryPath,
    pub required: u32,
    pub target: u32,
}

impl fmt::Display for SkipNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipping {}, requires API {} > {}",
            self.path, self.required, self.target
        )
    }
}

#[derive(Clone, Debug)]
pub struct FilterOutcome<E> {
    pub included: Vec<E>,
    pub skipped: Vec<SkipNotice>,
}

impl<E> FilterOutcome<E> {
    /// Write one line per skipped entry.
    pub fn report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_skip_notices(&self.skipped, out)
    }
}

pub fn write_skip_notices<W: Write>(notices: &[SkipNotice], out: &mut W) -> io::Result<()> {
    for notice in notices {
        writeln!(out, "{notice}")?;
    }
    Ok(())
}

/// Keep entries whose minimum API key is at most `target.key()`.
///
/// Skip notices are collected, never printed; callers decide where they go.
pub fn filter_entries<E>(entries: &[E], target: ApiVersion) -> FilterOutcome<E>
where
    E: VersionGated + Clone,
{
    let key = target.key();
    let mut included = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for entry in entries {
        if entry.min_api_version() <= key {
            included.push(entry.clone());
            continue;
        }
        let notice = SkipNotice {
            path: entry.gate_path().clone(),
            required: entry.min_api_version(),
            target: key,
        };
        log::debug!("{notice}");
        skipped.push(notice);
    }
    FilterOutcome { included, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Gated(RegistryPath, u32);

    impl VersionGated for Gated {
        fn min_api_version(&self) -> u32 {
            self.1
        }
        fn gate_path(&self) -> &RegistryPath {
            &self.0
        }
    }

    fn gated(func: &str, min: u32) -> Gated {
        Gated(RegistryPath::new("arrayfire", "arith", func), min)
    }

    #[test]
    fn parses_three_component_versions() {
        let version: ApiVersion = "3.7.2".parse().unwrap();
        assert_eq!(version.key(), 307);
        assert_eq!(version.to_string(), "3.7.2");
        assert_eq!("3.10.0".parse::<ApiVersion>().unwrap().key(), 310);
    }

    #[test]
    fn rejects_wrong_component_counts() {
        for bad in ["3.7", "3.7.2.1", "", "3"] {
            let err = bad.parse::<ApiVersion>().unwrap_err();
            assert!(
                matches!(err, GenError::MalformedVersion { .. }),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_non_numeric_components() {
        let err = "3.x.0".parse::<ApiVersion>().unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn rejects_major_versions_whose_key_overflows() {
        let err = "50000000.0.0".parse::<ApiVersion>().unwrap_err();
        assert!(matches!(err, GenError::MalformedVersion { .. }));
        assert!(err.to_string().contains("major version 50000000"));

        let largest: ApiVersion = format!("{MAX_MAJOR}.99.0").parse().unwrap();
        assert_eq!(largest.key(), MAX_MAJOR * 100 + 99);
    }

    #[test]
    fn filter_keeps_order_and_reports_skips() {
        let entries = vec![gated("abs", 0), gated("future", 400), gated("sin", 307)];
        let outcome = filter_entries(&entries, "3.7.0".parse().unwrap());

        let kept: Vec<String> = outcome.included.iter().map(|e| e.0.name.clone()).collect();
        assert_eq!(kept, ["abs", "sin"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(
            outcome.skipped[0].to_string(),
            "Skipping /arrayfire/arith/future, requires API 400 > 307"
        );

        let mut buffer = Vec::new();
        outcome.report(&mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Skipping /arrayfire/arith/future, requires API 400 > 307\n"
        );
    }

    #[test]
    fn filtering_is_monotonic_in_target_version() {
        let entries: Vec<Gated> = [0, 34, 306, 307, 308, 400, 1000]
            .into_iter()
            .enumerate()
            .map(|(i, min)| gated(&format!("f{i}"), min))
            .collect();
        let versions = ["3.4.0", "3.6.9", "3.7.0", "3.8.1", "4.0.0", "10.0.0"];
        for pair in versions.windows(2) {
            let lower = filter_entries(&entries, pair[0].parse().unwrap());
            let upper = filter_entries(&entries, pair[1].parse().unwrap());
            for entry in &lower.included {
                assert!(
                    upper.included.iter().any(|e| e.0 == entry.0),
                    "{} dropped between {} and {}",
                    entry.0,
                    pair[0],
                    pair[1]
                );
            }
        }
    }
}
