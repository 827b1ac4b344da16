//! Serial device discovery.
//!
//! The scanner lists the host device directory once, then walks an ordered
//! list of compiled name patterns. Each pattern claims the entries it matches
//! that no earlier pattern claimed, so a name matching several patterns is
//! recorded once under the highest-priority category.
//!
//! ## Built-in patterns
//!
//! | Priority | Category   | Pattern                             |
//! |----------|------------|-------------------------------------|
//! | 1        | USB        | `ttyUSB<n>`                         |
//! | 2        | ACM        | `ttyACM<n>`                         |
//! | 3        | Standard   | `ttyS<n>`, `ttyAMA<n>`, `serial<n>` |
//! | 4        | Custom     | `tty<letters><n>`                   |
//!
//! User-supplied patterns are appended after the built-ins as [`DeviceCategory::Custom`].

use {
    crate::{
        device::{DeviceCandidate, DeviceCategory, DeviceSet},
        error::{Error, Result},
        fs::DeviceFs,
    },
    log::{debug, info, trace, warn},
    regex::Regex,
    std::path::{Path, PathBuf},
};

/// Built-in name patterns in priority order.
pub const BUILTIN_PATTERNS: &[(DeviceCategory, &str)] = &[
    (DeviceCategory::Usb, r"^ttyUSB[0-9]+$"),
    (DeviceCategory::Acm, r"^ttyACM[0-9]+$"),
    (DeviceCategory::Standard, r"^ttyS[0-9]+$"),
    (DeviceCategory::Standard, r"^ttyAMA[0-9]+$"),
    (DeviceCategory::Standard, r"^serial[0-9]+$"),
    (DeviceCategory::Custom, r"^tty[A-Za-z]+[0-9]+$"),
];

/// Default device directory.
pub const DEFAULT_DEV_DIR: &str = "/dev";

/// A compiled device name pattern tagged with its category.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    category: DeviceCategory,
    regex: Regex,
}

impl PatternMatcher {
    /// Compile a pattern.
    pub fn new(category: DeviceCategory, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { category, regex })
    }

    /// Category assigned to names this pattern matches.
    pub fn category(&self) -> DeviceCategory {
        self.category
    }

    /// Source text of the pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether a directory entry name matches.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Enumerates serial device candidates by category.
#[derive(Debug, Clone)]
pub struct DeviceScanner {
    host_dir: PathBuf,
    sandbox_dir: PathBuf,
    matchers: Vec<PatternMatcher>,
}

impl DeviceScanner {
    /// Create a scanner with the built-in patterns.
    ///
    /// `host_dir` is listed; candidates are reported under `sandbox_dir`.
    pub fn new(host_dir: impl Into<PathBuf>, sandbox_dir: impl Into<PathBuf>) -> Result<Self> {
        let matchers = BUILTIN_PATTERNS
            .iter()
            .map(|(category, pattern)| PatternMatcher::new(*category, pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            host_dir: host_dir.into(),
            sandbox_dir: sandbox_dir.into(),
            matchers,
        })
    }

    /// Append user-supplied patterns, classified as [`DeviceCategory::Custom`].
    pub fn with_extra_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            self.matchers
                .push(PatternMatcher::new(DeviceCategory::Custom, pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Matchers in evaluation order.
    pub fn matchers(&self) -> &[PatternMatcher] {
        &self.matchers
    }

    /// Directory that is listed.
    pub fn host_dir(&self) -> &Path {
        &self.host_dir
    }

    /// Directory candidate paths are reported under.
    pub fn sandbox_dir(&self) -> &Path {
        &self.sandbox_dir
    }

    /// Host-side path of a candidate.
    pub fn host_path(&self, candidate: &DeviceCandidate) -> PathBuf {
        match candidate.path.strip_prefix(&self.sandbox_dir) {
            Ok(rel) => self.host_dir.join(rel),
            Err(_) => candidate.path.clone(),
        }
    }

    /// Scan the host directory.
    ///
    /// An unreadable directory or zero matches yields an empty set.
    pub fn scan(&self, fs: &impl DeviceFs) -> DeviceSet {
        let mut set = DeviceSet::new();

        let mut names = match fs.list_dir(&self.host_dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(
                    "Cannot list device directory {}: {e}",
                    self.host_dir.display()
                );
                return set;
            },
        };
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));

        for matcher in &self.matchers {
            for name in names
                .iter()
                .filter(|n| matcher.matches(n))
            {
                let path = self.sandbox_dir.join(name);
                if set.contains(&path) {
                    trace!("{name} already claimed, skipping for {}", matcher.pattern());
                    continue;
                }

                if !fs.exists(&self.host_dir.join(name)) {
                    debug!("Ignoring {name}: entry does not resolve");
                    continue;
                }

                debug!("Found {} device {}", matcher.category(), path.display());
                set.insert(DeviceCandidate::new(path, matcher.category()));
            }
        }

        if set.is_empty() {
            info!("No serial devices found in {}", self.host_dir.display());
        } else {
            info!(
                "Found {} serial device(s) in {}",
                set.len(),
                self.host_dir.display()
            );
        }

        set
    }
}

/// Sort key that orders `ttyUSB2` before `ttyUSB10`.
fn natural_key(name: &str) -> (&str, Option<u64>, &str) {
    let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[prefix.len()..];
    (prefix, digits.parse().ok(), digits)
}
