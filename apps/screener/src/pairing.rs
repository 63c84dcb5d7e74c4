//! Candidate pairing — joins a directory of CVs to a directory of LinkedIn
//! profile exports by normalized filename identity.
//!
//! The join is deterministic: directory listings are sorted by filename, so
//! repeated runs over an unchanged directory produce identical ordering and
//! pairing. One-sided documents are dropped from the result but never
//! silently — every drop is logged with the key and the missing side.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Which document set a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cv,
    SocialProfile,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Cv => "CV",
            DocumentKind::SocialProfile => "profile",
        })
    }
}

/// A discovered document: filesystem path plus kind. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

/// Normalized candidate identity derived from a filename. The join key
/// between the two document sets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateKey(String);

impl CandidateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully matched candidate: both documents proven present.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub key: CandidateKey,
    pub cv: Document,
    pub profile: Document,
}

/// Pair under construction during the directory join. Only fully matched
/// pairs escape this module.
#[derive(Debug, Default)]
struct CandidatePair {
    cv: Option<Document>,
    profile: Option<Document>,
}

const KIND_MARKERS: [&str; 2] = ["_cv", "_linkedin"];
const SUPPORTED_EXTENSION: &str = ".pdf";

/// Derives the candidate identity from a filename.
///
/// Strips the supported extension and the kind markers (`_cv`, `_linkedin`,
/// case-insensitive, wherever they appear, repeated until none remain),
/// then maps `_` separators to spaces, collapses whitespace, and
/// lower-cases. Case-insensitive and idempotent:
/// `normalize_key(f) == normalize_key(&f.to_uppercase())` and
/// `normalize_key(normalize_key(f).as_str()) == normalize_key(f)`.
pub fn normalize_key(file_name: &str) -> CandidateKey {
    let mut base = file_name.to_string();
    loop {
        let mut next = strip_supported_extension(&base).to_string();
        next = strip_kind_markers(&next);
        if next == base {
            break;
        }
        base = next;
    }
    let spaced = base.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    CandidateKey(collapsed.to_lowercase())
}

fn strip_supported_extension(name: &str) -> &str {
    let n = SUPPORTED_EXTENSION.len();
    if name.len() >= n
        && name.is_char_boundary(name.len() - n)
        && name[name.len() - n..].eq_ignore_ascii_case(SUPPORTED_EXTENSION)
    {
        &name[..name.len() - n]
    } else {
        name
    }
}

/// Removes every occurrence of the kind markers, ASCII-case-insensitively.
/// Single left-to-right pass; the caller loops until fixpoint.
fn strip_kind_markers(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    'scan: while i < bytes.len() {
        for marker in KIND_MARKERS {
            let m = marker.as_bytes();
            if bytes.len() - i >= m.len() && bytes[i..i + m.len()].eq_ignore_ascii_case(m) {
                i += m.len();
                continue 'scan;
            }
        }
        // Markers are pure ASCII, so `i` stays on a char boundary.
        let ch = name[i..].chars().next().expect("i is on a char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Pairs the two directories into fully matched candidates, keyed by
/// normalized identity.
///
/// Empty directories yield an empty map. Duplicate keys within one set are
/// resolved last-write-wins in sorted filename order and logged. One-sided
/// entries are dropped from the result and logged with the missing side —
/// extras are expected, but a typo'd filename should be visible in the run
/// log rather than vanishing.
pub fn match_directories(
    cv_dir: &Path,
    profile_dir: &Path,
) -> io::Result<BTreeMap<CandidateKey, MatchedPair>> {
    let cv_files = list_supported_files(cv_dir)?;
    let profile_files = list_supported_files(profile_dir)?;

    let mut building: BTreeMap<CandidateKey, CandidatePair> = BTreeMap::new();

    for path in cv_files {
        insert_document(
            &mut building,
            Document {
                path,
                kind: DocumentKind::Cv,
            },
        );
    }
    for path in profile_files {
        insert_document(
            &mut building,
            Document {
                path,
                kind: DocumentKind::SocialProfile,
            },
        );
    }

    let mut matched = BTreeMap::new();
    for (key, pair) in building {
        match (pair.cv, pair.profile) {
            (Some(cv), Some(profile)) => {
                matched.insert(
                    key.clone(),
                    MatchedPair { key, cv, profile },
                );
            }
            (Some(cv), None) => {
                warn!(
                    "dropping candidate '{key}': CV present ({}) but no matching profile",
                    cv.path.display()
                );
            }
            (None, Some(profile)) => {
                warn!(
                    "dropping candidate '{key}': profile present ({}) but no matching CV",
                    profile.path.display()
                );
            }
            (None, None) => unreachable!("entries are only created with one slot filled"),
        }
    }
    Ok(matched)
}

/// Files the kind's slot; an occupied slot is overwritten (last-write-wins
/// within a set) and logged.
fn insert_document(building: &mut BTreeMap<CandidateKey, CandidatePair>, document: Document) {
    let key = normalize_key(&file_name(&document.path));
    let kind = document.kind;
    let entry = building.entry(key.clone()).or_default();
    let slot = match kind {
        DocumentKind::Cv => &mut entry.cv,
        DocumentKind::SocialProfile => &mut entry.profile,
    };
    if let Some(previous) = slot.replace(document) {
        warn!(
            "duplicate {kind} for candidate '{key}': replacing {}",
            previous.path.display()
        );
    }
}

/// Lists supported files in a directory, sorted lexicographically by
/// filename. Sorting is the determinism guarantee for the whole join.
fn list_supported_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort_by_key(|path| file_name(path));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
