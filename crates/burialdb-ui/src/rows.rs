#![forbid(unsafe_code)]

//! Clickable table rows.
//!
//! List rows flagged as clickable navigate to their `data-href` when clicked,
//! either in the current browsing context or, when flagged, in a new one.
//! [`RowBinder`] keeps an explicit registry of bound rows: each bound element
//! is stamped with a [`RowKey`], and later binding passes skip elements whose
//! key is already registered. Re-running the binder after inserting a page of
//! rows therefore binds only the new rows, and a click yields at most one
//! navigation.

use core::fmt;

use rustc_hash::FxHashMap;
use tracing::debug;

/// Identity of a bound row, stamped on its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(u64);

impl RowKey {
    /// Parse the stamped attribute value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a clickable row cannot be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTargetError {
    /// The row has no destination address.
    MissingHref,
}

impl fmt::Display for RowTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHref => write!(f, "clickable row has no destination address"),
        }
    }
}

impl std::error::Error for RowTargetError {}

/// Where a click should take the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    SameContext(String),
    NewContext(String),
}

impl Navigation {
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::SameContext(href) | Self::NewContext(href) => href,
        }
    }
}

/// Destination of one clickable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTarget {
    href: String,
    open_in_new_context: bool,
}

impl RowTarget {
    /// Read a row's destination from its attributes.
    ///
    /// The row opens in a new context when `target` is `_blank` or the
    /// new-window attribute is present and not `"false"`/`"0"` (an empty value
    /// counts as present, like an HTML boolean attribute).
    pub fn from_attributes(
        href: Option<&str>,
        target: Option<&str>,
        new_window: Option<&str>,
    ) -> Result<Self, RowTargetError> {
        let href = href
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or(RowTargetError::MissingHref)?;
        let blank_target = target.is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"));
        let new_window = new_window.is_some_and(|flag| {
            !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            )
        });
        Ok(Self {
            href: href.to_owned(),
            open_in_new_context: blank_target || new_window,
        })
    }

    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    #[must_use]
    pub const fn opens_in_new_context(&self) -> bool {
        self.open_in_new_context
    }

    #[must_use]
    pub fn navigation(&self) -> Navigation {
        if self.open_in_new_context {
            Navigation::NewContext(self.href.clone())
        } else {
            Navigation::SameContext(self.href.clone())
        }
    }
}

/// Attributes read from one clickable element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCandidate {
    /// Stamped key, if the element was bound before.
    pub key: Option<String>,
    pub href: Option<String>,
    pub target: Option<String>,
    pub new_window: Option<String>,
}

/// A row bound by the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundRow {
    /// Position in the candidate sequence passed to [`RowBinder::bind`].
    pub index: usize,
    pub key: RowKey,
}

/// Outcome of one binding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: Vec<BoundRow>,
    pub already_bound: usize,
    pub rejected: Vec<(usize, RowTargetError)>,
}

/// Registry of bound clickable rows.
#[derive(Debug, Default)]
pub struct RowBinder {
    targets: FxHashMap<RowKey, RowTarget>,
    next_key: u64,
}

impl RowBinder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every candidate not already registered with this binder.
    ///
    /// The host stamps each returned [`BoundRow::key`] on its element and
    /// attaches exactly one click listener to it.
    pub fn bind(&mut self, candidates: impl IntoIterator<Item = RowCandidate>) -> BindReport {
        let mut report = BindReport::default();

        for (index, candidate) in candidates.into_iter().enumerate() {
            if candidate
                .key
                .as_deref()
                .and_then(RowKey::parse)
                .is_some_and(|key| self.is_bound(key))
            {
                report.already_bound += 1;
                continue;
            }

            match RowTarget::from_attributes(
                candidate.href.as_deref(),
                candidate.target.as_deref(),
                candidate.new_window.as_deref(),
            ) {
                Ok(target) => {
                    let key = self.allocate_key();
                    self.targets.insert(key, target);
                    report.bound.push(BoundRow { index, key });
                }
                Err(error) => report.rejected.push((index, error)),
            }
        }

        debug!(
            bound = report.bound.len(),
            already_bound = report.already_bound,
            rejected = report.rejected.len(),
            "row binding pass"
        );
        report
    }

    /// Navigation for a click on the row stamped with `key`.
    #[must_use]
    pub fn navigation_for(&self, key: RowKey) -> Option<Navigation> {
        self.targets.get(&key).map(RowTarget::navigation)
    }

    #[must_use]
    pub fn is_bound(&self, key: RowKey) -> bool {
        self.targets.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn allocate_key(&mut self) -> RowKey {
        self.next_key = self.next_key.saturating_add(1);
        RowKey(self.next_key)
    }
}
