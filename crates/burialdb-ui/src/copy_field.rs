#![forbid(unsafe_code)]

//! Copy one form field's value into another.
//!
//! Edit forms pair each recorded value with its "actual" counterpart (e.g.
//! the name as written in the archive and the corrected name). A small
//! button next to the counterpart copies the recorded value over.

use core::fmt;

/// Invalid copy-field markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyFieldError {
    MissingSource,
    MissingTarget,
    /// Source and target name the same field.
    SameField(String),
}

impl fmt::Display for CopyFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource => write!(f, "copy control has no source field"),
            Self::MissingTarget => write!(f, "copy control has no target field"),
            Self::SameField(id) => write!(f, "copy control copies field {id:?} onto itself"),
        }
    }
}

impl std::error::Error for CopyFieldError {}

/// One copy control: which field feeds which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFieldSpec {
    source_id: String,
    target_id: String,
    only_if_empty: bool,
}

impl CopyFieldSpec {
    /// Read a control's `data-copy-from`, `data-copy-to` and
    /// `data-copy-only-if-empty` attributes. Ids may carry a leading `#`.
    pub fn from_attributes(
        from: Option<&str>,
        to: Option<&str>,
        only_if_empty: Option<&str>,
    ) -> Result<Self, CopyFieldError> {
        let source_id = element_id(from).ok_or(CopyFieldError::MissingSource)?;
        let target_id = element_id(to).ok_or(CopyFieldError::MissingTarget)?;
        if source_id == target_id {
            return Err(CopyFieldError::SameField(source_id));
        }
        Ok(Self {
            source_id,
            target_id,
            only_if_empty: only_if_empty
                .is_some_and(|flag| !matches!(flag.trim(), "false" | "0")),
        })
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// New value for the target field, or `None` to leave it untouched.
    #[must_use]
    pub fn apply(&self, source_value: &str, target_value: &str) -> Option<String> {
        if source_value == target_value {
            return None;
        }
        if self.only_if_empty && !target_value.trim().is_empty() {
            return None;
        }
        Some(source_value.to_owned())
    }
}

fn element_id(raw: Option<&str>) -> Option<String> {
    let id = raw?.trim();
    let id = id.strip_prefix('#').unwrap_or(id);
    if id.is_empty() {
        None
    } else {
        Some(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_source_into_target() {
        let spec = CopyFieldSpec::from_attributes(Some("#id_fio"), Some("id_actual_fio"), None)
            .expect("valid control");
        assert_eq!(spec.source_id(), "id_fio");
        assert_eq!(spec.target_id(), "id_actual_fio");
        assert_eq!(spec.apply("Petrov", "Petrow"), Some("Petrov".to_owned()));
        assert_eq!(spec.apply("Petrov", "Petrov"), None);
    }

    #[test]
    fn only_if_empty_protects_filled_targets() {
        let spec = CopyFieldSpec::from_attributes(Some("a"), Some("b"), Some(""))
            .expect("valid control");
        assert_eq!(spec.apply("x", "kept"), None);
        assert_eq!(spec.apply("x", "  "), Some("x".to_owned()));
    }

    #[test]
    fn malformed_controls_are_rejected() {
        assert_eq!(
            CopyFieldSpec::from_attributes(None, Some("b"), None),
            Err(CopyFieldError::MissingSource)
        );
        assert_eq!(
            CopyFieldSpec::from_attributes(Some("a"), Some("#"), None),
            Err(CopyFieldError::MissingTarget)
        );
        assert_eq!(
            CopyFieldSpec::from_attributes(Some("#a"), Some("a"), None),
            Err(CopyFieldError::SameField("a".to_owned()))
        );
    }
}
