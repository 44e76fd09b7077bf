#![forbid(unsafe_code)]

//! Advanced-search mode.
//!
//! The search form keeps its mode in a hidden input (`"0"` basic, `"1"`
//! advanced) so the choice survives the round-trip through the server.

/// Which search form is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Basic,
    Advanced,
}

impl SearchMode {
    /// Read the hidden flag. Only `"1"` selects advanced mode.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim() == "1" {
            Self::Advanced
        } else {
            Self::Basic
        }
    }

    /// Value written back into the hidden flag.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Basic => "0",
            Self::Advanced => "1",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Basic => Self::Advanced,
            Self::Advanced => Self::Basic,
        }
    }

    #[must_use]
    pub const fn view(self) -> SearchModeView {
        let advanced = matches!(self, Self::Advanced);
        SearchModeView {
            fields_visible: advanced,
            on_control_visible: !advanced,
            off_control_visible: advanced,
        }
    }
}

/// What the form should display for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchModeView {
    pub fields_visible: bool,
    /// The control that switches advanced mode on.
    pub on_control_visible: bool,
    /// The control that switches advanced mode off.
    pub off_control_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_one_renders_advanced_form() {
        let view = SearchMode::from_flag("1").view();
        assert!(view.fields_visible);
        assert!(view.off_control_visible);
        assert!(!view.on_control_visible);
    }

    #[test]
    fn any_other_flag_renders_basic_form() {
        for flag in ["0", "", "true", "2"] {
            let mode = SearchMode::from_flag(flag);
            assert_eq!(mode, SearchMode::Basic, "flag {flag:?}");
            let view = mode.view();
            assert!(!view.fields_visible);
            assert!(view.on_control_visible);
            assert!(!view.off_control_visible);
        }
    }

    #[test]
    fn toggling_flips_the_flag() {
        let mode = SearchMode::Basic.toggled();
        assert_eq!(mode, SearchMode::Advanced);
        assert_eq!(mode.flag(), "1");
        assert_eq!(mode.toggled().flag(), "0");
    }
}
