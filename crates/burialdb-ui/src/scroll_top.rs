#![forbid(unsafe_code)]

//! "Back to top" button visibility.

/// Shows the button once the page is scrolled past a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTopButton {
    threshold_px: f64,
    visible: Option<bool>,
}

impl ScrollTopButton {
    #[must_use]
    pub const fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            visible: None,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.visible, Some(true))
    }

    /// Feed the current scroll offset; returns the new visibility only when
    /// it changed (always on the first call).
    pub fn update(&mut self, scroll_top: f64) -> Option<bool> {
        let visible = scroll_top.is_finite() && scroll_top > self.threshold_px;
        if self.visible == Some(visible) {
            return None;
        }
        self.visible = Some(visible);
        Some(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_changes() {
        let mut button = ScrollTopButton::new(200.0);
        assert_eq!(button.update(0.0), Some(false));
        assert_eq!(button.update(150.0), None);
        assert_eq!(button.update(200.5), Some(true));
        assert!(button.is_visible());
        assert_eq!(button.update(900.0), None);
        assert_eq!(button.update(10.0), Some(false));
    }

    #[test]
    fn non_finite_offsets_hide_the_button() {
        let mut button = ScrollTopButton::new(0.0);
        assert_eq!(button.update(f64::NAN), Some(false));
    }
}
