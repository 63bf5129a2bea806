//! Bidirectional scroll synchronization between the two panes.
//!
//! Either pane can scroll; the synchronizer mirrors the scroll *fraction*
//! to the other pane so both stay proportionally aligned. A transient guard
//! flag suppresses the mirrored write from re-triggering the opposite
//! pane's handler within the same frame.

/// Read-only scroll snapshot for one pane, taken at the scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    /// First visible line index.
    pub offset: usize,
    /// Visible height in lines.
    pub height: usize,
    /// Total content length in lines.
    pub total: usize,
}

impl ScrollRegion {
    pub const fn new(offset: usize, height: usize, total: usize) -> Self {
        Self {
            offset,
            height,
            total,
        }
    }

    /// Scrollable range: how far the offset can travel.
    pub const fn range(&self) -> usize {
        self.total.saturating_sub(self.height)
    }

    /// Scroll fraction in [0, 1].
    ///
    /// `None` when the region has no overflow — a pane that cannot scroll
    /// cannot meaningfully donate a fraction.
    pub fn fraction(&self) -> Option<f64> {
        let range = self.range();
        if range == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.offset.min(range) as f64 / range as f64;
        Some(fraction)
    }
}

/// Which pane a scroll event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    Editor,
    Preview,
}

/// Mirrors scroll fractions between two panes without feedback loops.
///
/// The guard flag is set immediately before a mirrored write and stays set
/// until [`ScrollSync::release`] is called at the next frame boundary.
/// While guarded, incoming scroll events are ignored — the mirrored write
/// would otherwise re-trigger the opposite handler and the two panes would
/// chase each other indefinitely.
#[derive(Debug)]
pub struct ScrollSync {
    enabled: bool,
    guarded: bool,
}

impl ScrollSync {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            guarded: false,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether a mirrored write is in flight this frame.
    pub const fn is_guarded(&self) -> bool {
        self.guarded
    }

    /// Compute the mirrored offset for `target` after `source` scrolled.
    ///
    /// Returns `None` (no write) when sync is disabled, when the guard is
    /// set, or when either region has no scrollable range. On a `Some`
    /// result the guard is set; the caller must apply the returned offset
    /// and call [`ScrollSync::release`] at the next frame boundary.
    pub fn mirror(&mut self, source: ScrollRegion, target: ScrollRegion) -> Option<usize> {
        if !self.enabled || self.guarded {
            return None;
        }
        let fraction = source.fraction()?;
        let target_range = target.range();
        if target_range == 0 {
            return None;
        }

        // Guard before the write so the write's own event is suppressed.
        self.guarded = true;

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let mirrored = (fraction * target_range as f64).round() as usize;
        Some(mirrored)
    }

    /// Clear the guard at the frame boundary.
    ///
    /// Called once per event-loop iteration, after the draw. This bounds
    /// the feedback-suppression window to a single frame: the mirrored
    /// write's own scroll event is handled (and dropped) inside the same
    /// iteration it was produced in.
    pub const fn release(&mut self) {
        self.guarded = false;
    }
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(true)
    }
}
