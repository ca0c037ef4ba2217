//! Receipt card layout math.
//!
//! The card occupies a fixed region of the 1280x720 canvas. Line items
//! are spaced evenly from `BODY_START_Y`; when the item count would
//! overflow the body region, spacing and font size are scaled down
//! together, floored at a minimum readable size.

/// Canvas dimensions for generated text clips.
pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

/// Duration of a generated text clip, in seconds.
pub const CLIP_SECONDS: u32 = 5;

/// Y position of the first body row.
pub const BODY_START_Y: u32 = 230;

/// Vertical space available for body rows.
pub const MAX_BODY_HEIGHT: u32 = 350;

/// Row spacing when no scaling is needed.
pub const DEFAULT_LINE_SPACING: u32 = 45;

/// Body font size when no scaling is needed.
pub const DEFAULT_BODY_FONT_SIZE: u32 = 30;

/// Smallest readable body font size.
pub const MIN_BODY_FONT_SIZE: u32 = 16;

/// Computed spacing and font size for a receipt body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptLayout {
    pub line_spacing: u32,
    pub font_size: u32,
}

impl ReceiptLayout {
    /// Layout for `item_count` body rows.
    ///
    /// Invariant: `item_count * line_spacing <= MAX_BODY_HEIGHT`, so the
    /// rows never overflow the card region.
    pub fn for_items(item_count: usize) -> Self {
        let count = item_count.max(1) as u32;

        let needed = count * DEFAULT_LINE_SPACING;
        if needed <= MAX_BODY_HEIGHT {
            return Self {
                line_spacing: DEFAULT_LINE_SPACING,
                font_size: DEFAULT_BODY_FONT_SIZE,
            };
        }

        let line_spacing = MAX_BODY_HEIGHT / count;
        let font_size = (line_spacing * 3 / 4)
            .min(DEFAULT_BODY_FONT_SIZE)
            .max(MIN_BODY_FONT_SIZE);

        Self {
            line_spacing,
            font_size,
        }
    }

    /// Y position of body row `index`.
    pub fn row_y(&self, index: usize) -> u32 {
        BODY_START_Y + index as u32 * self.line_spacing
    }

    /// Y position of the total row, below the last body row.
    ///
    /// Tightly-packed bodies get a smaller gap so the total stays on
    /// the card.
    pub fn total_y(&self, item_count: usize) -> u32 {
        let last_y = self.row_y(item_count.saturating_sub(1));
        let gap = if self.line_spacing > 40 { 70 } else { 50 };
        last_y + gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_bodies_use_default_spacing() {
        let layout = ReceiptLayout::for_items(5);
        assert_eq!(layout.line_spacing, DEFAULT_LINE_SPACING);
        assert_eq!(layout.font_size, DEFAULT_BODY_FONT_SIZE);
    }

    #[test]
    fn overflowing_bodies_scale_down_to_fit() {
        // 12 rows at the default spacing would need 540px; the region
        // holds 350px, so spacing and font must shrink until they fit.
        let layout = ReceiptLayout::for_items(12);
        assert!(layout.line_spacing < DEFAULT_LINE_SPACING);
        assert!(layout.font_size < DEFAULT_BODY_FONT_SIZE);
        assert!(12 * layout.line_spacing <= MAX_BODY_HEIGHT);

        // Every row lands inside the body region.
        let last_y = layout.row_y(11);
        assert!(last_y < BODY_START_Y + MAX_BODY_HEIGHT);
    }

    #[test]
    fn font_size_never_drops_below_minimum() {
        let layout = ReceiptLayout::for_items(30);
        assert_eq!(layout.font_size, MIN_BODY_FONT_SIZE);
        assert!(30 * layout.line_spacing <= MAX_BODY_HEIGHT);
    }

    #[test]
    fn scaled_font_never_exceeds_default() {
        // Spacing of 350/8 = 43 would naively give a 32px font; the
        // default is the ceiling.
        let layout = ReceiptLayout::for_items(8);
        assert!(layout.font_size <= DEFAULT_BODY_FONT_SIZE);
    }

    #[test]
    fn row_positions_are_evenly_spaced() {
        let layout = ReceiptLayout::for_items(4);
        assert_eq!(layout.row_y(0), BODY_START_Y);
        assert_eq!(layout.row_y(3) - layout.row_y(2), layout.line_spacing);
    }

    #[test]
    fn total_row_sits_below_the_body() {
        let layout = ReceiptLayout::for_items(6);
        assert!(layout.total_y(6) > layout.row_y(5));
    }
}
