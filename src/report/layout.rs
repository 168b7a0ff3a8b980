//! Places card text on fixed-size report pages.
//!
//! Every card takes two lines (bold title, plain description). Lines are never
//! wrapped. The cursor walks down the page one line height at a time and a new
//! page starts once it drops below the bottom margin.

use crate::cards::model::Card;

/// A4 width in points.
pub const PAGE_WIDTH: i64 = 595;
/// A4 height in points.
pub const PAGE_HEIGHT: i64 = 842;
pub const MARGIN: i64 = 40;
pub const LINE_HEIGHT: i64 = 20;
/// Baseline of the first line on every page.
pub const TOP_Y: i64 = PAGE_HEIGHT - MARGIN;
/// Vertical space taken by the report title.
pub const TITLE_ADVANCE: i64 = 2 * LINE_HEIGHT;
/// Line slots between the top line and the bottom margin.
pub const LINES_PER_PAGE: usize = ((TOP_Y - MARGIN) / LINE_HEIGHT + 1) as usize;

pub const DEFAULT_REPORT_TITLE: &str = "Construction Progress Report";

const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// A single string drawn at a fixed baseline position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDraw {
    pub x: i64,
    pub y: i64,
    pub style: FontStyle,
    pub size: i64,
    pub text: String,
}

/// One page worth of text draws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub draws: Vec<TextDraw>,
}

/// Stateless page composer.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    title: String,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_TITLE)
    }
}

impl ReportLayout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Lay out `cards` onto as many pages as they need. Always at least one.
    pub fn compose(&self, cards: &[Card]) -> Vec<Page> {
        let mut pages = vec![Page::default()];
        let mut y = TOP_Y;

        pages[0].draws.push(TextDraw {
            x: MARGIN,
            y,
            style: FontStyle::Bold,
            size: TITLE_SIZE,
            text: self.title.clone(),
        });
        y -= TITLE_ADVANCE;

        let lines = cards.iter().flat_map(|card| {
            [
                (FontStyle::Bold, card.title.as_str()),
                (FontStyle::Regular, card.description.as_str()),
            ]
        });

        for (style, text) in lines {
            if y < MARGIN {
                pages.push(Page::default());
                y = TOP_Y;
            }
            if let Some(page) = pages.last_mut() {
                page.draws.push(TextDraw {
                    x: MARGIN,
                    y,
                    style,
                    size: BODY_SIZE,
                    text: text.to_string(),
                });
            }
            y -= LINE_HEIGHT;
        }

        pages
    }
}
