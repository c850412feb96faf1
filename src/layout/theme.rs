//! Colours and text styles shared by every report page.

use genpdf::style::{Color, Style};
use rust_decimal::Decimal;

/// Semantic colouring for a figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// No emphasis.
    Neutral,
    /// Saving or compliant value.
    Positive,
    /// Overrun or non-compliant value.
    Negative,
    /// Highlighted but not judged.
    Accent,
}

impl Tone {
    /// Tone for a cost variance: overruns are negative, savings positive.
    pub fn for_variance(variance: Decimal) -> Self {
        if variance > Decimal::ZERO {
            Self::Negative
        } else if variance < Decimal::ZERO {
            Self::Positive
        } else {
            Self::Neutral
        }
    }
}

/// Palette and type scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Headings and card titles.
    pub primary: Color,
    /// Labels and captions.
    pub muted: Color,
    /// Savings and passes.
    pub positive: Color,
    /// Overruns and failures.
    pub negative: Color,
    /// Card borders and rules.
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(31, 56, 100),
            muted: Color::Rgb(110, 110, 110),
            positive: Color::Rgb(34, 139, 76),
            negative: Color::Rgb(192, 57, 43),
            border: Color::Rgb(190, 198, 210),
        }
    }
}

impl Theme {
    /// Colour associated with `tone`.
    pub fn color(&self, tone: Tone) -> Color {
        match tone {
            Tone::Neutral => Color::Rgb(0, 0, 0),
            Tone::Positive => self.positive,
            Tone::Negative => self.negative,
            Tone::Accent => self.primary,
        }
    }

    /// Cover and page titles.
    pub fn title(&self) -> Style {
        Style::new().bold().with_font_size(20).with_color(self.primary)
    }

    /// Section headings.
    pub fn heading(&self) -> Style {
        Style::new().bold().with_font_size(14).with_color(self.primary)
    }

    /// Sub-headings inside a section.
    pub fn subheading(&self) -> Style {
        Style::new().bold().with_font_size(11)
    }

    /// Small caption text above a value.
    pub fn label(&self) -> Style {
        Style::new().with_font_size(8).with_color(self.muted)
    }

    /// Large figure inside a card.
    pub fn value(&self, tone: Tone) -> Style {
        Style::new().bold().with_font_size(13).with_color(self.color(tone))
    }

    /// Footer and table text.
    pub fn small(&self) -> Style {
        Style::new().with_font_size(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn overruns_are_negative() {
        assert_eq!(Tone::for_variance(dec!(1)), Tone::Negative);
        assert_eq!(Tone::for_variance(dec!(-1)), Tone::Positive);
        assert_eq!(Tone::for_variance(dec!(0)), Tone::Neutral);
    }
}
