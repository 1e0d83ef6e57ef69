//! Labels that annotate source spans within a diagnostic.

use hdrdep_source::Span;
use serde::{Deserialize, Serialize};

/// The visual style of a diagnostic label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The offending directive itself (`^^^^`).
    Primary,
    /// Related context, such as the header that defines a macro.
    Secondary,
}

/// An annotated source span within a diagnostic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The source span this label annotates.
    pub span: Span,
    /// The message displayed next to the underline.
    pub message: String,
    /// Whether this is a primary or secondary label.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_styles() {
        let primary = Label::primary(Span::DUMMY, "not found");
        assert_eq!(primary.style, LabelStyle::Primary);
        let secondary = Label::secondary(Span::DUMMY, "macro defined here");
        assert_eq!(secondary.style, LabelStyle::Secondary);
        assert_eq!(secondary.message, "macro defined here");
    }
}
