//! Image size strings shared by the image directives.
//!
//! A size is `width[,height[,mode]]` where width and height are `N%`, `Npx`
//! or `auto`, and mode is `max` (default) or `hard`.

use std::sync::LazyLock;

use regex::Regex;

static DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+%|\d+px|auto)$").expect("valid dimension regex"));

/// Default width for `!imgblock`.
pub const BLOCK_DEFAULT_WIDTH: &str = "40%";
/// Default width for `!img` and `!tblimg`.
pub const IMAGE_DEFAULT_WIDTH: &str = "100%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// `max-width` / `max-height`
    Max,
    /// `width` / `height`
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSize {
    pub width: String,
    pub height: Option<String>,
    pub mode: SizeMode,
}

impl ImageSize {
    /// The size used when a directive has no size segment.
    pub fn with_default(default_width: &str) -> Self {
        Self {
            width: default_width.to_string(),
            height: None,
            mode: SizeMode::Max,
        }
    }

    /// Parse a size string, replacing invalid parts with defaults.
    pub fn parse(raw: Option<&str>, default_width: &str) -> Self {
        let Some(raw) = raw else {
            return Self::with_default(default_width);
        };

        let parts: Vec<String> = raw.split(',').map(|p| p.trim().to_lowercase()).collect();

        let width = parts
            .first()
            .filter(|w| is_valid_dimension(w))
            .cloned()
            .unwrap_or_else(|| default_width.to_string());

        let height = parts.get(1).filter(|h| is_valid_dimension(h)).cloned();

        let mode = match parts.get(2).map(String::as_str) {
            Some("hard") => SizeMode::Hard,
            _ => SizeMode::Max,
        };

        Self {
            width,
            height,
            mode,
        }
    }

    /// Inline CSS for the `style` attribute.
    pub fn css(&self) -> String {
        let (w, h) = match self.mode {
            SizeMode::Hard => ("width", "height"),
            SizeMode::Max => ("max-width", "max-height"),
        };

        let mut style = format!("{w}:{};", self.width);
        if let Some(height) = &self.height {
            style.push_str(&format!(" {h}:{height};"));
        }
        style
    }
}

fn is_valid_dimension(value: &str) -> bool {
    DIMENSION.is_match(value)
}
