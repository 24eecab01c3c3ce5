//! Glyph sets for the time label.

use std::str::FromStr;

use thiserror::Error;

pub const BLOCK_HEIGHT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown font `{0}` (expected `plain` or `block`)")]
pub struct FontError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    Plain,
    Block,
}

impl FromStr for Font {
    type Err = FontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "default" => Ok(Self::Plain),
            "block" | "big" => Ok(Self::Block),
            _ => Err(FontError(s.to_string())),
        }
    }
}

impl Font {
    /// Lines to draw for `text`, or `None` when they do not fit in
    /// `width` x `height` cells and plain text should be used instead.
    pub fn layout(&self, text: &str, width: usize, height: usize) -> Option<Vec<String>> {
        match self {
            Self::Plain => None,
            Self::Block => {
                let lines = block_lines(text)?;
                let fits = height >= BLOCK_HEIGHT
                    && lines.iter().all(|l| l.chars().count() <= width);
                fits.then_some(lines)
            }
        }
    }
}

fn glyph(c: char) -> Option<[&'static str; BLOCK_HEIGHT]> {
    Some(match c {
        '0' => ["███", "█ █", "█ █", "█ █", "███"],
        '1' => ["  █", "  █", "  █", "  █", "  █"],
        '2' => ["███", "  █", "███", "█  ", "███"],
        '3' => ["███", "  █", "███", "  █", "███"],
        '4' => ["█ █", "█ █", "███", "  █", "  █"],
        '5' => ["███", "█  ", "███", "  █", "███"],
        '6' => ["███", "█  ", "███", "█ █", "███"],
        '7' => ["███", "  █", "  █", "  █", "  █"],
        '8' => ["███", "█ █", "███", "█ █", "███"],
        '9' => ["███", "█ █", "███", "  █", "███"],
        ':' => [" ", "▪", " ", "▪", " "],
        '-' => ["   ", "   ", "███", "   ", "   "],
        _ => return None,
    })
}

fn block_lines(text: &str) -> Option<Vec<String>> {
    let glyphs = text.chars().map(glyph).collect::<Option<Vec<_>>>()?;
    let lines = (0..BLOCK_HEIGHT)
        .map(|row| glyphs.iter().map(|g| g[row]).collect::<Vec<_>>().join(" "))
        .collect();
    Some(lines)
}
