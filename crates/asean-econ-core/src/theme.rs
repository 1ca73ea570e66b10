//! Dashboard palette. Consumed only by renderers; nothing in the analysis
//! reads it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub primary: &'static str,
    pub slate: &'static str,
    pub muted: &'static str,
    pub silver: &'static str,
    pub teal: &'static str,
    pub gold: &'static str,
}

pub const THEME: Theme = Theme {
    primary: "#0B1F3A",
    slate: "#334155",
    muted: "#6B7280",
    silver: "#E5E7EB",
    teal: "#0EA5A4",
    gold: "#B08D57",
};

impl Default for Theme {
    fn default() -> Self {
        THEME
    }
}
