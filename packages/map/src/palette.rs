//! Fixed polygon color palette.
//!
//! Colors are handed out by polygon insertion order, wrapping around once
//! the palette is exhausted.

/// Sixteen CSS colors, in assignment order.
pub const PALETTE: [&str; 16] = [
    "blue",
    "red",
    "green",
    "purple",
    "orange",
    "darkblue",
    "darkred",
    "darkgreen",
    "cadetblue",
    "#5b396b",
    "pink",
    "lightblue",
    "#ff8e7f",
    "lightgreen",
    "gray",
    "black",
];

/// Color for the polygon at `index` in insertion order.
#[must_use]
pub const fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}
