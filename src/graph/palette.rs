// graph/palette.rs
// Group colors. Ids past the palette length wrap around and reuse colors.

pub const PALETTE: [&str; 10] = [
    "#001219", "#005f73", "#0a9396", "#94d2bd", "#e9d8a6", "#ee9b00", "#ca6702", "#bb3e03",
    "#ae2012", "#9b2226",
];

pub fn color(group_id: usize) -> &'static str {
    PALETTE[group_id % PALETTE.len()]
}
