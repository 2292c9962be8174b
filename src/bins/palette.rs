use crate::error::Error;

/// Fill for regions whose attribute is missing (folium's `darkgray`).
pub const NO_DATA_COLOR: &str = "#a9a9a9";

/// A named sequential color ramp, sampled to however many buckets the
/// division count produces.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub name: &'static str,
    anchors: [(u8, u8, u8); 9],
}

/// ColorBrewer 9-class sequential ramps, the set the dashboard's map layers
/// use (BuGn for student counts, RdPu for average age).
static PALETTES: [Palette; 4] = [
    Palette {
        name: "BuGn",
        anchors: [
            (0xf7, 0xfc, 0xfd), (0xe5, 0xf5, 0xf9), (0xcc, 0xec, 0xe6),
            (0x99, 0xd8, 0xc9), (0x66, 0xc2, 0xa4), (0x41, 0xae, 0x76),
            (0x23, 0x8b, 0x45), (0x00, 0x6d, 0x2c), (0x00, 0x44, 0x1b),
        ],
    },
    Palette {
        name: "RdPu",
        anchors: [
            (0xff, 0xf7, 0xf3), (0xfd, 0xe0, 0xdd), (0xfc, 0xc5, 0xc0),
            (0xfa, 0x9f, 0xb5), (0xf7, 0x68, 0xa1), (0xdd, 0x34, 0x97),
            (0xae, 0x01, 0x7e), (0x7a, 0x01, 0x77), (0x49, 0x00, 0x6a),
        ],
    },
    Palette {
        name: "YlGnBu",
        anchors: [
            (0xff, 0xff, 0xd9), (0xed, 0xf8, 0xb1), (0xc7, 0xe9, 0xb4),
            (0x7f, 0xcd, 0xbb), (0x41, 0xb6, 0xc4), (0x1d, 0x91, 0xc0),
            (0x22, 0x5e, 0xa8), (0x25, 0x34, 0x94), (0x08, 0x1d, 0x58),
        ],
    },
    Palette {
        name: "OrRd",
        anchors: [
            (0xff, 0xf7, 0xec), (0xfe, 0xe8, 0xc8), (0xfd, 0xd4, 0x9e),
            (0xfd, 0xbb, 0x84), (0xfc, 0x8d, 0x59), (0xef, 0x65, 0x48),
            (0xd7, 0x30, 0x1f), (0xb3, 0x00, 0x00), (0x7f, 0x00, 0x00),
        ],
    },
];

/// Look up a palette by its ColorBrewer name (case-insensitive).
pub fn named_palette(name: &str) -> Result<&'static Palette, Error> {
    PALETTES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::MissingPalette { name: name.to_string() })
}

impl Palette {
    /// Sample `buckets` evenly spaced colors across the ramp as `#rrggbb`
    /// strings, interpolating between the 9 anchors so any division count up
    /// to the dashboard's ceiling of 100 gets distinct colors.
    pub fn sample(&self, buckets: usize) -> Vec<String> {
        (0..buckets)
            .map(|i| {
                let t = if buckets <= 1 { 0.0 } else { i as f64 / (buckets - 1) as f64 };
                let (r, g, b) = self.at(t);
                format!("#{r:02x}{g:02x}{b:02x}")
            })
            .collect()
    }

    /// Linear RGB interpolation over the anchors, `t` in `[0, 1]`.
    fn at(&self, t: f64) -> (u8, u8, u8) {
        let pos = t.clamp(0.0, 1.0) * (self.anchors.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        if lo == hi {
            return self.anchors[lo];
        }
        let frac = pos - lo as f64;
        let lerp = |a: u8, b: u8| (a as f64 + frac * (b as f64 - a as f64)).round() as u8;
        let (ar, ag, ab) = self.anchors[lo];
        let (br, bg, bb) = self.anchors[hi];
        (lerp(ar, br), lerp(ag, bg), lerp(ab, bb))
    }
}

#[cfg(test)]
mod tests {
    use super::{named_palette, NO_DATA_COLOR};
    use crate::error::Error;

    #[test]
    fn lookup_is_case_insensitive_and_unknown_fails() {
        assert_eq!(named_palette("bugn").unwrap().name, "BuGn");
        assert!(matches!(named_palette("Viridis"), Err(Error::MissingPalette { .. })));
    }

    #[test]
    fn nine_buckets_reproduce_the_anchors() {
        let colors = named_palette("BuGn").unwrap().sample(9);
        assert_eq!(colors[0], "#f7fcfd");
        assert_eq!(colors[4], "#66c2a4");
        assert_eq!(colors[8], "#00441b");
    }

    #[test]
    fn any_bucket_count_spans_the_full_ramp() {
        let palette = named_palette("RdPu").unwrap();
        for buckets in [1, 2, 3, 8, 50, 99] {
            let colors = palette.sample(buckets);
            assert_eq!(colors.len(), buckets);
            if buckets > 1 {
                assert_eq!(colors.last().map(String::as_str), Some("#49006a"));
            }
            for c in &colors {
                assert_eq!(c.len(), 7);
                assert!(c.starts_with('#'));
            }
        }
        assert_eq!(palette.sample(1)[0], "#fff7f3");
    }

    #[test]
    fn no_data_color_is_the_reserved_gray() {
        assert_eq!(NO_DATA_COLOR, "#a9a9a9");
    }
}
