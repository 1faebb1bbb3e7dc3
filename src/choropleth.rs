use ratatui::style::Color;

/// Upper bounds (exclusive) of the first six tiers, in £/m². Each one doubles
/// the previous so tiers stay distinct across a heavily skewed distribution.
pub const THRESHOLDS: [f64; 6] = [100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0];

/// Fill colour per tier, deep blue for the cheapest land through to green.
pub const PALETTE: [Color; 7] = [
    Color::Rgb(0x1e, 0x3a, 0x8a), // deep blue
    Color::Rgb(0x25, 0x63, 0xeb), // blue
    Color::Rgb(0x0e, 0xa5, 0xe9), // sky blue
    Color::Rgb(0x06, 0xb6, 0xd4), // cyan
    Color::Rgb(0x14, 0xb8, 0xa6), // teal
    Color::Rgb(0x10, 0xb9, 0x81), // emerald
    Color::Rgb(0x22, 0xc5, 0x5e), // green
];

/// One of the seven colour tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(u8);

impl Tier {
    pub const COUNT: usize = PALETTE.len();

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn color(self) -> Color {
        PALETTE[self.index()]
    }

    /// Half-open value range covered by this tier, `None` meaning unbounded.
    pub fn range(self) -> (Option<f64>, Option<f64>) {
        let i = self.index();
        let lo = i.checked_sub(1).map(|j| THRESHOLDS[j]);
        let hi = THRESHOLDS.get(i).copied();
        (lo, hi)
    }

    pub fn all() -> impl Iterator<Item = Tier> {
        (0..Self::COUNT as u8).map(Tier)
    }
}

/// Bucket a land value per m² into its tier. Missing values land in tier 0.
pub fn bucket(value_per_m2: Option<f64>) -> Tier {
    let v = value_per_m2.unwrap_or(0.0);
    let idx = THRESHOLDS
        .iter()
        .position(|&t| v < t)
        .unwrap_or(THRESHOLDS.len());
    Tier(idx as u8)
}

/// Fill colour for a land value per m².
pub fn color_for(value_per_m2: Option<f64>) -> Color {
    bucket(value_per_m2).color()
}

/// Alpha-blend `fg` over `bg`. Non-RGB colours are returned unchanged.
pub fn blend(fg: Color, bg: Color, alpha: f64) -> Color {
    match (fg, bg) {
        (Color::Rgb(fr, fg_, fb), Color::Rgb(br, bg_, bb)) => {
            let a = alpha.clamp(0.0, 1.0);
            let mix = |f: u8, b: u8| (f as f64 * a + b as f64 * (1.0 - a)).round() as u8;
            Color::Rgb(mix(fr, br), mix(fg_, bg_), mix(fb, bb))
        }
        _ => fg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(bucket(Some(0.0)).index(), 0);
        assert_eq!(bucket(Some(99.999)).index(), 0);
        assert_eq!(bucket(Some(100.0)).index(), 1);
        assert_eq!(bucket(Some(199.0)).index(), 1);
        assert_eq!(bucket(Some(200.0)).index(), 2);
        assert_eq!(bucket(Some(400.0)).index(), 3);
        assert_eq!(bucket(Some(800.0)).index(), 4);
        assert_eq!(bucket(Some(1600.0)).index(), 5);
        assert_eq!(bucket(Some(3199.99)).index(), 5);
        assert_eq!(bucket(Some(3200.0)).index(), 6);
        assert_eq!(bucket(Some(1e9)).index(), 6);
    }

    #[test]
    fn test_missing_is_lowest() {
        assert_eq!(bucket(None), bucket(Some(0.0)));
    }

    #[test]
    fn test_thresholds_double() {
        for pair in THRESHOLDS.windows(2) {
            assert_eq!(pair[1], pair[0] * 2.0);
        }
    }

    #[test]
    fn test_non_decreasing() {
        let mut prev = bucket(Some(0.0));
        let mut seen = std::collections::HashSet::new();
        for step in 0..5000 {
            let t = bucket(Some(step as f64));
            assert!(t >= prev);
            seen.insert(t);
            prev = t;
        }
        assert_eq!(seen.len(), Tier::COUNT);
    }

    #[test]
    fn test_tier_ranges() {
        let tiers: Vec<_> = Tier::all().collect();
        assert_eq!(tiers[0].range(), (None, Some(100.0)));
        assert_eq!(tiers[3].range(), (Some(400.0), Some(800.0)));
        assert_eq!(tiers[6].range(), (Some(3200.0), None));
    }

    #[test]
    fn test_blend() {
        let white = Color::Rgb(255, 255, 255);
        let black = Color::Rgb(0, 0, 0);
        assert_eq!(blend(white, black, 1.0), white);
        assert_eq!(blend(white, black, 0.0), black);
        assert_eq!(blend(white, black, 0.6), Color::Rgb(153, 153, 153));
    }
}
