/// Theme flag driving the backdrop colors. Owned by the host; the renderer
/// only ever receives it through the shared input state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl From<winit::window::Theme> for Theme {
    fn from(theme: winit::window::Theme) -> Self {
        match theme {
            winit::window::Theme::Light => Theme::Light,
            winit::window::Theme::Dark => Theme::Dark,
        }
    }
}

/// Color set for one theme. Derived, never stored across theme changes;
/// applying it only rewrites uniform values, geometry stays untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: [f32; 3],
    pub secondary: [f32; 3],
    pub dust_color: [f32; 3],
    pub dust_opacity: f32,
    pub clear_color: [f64; 3],
}

impl Palette {
    pub fn of(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                primary: [0.8, 0.3, 1.0],
                secondary: [0.4, 0.1, 0.6],
                dust_color: [1.0, 1.0, 1.0],
                dust_opacity: 0.4,
                clear_color: [0.02, 0.02, 0.04],
            },
            Theme::Light => Palette {
                primary: [0.6, 0.2, 0.8],
                secondary: [0.4, 0.1, 0.5],
                // 0x555555
                dust_color: [0x55 as f32 / 255.0; 3],
                dust_opacity: 0.2,
                clear_color: [0.97, 0.97, 0.98],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_palette_matches_expected_colors() {
        let palette = Palette::of(Theme::Dark);
        assert_eq!(palette.primary, [0.8, 0.3, 1.0]);
        assert_eq!(palette.secondary, [0.4, 0.1, 0.6]);
        assert_eq!(palette.dust_color, [1.0, 1.0, 1.0]);
        assert_eq!(palette.dust_opacity, 0.4);
    }

    #[test]
    fn light_palette_matches_expected_colors() {
        let palette = Palette::of(Theme::Light);
        assert_eq!(palette.primary, [0.6, 0.2, 0.8]);
        assert_eq!(palette.secondary, [0.4, 0.1, 0.5]);
        assert!(palette.dust_color[0] > 0.33 && palette.dust_color[0] < 0.34);
        assert_eq!(palette.dust_opacity, 0.2);
    }

    #[test]
    fn repeated_derivation_is_idempotent() {
        assert_eq!(Palette::of(Theme::Dark), Palette::of(Theme::Dark));
        assert_eq!(Palette::of(Theme::Light), Palette::of(Theme::Light));
    }

    #[test]
    fn toggle_flips_and_returns() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
