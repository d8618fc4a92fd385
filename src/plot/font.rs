//! TrueType font for figure text

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};
use tracing::{debug, warn};

/// Environment variable naming a `.ttf` file for titles, labels and legends.
pub const FONT_ENV: &str = "UNMIX_SWEEP_FONT";

const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT: OnceLock<bool> = OnceLock::new();

/// Register the figure font. Only the first call has an effect.
///
/// Tried in order: `explicit`, `UNMIX_SWEEP_FONT`, common system locations.
/// Returns whether figure text can be drawn; without a font, figures are
/// still written, just without titles, tick labels and legends.
pub fn init_font(explicit: Option<&Path>) -> bool {
    *TEXT.get_or_init(|| {
        let candidates = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::env::var_os(FONT_ENV).map(PathBuf::from))
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            if !is_truetype(&bytes) {
                debug!(font = %path.display(), "not a TrueType/OpenType font, skipping");
                continue;
            }
            // Registered fonts live for the rest of the process
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FAMILY, FontStyle::Normal, bytes).is_ok() {
                debug!(font = %path.display(), "figure font registered");
                return true;
            }
        }

        warn!("no TrueType font found, figures are written without text (set {FONT_ENV} to a .ttf file)");
        false
    })
}

/// Whether figure text can be drawn, registering a font on first use.
#[must_use]
pub fn text_available() -> bool {
    init_font(None)
}

fn is_truetype(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x00, 0x01, 0x00, 0x00]) || bytes.starts_with(b"true") || bytes.starts_with(b"OTTO")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truetype_magic() {
        assert!(is_truetype(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x10]));
        assert!(is_truetype(b"OTTO\x00\x0a"));
        assert!(!is_truetype(b"%PDF-1.4"));
        assert!(!is_truetype(&[]));
    }
}
