use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_INDEX_COLOR: Rgb = Rgb(0, 255, 0);
pub const DEFAULT_TAG_COLOR: Rgb = Rgb(130, 130, 130);
pub const DEFAULT_DASH_COLOR: Rgb = Rgb(160, 160, 160);

const RESET: &str = "\x1b[0m";

/// 24-bit color; deserializes from `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn sgr(self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.0, self.1, self.2)
    }
}

/// Color state of one run. Every getter returns an empty string while
/// colors are disabled, so callers can format unconditionally.
#[derive(Clone, Debug)]
pub struct Colors {
    enabled: bool,
    index: Rgb,
    tag: Rgb,
    dash: Rgb,
    ls_colors: LsColors,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            enabled: false,
            index: DEFAULT_INDEX_COLOR,
            tag: DEFAULT_TAG_COLOR,
            dash: DEFAULT_DASH_COLOR,
            ls_colors: LsColors::default(),
        }
    }
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_index_color(&mut self, color: Rgb) {
        self.index = color;
    }

    pub fn set_tag_color(&mut self, color: Rgb) {
        self.tag = color;
    }

    pub fn set_dash_color(&mut self, color: Rgb) {
        self.dash = color;
    }

    pub fn set_ls_colors(&mut self, ls_colors: LsColors) {
        self.ls_colors = ls_colors;
    }

    pub fn rgb(&self, color: Rgb) -> String {
        if self.enabled {
            color.sgr()
        } else {
            String::new()
        }
    }

    pub fn index_color(&self) -> String {
        self.rgb(self.index)
    }

    pub fn tag_color(&self) -> String {
        self.rgb(self.tag)
    }

    pub fn dash_color(&self) -> String {
        self.rgb(self.dash)
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled {
            RESET
        } else {
            ""
        }
    }

    /// Wrap `text` in `color`, or return it untouched when colors are off.
    pub fn paint(&self, color: Rgb, text: &str) -> String {
        if self.enabled {
            format!("{}{text}{RESET}", color.sgr())
        } else {
            text.to_string()
        }
    }

    /// Wrap `text` in the LS_COLORS style of `path`.
    pub fn paint_path(&self, path: &Path, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match self.ls_colors.code_for(path) {
            Some(code) => format!("\x1b[{code}m{text}{RESET}"),
            None => text.to_string(),
        }
    }
}

/// `LS_COLORS` styles for paths shown in the list.
#[derive(Clone, Debug, Default)]
pub struct LsColors {
    table: Option<lscolors::LsColors>,
}

impl LsColors {
    /// Parse an `LS_COLORS` value; an empty one styles nothing.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        Self {
            table: (!spec.is_empty()).then(|| lscolors::LsColors::from_string(spec)),
        }
    }

    pub fn from_env() -> Self {
        Self {
            table: lscolors::LsColors::from_env(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_none()
    }

    /// SGR parameters for `path`, as `ls` would style it.
    pub fn code_for(&self, path: &Path) -> Option<String> {
        let style = self.table.as_ref()?.style_for_path(path)?;
        sgr_params(style)
    }
}

fn sgr_params(style: &lscolors::Style) -> Option<String> {
    let font = &style.font_style;
    let mut params: Vec<String> = [
        (font.bold, "1"),
        (font.dimmed, "2"),
        (font.italic, "3"),
        (font.underline, "4"),
        (font.slow_blink, "5"),
        (font.rapid_blink, "6"),
        (font.reverse, "7"),
        (font.hidden, "8"),
        (font.strikethrough, "9"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, code)| code.to_string())
    .collect();

    if let Some(color) = &style.foreground {
        params.extend(color_params(color, false));
    }
    if let Some(color) = &style.background {
        params.extend(color_params(color, true));
    }
    (!params.is_empty()).then(|| params.join(";"))
}

fn color_params(color: &lscolors::Color, background: bool) -> Option<String> {
    use lscolors::Color;

    let (base, extended) = if background { (40, 48) } else { (30, 38) };
    let code = match color {
        Color::Black => base,
        Color::Red => base + 1,
        Color::Green => base + 2,
        Color::Yellow => base + 3,
        Color::Blue => base + 4,
        Color::Magenta => base + 5,
        Color::Cyan => base + 6,
        Color::White => base + 7,
        Color::BrightBlack => base + 60,
        Color::BrightRed => base + 61,
        Color::BrightGreen => base + 62,
        Color::BrightYellow => base + 63,
        Color::BrightBlue => base + 64,
        Color::BrightMagenta => base + 65,
        Color::BrightCyan => base + 66,
        Color::BrightWhite => base + 67,
        Color::Fixed(n) => return Some(format!("{extended};5;{n}")),
        Color::RGB(r, g, b) => return Some(format!("{extended};2;{r};{g};{b}")),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn disabled_colors_are_empty() {
        let colors = Colors::new(false);
        assert_eq!(colors.index_color(), "");
        assert_eq!(colors.reset(), "");
        assert_eq!(colors.paint(Rgb(1, 2, 3), "x"), "x");
    }

    #[test]
    fn enabled_colors_use_truecolor_sequences() {
        let colors = Colors::new(true);
        assert_eq!(colors.index_color(), "\x1b[38;2;0;255;0m");
        assert_eq!(colors.paint(Rgb(1, 2, 3), "x"), "\x1b[38;2;1;2;3mx\x1b[0m");
    }

    #[test]
    fn ls_colors_resolves_directories_and_extensions() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("notes.md");
        fs::write(&file, "hello").unwrap();

        let ls = LsColors::parse("di=01;34:*.md=00;33:fi=0");
        assert_eq!(ls.code_for(temp.path()).as_deref(), Some("1;34"));
        assert_eq!(ls.code_for(&file).as_deref(), Some("33"));

        let plain = temp.path().join("plain");
        fs::write(&plain, "").unwrap();
        assert_eq!(ls.code_for(&plain), None);
    }

    #[test]
    fn ls_colors_render_extended_colors() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("photo.png");
        fs::write(&file, "").unwrap();

        let ls = LsColors::parse("*.png=38;5;208:*.svg=4;38;2;10;20;30;48;5;1");
        assert_eq!(ls.code_for(&file).as_deref(), Some("38;5;208"));

        let svg = temp.path().join("logo.svg");
        fs::write(&svg, "").unwrap();
        assert_eq!(ls.code_for(&svg).as_deref(), Some("4;38;2;10;20;30;48;5;1"));

        assert!(LsColors::parse("  ").is_empty());
        assert_eq!(LsColors::parse("").code_for(&svg), None);
    }
}
