use crate::error::{PickerError, Result};

/// Columns taken by the popup border.
pub const HOR_BORDER: i64 = 2;

/// Rows taken by the popup border, prompt and info line, plus the header line.
pub const fn ver_border(show_header: bool) -> i64 {
    if show_header {
        5
    } else {
        4
    }
}

/// Size of the tmux pane the popup is drawn over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaneSize {
    pub height: i64,
    pub width: i64,
}

/// Resolved `tmux popup` placement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopupGeometry {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub width: Option<i64>,
    pub height: i64,
}

impl PopupGeometry {
    /// Pull `-x`, `-y`, `-w`, `-h` and `--maxnum-displayed` out of the user's
    /// fzf arguments and turn them into popup placement. Whatever is left in
    /// `user_args` is meant for fzf itself.
    ///
    /// Sizes accept an absolute value or a percentage of the pane's inner size;
    /// a zero value counts as unset.
    pub fn resolve(
        user_args: &mut Vec<String>,
        pane: PaneSize,
        choices: usize,
        show_header: bool,
    ) -> Result<Self> {
        let ver_border = ver_border(show_header);

        let x = parse_int_option("-x", extract_option(user_args, "-x")?, None)?;
        let y = parse_int_option("-y", extract_option(user_args, "-y")?, None)?;

        let width = parse_int_option(
            "-w",
            extract_option(user_args, "-w")?,
            Some(pane.width - HOR_BORDER),
        )?
        .filter(|&w| w != 0)
        .map(|w| w.max(1).saturating_add(HOR_BORDER).min(pane.width));

        let mut height = parse_int_option(
            "-h",
            extract_option(user_args, "-h")?,
            Some(pane.height - ver_border),
        )?
        .filter(|&h| h != 0)
        .map(|h| h.max(1))
        .unwrap_or_else(|| i64::try_from(choices).unwrap_or(i64::MAX));

        let maxnum = parse_int_option(
            "--maxnum-displayed",
            extract_option(user_args, "--maxnum-displayed")?,
            Some(pane.height - ver_border),
        )?;
        if let Some(maxnum) = maxnum.filter(|&m| m != 0) {
            height = height.min(maxnum);
        }

        Ok(Self {
            x: x.filter(|&x| x != 0),
            y: y.filter(|&y| y != 0),
            width,
            height: height.saturating_add(ver_border).min(pane.height),
        })
    }

    /// `tmux popup` flags for this placement.
    pub fn tmux_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(x) = self.x {
            args.extend(["-x".to_string(), x.to_string()]);
        }
        if let Some(y) = self.y {
            args.extend(["-y".to_string(), y.to_string()]);
        }
        if let Some(width) = self.width {
            args.extend(["-w".to_string(), width.to_string()]);
        }
        args.extend(["-h".to_string(), self.height.to_string()]);
        args
    }
}

/// Remove `option` and the value after it from `args`.
fn extract_option(args: &mut Vec<String>, option: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|arg| arg == option) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(missing_or_invalid(option));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

/// Percentages are only accepted where there is a non-zero reference size.
fn parse_int_option(option: &str, value: Option<String>, reference: Option<i64>) -> Result<Option<i64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    let parsed = match (reference.filter(|&r| r != 0), value.strip_suffix('%')) {
        (Some(reference), Some(percent)) => percent
            .parse::<i64>()
            .map(|percent| reference.saturating_mul(percent).div_euclid(100)),
        _ => value.parse::<i64>(),
    };
    parsed.map(Some).map_err(|_| missing_or_invalid(option))
}

fn missing_or_invalid(option: &str) -> PickerError {
    PickerError::InvalidOption(format!(
        "option '{option}' is defined but its value is missing or invalid"
    ))
}
