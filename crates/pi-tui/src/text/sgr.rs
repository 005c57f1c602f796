//! SGR (Select Graphic Rendition) state tracking.
//!
//! The wrapper and slicer walk a line's escape sequences through an
//! [`SgrTracker`] so that attributes active at a split point can be
//! re-emitted on the following line.

/// A tracked color parameter, stored as the exact SGR parameter run that
/// produced it so re-emission is byte-faithful.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ColorParam {
    /// A 16-color code (`30..=37`, `90..=97`, `40..=47`, `100..=107`).
    Base(u16),
    /// A 256-color index (`38;5;N` / `48;5;N`).
    Indexed(u16),
    /// An RGB triple (`38;2;R;G;B` / `48;2;R;G;B`).
    Rgb(u16, u16, u16),
}

/// The set of currently-active SGR attributes.
///
/// Feed it SGR parameter strings with [`apply`](Self::apply); ask for the
/// minimal sequence that reproduces the current state with
/// [`active_codes`](Self::active_codes).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SgrTracker {
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    blink: bool,
    inverse: bool,
    hidden: bool,
    strikethrough: bool,
    fg: Option<ColorParam>,
    bg: Option<ColorParam>,
}

impl SgrTracker {
    /// Create a tracker with all attributes off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no attribute is active.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Returns true if underline is currently active.
    pub fn underline_active(&self) -> bool {
        self.underline
    }

    /// Apply the parameter portion of a `CSI ... m` sequence.
    ///
    /// `params` is the text between `ESC [` and the final `m`, e.g.
    /// `"1;31"` or `"38;5;196"`. An empty string resets everything.
    /// Colon sub-parameters (`4:3`, `38:5:196`) stay attached to their
    /// leading code.
    pub fn apply(&mut self, params: &str) {
        if params.is_empty() {
            *self = Self::default();
            return;
        }
        let groups: Vec<Vec<u16>> = params
            .split(';')
            .map(|group| {
                group
                    .split(':')
                    .map(|p| p.parse::<u16>().unwrap_or(0))
                    .collect()
            })
            .collect();

        let mut i = 0;
        while i < groups.len() {
            let group = &groups[i];
            let code = group[0];
            match code {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                // `4:0` is the sub-parameter form of underline-off.
                4 => self.underline = group.get(1) != Some(&0),
                5 => self.blink = true,
                7 => self.inverse = true,
                8 => self.hidden = true,
                9 => self.strikethrough = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                25 => self.blink = false,
                27 => self.inverse = false,
                28 => self.hidden = false,
                29 => self.strikethrough = false,
                30..=37 | 90..=97 => self.fg = Some(ColorParam::Base(code)),
                39 => self.fg = None,
                40..=47 | 100..=107 => self.bg = Some(ColorParam::Base(code)),
                49 => self.bg = None,
                38 | 48 => {
                    let (color, consumed) = if group.len() > 1 {
                        (parse_extended_color(&group[1..]), 0)
                    } else {
                        parse_extended_color_groups(&groups[i + 1..])
                    };
                    let target = if code == 38 {
                        &mut self.fg
                    } else {
                        &mut self.bg
                    };
                    if let Some(c) = color {
                        *target = Some(c);
                    }
                    i += consumed;
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Feed a complete escape sequence; non-SGR sequences are ignored.
    pub fn feed(&mut self, sequence: &str) {
        if let Some(params) = sequence
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        {
            // CSI with private-mode or intermediate bytes is not SGR.
            if params
                .chars()
                .all(|c| c.is_ascii_digit() || c == ';' || c == ':')
            {
                self.apply(params);
            }
        }
    }

    /// The sequence reproducing the current state, or `None` when default.
    pub fn active_codes(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if self.bold {
            parts.push("1".into());
        }
        if self.dim {
            parts.push("2".into());
        }
        if self.italic {
            parts.push("3".into());
        }
        if self.underline {
            parts.push("4".into());
        }
        if self.blink {
            parts.push("5".into());
        }
        if self.inverse {
            parts.push("7".into());
        }
        if self.hidden {
            parts.push("8".into());
        }
        if self.strikethrough {
            parts.push("9".into());
        }
        if let Some(fg) = &self.fg {
            parts.push(color_params(fg, false));
        }
        if let Some(bg) = &self.bg {
            parts.push(color_params(bg, true));
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!("\x1b[{}m", parts.join(";")))
        }
    }
}

/// Decode the tail of a colon-form extended color (`5:N` or `2:R:G:B`).
fn parse_extended_color(tail: &[u16]) -> Option<ColorParam> {
    match tail.first() {
        Some(5) => tail.get(1).map(|&n| ColorParam::Indexed(n)),
        Some(2) => match (tail.get(1), tail.get(2), tail.get(3)) {
            (Some(&r), Some(&g), Some(&b)) => Some(ColorParam::Rgb(r, g, b)),
            _ => None,
        },
        _ => None,
    }
}

/// Decode a semicolon-form extended color from the following parameter
/// groups. Returns the color and how many groups were consumed.
fn parse_extended_color_groups(rest: &[Vec<u16>]) -> (Option<ColorParam>, usize) {
    match rest.first().map(|g| g[0]) {
        Some(5) => match rest.get(1) {
            Some(n) => (Some(ColorParam::Indexed(n[0])), 2),
            None => (None, 1),
        },
        Some(2) => match (rest.get(1), rest.get(2), rest.get(3)) {
            (Some(r), Some(g), Some(b)) => (Some(ColorParam::Rgb(r[0], g[0], b[0])), 4),
            _ => (None, rest.len().min(4)),
        },
        _ => (None, 0),
    }
}

fn color_params(color: &ColorParam, background: bool) -> String {
    let lead = if background { 48 } else { 38 };
    match color {
        ColorParam::Base(code) => code.to_string(),
        ColorParam::Indexed(n) => format!("{lead};5;{n}"),
        ColorParam::Rgb(r, g, b) => format!("{lead};2;{r};{g};{b}"),
    }
}
