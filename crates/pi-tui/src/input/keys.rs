//! Keystroke classification.
//!
//! Turns one complete input sequence (as segmented by the stdin buffer)
//! into a canonical [`KeyId`] plus an event kind. The Kitty keyboard
//! protocol (CSI-u) is the primary format; the legacy xterm sequences
//! are the fallback and remain valid while the protocol is active.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide Kitty protocol activation, set by the terminal adapter
/// when the `CSI ? flags u` acknowledgment is observed. Only the event
/// thread writes it.
static KITTY_PROTOCOL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether the Kitty keyboard protocol has been acknowledged.
pub fn kitty_protocol_active() -> bool {
    KITTY_PROTOCOL_ACTIVE.load(Ordering::Relaxed)
}

/// Record Kitty protocol activation (or deactivation on exit).
pub fn set_kitty_protocol_active(active: bool) {
    KITTY_PROTOCOL_ACTIVE.store(active, Ordering::Relaxed);
}

/// Symbols accepted as a [`KeyId`] base.
const SYMBOLS: &str = "`-=[]\\;',./!@#$%^&*()_+|~{}:<>?";

/// Named keys accepted as a [`KeyId`] base.
const NAMED: &[&str] = &[
    "escape",
    "enter",
    "tab",
    "space",
    "backspace",
    "delete",
    "insert",
    "home",
    "end",
    "pageUp",
    "pageDown",
    "up",
    "down",
    "left",
    "right",
    "clear",
    "f1",
    "f2",
    "f3",
    "f4",
    "f5",
    "f6",
    "f7",
    "f8",
    "f9",
    "f10",
    "f11",
    "f12",
];

/// A canonical key identifier: modifier set plus base key.
///
/// Displays as `[ctrl+][shift+][alt+]base`; parsing accepts modifiers
/// in any order. Equality is modifier-set + base equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyId {
    ctrl: bool,
    shift: bool,
    alt: bool,
    base: String,
}

impl KeyId {
    /// A key with no modifiers. Returns `None` for an invalid base.
    pub fn new(base: &str) -> Option<Self> {
        Self::with_modifiers(base, false, false, false)
    }

    /// A key with an explicit modifier set.
    pub fn with_modifiers(base: &str, ctrl: bool, shift: bool, alt: bool) -> Option<Self> {
        if !is_valid_base(base) {
            return None;
        }
        Some(Self {
            ctrl,
            shift,
            alt,
            base: base.to_string(),
        })
    }

    /// Parse a key identifier such as `"shift+ctrl+c"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (mods, base) = match s.rfind('+') {
            Some(i) if i + 1 < s.len() => (&s[..i], &s[i + 1..]),
            // A trailing '+' means the base itself is '+'.
            Some(0) => ("", "+"),
            Some(i) => (&s[..i - 1], "+"),
            None => ("", s),
        };
        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            match part {
                "ctrl" => ctrl = true,
                "shift" => shift = true,
                "alt" => alt = true,
                _ => return None,
            }
        }
        Self::with_modifiers(base, ctrl, shift, alt)
    }

    /// The base key name.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Ctrl modifier.
    pub fn ctrl(&self) -> bool {
        self.ctrl
    }

    /// Shift modifier.
    pub fn shift(&self) -> bool {
        self.shift
    }

    /// Alt modifier.
    pub fn alt(&self) -> bool {
        self.alt
    }

    /// True when this identifier equals the canonical spelling `other`.
    pub fn is(&self, other: &str) -> bool {
        KeyId::parse(other).is_some_and(|k| k == *self)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.shift {
            write!(f, "shift+")?;
        }
        if self.alt {
            write!(f, "alt+")?;
        }
        write!(f, "{}", self.base)
    }
}

fn is_valid_base(base: &str) -> bool {
    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_lowercase() || SYMBOLS.contains(c);
    }
    NAMED.contains(&base)
}

/// The kind of key transition reported by the terminal.
///
/// Repeat and release arrive only while the Kitty protocol is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyEventKind {
    /// Key pressed (the default).
    #[default]
    Press,
    /// Key auto-repeated.
    Repeat,
    /// Key released.
    Release,
}

/// A classified keystroke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The canonical key identifier.
    pub id: KeyId,
    /// Press, repeat, or release.
    pub kind: KeyEventKind,
    /// True when the sequence was Kitty CSI-u, meaning alternate-key
    /// (base layout) remapping has been applied.
    pub kitty: bool,
}

impl KeyEvent {
    fn press(id: KeyId) -> Self {
        Self {
            id,
            kind: KeyEventKind::Press,
            kitty: false,
        }
    }
}

/// Classify a complete input sequence using the process-wide Kitty flag.
pub fn parse_key(data: &str) -> Option<KeyEvent> {
    parse_key_with(data, kitty_protocol_active())
}

/// Classify a complete input sequence with an explicit protocol mode.
pub fn parse_key_with(data: &str, kitty_active: bool) -> Option<KeyEvent> {
    let mut chars = data.chars();
    let first = chars.next()?;
    let second = chars.next();

    if second.is_none() {
        return parse_single_char(first, kitty_active);
    }
    if first != '\x1b' {
        return None;
    }
    let second = second?;
    let rest_len = data.len() - 1 - second.len_utf8();

    match second {
        '\r' if rest_len == 0 => {
            // Terminals with custom shift+enter maps send ESC CR under
            // the Kitty protocol; legacy terminals send it for alt+enter.
            let base = KeyId::with_modifiers("enter", false, kitty_active, !kitty_active)?;
            Some(KeyEvent::press(base))
        }
        '\x7f' | '\x08' if rest_len == 0 => {
            Some(KeyEvent::press(KeyId::with_modifiers(
                "backspace",
                false,
                false,
                true,
            )?))
        }
        '[' => parse_csi(&data[2..], kitty_active),
        'O' if rest_len == 1 => parse_ss3(data.as_bytes()[2] as char),
        c if rest_len == 0 => {
            // Meta combo: ESC + printable char.
            let (base, shift) = char_base(c)?;
            Some(KeyEvent::press(KeyId::with_modifiers(
                &base, false, shift, true,
            )?))
        }
        _ => None,
    }
}

/// Single-character input: printable keys and bare control bytes.
fn parse_single_char(c: char, kitty_active: bool) -> Option<KeyEvent> {
    match c {
        '\r' => Some(KeyEvent::press(KeyId::new("enter")?)),
        '\n' => {
            if kitty_active {
                // Under the protocol a raw LF can only be ctrl+j.
                Some(KeyEvent::press(KeyId::with_modifiers(
                    "j", true, false, false,
                )?))
            } else {
                Some(KeyEvent::press(KeyId::new("enter")?))
            }
        }
        '\t' => Some(KeyEvent::press(KeyId::new("tab")?)),
        '\x7f' | '\x08' => Some(KeyEvent::press(KeyId::new("backspace")?)),
        '\x1b' => Some(KeyEvent::press(KeyId::new("escape")?)),
        ' ' => Some(KeyEvent::press(KeyId::new("space")?)),
        '\x01'..='\x1a' | '\x1c'..='\x1f' => {
            // Universal control formula: (code & 0x1f) maps back through
            // the a-z / [ \ ] ^ _ column.
            let code = (c as u8) | 0x60;
            let base = if code.is_ascii_lowercase() {
                (code as char).to_string()
            } else {
                (((c as u8) + 64) as char).to_string()
            };
            Some(KeyEvent::press(KeyId::with_modifiers(
                &base, true, false, false,
            )?))
        }
        _ => {
            let (base, shift) = char_base(c)?;
            Some(KeyEvent::press(KeyId::with_modifiers(
                &base, false, shift, false,
            )?))
        }
    }
}

/// Base name for a printable character, with an implied shift for
/// uppercase letters.
fn char_base(c: char) -> Option<(String, bool)> {
    if c.is_ascii_lowercase() {
        return Some((c.to_string(), false));
    }
    if c.is_ascii_uppercase() {
        return Some((c.to_ascii_lowercase().to_string(), true));
    }
    if SYMBOLS.contains(c) {
        return Some((c.to_string(), false));
    }
    None
}

/// SS3 sequences: `ESC O` + one byte.
fn parse_ss3(c: char) -> Option<KeyEvent> {
    let base = match c {
        'A' => "up",
        'B' => "down",
        'C' => "right",
        'D' => "left",
        'H' => "home",
        'F' => "end",
        'M' => "enter",
        'P' => "f1",
        'Q' => "f2",
        'R' => "f3",
        'S' => "f4",
        _ => return None,
    };
    Some(KeyEvent::press(KeyId::new(base)?))
}

/// CSI sequences: `body` is everything between `ESC [` and the end.
fn parse_csi(body: &str, kitty_active: bool) -> Option<KeyEvent> {
    let final_byte = body.chars().last()?;
    let params = &body[..body.len() - final_byte.len_utf8()];

    match final_byte {
        'u' => parse_csi_u(params, kitty_active),
        '~' => parse_csi_tilde(params),
        'A' | 'B' | 'C' | 'D' | 'H' | 'F' => {
            // Linux-console function keys: ESC [ [ A..E.
            if params == "[" {
                let base = match final_byte {
                    'A' => "f1",
                    'B' => "f2",
                    'C' => "f3",
                    'D' => "f4",
                    _ => return None,
                };
                return Some(KeyEvent::press(KeyId::new(base)?));
            }
            let base = match final_byte {
                'A' => "up",
                'B' => "down",
                'C' => "right",
                'D' => "left",
                'H' => "home",
                _ => "end",
            };
            let (mods, kind) = parse_modifier_field(params)?;
            let id = KeyId::with_modifiers(base, mods.ctrl, mods.shift, mods.alt)?;
            Some(KeyEvent {
                id,
                kind,
                kitty: false,
            })
        }
        'E' if params == "[" => Some(KeyEvent::press(KeyId::new("f5")?)),
        'E' if params.is_empty() => Some(KeyEvent::press(KeyId::new("clear")?)),
        'Z' if params.is_empty() => Some(KeyEvent::press(KeyId::with_modifiers(
            "tab", false, true, false,
        )?)),
        _ => None,
    }
}

/// Modifier bit assignments in CSI parameters (value minus one).
#[derive(Clone, Copy, Debug, Default)]
struct Mods {
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Mods {
    fn from_field(value: u32) -> Self {
        // Lock modifiers (caps 64, num 128) are masked off.
        let bits = value.saturating_sub(1) & !(64 | 128);
        Self {
            shift: bits & 1 != 0,
            alt: bits & 2 != 0,
            ctrl: bits & 4 != 0,
        }
    }
}

fn event_kind(value: u32) -> KeyEventKind {
    match value {
        2 => KeyEventKind::Repeat,
        3 => KeyEventKind::Release,
        _ => KeyEventKind::Press,
    }
}

/// Parse the modifier parameter of an arrow/functional CSI: either
/// empty, `1;mod`, or `1;mod:event`.
fn parse_modifier_field(params: &str) -> Option<(Mods, KeyEventKind)> {
    if params.is_empty() {
        return Some((Mods::default(), KeyEventKind::Press));
    }
    let mut fields = params.split(';');
    let lead = fields.next()?;
    if !lead.is_empty() && lead != "1" {
        return None;
    }
    match fields.next() {
        None => Some((Mods::default(), KeyEventKind::Press)),
        Some(field) => {
            let (mods, kind) = split_mod_event(field)?;
            Some((mods, kind))
        }
    }
}

/// Split `mod[:event]`.
fn split_mod_event(field: &str) -> Option<(Mods, KeyEventKind)> {
    let mut parts = field.split(':');
    let mod_value: u32 = match parts.next() {
        Some("") | None => 1,
        Some(v) => v.parse().ok()?,
    };
    let kind = match parts.next() {
        Some(v) => event_kind(v.parse().ok()?),
        None => KeyEventKind::Press,
    };
    Some((Mods::from_field(mod_value), kind))
}

/// Functional-key CSI `~` form: `n[;mod[:event]]~`, plus the xterm
/// modifyOtherKeys form `27;mod;codepoint~`.
fn parse_csi_tilde(params: &str) -> Option<KeyEvent> {
    let mut fields = params.split(';');
    let number: u32 = fields.next()?.parse().ok()?;

    if number == 27 {
        // modifyOtherKeys: fallback path for shift/alt+enter and co.
        let (mods, kind) = split_mod_event(fields.next()?)?;
        let codepoint: u32 = fields.next()?.parse().ok()?;
        let base = base_for_codepoint(codepoint)?;
        let id = KeyId::with_modifiers(&base.name, mods.ctrl, mods.shift || base.shift, mods.alt)?;
        return Some(KeyEvent {
            id,
            kind,
            kitty: false,
        });
    }

    let base = match number {
        1 | 7 => "home",
        2 => "insert",
        3 => "delete",
        4 | 8 => "end",
        5 => "pageUp",
        6 => "pageDown",
        11 => "f1",
        12 => "f2",
        13 => "f3",
        14 => "f4",
        15 => "f5",
        17 => "f6",
        18 => "f7",
        19 => "f8",
        20 => "f9",
        21 => "f10",
        23 => "f11",
        24 => "f12",
        _ => return None,
    };
    let (mods, kind) = match fields.next() {
        Some(field) => split_mod_event(field)?,
        None => (Mods::default(), KeyEventKind::Press),
    };
    let id = KeyId::with_modifiers(base, mods.ctrl, mods.shift, mods.alt)?;
    Some(KeyEvent {
        id,
        kind,
        kitty: false,
    })
}

struct BaseName {
    name: String,
    /// Implied shift (uppercase-letter codepoints).
    shift: bool,
}

fn base_for_codepoint(codepoint: u32) -> Option<BaseName> {
    let named = match codepoint {
        13 => Some("enter"),
        9 => Some("tab"),
        27 => Some("escape"),
        32 => Some("space"),
        127 | 8 => Some("backspace"),
        _ => None,
    };
    if let Some(name) = named {
        return Some(BaseName {
            name: name.to_string(),
            shift: false,
        });
    }
    let c = char::from_u32(codepoint)?;
    let (name, shift) = char_base(c)?;
    Some(BaseName { name, shift })
}

/// Kitty CSI-u: `codepoint[:shifted[:base]] [; mod[:event]] u`.
fn parse_csi_u(params: &str, _kitty_active: bool) -> Option<KeyEvent> {
    if params.starts_with('?') || params.starts_with('<') || params.starts_with('>') {
        // Protocol negotiation responses, not keys.
        return None;
    }
    let mut fields = params.split(';');
    let key_field = fields.next()?;
    let mut key_parts = key_field.split(':');
    let codepoint: u32 = key_parts.next()?.parse().ok()?;
    let _shifted: Option<u32> = key_parts.next().and_then(|v| v.parse().ok());
    let base_layout: Option<u32> = key_parts.next().and_then(|v| v.parse().ok());

    let (mods, kind) = match fields.next() {
        Some(field) => split_mod_event(field)?,
        None => (Mods::default(), KeyEventKind::Press),
    };

    // Effective codepoint: a recognized ASCII key is authoritative; an
    // unrecognized one defers to the base-layout key so Cyrillic Ctrl+С
    // matches ctrl+c while Dvorak-style remaps keep their labels.
    let effective = if is_authoritative_codepoint(codepoint) {
        codepoint
    } else if let Some(base) = base_layout {
        base
    } else {
        codepoint
    };

    let base = base_for_codepoint(effective)?;
    let id = KeyId::with_modifiers(&base.name, mods.ctrl, mods.shift || base.shift, mods.alt)?;
    Some(KeyEvent {
        id,
        kind,
        kitty: true,
    })
}

fn is_authoritative_codepoint(codepoint: u32) -> bool {
    match char::from_u32(codepoint) {
        Some(c) => c.is_ascii_lowercase() || SYMBOLS.contains(c),
        None => false,
    }
}

/// Parse a Kitty protocol acknowledgment (`CSI ? flags u`).
pub fn parse_kitty_ack(data: &str) -> Option<u32> {
    data.strip_prefix("\x1b[?")
        .and_then(|rest| rest.strip_suffix('u'))
        .and_then(|flags| flags.parse().ok())
}

/// Encode a [`KeyId`] as the byte sequence a terminal would send.
///
/// `parse(encode(k)) == k` for every key the encoder can express.
pub fn encode_key(id: &KeyId) -> String {
    let mods = 1 + u32::from(id.shift()) + 2 * u32::from(id.alt()) + 4 * u32::from(id.ctrl());
    match id.base() {
        "up" => format!("\x1b[1;{mods}A"),
        "down" => format!("\x1b[1;{mods}B"),
        "right" => format!("\x1b[1;{mods}C"),
        "left" => format!("\x1b[1;{mods}D"),
        "home" => format!("\x1b[1;{mods}H"),
        "end" => format!("\x1b[1;{mods}F"),
        "insert" => format!("\x1b[2;{mods}~"),
        "delete" => format!("\x1b[3;{mods}~"),
        "pageUp" => format!("\x1b[5;{mods}~"),
        "pageDown" => format!("\x1b[6;{mods}~"),
        "clear" => "\x1b[E".to_string(),
        "f1" => format!("\x1b[11;{mods}~"),
        "f2" => format!("\x1b[12;{mods}~"),
        "f3" => format!("\x1b[13;{mods}~"),
        "f4" => format!("\x1b[14;{mods}~"),
        "f5" => format!("\x1b[15;{mods}~"),
        "f6" => format!("\x1b[17;{mods}~"),
        "f7" => format!("\x1b[18;{mods}~"),
        "f8" => format!("\x1b[19;{mods}~"),
        "f9" => format!("\x1b[20;{mods}~"),
        "f10" => format!("\x1b[21;{mods}~"),
        "f11" => format!("\x1b[23;{mods}~"),
        "f12" => format!("\x1b[24;{mods}~"),
        "enter" => format!("\x1b[13;{mods}u"),
        "tab" => format!("\x1b[9;{mods}u"),
        "space" => format!("\x1b[32;{mods}u"),
        "backspace" => format!("\x1b[127;{mods}u"),
        "escape" => format!("\x1b[27;{mods}u"),
        base => {
            let codepoint = base.chars().next().map_or(0, |c| c as u32);
            format!("\x1b[{codepoint};{mods}u")
        }
    }
}

/// The text a keystroke should insert, if it is a printable keystroke.
///
/// Plain characters insert themselves. Kitty CSI-u events insert the
/// shifted-key glyph when one was reported (the user-visible glyph, as
/// opposed to the codepoint used for shortcut matching), provided no
/// ctrl/alt modifier is held and the event is not a release.
pub fn printable_text(data: &str) -> Option<String> {
    let mut chars = data.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        if first.is_control() {
            return None;
        }
        return Some(first.to_string());
    }
    let params = data.strip_prefix("\x1b[")?.strip_suffix('u')?;
    if params.starts_with(['?', '<', '>']) {
        return None;
    }
    let mut fields = params.split(';');
    let key_field = fields.next()?;
    let mut parts = key_field.split(':');
    let codepoint: u32 = parts.next()?.parse().ok()?;
    let shifted: Option<u32> = parts.next().and_then(|v| v.parse().ok());
    let (mods, kind) = match fields.next() {
        Some(field) => split_mod_event(field)?,
        None => (Mods::default(), KeyEventKind::Press),
    };
    if mods.ctrl || mods.alt || kind == KeyEventKind::Release {
        return None;
    }
    let chosen = if mods.shift {
        shifted.unwrap_or(codepoint)
    } else {
        codepoint
    };
    let c = char::from_u32(chosen)?;
    if c.is_control() {
        return None;
    }
    Some(c.to_string())
}

/// Cheap scan for a repeat (`:2`) or release (`:3`) event marker before
/// a CSI terminator, without fully parsing. Bracketed paste payloads
/// are excluded.
pub fn has_release_or_repeat(data: &str) -> bool {
    const TERMINATORS: &[u8] = b"u~ABCDHF";
    let bytes = data.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"\x1b[200~") {
            // Skip to the end of the paste payload.
            match bytes[i + 6..]
                .windows(6)
                .position(|w| w == b"\x1b[201~")
            {
                Some(end) => {
                    i += 6 + end + 6;
                    continue;
                }
                None => return false,
            }
        }
        if bytes[i] == b':'
            && i + 2 < bytes.len()
            && (bytes[i + 1] == b'2' || bytes[i + 1] == b'3')
            && TERMINATORS.contains(&bytes[i + 2])
        {
            return true;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> KeyId {
        match KeyId::parse(s) {
            Some(k) => k,
            None => unreachable!("invalid key id {s:?}"),
        }
    }

    #[test]
    fn canonical_display_order() {
        assert_eq!(key("alt+ctrl+shift+a").to_string(), "ctrl+shift+alt+a");
    }

    #[test]
    fn parse_is_order_insensitive() {
        assert_eq!(key("shift+ctrl+c"), key("ctrl+shift+c"));
    }

    #[test]
    fn plus_base_parses() {
        assert_eq!(key("+").base(), "+");
        assert_eq!(key("ctrl++").base(), "+");
        assert!(key("ctrl++").ctrl());
    }

    #[test]
    fn invalid_bases_rejected() {
        assert!(KeyId::parse("ctrl+Q").is_none());
        assert!(KeyId::parse("super+a").is_none());
        assert!(KeyId::parse("enterr").is_none());
    }

    #[test]
    fn csi_u_ctrl_c() {
        let event = parse_key_with("\x1b[99;5u", true);
        assert_eq!(
            event,
            Some(KeyEvent {
                id: key("ctrl+c"),
                kind: KeyEventKind::Press,
                kitty: true,
            })
        );
    }

    #[test]
    fn control_byte_ctrl_c() {
        let event = parse_key_with("\x03", false);
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+c")));
    }

    #[test]
    fn control_byte_ctrl_underscore() {
        let event = parse_key_with("\x1f", false);
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+_")));
    }

    #[test]
    fn csi_u_release_event() {
        let event = parse_key_with("\x1b[99;5:3u", true);
        assert_eq!(event.as_ref().map(|e| e.kind), Some(KeyEventKind::Release));
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+c")));
    }

    #[test]
    fn csi_u_repeat_event() {
        let event = parse_key_with("\x1b[106;1:2u", true);
        assert_eq!(event.as_ref().map(|e| e.kind), Some(KeyEventKind::Repeat));
        assert_eq!(event.map(|e| e.id), Some(key("j")));
    }

    #[test]
    fn base_layout_key_maps_cyrillic_ctrl_c() {
        // Ctrl+С on a Cyrillic layout: codepoint 1089, base layout 99.
        let event = parse_key_with("\x1b[1089::99;5u", true);
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+c")));
    }

    #[test]
    fn authoritative_ascii_ignores_base_layout() {
        // A remapper reporting base 'b' must not override a real 'a'.
        let event = parse_key_with("\x1b[97::98;5u", true);
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+a")));
    }

    #[test]
    fn lock_modifiers_masked() {
        // Caps lock (64) + ctrl (4): field = 1 + 68.
        let event = parse_key_with("\x1b[99;69u", true);
        assert_eq!(event.map(|e| e.id), Some(key("ctrl+c")));
    }

    #[test]
    fn legacy_arrows() {
        assert_eq!(
            parse_key_with("\x1b[A", false).map(|e| e.id),
            Some(key("up"))
        );
        assert_eq!(
            parse_key_with("\x1bOD", false).map(|e| e.id),
            Some(key("left"))
        );
    }

    #[test]
    fn modified_arrow() {
        assert_eq!(
            parse_key_with("\x1b[1;5C", false).map(|e| e.id),
            Some(key("ctrl+right"))
        );
    }

    #[test]
    fn arrow_release_under_kitty() {
        let event = parse_key_with("\x1b[1;1:3B", true);
        assert_eq!(event.as_ref().map(|e| e.kind), Some(KeyEventKind::Release));
        assert_eq!(event.map(|e| e.id), Some(key("down")));
    }

    #[test]
    fn functional_tilde_keys() {
        assert_eq!(
            parse_key_with("\x1b[3~", false).map(|e| e.id),
            Some(key("delete"))
        );
        assert_eq!(
            parse_key_with("\x1b[5;3~", false).map(|e| e.id),
            Some(key("alt+pageUp"))
        );
        assert_eq!(
            parse_key_with("\x1b[1~", false).map(|e| e.id),
            Some(key("home"))
        );
    }

    #[test]
    fn function_keys_all_forms() {
        assert_eq!(
            parse_key_with("\x1bOP", false).map(|e| e.id),
            Some(key("f1"))
        );
        assert_eq!(
            parse_key_with("\x1b[15~", false).map(|e| e.id),
            Some(key("f5"))
        );
        assert_eq!(
            parse_key_with("\x1b[[C", false).map(|e| e.id),
            Some(key("f3"))
        );
        assert_eq!(
            parse_key_with("\x1b[24~", false).map(|e| e.id),
            Some(key("f12"))
        );
    }

    #[test]
    fn shift_tab() {
        assert_eq!(
            parse_key_with("\x1b[Z", false).map(|e| e.id),
            Some(key("shift+tab"))
        );
    }

    #[test]
    fn backspace_variants() {
        assert_eq!(
            parse_key_with("\x7f", false).map(|e| e.id),
            Some(key("backspace"))
        );
        assert_eq!(
            parse_key_with("\x1b\x7f", false).map(|e| e.id),
            Some(key("alt+backspace"))
        );
    }

    #[test]
    fn escape_alone() {
        assert_eq!(
            parse_key_with("\x1b", false).map(|e| e.id),
            Some(key("escape"))
        );
    }

    #[test]
    fn alt_letter_combo() {
        assert_eq!(
            parse_key_with("\x1bf", false).map(|e| e.id),
            Some(key("alt+f"))
        );
    }

    #[test]
    fn esc_cr_is_mode_dependent() {
        assert_eq!(
            parse_key_with("\x1b\r", true).map(|e| e.id),
            Some(key("shift+enter"))
        );
        assert_eq!(
            parse_key_with("\x1b\r", false).map(|e| e.id),
            Some(key("alt+enter"))
        );
    }

    #[test]
    fn newline_is_mode_dependent() {
        assert_eq!(
            parse_key_with("\n", false).map(|e| e.id),
            Some(key("enter"))
        );
        assert_eq!(
            parse_key_with("\n", true).map(|e| e.id),
            Some(key("ctrl+j"))
        );
    }

    #[test]
    fn modify_other_keys_shift_enter() {
        assert_eq!(
            parse_key_with("\x1b[27;2;13~", false).map(|e| e.id),
            Some(key("shift+enter"))
        );
    }

    #[test]
    fn uppercase_codepoint_implies_shift() {
        let event = parse_key_with("\x1b[65;1u", true);
        assert_eq!(event.map(|e| e.id), Some(key("shift+a")));
    }

    #[test]
    fn kitty_ack_parses() {
        assert_eq!(parse_kitty_ack("\x1b[?1u"), Some(1));
        assert_eq!(parse_kitty_ack("\x1b[?31u"), Some(31));
        assert_eq!(parse_kitty_ack("\x1b[1u"), None);
    }

    #[test]
    fn encode_round_trips() {
        let cases = [
            "a",
            "ctrl+c",
            "shift+alt+z",
            "ctrl+shift+alt+/",
            "enter",
            "shift+enter",
            "tab",
            "space",
            "backspace",
            "escape",
            "up",
            "ctrl+down",
            "alt+left",
            "shift+right",
            "home",
            "end",
            "insert",
            "delete",
            "pageUp",
            "ctrl+pageDown",
            "clear",
            "f1",
            "f5",
            "f6",
            "ctrl+f12",
        ];
        for case in cases {
            let id = key(case);
            let encoded = encode_key(&id);
            let parsed = parse_key_with(&encoded, true).map(|e| e.id);
            assert_eq!(parsed, Some(id), "case {case}");
        }
    }

    #[test]
    fn release_scan_finds_markers() {
        assert!(has_release_or_repeat("\x1b[99;5:3u"));
        assert!(has_release_or_repeat("\x1b[1;1:2A"));
        assert!(!has_release_or_repeat("\x1b[99;5u"));
    }

    #[test]
    fn release_scan_ignores_paste() {
        let data = "\x1b[200~looks like :3u inside\x1b[201~";
        assert!(!has_release_or_repeat(data));
    }

    #[test]
    fn release_scan_sees_markers_after_paste() {
        let data = "\x1b[200~:3u\x1b[201~\x1b[99;1:3u";
        assert!(has_release_or_repeat(data));
    }

    #[test]
    fn kitty_superset_of_legacy() {
        // Everything the legacy table decodes still decodes (to the
        // same id) with the protocol active.
        let sequences = [
            "\x1b[A", "\x1b[1;5C", "\x1b[3~", "\x1bOP", "\x1b[Z", "\x7f", "\x03", "\t",
        ];
        for seq in sequences {
            let legacy = parse_key_with(seq, false).map(|e| e.id);
            let kitty = parse_key_with(seq, true).map(|e| e.id);
            assert!(legacy.is_some(), "legacy failed for {seq:?}");
            assert_eq!(legacy, kitty, "mode mismatch for {seq:?}");
        }
    }

    #[test]
    fn printable_text_plain_char() {
        assert_eq!(printable_text("a"), Some("a".to_string()));
        assert_eq!(printable_text("é"), Some("é".to_string()));
        assert_eq!(printable_text("\x03"), None);
    }

    #[test]
    fn printable_text_uses_shifted_glyph() {
        // shift+7 on a German layout reports '/' as the shifted key.
        assert_eq!(printable_text("\x1b[55:47;2u"), Some("/".to_string()));
    }

    #[test]
    fn printable_text_rejects_ctrl_and_release() {
        assert_eq!(printable_text("\x1b[99;5u"), None);
        assert_eq!(printable_text("\x1b[97;1:3u"), None);
    }

    #[test]
    fn unrecognized_bytes_return_none() {
        assert!(parse_key_with("Ж", false).is_none());
        assert!(parse_key_with("\x1b[999Q", false).is_none());
    }
}
