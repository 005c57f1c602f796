//! Raw terminal input: byte-stream segmentation and key classification.

mod keys;
mod stdin;

pub use keys::{
    KeyEvent, KeyEventKind, KeyId, encode_key, has_release_or_repeat, kitty_protocol_active,
    parse_key, parse_key_with, parse_kitty_ack, printable_text, set_kitty_protocol_active,
};
pub use stdin::{INCOMPLETE_FLUSH_TIMEOUT, StdinBuffer, StdinEvent};
