//! String bridging between Rust text and the engine's C-string boundary.
//!
//! The engine takes NUL-terminated strings. Caller text usually is not
//! terminated, but on the hot path it often is (e.g. a receive buffer with a
//! trailing `\0`), so [`to_c_str`] checks the last byte and only copies when
//! it has to:
//!
//! - last byte is `\0` → borrow the caller's storage, zero-copy
//! - otherwise → copy into one owned, terminated buffer
//!
//! Both paths stop at the first NUL byte, so interior NULs truncate the text
//! the same way a C reader would, and the two paths agree on every input.
//! Each input is bridged from its own bytes; two bridged inputs never share
//! storage. Bridging cannot fail.

use std::borrow::Cow;
use std::ffi::{CStr, CString};

/// How caller text is handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// Borrow already-terminated text, copy the rest.
    #[default]
    ZeroCopy,
    /// Always copy into an owned buffer.
    AlwaysCopy,
}

impl BridgeMode {
    pub fn bridge(self, text: &str) -> Cow<'_, CStr> {
        match self {
            Self::ZeroCopy => to_c_str(text.as_bytes()),
            Self::AlwaysCopy => Cow::Owned(copy_c_str(text.as_bytes())),
        }
    }
}

/// Whether `bytes` already ends in a NUL terminator.
#[inline]
pub fn is_nul_terminated(bytes: &[u8]) -> bool {
    bytes.last() == Some(&0)
}

/// Bridge `bytes` to a C string, borrowing when already terminated.
#[inline]
pub fn to_c_str(bytes: &[u8]) -> Cow<'_, CStr> {
    if is_nul_terminated(bytes) {
        if let Ok(c) = CStr::from_bytes_until_nul(bytes) {
            return Cow::Borrowed(c);
        }
    }
    Cow::Owned(copy_c_str(bytes))
}

/// Copy `bytes` up to the first NUL into an owned, terminated buffer.
pub fn copy_c_str(bytes: &[u8]) -> CString {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let mut buf = Vec::with_capacity(end + 1);
    buf.extend_from_slice(&bytes[..end]);
    buf.push(0);
    // `buf` ends in its only NUL; the fallback is unreachable.
    CString::from_vec_with_nul(buf).unwrap_or_default()
}

/// Bridge engine output back to an owned string.
///
/// Invalid UTF-8 is replaced rather than rejected; the codec reports any
/// resulting malformed JSON.
pub fn from_c_str(c: &CStr) -> String {
    c.to_string_lossy().into_owned()
}
