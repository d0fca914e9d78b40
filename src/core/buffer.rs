//! Growable byte buffer used by the render pipeline
//!
//! The buffer only grows. Capacity doubles with the requested headroom added on
//! top, and [`Buffer::reset`] drops the length to zero while keeping the
//! allocation for the next checkout.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::time::Duration;

/// Largest capacity a render buffer may reach (1 GiB)
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// Capacity of a freshly created buffer
pub const INITIAL_CAPACITY: usize = 512;

const HEX: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.min(MAX_BUFFER_SIZE)),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Drop the content, keep the allocation
    #[inline]
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Roll back to an earlier length
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Make room for `additional` more bytes
    ///
    /// # Panics
    ///
    /// Panics with "buffer too large" when the buffer would exceed
    /// [`MAX_BUFFER_SIZE`].
    pub fn grow(&mut self, additional: usize) {
        let len = self.bytes.len();
        let needed = match len.checked_add(additional) {
            Some(n) if n <= MAX_BUFFER_SIZE => n,
            _ => panic!("buffer too large"),
        };
        if needed <= self.bytes.capacity() {
            return;
        }
        let target = self
            .bytes
            .capacity()
            .saturating_mul(2)
            .saturating_add(additional)
            .clamp(needed, MAX_BUFFER_SIZE);
        self.bytes.reserve_exact(target - len);
    }

    #[inline]
    pub fn push_byte(&mut self, b: u8) {
        self.grow(1);
        self.bytes.push(b);
    }

    #[inline]
    pub fn push_bytes(&mut self, b: &[u8]) {
        self.grow(b.len());
        self.bytes.extend_from_slice(b);
    }

    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    /// Append `n` spaces
    pub fn pad(&mut self, n: usize) {
        self.grow(n);
        self.bytes.resize(self.bytes.len() + n, b' ');
    }

    pub fn write_bool(&mut self, v: bool) {
        self.push_str(if v { "true" } else { "false" });
    }

    pub fn write_int(&mut self, v: i64) {
        let mut tmp = itoa::Buffer::new();
        self.push_str(tmp.format(v));
    }

    pub fn write_uint(&mut self, v: u64) {
        let mut tmp = itoa::Buffer::new();
        self.push_str(tmp.format(v));
    }

    /// Shortest round-trip decimal; `NaN`, `+Inf` and `-Inf` for non-finite values
    pub fn write_float(&mut self, v: f64) {
        if let Some(text) = non_finite(v.is_nan(), v.is_infinite(), v.is_sign_negative()) {
            self.push_str(text);
            return;
        }
        let mut tmp = ryu::Buffer::new();
        self.push_str(tmp.format_finite(v));
    }

    pub fn write_float32(&mut self, v: f32) {
        if let Some(text) = non_finite(v.is_nan(), v.is_infinite(), v.is_sign_negative()) {
            self.push_str(text);
            return;
        }
        let mut tmp = ryu::Buffer::new();
        self.push_str(tmp.format_finite(v));
    }

    /// `(re±imi)`; the imaginary sign sits directly on its magnitude
    pub fn write_complex(&mut self, re: f64, im: f64) {
        self.push_byte(b'(');
        self.write_float(re);
        if !im.is_sign_negative() && im.is_finite() || im.is_nan() {
            self.push_byte(b'+');
        }
        self.write_float(im);
        self.push_str("i)");
    }

    pub fn write_complex32(&mut self, re: f32, im: f32) {
        self.push_byte(b'(');
        self.write_float32(re);
        if !im.is_sign_negative() && im.is_finite() || im.is_nan() {
            self.push_byte(b'+');
        }
        self.write_float32(im);
        self.push_str("i)");
    }

    /// Rust `Debug` form, e.g. `1.5s`
    pub fn write_duration(&mut self, d: Duration) {
        // Buffer's fmt::Write never fails
        let _ = fmt::Write::write_fmt(self, format_args!("{:?}", d));
    }

    /// RFC 3339 with nanoseconds in UTC
    pub fn write_time(&mut self, t: &DateTime<Utc>) {
        let _ = fmt::Write::write_fmt(self, format_args!("{}", t.format("%Y-%m-%dT%H:%M:%S%.9fZ")));
    }

    /// `s` as a quoted JSON string
    pub fn write_json_string(&mut self, s: &str) {
        self.grow(s.len() + 2);
        self.bytes.push(b'"');
        self.write_json_escaped(s);
        self.bytes.push(b'"');
    }

    /// JSON string escaping without the surrounding quotes
    pub fn write_json_escaped(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escape: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x00..=0x1f | 0x7f => b"",
                _ => continue,
            };
            self.push_bytes(&bytes[start..i]);
            if escape.is_empty() {
                self.push_bytes(&[b'\\', b'u', b'0', b'0', HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]]);
            } else {
                self.push_bytes(escape);
            }
            start = i + 1;
        }
        self.push_bytes(&bytes[start..]);
    }
}

fn non_finite(nan: bool, inf: bool, negative: bool) -> Option<&'static str> {
    match (nan, inf, negative) {
        (true, _, _) => Some("NaN"),
        (false, true, false) => Some("+Inf"),
        (false, true, true) => Some("-Inf"),
        _ => None,
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
