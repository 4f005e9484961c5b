//! Data structures for DLIS representation codes and decoded values.

use encoding_rs::WINDOWS_1252;

/// The DLIS v1 representation codes.
///
/// Every attribute value in an explicitly formatted logical record is a
/// sequence of elements of one of these codes. Discriminants are the wire
/// values; `Ident` (19) is the default code for attributes that do not
/// declare one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RepresentationCode {
    /// Low-precision floating point (16 bits).
    Fshort = 1,
    /// IEEE 754 single precision.
    Fsingl = 2,
    /// Single precision with validation interval (value, bound).
    Fsing1 = 3,
    /// Single precision with two-sided validation interval.
    Fsing2 = 4,
    /// IBM System/360 single precision.
    Isingl = 5,
    /// VAX F single precision.
    Vsingl = 6,
    /// IEEE 754 double precision.
    Fdoubl = 7,
    /// Double precision with validation interval.
    Fdoub1 = 8,
    /// Double precision with two-sided validation interval.
    Fdoub2 = 9,
    /// Single precision complex.
    Csingl = 10,
    /// Double precision complex.
    Cdoubl = 11,
    /// Signed 8-bit integer.
    Sshort = 12,
    /// Signed 16-bit integer.
    Snorm = 13,
    /// Signed 32-bit integer.
    Slong = 14,
    /// Unsigned 8-bit integer.
    Ushort = 15,
    /// Unsigned 16-bit integer.
    Unorm = 16,
    /// Unsigned 32-bit integer.
    Ulong = 17,
    /// Variable-length unsigned integer (1, 2 or 4 bytes).
    Uvari = 18,
    /// Short identifier string, length-prefixed with a ushort.
    Ident = 19,
    /// Arbitrary string, length-prefixed with a uvari.
    Ascii = 20,
    /// Date and time down to milliseconds.
    Dtime = 21,
    /// Origin reference (same wire format as uvari).
    Origin = 22,
    /// Object name: origin, copy number and identifier.
    Obname = 23,
    /// Object reference: object type and name.
    Objref = 24,
    /// Attribute reference: object type, name and label.
    Attref = 25,
    /// Boolean status (same wire format as ushort).
    Status = 26,
    /// Units expression, same wire format as ident.
    Units = 27,
}

impl RepresentationCode {
    /// Look up a representation code by its wire value.
    pub fn from_u8(code: u8) -> Option<Self> {
        use RepresentationCode::*;
        Some(match code {
            1 => Fshort,
            2 => Fsingl,
            3 => Fsing1,
            4 => Fsing2,
            5 => Isingl,
            6 => Vsingl,
            7 => Fdoubl,
            8 => Fdoub1,
            9 => Fdoub2,
            10 => Csingl,
            11 => Cdoubl,
            12 => Sshort,
            13 => Snorm,
            14 => Slong,
            15 => Ushort,
            16 => Unorm,
            17 => Ulong,
            18 => Uvari,
            19 => Ident,
            20 => Ascii,
            21 => Dtime,
            22 => Origin,
            23 => Obname,
            24 => Objref,
            25 => Attref,
            26 => Status,
            27 => Units,
            _ => return None,
        })
    }
}

/// A complex number as stored by the csingl/cdoubl codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

/// Time zone nibble of a dtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZone {
    Local,
    Dst,
    Utc,
    /// Values above 2 are reserved by the standard.
    Reserved(u8),
}

impl TimeZone {
    pub(crate) fn from_nibble(nibble: u8) -> Self {
        match nibble {
            0 => TimeZone::Local,
            1 => TimeZone::Dst,
            2 => TimeZone::Utc,
            other => TimeZone::Reserved(other),
        }
    }
}

/// A decoded dtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    /// Calendar year (the wire carries years since 1900).
    pub year: u16,
    pub tz: TimeZone,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

/// An object name: the unique identifier of an object within a logical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Obname {
    pub origin: u32,
    pub copy: u8,
    pub id: String,
}

/// A reference to an object of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Objref {
    /// Object type (an ident).
    pub kind: String,
    pub name: Obname,
}

/// A reference to a single attribute of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attref {
    /// Object type (an ident).
    pub kind: String,
    pub name: Obname,
    pub label: String,
}

/// A decoded value of any representation code.
///
/// Callers match on the variant; the variant order follows the wire code
/// numbering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Fshort(f32),
    Fsingl(f32),
    Fsing1([f32; 2]),
    Fsing2([f32; 3]),
    Isingl(f32),
    Vsingl(f32),
    Fdoubl(f64),
    Fdoub1([f64; 2]),
    Fdoub2([f64; 3]),
    Csingl(Complex<f32>),
    Cdoubl(Complex<f64>),
    Sshort(i8),
    Snorm(i16),
    Slong(i32),
    Ushort(u8),
    Unorm(u16),
    Ulong(u32),
    Uvari(u32),
    Ident(String),
    Ascii(String),
    Dtime(DateTime),
    Origin(u32),
    Obname(Obname),
    Objref(Objref),
    Attref(Attref),
    Status(u8),
    Units(String),
}

/// Decode an ident/ascii/units byte string.
///
/// DLIS strings are nominally ASCII but real files frequently carry the
/// Latin-1 degree symbol (0xB0). Strict UTF-8 is tried first, then the
/// common mis-encoding fix (0xB0 -> 0xC2 0xB0), then WINDOWS_1252 as a
/// lossy fallback.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            if bytes.contains(&0xB0) {
                let mut fixed = Vec::with_capacity(bytes.len() + 4);
                for &b in bytes {
                    if b == 0xB0 {
                        fixed.push(0xC2);
                    }
                    fixed.push(b);
                }
                if let Ok(s) = String::from_utf8(fixed) {
                    return s;
                }
            }
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}
