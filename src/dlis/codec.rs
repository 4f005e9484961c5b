//! Primitive codec for the DLIS representation codes.
//!
//! Every decoder takes a [`Cursor`] positioned at the start of one value
//! and leaves it positioned immediately after. All multi-byte integers
//! are big-endian.

use byteorder::{BigEndian, ByteOrder};

use super::error::{DlisError, Result};
use super::types::{
    decode_text, Attref, Complex, DateTime, Obname, Objref, RepresentationCode, TimeZone, Value,
};

/// A byte cursor over a borrowed span.
///
/// Tracks the absolute offset of the span's first byte so decode errors
/// point into the file rather than into a copy of a payload.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// A cursor whose error offsets are absolute file offsets.
    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the next byte to be read.
    pub fn tell(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(DlisError::Truncated {
                offset: self.tell(),
                needed: n,
                available: self.remaining() as u64,
            });
        }
        let span = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(span)
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.data.get(self.pos).copied().ok_or(DlisError::Truncated {
            offset: self.tell(),
            needed: 1,
            available: 0,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }
}

/// Low-precision 16-bit float: sign, 11-bit two's-complement fraction
/// scaled by 2^-11, 4-bit unbiased exponent.
pub fn fshort(c: &mut Cursor) -> Result<f32> {
    let v = c.read_u16()?;
    let sign_bit = v & 0x8000 != 0;
    let exp_bits = v & 0x000F;
    let mut frac_bits = u32::from((v & 0x7FF0) >> 4);
    if sign_bit {
        frac_bits = ((!frac_bits) & 0x7FF) + 1;
    }
    let sign = if sign_bit { -1.0f32 } else { 1.0 };
    let fraction = frac_bits as f32 / 2048.0;
    Ok(sign * fraction * f32::from(exp_bits).exp2())
}

pub fn fsingl(c: &mut Cursor) -> Result<f32> {
    c.read_f32()
}

pub fn fdoubl(c: &mut Cursor) -> Result<f64> {
    c.read_f64()
}

/// IBM System/360 single: sign, 7-bit excess-64 base-16 exponent,
/// 24-bit unnormalized fraction.
pub fn isingl(c: &mut Cursor) -> Result<f32> {
    let u = c.read_u32()?;
    let sign = if u & 0x8000_0000 != 0 { -1.0f64 } else { 1.0 };
    let exp = ((u >> 24) & 0x7F) as i32 - 64;
    let frac = f64::from(u & 0x00FF_FFFF) / f64::from(1u32 << 24);
    Ok((sign * frac * 16f64.powi(exp)) as f32)
}

/// VAX F single: 16-bit words swapped relative to big-endian, excess-128
/// exponent, hidden-bit significand in [0.5, 1).
pub fn vsingl(c: &mut Cursor) -> Result<f32> {
    let raw = c.take(4)?;
    let v = u32::from(raw[1]) << 24
        | u32::from(raw[0]) << 16
        | u32::from(raw[3]) << 8
        | u32::from(raw[2]);

    let sign_bit = v & 0x8000_0000 != 0;
    let exp = ((v >> 23) & 0xFF) as i32;
    if exp == 0 {
        // true zero and "dirty zero"; with the sign bit set this bit
        // pattern is reserved by the VAX architecture
        return Ok(if sign_bit { f32::NAN } else { 0.0 });
    }
    let sign = if sign_bit { -1.0f64 } else { 1.0 };
    let significand = 0.5 + f64::from(v & 0x007F_FFFF) / f64::from(1u32 << 24);
    Ok((sign * significand * 2f64.powi(exp - 128)) as f32)
}

pub fn fsing1(c: &mut Cursor) -> Result<[f32; 2]> {
    Ok([fsingl(c)?, fsingl(c)?])
}

pub fn fsing2(c: &mut Cursor) -> Result<[f32; 3]> {
    Ok([fsingl(c)?, fsingl(c)?, fsingl(c)?])
}

pub fn fdoub1(c: &mut Cursor) -> Result<[f64; 2]> {
    Ok([fdoubl(c)?, fdoubl(c)?])
}

pub fn fdoub2(c: &mut Cursor) -> Result<[f64; 3]> {
    Ok([fdoubl(c)?, fdoubl(c)?, fdoubl(c)?])
}

pub fn csingl(c: &mut Cursor) -> Result<Complex<f32>> {
    Ok(Complex {
        re: fsingl(c)?,
        im: fsingl(c)?,
    })
}

pub fn cdoubl(c: &mut Cursor) -> Result<Complex<f64>> {
    Ok(Complex {
        re: fdoubl(c)?,
        im: fdoubl(c)?,
    })
}

pub fn sshort(c: &mut Cursor) -> Result<i8> {
    Ok(c.read_u8()? as i8)
}

pub fn snorm(c: &mut Cursor) -> Result<i16> {
    Ok(c.read_u16()? as i16)
}

pub fn slong(c: &mut Cursor) -> Result<i32> {
    Ok(c.read_u32()? as i32)
}

pub fn ushort(c: &mut Cursor) -> Result<u8> {
    c.read_u8()
}

pub fn unorm(c: &mut Cursor) -> Result<u16> {
    c.read_u16()
}

pub fn ulong(c: &mut Cursor) -> Result<u32> {
    c.read_u32()
}

/// Variable-length unsigned integer.
///
/// The top two bits of the first byte select the width: `0x` is a 1-byte
/// value (7 bits), `10` a 2-byte value (14 bits), `11` a 4-byte value
/// (30 bits). Sign extension never applies.
pub fn uvari(c: &mut Cursor) -> Result<u32> {
    let head = c.peek_u8()?;
    if head & 0x80 == 0 {
        Ok(u32::from(c.read_u8()?))
    } else if head & 0x40 == 0 {
        Ok(u32::from(c.read_u16()?) & 0x3FFF)
    } else {
        Ok(c.read_u32()? & 0x3FFF_FFFF)
    }
}

/// Short identifier: ushort length prefix, then that many bytes.
pub fn ident(c: &mut Cursor) -> Result<String> {
    let n = usize::from(c.read_u8()?);
    Ok(decode_text(c.take(n)?))
}

/// Arbitrary string: uvari length prefix, then that many bytes. May
/// contain any byte value.
pub fn ascii(c: &mut Cursor) -> Result<String> {
    let n = uvari(c)? as usize;
    Ok(decode_text(c.take(n)?))
}

/// Units expression; same wire format as ident.
pub fn units(c: &mut Cursor) -> Result<String> {
    ident(c)
}

/// Date and time, 8 bytes on the wire. The time zone lives in the high
/// nibble of the second byte, the month in its low nibble; milliseconds
/// are a big-endian u16.
pub fn dtime(c: &mut Cursor) -> Result<DateTime> {
    let raw = c.take(8)?;
    Ok(DateTime {
        year: 1900 + u16::from(raw[0]),
        tz: TimeZone::from_nibble(raw[1] >> 4),
        month: raw[1] & 0x0F,
        day: raw[2],
        hour: raw[3],
        minute: raw[4],
        second: raw[5],
        millisecond: BigEndian::read_u16(&raw[6..8]),
    })
}

pub fn origin(c: &mut Cursor) -> Result<u32> {
    uvari(c)
}

pub fn status(c: &mut Cursor) -> Result<u8> {
    ushort(c)
}

pub fn obname(c: &mut Cursor) -> Result<Obname> {
    Ok(Obname {
        origin: origin(c)?,
        copy: ushort(c)?,
        id: ident(c)?,
    })
}

pub fn objref(c: &mut Cursor) -> Result<Objref> {
    Ok(Objref {
        kind: ident(c)?,
        name: obname(c)?,
    })
}

pub fn attref(c: &mut Cursor) -> Result<Attref> {
    Ok(Attref {
        kind: ident(c)?,
        name: obname(c)?,
        label: ident(c)?,
    })
}

/// Decode a single value of the given representation code.
pub fn read_value(c: &mut Cursor, reprc: RepresentationCode) -> Result<Value> {
    use RepresentationCode as R;
    Ok(match reprc {
        R::Fshort => Value::Fshort(fshort(c)?),
        R::Fsingl => Value::Fsingl(fsingl(c)?),
        R::Fsing1 => Value::Fsing1(fsing1(c)?),
        R::Fsing2 => Value::Fsing2(fsing2(c)?),
        R::Isingl => Value::Isingl(isingl(c)?),
        R::Vsingl => Value::Vsingl(vsingl(c)?),
        R::Fdoubl => Value::Fdoubl(fdoubl(c)?),
        R::Fdoub1 => Value::Fdoub1(fdoub1(c)?),
        R::Fdoub2 => Value::Fdoub2(fdoub2(c)?),
        R::Csingl => Value::Csingl(csingl(c)?),
        R::Cdoubl => Value::Cdoubl(cdoubl(c)?),
        R::Sshort => Value::Sshort(sshort(c)?),
        R::Snorm => Value::Snorm(snorm(c)?),
        R::Slong => Value::Slong(slong(c)?),
        R::Ushort => Value::Ushort(ushort(c)?),
        R::Unorm => Value::Unorm(unorm(c)?),
        R::Ulong => Value::Ulong(ulong(c)?),
        R::Uvari => Value::Uvari(uvari(c)?),
        R::Ident => Value::Ident(ident(c)?),
        R::Ascii => Value::Ascii(ascii(c)?),
        R::Dtime => Value::Dtime(dtime(c)?),
        R::Origin => Value::Origin(origin(c)?),
        R::Obname => Value::Obname(obname(c)?),
        R::Objref => Value::Objref(objref(c)?),
        R::Attref => Value::Attref(attref(c)?),
        R::Status => Value::Status(status(c)?),
        R::Units => Value::Units(units(c)?),
    })
}
