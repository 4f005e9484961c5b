//! Primitive codec against hand-encoded byte fixtures.

use dlis_reader::dlis::codec::{self, Cursor};
use dlis_reader::{DlisError, Obname, RepresentationCode, TimeZone, Value};

/// Encode a uvari at its canonical width.
fn encode_uvari(v: u32) -> Vec<u8> {
    if v < 0x80 {
        vec![v as u8]
    } else if v < 0x4000 {
        ((v as u16) | 0x8000).to_be_bytes().to_vec()
    } else {
        (v | 0xC000_0000).to_be_bytes().to_vec()
    }
}

fn encode_ident(s: &str) -> Vec<u8> {
    let mut out = vec![s.len() as u8];
    out.extend_from_slice(s.as_bytes());
    out
}

#[test]
fn uvari_width_boundaries() {
    // 1 byte up to 127, 2 bytes to 16383, 4 bytes to 2^30 - 1
    let cases: &[(u32, usize)] = &[
        (0, 1),
        (1, 1),
        (127, 1),
        (128, 2),
        (8192, 2),
        (16383, 2),
        (16384, 4),
        (1 << 29, 4),
        ((1 << 30) - 1, 4),
    ];
    for &(value, width) in cases {
        let bytes = encode_uvari(value);
        assert_eq!(bytes.len(), width, "width of {}", value);

        let mut c = Cursor::new(&bytes);
        assert_eq!(codec::uvari(&mut c).expect("uvari"), value);
        assert!(c.is_empty(), "cursor left {} bytes after {}", c.remaining(), value);
    }
}

#[test]
fn uvari_accepts_non_canonical_widths() {
    let mut c = Cursor::new(&[0x80, 0x07]);
    assert_eq!(codec::uvari(&mut c).expect("uvari"), 7);

    let mut c = Cursor::new(&[0xC0, 0x00, 0x00, 0x07]);
    assert_eq!(codec::uvari(&mut c).expect("uvari"), 7);
}

#[test]
fn unsigned_integers() {
    assert_eq!(codec::ushort(&mut Cursor::new(&[0xA5])).expect("ushort"), 0xA5);
    assert_eq!(
        codec::unorm(&mut Cursor::new(&[0x01, 0x02])).expect("unorm"),
        0x0102
    );
    assert_eq!(
        codec::ulong(&mut Cursor::new(&[0x01, 0x02, 0x03, 0x04])).expect("ulong"),
        0x0102_0304
    );
}

#[test]
fn signed_integers() {
    assert_eq!(codec::sshort(&mut Cursor::new(&[0xFF])).expect("sshort"), -1);
    assert_eq!(codec::sshort(&mut Cursor::new(&[0x7F])).expect("sshort"), 127);
    assert_eq!(
        codec::snorm(&mut Cursor::new(&[0xFF, 0xFE])).expect("snorm"),
        -2
    );
    assert_eq!(
        codec::slong(&mut Cursor::new(&[0xFF, 0xFF, 0xFF, 0xFC])).expect("slong"),
        -4
    );
    assert_eq!(
        codec::slong(&mut Cursor::new(&[0x00, 0x00, 0x01, 0x00])).expect("slong"),
        256
    );
}

#[test]
fn ieee_floats() {
    let bytes = 118.5f32.to_be_bytes();
    assert_eq!(
        codec::fsingl(&mut Cursor::new(&bytes)).expect("fsingl"),
        118.5
    );

    let bytes = (-0.25f64).to_be_bytes();
    assert_eq!(
        codec::fdoubl(&mut Cursor::new(&bytes)).expect("fdoubl"),
        -0.25
    );
}

#[test]
fn fshort_sign_fraction_exponent() {
    // fraction 0.5, exponent 1
    let mut c = Cursor::new(&[0x40, 0x01]);
    assert_eq!(codec::fshort(&mut c).expect("fshort"), 1.0);

    // two's-complement fraction
    let mut c = Cursor::new(&[0xC0, 0x01]);
    assert_eq!(codec::fshort(&mut c).expect("fshort"), -1.0);

    let mut c = Cursor::new(&[0x00, 0x00]);
    assert_eq!(codec::fshort(&mut c).expect("fshort"), 0.0);
}

#[test]
fn isingl_ibm_float() {
    // 118.5 = 16^2 * 0.462890625
    let mut c = Cursor::new(&[0x42, 0x76, 0x80, 0x00]);
    assert_eq!(codec::isingl(&mut c).expect("isingl"), 118.5);

    let mut c = Cursor::new(&[0xC2, 0x76, 0x80, 0x00]);
    assert_eq!(codec::isingl(&mut c).expect("isingl"), -118.5);

    let mut c = Cursor::new(&[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(codec::isingl(&mut c).expect("isingl"), 0.0);
}

#[test]
fn vsingl_vax_float() {
    let mut c = Cursor::new(&[0x80, 0x40, 0x00, 0x00]);
    assert_eq!(codec::vsingl(&mut c).expect("vsingl"), 1.0);

    let mut c = Cursor::new(&[0x80, 0xC0, 0x00, 0x00]);
    assert_eq!(codec::vsingl(&mut c).expect("vsingl"), -1.0);

    // true zero
    let mut c = Cursor::new(&[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(codec::vsingl(&mut c).expect("vsingl"), 0.0);

    // sign bit with zero exponent is reserved
    let mut c = Cursor::new(&[0x00, 0x80, 0x00, 0x00]);
    assert!(codec::vsingl(&mut c).expect("vsingl").is_nan());
}

#[test]
fn validated_and_complex_floats() {
    let mut bytes = Vec::new();
    bytes.extend(1.0f32.to_be_bytes());
    bytes.extend(0.5f32.to_be_bytes());
    let mut c = Cursor::new(&bytes);
    assert_eq!(codec::fsing1(&mut c).expect("fsing1"), [1.0, 0.5]);

    let mut bytes = Vec::new();
    bytes.extend(1.0f32.to_be_bytes());
    bytes.extend(0.5f32.to_be_bytes());
    bytes.extend(0.25f32.to_be_bytes());
    let mut c = Cursor::new(&bytes);
    assert_eq!(codec::fsing2(&mut c).expect("fsing2"), [1.0, 0.5, 0.25]);

    let mut bytes = Vec::new();
    bytes.extend(2.0f64.to_be_bytes());
    bytes.extend((-3.0f64).to_be_bytes());
    let mut c = Cursor::new(&bytes);
    assert_eq!(codec::fdoub1(&mut c).expect("fdoub1"), [2.0, -3.0]);

    let mut bytes = Vec::new();
    bytes.extend(1.0f32.to_be_bytes());
    bytes.extend((-1.0f32).to_be_bytes());
    let mut c = Cursor::new(&bytes);
    let z = codec::csingl(&mut c).expect("csingl");
    assert_eq!((z.re, z.im), (1.0, -1.0));
}

#[test]
fn ident_ascii_units() {
    let mut c = Cursor::new(&[7, b'C', b'H', b'A', b'N', b'N', b'E', b'L']);
    assert_eq!(codec::ident(&mut c).expect("ident"), "CHANNEL");

    // empty ident
    let mut c = Cursor::new(&[0]);
    assert_eq!(codec::ident(&mut c).expect("ident"), "");

    // ascii takes a uvari length; a non-canonical 2-byte one is fine
    let mut bytes = vec![0x80, 0x07];
    bytes.extend_from_slice(b"primary");
    let mut c = Cursor::new(&bytes);
    assert_eq!(codec::ascii(&mut c).expect("ascii"), "primary");

    let mut c = Cursor::new(&[4, b'0', b'.', b'1', b'V']);
    assert_eq!(codec::units(&mut c).expect("units"), "0.1V");
}

#[test]
fn latin1_degree_symbol_is_recovered() {
    let mut c = Cursor::new(&[4, b'd', b'e', b'g', 0xB0]);
    assert_eq!(codec::ident(&mut c).expect("ident"), "deg\u{00B0}");
}

#[test]
fn dtime_fields() {
    let bytes = [87, 0x04, 19, 10, 20, 30, 0x00, 0x7B];
    let mut c = Cursor::new(&bytes);
    let dt = codec::dtime(&mut c).expect("dtime");
    assert_eq!(dt.year, 1987);
    assert_eq!(dt.tz, TimeZone::Local);
    assert_eq!(dt.month, 4);
    assert_eq!(dt.day, 19);
    assert_eq!(dt.hour, 10);
    assert_eq!(dt.minute, 20);
    assert_eq!(dt.second, 30);
    assert_eq!(dt.millisecond, 123);

    // time zone lives in the high nibble
    let bytes = [87, 0x24, 19, 10, 20, 30, 0x00, 0x7B];
    let mut c = Cursor::new(&bytes);
    let dt = codec::dtime(&mut c).expect("dtime");
    assert_eq!(dt.tz, TimeZone::Utc);
    assert_eq!(dt.month, 4);
}

#[test]
fn name_types_compose() {
    let mut bytes = encode_uvari(10);
    bytes.push(2);
    bytes.extend(encode_ident("CH1"));
    let mut c = Cursor::new(&bytes);
    let name = codec::obname(&mut c).expect("obname");
    assert_eq!(name.origin, 10);
    assert_eq!(name.copy, 2);
    assert_eq!(name.id, "CH1");

    let mut bytes = encode_ident("CHANNEL");
    bytes.extend(encode_uvari(1));
    bytes.push(0);
    bytes.extend(encode_ident("CH1"));
    let mut c = Cursor::new(&bytes);
    let objref = codec::objref(&mut c).expect("objref");
    assert_eq!(objref.kind, "CHANNEL");
    assert_eq!(objref.name.id, "CH1");

    let mut bytes = encode_ident("CHANNEL");
    bytes.extend(encode_uvari(1));
    bytes.push(0);
    bytes.extend(encode_ident("CH1"));
    bytes.extend(encode_ident("UNITS"));
    let mut c = Cursor::new(&bytes);
    let attref = codec::attref(&mut c).expect("attref");
    assert_eq!(attref.kind, "CHANNEL");
    assert_eq!(attref.name.id, "CH1");
    assert_eq!(attref.label, "UNITS");
}

#[test]
fn read_value_dispatches_by_code() {
    let mut c = Cursor::new(&[0x05]);
    assert_eq!(
        codec::read_value(&mut c, RepresentationCode::Uvari).expect("uvari"),
        Value::Uvari(5)
    );

    let bytes = encode_ident("T");
    let mut c = Cursor::new(&bytes);
    assert_eq!(
        codec::read_value(&mut c, RepresentationCode::Ident).expect("ident"),
        Value::Ident("T".to_string())
    );

    let mut bytes = encode_uvari(1);
    bytes.push(0);
    bytes.extend(encode_ident("X"));
    let mut c = Cursor::new(&bytes);
    assert_eq!(
        codec::read_value(&mut c, RepresentationCode::Obname).expect("obname"),
        Value::Obname(Obname {
            origin: 1,
            copy: 0,
            id: "X".to_string()
        })
    );

    let mut c = Cursor::new(&[0x01]);
    assert_eq!(
        codec::read_value(&mut c, RepresentationCode::Status).expect("status"),
        Value::Status(1)
    );
}

#[test]
fn representation_code_lookup() {
    assert_eq!(
        RepresentationCode::from_u8(19),
        Some(RepresentationCode::Ident)
    );
    assert_eq!(
        RepresentationCode::from_u8(27),
        Some(RepresentationCode::Units)
    );
    assert_eq!(RepresentationCode::from_u8(0), None);
    assert_eq!(RepresentationCode::from_u8(28), None);
}

#[test]
fn truncated_reads_carry_offsets() {
    // ident claims 5 bytes with only 3 available
    let mut c = Cursor::new(&[5, b'a', b'b', b'c']);
    match codec::ident(&mut c) {
        Err(DlisError::Truncated {
            offset,
            needed,
            available,
        }) => {
            assert_eq!(offset, 1);
            assert_eq!(needed, 5);
            assert_eq!(available, 3);
        }
        other => panic!("expected Truncated, got {:?}", other),
    }

    // a based cursor reports absolute offsets
    let mut c = Cursor::with_base(&[5, b'a'], 100);
    match codec::ident(&mut c) {
        Err(DlisError::Truncated { offset, .. }) => assert_eq!(offset, 101),
        other => panic!("expected Truncated, got {:?}", other),
    }

    let mut c = Cursor::new(&[0x01, 0x02]);
    assert!(matches!(
        codec::ulong(&mut c),
        Err(DlisError::Truncated { .. })
    ));
}
