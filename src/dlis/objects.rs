//! Explicit-format object-set parsing.
//!
//! The payload of an explicitly formatted logical record is a stream of
//! components, each introduced by a 1-byte descriptor: the top three
//! bits carry the component's role, the remaining five flag which fields
//! follow. One set header opens the stream, a run of template attributes
//! fixes the shape shared by every object, then each object binds its
//! attributes positionally to the template.

use log::{trace, warn};

use super::codec::{self, Cursor};
use super::error::{DlisError, Result};
use super::record::Record;
use super::types::{Obname, RepresentationCode, Value};

const SET_TYPE: u8 = 1 << 4;
const SET_NAME: u8 = 1 << 3;
const OBJECT_NAME: u8 = 1 << 4;
const ATTR_LABEL: u8 = 1 << 4;
const ATTR_COUNT: u8 = 1 << 3;
const ATTR_REPRC: u8 = 1 << 2;
const ATTR_UNITS: u8 = 1 << 1;
const ATTR_VALUE: u8 = 1 << 0;

/// Component roles, the top three descriptor bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Absent attribute: advances the template position without binding.
    Absatr,
    Attrib,
    /// Invariant attribute: binds its value for every object in the set.
    Invatr,
    Object,
    /// Redundant set.
    Rdset,
    /// Replacement set.
    Rset,
    Set,
}

impl Role {
    fn parse(descriptor: u8, offset: u64) -> Result<Role> {
        match descriptor >> 5 {
            0b000 => Ok(Role::Absatr),
            0b001 => Ok(Role::Attrib),
            0b010 => Ok(Role::Invatr),
            0b011 => Ok(Role::Object),
            0b101 => Ok(Role::Rdset),
            0b110 => Ok(Role::Rset),
            0b111 => Ok(Role::Set),
            other => Err(DlisError::UnexpectedValue {
                offset,
                reason: format!("undefined component role {:#05b}", other),
            }),
        }
    }
}

/// A single attribute cell: a template slot, or an object's override of
/// one.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttribute {
    pub label: String,
    pub count: u32,
    pub reprc: RepresentationCode,
    pub units: String,
    /// `None` marks an absent attribute: the slot exists but binds no
    /// value.
    pub value: Option<Vec<Value>>,
}

impl Default for ObjectAttribute {
    fn default() -> Self {
        Self {
            label: String::new(),
            count: 1,
            reprc: RepresentationCode::Ident,
            units: String::new(),
            value: None,
        }
    }
}

/// A named object with attributes aligned to its set's template.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: Obname,
    pub attributes: Vec<ObjectAttribute>,
}

/// A parsed object set: type, optional name, template and objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSet {
    /// Set type (an ident).
    pub kind: String,
    pub name: Option<String>,
    pub template: Vec<ObjectAttribute>,
    pub objects: Vec<Object>,
    /// False when the payload needed a lossy repair to parse, such as a
    /// representation-code override that orphaned an inherited value, or
    /// when the source record itself was already marked inconsistent.
    pub consistent: bool,
}

/// Parse the payload of one explicitly formatted logical record.
pub fn parse_object_set(data: &[u8]) -> Result<ObjectSet> {
    let mut c = Cursor::new(data);
    let mut consistent = true;

    let offset = c.tell();
    let descriptor = c.read_u8()?;
    match Role::parse(descriptor, offset)? {
        Role::Set => {}
        role @ (Role::Rdset | Role::Rset) => {
            // same wire shape as a regular set
            warn!("treating {:?} component at offset {} as a set header", role, offset);
        }
        role => {
            return Err(DlisError::UnexpectedValue {
                offset,
                reason: format!("expected set component, found {:?}", role),
            });
        }
    }

    let kind = if descriptor & SET_TYPE != 0 {
        codec::ident(&mut c)?
    } else {
        warn!("set component at offset {} carries no type", offset);
        String::new()
    };
    let name = if descriptor & SET_NAME != 0 {
        Some(codec::ident(&mut c)?)
    } else {
        None
    };

    // template: attribute components up to the first object
    let mut template: Vec<ObjectAttribute> = Vec::new();
    let mut invariant: Vec<bool> = Vec::new();
    while !c.is_empty() {
        let offset = c.tell();
        let descriptor = c.peek_u8()?;
        let role = Role::parse(descriptor, offset)?;
        match role {
            Role::Attrib | Role::Invatr => {
                c.read_u8()?;
                template.push(read_attribute(&mut c, descriptor, &ObjectAttribute::default())?);
                invariant.push(role == Role::Invatr);
            }
            Role::Absatr => {
                c.read_u8()?;
                template.push(ObjectAttribute::default());
                invariant.push(false);
            }
            Role::Object => break,
            role => {
                return Err(DlisError::UnexpectedValue {
                    offset,
                    reason: format!("unexpected {:?} component in template", role),
                });
            }
        }
    }

    let mut objects: Vec<Object> = Vec::new();
    while !c.is_empty() {
        let offset = c.tell();
        let descriptor = c.read_u8()?;
        let role = Role::parse(descriptor, offset)?;
        if role != Role::Object {
            return Err(DlisError::UnexpectedValue {
                offset,
                reason: format!("expected object component, found {:?}", role),
            });
        }
        if descriptor & OBJECT_NAME == 0 {
            return Err(DlisError::UnexpectedValue {
                offset,
                reason: "object component carries no name".to_string(),
            });
        }
        let name = codec::obname(&mut c)?;

        let mut attributes = template.clone();
        let mut slot = 0usize;
        while !c.is_empty() {
            let offset = c.tell();
            let descriptor = c.peek_u8()?;
            match Role::parse(descriptor, offset)? {
                Role::Object => break,
                Role::Attrib => {
                    c.read_u8()?;
                    if slot >= template.len() {
                        return Err(template_overrun(&name, template.len(), offset));
                    }
                    let merged = merge_attribute(
                        &mut c,
                        descriptor,
                        &attributes[slot],
                        invariant[slot],
                        &mut consistent,
                    )?;
                    attributes[slot] = merged;
                    slot += 1;
                }
                Role::Absatr => {
                    c.read_u8()?;
                    if slot >= template.len() {
                        return Err(template_overrun(&name, template.len(), offset));
                    }
                    attributes[slot].value = None;
                    slot += 1;
                }
                role => {
                    return Err(DlisError::UnexpectedValue {
                        offset,
                        reason: format!("unexpected {:?} component in object", role),
                    });
                }
            }
        }

        objects.push(Object { name, attributes });
    }

    Ok(ObjectSet {
        kind,
        name,
        template,
        objects,
        consistent,
    })
}

/// Parse every explicitly formatted, unencrypted record of a batch into
/// an object set. Encrypted and implicit-format records are skipped.
///
/// A record that was already reassembled inconsistently, or whose
/// payload needed a lossy repair, yields a set with `consistent` false.
pub fn parse_objects(records: &[Record]) -> Result<Vec<ObjectSet>> {
    let mut sets = Vec::with_capacity(records.len());
    for record in records {
        if record.is_encrypted() || !record.is_explicit() {
            trace!(
                "skipping record (type {}): encrypted={}, explicit={}",
                record.record_type,
                record.is_encrypted(),
                record.is_explicit()
            );
            continue;
        }
        let mut set = parse_object_set(&record.data)?;
        set.consistent = set.consistent && record.consistent;
        sets.push(set);
    }
    Ok(sets)
}

fn template_overrun(name: &Obname, slots: usize, offset: u64) -> DlisError {
    DlisError::UnexpectedValue {
        offset,
        reason: format!(
            "object '{}' has more attributes than the {}-slot template",
            name.id, slots
        ),
    }
}

/// Read the fields flagged by `descriptor` over a copy of `base`, in the
/// fixed order label, count, reprc, units, value.
fn read_attribute(
    c: &mut Cursor,
    descriptor: u8,
    base: &ObjectAttribute,
) -> Result<ObjectAttribute> {
    let mut attr = base.clone();
    if descriptor & ATTR_LABEL != 0 {
        attr.label = codec::ident(c)?;
    }
    if descriptor & ATTR_COUNT != 0 {
        attr.count = codec::uvari(c)?;
    }
    if descriptor & ATTR_REPRC != 0 {
        let offset = c.tell();
        let raw = c.read_u8()?;
        attr.reprc = RepresentationCode::from_u8(raw).ok_or_else(|| {
            DlisError::UnexpectedValue {
                offset,
                reason: format!("unknown representation code {}", raw),
            }
        })?;
    }
    if descriptor & ATTR_UNITS != 0 {
        attr.units = codec::units(c)?;
    }
    if descriptor & ATTR_VALUE != 0 {
        // every element takes at least one byte, so the remaining span
        // bounds a sane pre-allocation even for a lying count
        let mut values = Vec::with_capacity((attr.count as usize).min(c.remaining()));
        for _ in 0..attr.count {
            values.push(codec::read_value(c, attr.reprc)?);
        }
        attr.value = Some(values);
    }
    Ok(attr)
}

/// Merge an object attribute over its template slot. Fields absent from
/// the descriptor inherit from the slot.
fn merge_attribute(
    c: &mut Cursor,
    descriptor: u8,
    base: &ObjectAttribute,
    invariant: bool,
    consistent: &mut bool,
) -> Result<ObjectAttribute> {
    let mut attr = read_attribute(c, descriptor, base)?;

    // overriding the representation code without a new value orphans the
    // inherited one; warn, drop it and clear the set's consistent bit
    let overrode_reprc = descriptor & ATTR_REPRC != 0 && attr.reprc != base.reprc;
    if overrode_reprc && descriptor & ATTR_VALUE == 0 && base.value.is_some() {
        warn!(
            "attribute '{}' overrides representation code {:?} -> {:?} without a value{}; dropping inherited value",
            attr.label,
            base.reprc,
            attr.reprc,
            if invariant { " bound by an invariant attribute" } else { "" }
        );
        attr.value = None;
        *consistent = false;
    }

    Ok(attr)
}
