//! # Varint / Value Codec
//!
//! Wire primitives shared by messages and layout resources.
//!
//! ## Encoding
//!
//! - Unsigned integers: 7-bit groups, most significant group first, bit 7
//!   set on every byte but the last. At most 5 bytes.
//! - Signed integers: zig-zag mapped, then encoded as unsigned.
//! - Floats: 4 bytes, native byte order. Both peers must share endianness.
//! - Strings: varint length, then raw UTF-8 bytes.
//! - Sizelists: count, packed 2-bit kind bitmap, then one varint per pixel
//!   entry and one byte (0-100) per percent entry.

use crate::constants::MAX_VARINT_LEN;
use crate::enums::UiType;
use crate::error::{FarsightError, FarsightResult};
use crate::geometry::{Color, Margins, Point, Size};
use crate::ids::{EventId, ObjectId, PropertyName, ResourceId};
use crate::object::{Object, ObjectRef};
use crate::value::{SizeDef, Value};

/// Maps a signed integer onto the unsigned range so small magnitudes stay small.
#[inline]
#[must_use]
pub const fn zigzag_encode(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[must_use]
pub const fn zigzag_decode(u: u32) -> i32 {
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

/// Number of bytes `write_varint` emits for `value`.
#[must_use]
pub const fn varint_len(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Cursor over a received buffer.
///
/// Every read is bounds-checked and fails with `StreamExhausted` instead of
/// panicking.
pub struct WireReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over the given bytes.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true once every byte has been consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes and returns everything left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }

    /// Reads exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> FarsightResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(FarsightError::StreamExhausted {
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self) -> FarsightResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads an unsigned varint.
    pub fn read_uint(&mut self) -> FarsightResult<u32> {
        let mut value: u64 = 0;
        for _ in 0..MAX_VARINT_LEN {
            let byte = self.read_byte()?;
            value = (value << 7) | u64::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return u32::try_from(value).map_err(|_| FarsightError::VarintOverflow);
            }
        }
        Err(FarsightError::VarintOverflow)
    }

    /// Reads a zig-zag encoded signed varint.
    pub fn read_int(&mut self) -> FarsightResult<i32> {
        self.read_uint().map(zigzag_decode)
    }

    /// Reads a native-endian 32-bit float.
    pub fn read_float(&mut self) -> FarsightResult<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> FarsightResult<String> {
        let len = self.read_uint()? as usize;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| FarsightError::InvalidUtf8)
    }

    /// Reads a type tag byte.
    pub fn read_type(&mut self) -> FarsightResult<UiType> {
        let tag = self.read_byte()?;
        UiType::from_u8(tag).ok_or(FarsightError::InvalidTag { kind: "value type", tag })
    }

    /// Reads a value whose type is known from context.
    pub fn read_value(&mut self, ty: UiType) -> FarsightResult<Value> {
        Ok(match ty {
            UiType::Invalid => {
                return Err(FarsightError::InvalidTag {
                    kind: "value type",
                    tag: 0,
                })
            }
            UiType::Integer => Value::Integer(self.read_int()?),
            UiType::Number => Value::Number(self.read_float()?),
            UiType::String => Value::String(self.read_string()?),
            UiType::Enumeration => Value::Enumeration(self.read_byte()?),
            UiType::Margins => {
                let left = self.read_int()?;
                let top = self.read_int()?;
                let right = self.read_int()?;
                let bottom = self.read_int()?;
                Value::Margins(Margins::new(left, top, right, bottom))
            }
            UiType::Color => {
                let rgba = self.read_bytes(4)?;
                Value::Color(Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]))
            }
            UiType::Size => {
                let width = saturate(self.read_uint()?);
                let height = saturate(self.read_uint()?);
                Value::Size(Size::new(width, height))
            }
            UiType::Point => {
                let x = self.read_int()?;
                let y = self.read_int()?;
                Value::Point(Point::new(x, y))
            }
            UiType::Resource => Value::Resource(ResourceId(self.read_uint()?)),
            UiType::Boolean => Value::Boolean(self.read_byte()? != 0),
            UiType::SizeList => Value::SizeList(self.read_size_list()?),
            UiType::Object => Value::Object(ObjectRef::new(ObjectId(self.read_uint()?))),
            UiType::ObjectList => {
                let mut list = Vec::new();
                loop {
                    let id = ObjectId(self.read_uint()?);
                    if id.is_null() {
                        break;
                    }
                    list.push(ObjectRef::new(id));
                }
                Value::ObjectList(list)
            }
            UiType::Event => Value::Event(EventId(self.read_uint()?)),
        })
    }

    fn read_size_list(&mut self) -> FarsightResult<Vec<SizeDef>> {
        let count = self.read_uint()? as usize;
        let bitmap_len = count.div_ceil(4);
        // a hostile count must not drive the allocation below
        if bitmap_len > self.remaining() {
            return Err(FarsightError::StreamExhausted {
                needed: bitmap_len - self.remaining(),
            });
        }
        let bitmap = self.read_bytes(bitmap_len)?;

        let mut list = Vec::with_capacity(count);
        for index in 0..count {
            let tag = (bitmap[index / 4] >> (2 * (index % 4))) & 0x3;
            let def = match tag {
                0 => SizeDef::Auto,
                1 => SizeDef::Expand,
                2 => SizeDef::Pixels(0),
                _ => SizeDef::Percent(0.0),
            };
            list.push(def);
        }

        for def in &mut list {
            match def {
                SizeDef::Pixels(px) => *px = saturate(self.read_uint()?),
                SizeDef::Percent(pct) => *pct = f32::from(self.read_byte()?) / 100.0,
                SizeDef::Auto | SizeDef::Expand => {}
            }
        }
        Ok(list)
    }

    /// Reads a serialized object: id, then `(type, name, value)` triples
    /// until a type byte of zero.
    pub fn read_object(&mut self) -> FarsightResult<Object> {
        let id = ObjectId(self.read_uint()?);
        let mut object = Object::new(id);
        loop {
            let ty = self.read_type()?;
            if ty == UiType::Invalid {
                break;
            }
            let name = PropertyName(self.read_uint()?);
            let value = self.read_value(ty)?;
            object.add_value(name, value)?;
        }
        Ok(object)
    }
}

fn saturate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Growable output buffer.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint in its minimal form.
    pub fn write_varint(&mut self, value: u32) {
        let len = varint_len(value);
        for group in (0..len).rev() {
            let bits = ((value >> (7 * group)) & 0x7F) as u8;
            if group == 0 {
                self.buffer.push(bits);
            } else {
                self.buffer.push(bits | 0x80);
            }
        }
    }

    /// Writes a zig-zag encoded signed varint.
    pub fn write_int(&mut self, value: i32) {
        self.write_varint(zigzag_encode(value));
    }

    /// Writes a native-endian 32-bit float.
    pub fn write_number(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_ne_bytes());
    }

    /// Writes a length-prefixed string.
    pub fn write_string(&mut self, value: &str) {
        self.write_varint(value.len() as u32);
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Writes a value, optionally preceded by its type tag.
    pub fn write_value(&mut self, value: &Value, prefix_type: bool) {
        if prefix_type {
            self.write_byte(value.ty() as u8);
        }
        match value {
            Value::Invalid => {}
            Value::Integer(v) => self.write_int(*v),
            Value::Number(v) => self.write_number(*v),
            Value::String(v) => self.write_string(v),
            Value::Enumeration(v) => self.write_byte(*v),
            Value::Margins(m) => {
                self.write_int(m.left);
                self.write_int(m.top);
                self.write_int(m.right);
                self.write_int(m.bottom);
            }
            Value::Color(c) => self.write_bytes(&[c.r, c.g, c.b, c.a]),
            Value::Size(s) => {
                self.write_varint(s.width.max(0) as u32);
                self.write_varint(s.height.max(0) as u32);
            }
            Value::Point(p) => {
                self.write_int(p.x);
                self.write_int(p.y);
            }
            Value::Resource(id) => self.write_varint(id.raw()),
            Value::Boolean(b) => self.write_byte(u8::from(*b)),
            Value::SizeList(list) => self.write_size_list(list),
            Value::Object(r) => self.write_varint(r.id.raw()),
            Value::ObjectList(list) => {
                for item in list.iter().filter(|r| !r.id.is_null()) {
                    self.write_varint(item.id.raw());
                }
                self.write_varint(0);
            }
            Value::Event(id) => self.write_varint(id.raw()),
        }
    }

    fn write_size_list(&mut self, list: &[SizeDef]) {
        self.write_varint(list.len() as u32);
        for chunk in list.chunks(4) {
            let mut packed = 0u8;
            for (j, def) in chunk.iter().enumerate() {
                packed |= def.tag() << (2 * j);
            }
            self.write_byte(packed);
        }
        for def in list {
            match def {
                SizeDef::Pixels(px) => self.write_varint((*px).max(0) as u32),
                SizeDef::Percent(pct) => {
                    self.write_byte((pct * 100.0).round().clamp(0.0, 100.0) as u8);
                }
                SizeDef::Auto | SizeDef::Expand => {}
            }
        }
    }

    /// Writes an object: id, typed properties, then a zero type byte.
    pub fn write_object(&mut self, object: &Object) {
        self.write_varint(object.id().raw());
        for (name, property) in object.properties() {
            self.write_byte(property.value.ty() as u8);
            self.write_varint(name.raw());
            self.write_value(&property.value, false);
        }
        self.write_byte(UiType::Invalid as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn encode(value: u32) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.write_varint(value);
        w.into_inner()
    }

    #[test]
    fn test_varint_big_endian_groups() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(0x7F), vec![0x7F]);
        assert_eq!(encode(0x80), vec![0x81, 0x00]);
        assert_eq!(encode(300), vec![0x82, 0x2C]);
        assert_eq!(encode(u32::MAX).len(), 5);
    }

    #[test]
    fn test_varint_random_round_trip() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let v: u32 = rng.gen();
            let bytes = encode(v);
            assert_eq!(bytes.len(), varint_len(v));
            let mut r = WireReader::new(&bytes);
            assert_eq!(r.read_uint().unwrap(), v);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_zigzag_round_trip() {
        for n in [0, 1, -1, 2, -2, i32::MAX, i32::MIN, 12345, -98765] {
            assert_eq!(zigzag_decode(zigzag_encode(n)), n);
        }
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
    }

    #[test]
    fn test_varint_overflow_rejected() {
        let mut r = WireReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(r.read_uint(), Err(FarsightError::VarintOverflow));

        // five groups, but the top group carries more than 4 bits
        let mut r = WireReader::new(&[0x9F, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(r.read_uint(), Err(FarsightError::VarintOverflow));
    }

    #[test]
    fn test_truncated_reads() {
        let mut r = WireReader::new(&[0x80]);
        assert!(matches!(r.read_uint(), Err(FarsightError::StreamExhausted { .. })));

        let mut r = WireReader::new(&[0x05, b'a', b'b']);
        assert!(matches!(r.read_string(), Err(FarsightError::StreamExhausted { .. })));

        let mut r = WireReader::new(&[]);
        assert!(r.read_byte().is_err());
    }

    #[test]
    fn test_value_round_trip() {
        let samples = vec![
            Value::Integer(-42),
            Value::Number(3.5),
            Value::String("Click me!".into()),
            Value::Enumeration(17),
            Value::Margins(Margins::new(1, -2, 3, 4)),
            Value::Color(Color::rgba(1, 2, 3, 4)),
            Value::Size(Size::new(640, 480)),
            Value::Point(Point::new(-5, 9)),
            Value::Resource(ResourceId(77)),
            Value::Boolean(true),
            Value::SizeList(vec![
                SizeDef::Auto,
                SizeDef::Expand,
                SizeDef::Pixels(120),
                SizeDef::Percent(0.25),
                SizeDef::Expand,
            ]),
            Value::object(ObjectId(5)),
            Value::object_list([ObjectId(1), ObjectId(2), ObjectId(3)]),
            Value::Event(EventId(9)),
        ];

        for value in samples {
            let mut w = WireWriter::new();
            w.write_value(&value, true);
            let bytes = w.into_inner();
            let mut r = WireReader::new(&bytes);
            let ty = r.read_type().unwrap();
            assert_eq!(ty, value.ty());
            assert_eq!(r.read_value(ty).unwrap(), value);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_size_list_bitmap_layout() {
        let mut w = WireWriter::new();
        w.write_value(
            &Value::SizeList(vec![SizeDef::Expand, SizeDef::Pixels(10), SizeDef::Percent(0.5)]),
            false,
        );
        // count, bitmap 0b11_10_01, pixel varint, percent byte
        assert_eq!(w.as_slice(), &[3, 0b0011_1001, 10, 50]);
    }

    #[test]
    fn test_size_list_hostile_count() {
        let mut r = WireReader::new(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert!(r.read_value(UiType::SizeList).is_err());
    }

    #[test]
    fn test_object_round_trip() {
        let mut object = Object::new(ObjectId(3));
        object.add_value(PropertyName(1), Value::Integer(7)).unwrap();
        object.add_value(PropertyName(2), Value::from("hello")).unwrap();

        let mut w = WireWriter::new();
        w.write_object(&object);
        let bytes = w.into_inner();
        let decoded = WireReader::new(&bytes).read_object().unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn test_object_duplicate_property_rejected() {
        // id 1, integer name 4 = 1, integer name 4 = 2, end
        let bytes = [1, 1, 4, 2, 1, 4, 4, 0];
        let err = WireReader::new(&bytes).read_object().unwrap_err();
        assert!(matches!(err, FarsightError::DuplicateProperty { object: 1, property: 4 }));
    }
}
