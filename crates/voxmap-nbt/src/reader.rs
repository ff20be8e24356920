//! Pull-based tag stream decoder.
//!
//! The reader hands out one tag at a time. Containers are not materialized:
//! a compound or list yields a header item, then its children, then an end
//! marker. Nesting is tracked with an explicit stack of expectations, so deep
//! trees never grow the call stack.

use crate::TagType;
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::io::{self, Read};
use voxmap_common::{MapError, Result};

/// One decoded tag. List elements and end markers carry no name.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtItem {
    pub name: Option<String>,
    pub value: NbtValue,
}

impl NbtItem {
    fn end() -> Self {
        NbtItem {
            name: None,
            value: NbtValue::End,
        }
    }

    pub fn tag_type(&self) -> TagType {
        self.value.tag_type()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    /// Header of a list; `count` elements of `element` type follow.
    List { element: TagType, count: i32 },
    /// Header of a compound; named children follow until an end marker.
    Compound,
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_type(&self) -> TagType {
        match self {
            NbtValue::End => TagType::End,
            NbtValue::Byte(_) => TagType::Byte,
            NbtValue::Short(_) => TagType::Short,
            NbtValue::Int(_) => TagType::Int,
            NbtValue::Long(_) => TagType::Long,
            NbtValue::Float(_) => TagType::Float,
            NbtValue::Double(_) => TagType::Double,
            NbtValue::ByteArray(_) => TagType::ByteArray,
            NbtValue::String(_) => TagType::String,
            NbtValue::List { .. } => TagType::List,
            NbtValue::Compound => TagType::Compound,
            NbtValue::IntArray(_) => TagType::IntArray,
            NbtValue::LongArray(_) => TagType::LongArray,
        }
    }
}

/// What the reader expects to see next at the current nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    /// A type byte and name, or an end marker (inside a compound or at the root).
    Named,
    /// Unnamed list elements of a known type.
    Elements { tag_type: TagType, remaining: i32 },
}

pub struct TagReader<R: Read> {
    input: Option<R>,
    stack: Vec<Expectation>,
}

impl<S: Read> TagReader<GzDecoder<S>> {
    /// Opens a gzip-compressed tag stream.
    pub fn open(source: S) -> Self {
        TagReader::uncompressed(GzDecoder::new(source))
    }
}

impl<R: Read> TagReader<R> {
    /// Reads tags from an already decompressed byte stream.
    pub fn uncompressed(input: R) -> Self {
        let mut stack = Vec::with_capacity(10);
        stack.push(Expectation::Named);
        TagReader {
            input: Some(input),
            stack,
        }
    }

    /// Current container nesting depth; zero at the top level.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    pub fn is_closed(&self) -> bool {
        self.input.is_none()
    }

    /// Releases the underlying reader. Later calls to [`Self::next_item`] report
    /// the end of the stream.
    pub fn close(&mut self) {
        self.input = None;
    }

    /// Returns the next tag, or `None` once the top-level stream is exhausted.
    /// Any error closes the reader.
    pub fn next_item(&mut self) -> Result<Option<NbtItem>> {
        let result = self.read_next();
        if result.is_err() {
            self.close();
        }
        result
    }

    fn read_next(&mut self) -> Result<Option<NbtItem>> {
        let Some(input) = self.input.as_mut() else {
            return Ok(None);
        };

        let (tag_type, name) = match self.stack.last().copied() {
            Some(Expectation::Named) => {
                let Some(type_id) = read_type_byte(input)? else {
                    if self.stack.len() > 1 {
                        return Err(MapError::from(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("stream ended inside {} open containers", self.stack.len() - 1),
                        )));
                    }
                    self.input = None;
                    return Ok(None);
                };
                let tag_type = TagType::from_id(type_id)?;
                let name = match tag_type {
                    TagType::End => None,
                    _ => Some(read_string(input)?),
                };
                (tag_type, name)
            }
            Some(Expectation::Elements { .. }) => {
                let (tag_type, exhausted) = decrement_expected(&mut self.stack)?;
                if exhausted {
                    self.stack.pop();
                    return Ok(Some(NbtItem::end()));
                }
                (tag_type, None)
            }
            None => return Err(MapError::invariant("tag reader lost its root expectation")),
        };

        let value = match tag_type {
            TagType::End => {
                if self.stack.len() <= 1 {
                    return Err(MapError::format("end marker outside of any compound"));
                }
                self.stack.pop();
                NbtValue::End
            }
            TagType::Byte => NbtValue::Byte(input.read_i8()?),
            TagType::Short => NbtValue::Short(input.read_i16::<BigEndian>()?),
            TagType::Int => NbtValue::Int(input.read_i32::<BigEndian>()?),
            TagType::Long => NbtValue::Long(input.read_i64::<BigEndian>()?),
            TagType::Float => NbtValue::Float(input.read_f32::<BigEndian>()?),
            TagType::Double => NbtValue::Double(input.read_f64::<BigEndian>()?),
            TagType::ByteArray => {
                let length = read_length(input, "byte array")?;
                NbtValue::ByteArray(read_bytes(input, length)?)
            }
            TagType::String => NbtValue::String(read_string(input)?),
            TagType::List => {
                let element = TagType::from_id(input.read_u8()?)?;
                let count = input.read_i32::<BigEndian>()?;
                if count < 0 {
                    return Err(MapError::format(format!("negative list length {}", count)));
                }
                if element == TagType::End && count > 0 {
                    return Err(MapError::format(format!(
                        "list declares {} elements of {}",
                        count, element
                    )));
                }
                self.stack.push(Expectation::Elements {
                    tag_type: element,
                    remaining: count,
                });
                NbtValue::List { element, count }
            }
            TagType::Compound => {
                self.stack.push(Expectation::Named);
                NbtValue::Compound
            }
            TagType::IntArray => {
                let length = read_length(input, "int array")?;
                let mut values = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    values.push(input.read_i32::<BigEndian>()?);
                }
                NbtValue::IntArray(values)
            }
            TagType::LongArray => {
                let length = read_length(input, "long array")?;
                let mut values = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    values.push(input.read_i64::<BigEndian>()?);
                }
                NbtValue::LongArray(values)
            }
        };

        Ok(Some(NbtItem { name, value }))
    }
}

impl<R: Read> Iterator for TagReader<R> {
    type Item = Result<NbtItem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

/// Consumes one element from the list expectation on top of the stack.
/// Returns the element type and whether the list had already run out.
fn decrement_expected(stack: &mut [Expectation]) -> Result<(TagType, bool)> {
    match stack.last_mut() {
        Some(Expectation::Elements {
            tag_type,
            remaining,
        }) => {
            *remaining -= 1;
            Ok((*tag_type, *remaining < 0))
        }
        other => Err(MapError::invariant(format!(
            "decrement of tag count while expecting {:?}",
            other
        ))),
    }
}

/// Reads a type byte, or `None` on a clean end of input.
fn read_type_byte<R: Read>(input: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_length<R: Read>(input: &mut R, what: &str) -> Result<usize> {
    let length = input.read_i32::<BigEndian>()?;
    usize::try_from(length)
        .map_err(|_| MapError::format(format!("negative {} length {}", what, length)))
}

/// Reads exactly `length` bytes without trusting `length` for the allocation.
fn read_bytes<R: Read>(input: &mut R, length: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(length.min(1 << 16));
    input.take(length as u64).read_to_end(&mut bytes)?;
    if bytes.len() != length {
        return Err(MapError::from(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream had {}", length, bytes.len()),
        )));
    }
    Ok(bytes)
}

fn read_string<R: Read>(input: &mut R) -> Result<String> {
    let length = input.read_u16::<BigEndian>()?;
    let bytes = read_bytes(input, length as usize)?;
    String::from_utf8(bytes).map_err(|e| MapError::format(format!("invalid UTF-8 in string: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NbtFile, Tag};
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn encode(root: Tag) -> Vec<u8> {
        let mut buffer = Vec::new();
        NbtFile::new("root".to_string(), root)
            .write(&mut buffer)
            .unwrap();
        buffer
    }

    fn events(bytes: Vec<u8>) -> Vec<NbtItem> {
        TagReader::uncompressed(Cursor::new(bytes))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn named(name: &str, value: NbtValue) -> NbtItem {
        NbtItem {
            name: Some(name.to_string()),
            value,
        }
    }

    fn unnamed(value: NbtValue) -> NbtItem {
        NbtItem { name: None, value }
    }

    #[test]
    fn test_list_elements_are_unnamed_and_closed() {
        let bytes = encode(Tag::Compound(vec![(
            "nums".to_string(),
            Tag::List(TagType::Short, vec![Tag::Short(1), Tag::Short(2)]),
        )]));
        assert_eq!(
            events(bytes),
            vec![
                named("root", NbtValue::Compound),
                named(
                    "nums",
                    NbtValue::List {
                        element: TagType::Short,
                        count: 2
                    }
                ),
                unnamed(NbtValue::Short(1)),
                unnamed(NbtValue::Short(2)),
                unnamed(NbtValue::End),
                unnamed(NbtValue::End),
            ]
        );
    }

    #[test]
    fn test_empty_list_closes_immediately() {
        let bytes = encode(Tag::Compound(vec![
            ("none".to_string(), Tag::List(TagType::End, vec![])),
            ("after".to_string(), Tag::Byte(5)),
        ]));
        let items = events(bytes);
        assert_eq!(items[2], unnamed(NbtValue::End));
        assert_eq!(items[3], named("after", NbtValue::Byte(5)));
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn test_lists_of_lists_track_depth() {
        let inner = |values: Vec<i64>| {
            Tag::List(TagType::Long, values.into_iter().map(Tag::Long).collect())
        };
        let bytes = encode(Tag::Compound(vec![(
            "grid".to_string(),
            Tag::List(TagType::List, vec![inner(vec![1, 2]), inner(vec![])]),
        )]));

        let mut reader = TagReader::uncompressed(Cursor::new(bytes));
        let mut depths = Vec::new();
        while let Some(item) = reader.next_item().unwrap() {
            depths.push((item.tag_type(), reader.depth()));
        }
        assert_eq!(
            depths,
            vec![
                (TagType::Compound, 1),
                (TagType::List, 2),
                (TagType::List, 3),
                (TagType::Long, 3),
                (TagType::Long, 3),
                (TagType::End, 2),
                (TagType::List, 3),
                (TagType::End, 2),
                (TagType::End, 1),
                (TagType::End, 0),
            ]
        );
        assert!(reader.is_closed());
        assert!(reader.next_item().unwrap().is_none());
    }

    #[test]
    fn test_truncated_scalar_is_io_error() {
        let mut bytes = encode(Tag::Compound(vec![("n".to_string(), Tag::Int(9))]));
        bytes.truncate(bytes.len() - 3);
        let mut reader = TagReader::uncompressed(Cursor::new(bytes));
        reader.next_item().unwrap();
        assert_matches!(
            reader.next_item(),
            Err(MapError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        );
        assert!(reader.is_closed());
    }

    #[test]
    fn test_stream_ending_inside_compound_is_io_error() {
        let mut bytes = encode(Tag::Compound(vec![("n".to_string(), Tag::Int(9))]));
        bytes.pop();
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(bytes)).collect();
        assert_matches!(result, Err(MapError::IoError(_)));
    }

    #[test]
    fn test_truncated_byte_array_is_io_error() {
        let mut bytes = encode(Tag::Compound(vec![(
            "Blocks".to_string(),
            Tag::ByteArray(vec![7; 64]),
        )]));
        bytes.truncate(bytes.len() - 10);
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(bytes)).collect();
        assert_matches!(result, Err(MapError::IoError(_)));
    }

    #[test]
    fn test_unknown_type_is_format_error() {
        let bytes = vec![10, 0, 0, 42, 0, 1, b'x'];
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(bytes)).collect();
        assert_matches!(result, Err(MapError::FormatError(_)));
    }

    #[test]
    fn test_negative_lengths_are_format_errors() {
        // compound "" { byte array "b" with length -1 }
        let bytes = vec![10, 0, 0, 7, 0, 1, b'b', 0xff, 0xff, 0xff, 0xff];
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(bytes)).collect();
        assert_matches!(result, Err(MapError::FormatError(_)));

        // compound "" { list "l" of 5 end tags }
        let bytes = vec![10, 0, 0, 9, 0, 1, b'l', 0, 0, 0, 0, 5];
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(bytes)).collect();
        assert_matches!(result, Err(MapError::FormatError(_)));
    }

    #[test]
    fn test_end_marker_at_root_is_format_error() {
        let result: Result<Vec<_>> = TagReader::uncompressed(Cursor::new(vec![0u8])).collect();
        assert_matches!(result, Err(MapError::FormatError(_)));
    }

    #[test]
    fn test_decrement_without_list_is_invariant_violation() {
        let mut stack = vec![Expectation::Named];
        assert_matches!(
            decrement_expected(&mut stack),
            Err(MapError::InvariantViolation(_))
        );
    }

    #[test]
    fn test_empty_input_is_clean_end() {
        let mut reader = TagReader::uncompressed(Cursor::new(Vec::<u8>::new()));
        assert!(reader.next_item().unwrap().is_none());
    }

    #[test]
    fn test_closed_reader_reports_end() {
        let bytes = encode(Tag::Compound(vec![("n".to_string(), Tag::Int(9))]));
        let mut reader = TagReader::uncompressed(Cursor::new(bytes));
        assert!(reader.next_item().unwrap().is_some());
        reader.close();
        assert!(reader.next_item().unwrap().is_none());
    }
}
