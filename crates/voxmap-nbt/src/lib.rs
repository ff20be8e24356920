pub mod reader;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{self, Read, Write};
use voxmap_common::{MapError, Result};

pub use reader::{NbtItem, NbtValue, TagReader};

/// Tag type ids as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagType {
    pub fn from_id(id: u8) -> Result<Self> {
        Ok(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            _ => return Err(MapError::format(format!("invalid tag type: {}", id))),
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagType::End => "TAG_End",
            TagType::Byte => "TAG_Byte",
            TagType::Short => "TAG_Short",
            TagType::Int => "TAG_Int",
            TagType::Long => "TAG_Long",
            TagType::Float => "TAG_Float",
            TagType::Double => "TAG_Double",
            TagType::ByteArray => "TAG_Byte_Array",
            TagType::String => "TAG_String",
            TagType::List => "TAG_List",
            TagType::Compound => "TAG_Compound",
            TagType::IntArray => "TAG_Int_Array",
            TagType::LongArray => "TAG_Long_Array",
        };
        write!(f, "{}", name)
    }
}

/// Owned tag tree. Compounds keep their entries in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(TagType, Vec<Tag>),
    Compound(Vec<(String, Tag)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::End => TagType::End,
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List(..) => TagType::List,
            Tag::Compound(_) => TagType::Compound,
            Tag::IntArray(_) => TagType::IntArray,
            Tag::LongArray(_) => TagType::LongArray,
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.tag_type().id())?;

        if !matches!(self, Tag::End) {
            write_string(writer, name)?;
        }

        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
            Tag::ByteArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                writer.write_all(v)
            }
            Tag::String(v) => write_string(writer, v),
            Tag::List(element_type, v) => {
                if let Some(mismatch) = v.iter().find(|tag| tag.tag_type() != *element_type) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "{} in a list of {}",
                            mismatch.tag_type(),
                            element_type
                        ),
                    ));
                }
                writer.write_u8(element_type.id())?;
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for tag in v {
                    tag.write_payload(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    tag.write(writer, name)?;
                }
                Tag::End.write(writer, "")
            }
            Tag::IntArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
                Ok(())
            }
        }
    }
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("string of {} bytes does not fit a tag", s.len()),
        )
    })?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(s.as_bytes())
}

/// A complete tag file: one named root tag, usually a compound.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub root: Tag,
    pub name: String,
}

impl NbtFile {
    pub fn new(name: String, root: Tag) -> Self {
        NbtFile { root, name }
    }

    /// Reads an uncompressed tag file by driving the streaming reader.
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Self::read_from(TagReader::uncompressed(reader))
    }

    pub fn read_gzip<R: Read>(reader: R) -> Result<Self> {
        Self::read_from(TagReader::open(reader))
    }

    fn read_from<R: Read>(mut reader: TagReader<R>) -> Result<Self> {
        let item = reader
            .next_item()?
            .ok_or_else(|| MapError::format("empty tag stream"))?;
        let name = item.name.clone().unwrap_or_default();
        let root = build_tag(&mut reader, item.value)?;
        reader.close();
        Ok(NbtFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write(writer, &self.name)
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}

fn next_required<R: Read>(reader: &mut TagReader<R>) -> Result<NbtItem> {
    reader.next_item()?.ok_or_else(|| {
        MapError::from(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "tag stream ended inside a container",
        ))
    })
}

fn build_tag<R: Read>(reader: &mut TagReader<R>, value: NbtValue) -> Result<Tag> {
    Ok(match value {
        NbtValue::End => Tag::End,
        NbtValue::Byte(v) => Tag::Byte(v),
        NbtValue::Short(v) => Tag::Short(v),
        NbtValue::Int(v) => Tag::Int(v),
        NbtValue::Long(v) => Tag::Long(v),
        NbtValue::Float(v) => Tag::Float(v),
        NbtValue::Double(v) => Tag::Double(v),
        NbtValue::ByteArray(v) => Tag::ByteArray(v),
        NbtValue::String(v) => Tag::String(v),
        NbtValue::IntArray(v) => Tag::IntArray(v),
        NbtValue::LongArray(v) => Tag::LongArray(v),
        NbtValue::List { element, count } => {
            let mut elements = Vec::with_capacity(count.clamp(0, 1024) as usize);
            loop {
                let item = next_required(reader)?;
                if item.value == NbtValue::End {
                    break;
                }
                elements.push(build_tag(reader, item.value)?);
            }
            Tag::List(element, elements)
        }
        NbtValue::Compound => {
            let mut entries = Vec::new();
            loop {
                let item = next_required(reader)?;
                if item.value == NbtValue::End {
                    break;
                }
                let name = item.name.clone().unwrap_or_default();
                entries.push((name, build_tag(reader, item.value)?));
            }
            Tag::Compound(entries)
        }
    })
}
