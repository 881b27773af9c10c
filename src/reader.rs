use crate::codec::Codec;
use crate::config::DEFAULT_FLUSH_INTERVAL;
use crate::error;
use crate::schema;
use crate::serde_avro;
use crate::util::{decode_bytes, decode_string};
use crate::value;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use error::AvrowErr;
use indexmap::IndexMap;
use integer_encoding::VarIntReader;
use schema::Registry;
use schema::Schema;
use schema::Variant;
use serde::Deserialize;
use serde_avro::SerdeReader;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::io::Cursor;
use std::io::Read;
use std::io::{Error, ErrorKind};
use std::str;
use std::str::FromStr;
use value::{FieldValue, Record, Value};

/// Reader is the primary interface for reading data from an avro datafile.
pub struct Reader<R> {
    source: R,
    header: Header,
    // TODO when reading data call resolve schema https://avro.apache.org/docs/1.8.2/spec.html#Schema+Resolution
    // This is the schema after it has been resolved using both reader and writer schema
    // NOTE: This is a partially resolved schema
    // schema: Option<ResolvedSchema>,
    // TODO this is for experimental purposes, ideally we can just use references
    reader_schema: Option<Schema>,
    block_buffer: Cursor<Vec<u8>>,
    entries_in_block: u64,
}

impl<R> Reader<R>
where
    R: Read,
{
    /// Creates a Reader from an avro encoded readable buffer.
    pub fn new(mut avro_source: R) -> Result<Self, AvrowErr> {
        let header = Header::from_reader(&mut avro_source)?;
        Ok(Reader {
            source: avro_source,
            header,
            reader_schema: None,
            block_buffer: Cursor::new(vec![0u8; DEFAULT_FLUSH_INTERVAL]),
            entries_in_block: 0,
        })
    }

    /// Create a Reader with the given reader schema and a readable buffer.
    pub fn with_schema(mut source: R, reader_schema: Schema) -> Result<Self, AvrowErr> {
        let header = Header::from_reader(&mut source)?;

        Ok(Reader {
            source,
            header,
            reader_schema: Some(reader_schema),
            block_buffer: Cursor::new(vec![0u8; DEFAULT_FLUSH_INTERVAL]),
            entries_in_block: 0,
        })
    }

    // TODO optimize based on benchmarks
    fn next_block(&mut self) -> Result<(), std::io::Error> {
        // if no more bytes to read, read_varint below returns an EOF
        let entries_in_block: i64 = self.source.read_varint()?;
        self.entries_in_block = entries_in_block as u64;

        let block_stream_len: i64 = self.source.read_varint()?;

        let mut compressed_block = vec![0u8; block_stream_len as usize];
        self.source.read_exact(&mut compressed_block)?;

        self.header
            .codec
            .decode(compressed_block, &mut self.block_buffer)
            .map_err(|e| {
                Error::new(
                    ErrorKind::Other,
                    format!("Failed decoding block data with codec, {:?}", e),
                )
            })?;

        // Ready for reading from block
        self.block_buffer.set_position(0);

        let mut sync_marker_buf = [0u8; 16];
        let _ = self.source.read_exact(&mut sync_marker_buf);

        if sync_marker_buf != self.header.sync_marker {
            let err = Error::new(
                ErrorKind::Other,
                "Sync marker does not match as expected while reading",
            );
            return Err(err);
        }

        Ok(())
    }

    /// Retrieves a reference to the header metadata map.
    pub fn meta(&self) -> &HashMap<String, Vec<u8>> {
        self.header.metadata()
    }
}

/// `from_value` is the serde API for deserialization of avro encoded data to native Rust types.
pub fn from_value<'de, D: Deserialize<'de>>(
    value: &'de Result<Value, AvrowErr>,
) -> Result<D, AvrowErr> {
    match value {
        Ok(v) => {
            let mut serde_reader = SerdeReader::new(v);
            D::deserialize(&mut serde_reader)
        }
        Err(e) => Err(AvrowErr::UnexpectedAvroValue {
            value: e.to_string(),
        }),
    }
}

impl<'a, 's, R: Read> Iterator for Reader<R> {
    type Item = Result<Value, AvrowErr>;

    fn next(&mut self) -> Option<Self::Item> {
        // invariant: True on start and end of an avro datafile
        if self.entries_in_block == 0 {
            if let Err(e) = self.next_block() {
                // marks the end of the avro datafile
                if let std::io::ErrorKind::UnexpectedEof = e.kind() {
                    return None;
                } else {
                    return Some(Err(AvrowErr::DecodeFailed(e)));
                }
            }
        }

        let writer_schema = &self.header.schema;
        let w_cxt = &writer_schema.cxt;
        let reader_schema = &self.reader_schema;
        let value = if let Some(r_schema) = reader_schema {
            let r_cxt = &r_schema.cxt;
            decode_with_resolution(
                &r_schema.variant,
                &writer_schema.variant,
                &r_cxt,
                &w_cxt,
                &mut self.block_buffer,
            )
        } else {
            // decode without the reader schema
            decode(&writer_schema.variant, &mut self.block_buffer, &w_cxt)
        };

        self.entries_in_block -= 1;

        if let Err(e) = value {
            return Some(Err(e));
        }

        Some(value)
    }
}

/// Reads an array/map block count, transparently consuming and discarding the
/// byte-size `long` that follows a negative count (the block's declared size
/// in bytes, present so unsupported readers can skip the block wholesale).
fn read_block_count<R: Read>(reader: &mut R) -> Result<i64, AvrowErr> {
    let count: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
    if count < 0 {
        let _block_byte_size: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
        Ok(-count)
    } else {
        Ok(count)
    }
}

// Reads places priority on reader's schema when passing any schema context if a reader schema is provided.
/// Whether a value encoded under `writer` can be resolved against `reader`
/// without consulting the union/named-type resolution rules above it:
/// identical types, or one of Avro's numeric/string-bytes promotions.
fn match_types(writer: &Variant, reader: &Variant) -> bool {
    match (writer, reader) {
        (Variant::Int, Variant::Long)
        | (Variant::Int, Variant::Float)
        | (Variant::Int, Variant::Double)
        | (Variant::Long, Variant::Float)
        | (Variant::Long, Variant::Double)
        | (Variant::Float, Variant::Double)
        | (Variant::Bytes, Variant::Str)
        | (Variant::Str, Variant::Bytes) => true,
        (w, r) => w == r,
    }
}

pub(crate) fn decode_with_resolution<R: Read>(
    r_schema: &Variant,
    w_schema: &Variant,
    r_cxt: &Registry,
    w_cxt: &Registry,
    reader: &mut R,
) -> Result<Value, AvrowErr> {
    // LHS: Writer schema, RHS: Reader schema
    let value = match (w_schema, r_schema) {
        (
            Variant::Logical { backing: w_backing, .. },
            Variant::Logical { params, backing: r_backing, .. },
        ) => {
            let raw = decode_with_resolution(r_backing, w_backing, r_cxt, w_cxt, reader)?;
            let key = r_schema
                .logical_key()
                .expect("Variant::Logical always has a key");
            crate::logical::interpret(&key, &raw, params)?
        }
        (Variant::Logical { backing: w_backing, .. }, r) => {
            decode_with_resolution(r, w_backing, r_cxt, w_cxt, reader)?
        }
        (w, Variant::Logical { params, backing: r_backing, .. }) => {
            let raw = decode_with_resolution(r_backing, w, r_cxt, w_cxt, reader)?;
            let key = r_schema
                .logical_key()
                .expect("Variant::Logical always has a key");
            crate::logical::interpret(&key, &raw, params)?
        }
        (Variant::Null, Variant::Null) => Value::Null,
        (Variant::Boolean, Variant::Boolean) => {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf)
                .map_err(AvrowErr::DecodeFailed)?;
            match buf {
                [0x00] => Value::Boolean(false),
                [0x01] => Value::Boolean(true),
                _o => {
                    return Err(AvrowErr::DecodeFailed(Error::new(
                        ErrorKind::InvalidData,
                        "expecting a 0x00 or 0x01 as a byte for boolean value",
                    )))
                }
            }
        }
        (Variant::Int, Variant::Int) => {
            Value::Int(reader.read_varint().map_err(AvrowErr::DecodeFailed)?)
        }
        // int is promotable to long, float, or double (we read as int and cast to promotable.)
        (Variant::Int, Variant::Long) => Value::Long(
            reader
                .read_varint::<i32>()
                .map_err(AvrowErr::DecodeFailed)? as i64,
        ),
        (Variant::Int, Variant::Float) => Value::Float(
            reader
                .read_varint::<i32>()
                .map_err(AvrowErr::DecodeFailed)? as f32,
        ),
        (Variant::Int, Variant::Double) => Value::Double(
            reader
                .read_varint::<i32>()
                .map_err(AvrowErr::DecodeFailed)? as f64,
        ),
        (Variant::Long, Variant::Long) => {
            Value::Long(reader.read_varint().map_err(AvrowErr::DecodeFailed)?)
        }
        // long is promotable to float or double
        (Variant::Long, Variant::Float) => Value::Float(
            reader
                .read_varint::<i64>()
                .map_err(AvrowErr::DecodeFailed)? as f32,
        ),
        (Variant::Long, Variant::Double) => Value::Double(
            reader
                .read_varint::<i64>()
                .map_err(AvrowErr::DecodeFailed)? as f64,
        ),
        (Variant::Float, Variant::Float) => Value::Float(
            reader
                .read_f32::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?,
        ),
        (Variant::Double, Variant::Double) => Value::Double(
            reader
                .read_f64::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?,
        ),
        // float is promotable to double
        (Variant::Float, Variant::Double) => Value::Double(
            reader
                .read_f32::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)? as f64,
        ),
        (Variant::Bytes, Variant::Bytes) => Value::Bytes(decode_bytes(reader)?),
        // bytes is promotable to string
        (Variant::Bytes, Variant::Str) => {
            let bytes = decode_bytes(reader)?;
            let s = str::from_utf8(&bytes).map_err(|_e| {
                let err = Error::new(ErrorKind::InvalidData, "failed converting bytes to string");
                AvrowErr::DecodeFailed(err)
            })?;

            Value::Str(s.to_string())
        }
        (Variant::Str, Variant::Str) => {
            let buf = decode_bytes(reader)?;
            let s = str::from_utf8(&buf).map_err(|_e| {
                let err = Error::new(ErrorKind::InvalidData, "failed converting bytes to string");
                AvrowErr::DecodeFailed(err)
            })?;
            Value::Str(s.to_string())
        }
        // string is promotable to bytes
        (Variant::Str, Variant::Bytes) => {
            let buf = decode_bytes(reader)?;
            Value::Bytes(buf)
        }
        (Variant::Array { items: w_items }, Variant::Array { items: r_items }) => {
            if w_items == r_items {
                let mut v = Vec::new();
                loop {
                    let block_count = read_block_count(reader)?;
                    if block_count == 0 {
                        break;
                    }
                    for _ in 0..block_count {
                        let decoded =
                            decode_with_resolution(&*r_items, &*w_items, r_cxt, w_cxt, reader)?;
                        v.push(decoded);
                    }
                }

                Value::Array(v)
            } else {
                return Err(AvrowErr::ArrayItemsMismatch);
            }
        }
        // Resolution rules
        // if both are records:
        // * The ordering of fields may be different: fields are matched by name. [1]
        // * Schemas for fields with the same name in both records are resolved recursively. [2]
        // * If the writer's record contains a field with a name not present in the reader's record,
        //   the writer's value for that field is ignored. [3]
        // * If the reader's record schema has a field that contains a default value,
        //   and writer's schema does not have a field with the same name,
        //   then the reader should use the default value from its field. [4]
        // * If the reader's record schema has a field with no default value,
        //   and writer's schema does not have a field with the same name, an error is signalled. [5]
        (
            Variant::Record {
                name: writer_name,
                fields: writer_fields,
                ..
            },
            Variant::Record {
                name: reader_name,
                fields: reader_fields,
                ..
            },
        ) => {
            // [1]
            let reader_name = reader_name.fullname();
            let writer_name = writer_name.fullname();
            if writer_name != reader_name {
                return Err(AvrowErr::RecordNameMismatch);
            }

            let mut rec = Record::new(&reader_name);
            let mut seen = std::collections::HashSet::new();

            // Walk writer fields in encoded order; only this order matches the byte stream.
            for (w_fieldname, wf) in writer_fields {
                let matched = reader_fields
                    .get(w_fieldname)
                    .map(|rf| (w_fieldname.as_str(), rf))
                    .or_else(|| {
                        reader_fields.iter().find_map(|(r_name, rf)| {
                            rf.aliases
                                .as_ref()
                                .filter(|aliases| aliases.iter().any(|a| a == w_fieldname))
                                .map(|_| (r_name.as_str(), rf))
                        })
                    });

                if let Some((r_fieldname, reader_field)) = matched {
                    // [2]
                    let f_decoded =
                        decode_with_resolution(&reader_field.ty, &wf.ty, r_cxt, w_cxt, reader)?;
                    rec.insert(r_fieldname, f_decoded)?;
                    seen.insert(r_fieldname.to_string());
                } else {
                    // [3] writer-only field: advance the stream without keeping the value.
                    skip_value(&wf.ty, w_cxt, reader)?;
                }
            }

            // [4], [5]
            for (r_fieldname, reader_field) in reader_fields {
                if seen.contains(r_fieldname) {
                    continue;
                }
                if let Some(default) = &reader_field.default {
                    rec.insert(r_fieldname, default.clone())?;
                } else {
                    return Err(AvrowErr::MissingFieldNoDefault(r_fieldname.clone()));
                }
            }

            return Ok(Value::Record(rec));
        }
        (
            Variant::Enum {
                name: w_name,
                symbols: w_symbols,
                aliases: w_aliases,
                ..
            },
            Variant::Enum {
                name: r_name,
                symbols: r_symbols,
                default: r_default,
                ..
            },
        ) => {
            let names_match = w_name.fullname() == r_name.fullname()
                || w_aliases
                    .as_ref()
                    .map(|a| a.iter().any(|n| *n == r_name.fullname()))
                    .unwrap_or(false);
            if !names_match {
                return Err(AvrowErr::EnumNameMismatch);
            }

            let idx: i32 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            let idx = idx as usize;
            if idx >= w_symbols.len() {
                return Err(AvrowErr::InvalidEnumSymbolIdx(
                    idx,
                    format!("{:?}", w_symbols),
                ));
            }

            let symbol = &w_symbols[idx];
            if r_symbols.contains(symbol) {
                return Ok(Value::Enum(symbol.to_string()));
            }
            if let Some(default) = r_default {
                return Ok(Value::Enum(default.clone()));
            }
            return Err(AvrowErr::EnumSymbolNoDefault(symbol.clone()));
        }
        (
            Variant::Fixed {
                name: w_name,
                size: w_size,
            },
            Variant::Fixed {
                name: r_name,
                size: r_size,
            },
        ) => {
            if w_name.fullname() != r_name.fullname() || w_size != r_size {
                return Err(AvrowErr::FixedSchemaNameMismatch);
            } else {
                let mut fixed = vec![0u8; *r_size];
                reader
                    .read_exact(&mut fixed)
                    .map_err(AvrowErr::DecodeFailed)?;
                Value::Fixed(fixed)
            }
        }
        (
            Variant::Map {
                values: writer_values,
            },
            Variant::Map {
                values: reader_values,
            },
        ) => {
            // here equality will be based
            if writer_values == reader_values {
                let mut hm = HashMap::new();
                loop {
                    let block_count = read_block_count(reader)?;
                    if block_count == 0 {
                        break;
                    }
                    for _ in 0..block_count {
                        let key = decode_string(reader)?;
                        let value = decode(reader_values, reader, r_cxt)?;
                        hm.insert(key, value);
                    }
                }
                Value::Map(hm)
            } else {
                return Err(AvrowErr::MapSchemaMismatch);
            }
        }
        (
            Variant::Union {
                variants: writer_variants,
            },
            Variant::Union {
                variants: reader_variants,
            },
        ) => {
            let union_idx: i32 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            if let Some(writer_schema) = writer_variants.get(union_idx as usize) {
                for i in reader_variants {
                    if i == writer_schema {
                        return decode(i, reader, r_cxt);
                    }
                }
            }

            return Err(AvrowErr::UnionSchemaMismatch);
        }
        /*
         if reader's is a union but writer's is not. The first schema in the reader's union that matches
         the writer's schema is recursively resolved against it. If none match, an error is signalled.
        */
        (
            writer_schema,
            Variant::Union {
                variants: reader_variants,
            },
        ) => {
            for i in reader_variants {
                if match_types(writer_schema, i) {
                    return decode_with_resolution(i, writer_schema, r_cxt, w_cxt, reader);
                }
            }

            return Err(AvrowErr::WriterNotInReader);
        }
        /*
         if writer's schema is a union, but reader's is not.
         If the reader's schema matches the selected writer's schema,
         it is recursively resolved against it. If they do not match, an error is signalled.
        */
        (
            Variant::Union {
                variants: writer_variants,
            },
            reader_schema,
        ) => {
            // Read the index value in the schema
            let union_idx: i32 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            let schema = writer_variants.get(union_idx as usize);
            if let Some(s) = schema {
                if match_types(s, reader_schema) {
                    return decode_with_resolution(reader_schema, s, r_cxt, w_cxt, reader);
                }
            }
            let writer_schema = format!("writer schema: {:?}", writer_variants);
            let reader_schema = format!("reader schema: {:?}", reader_schema);
            return Err(AvrowErr::SchemaResolutionFailed(
                reader_schema,
                writer_schema,
            ));
        }
        other => {
            return Err(AvrowErr::SchemaResolutionFailed(
                format!("{:?}", other.0),
                format!("{:?}", other.1),
            ))
        }
    };

    Ok(value)
}

/// Advances `reader` past a value encoded under `schema` without building a
/// `Value`. Used to skip writer-only record fields during schema resolution;
/// keyed on the writer schema alone, never the reader's.
pub(crate) fn skip_value<R: Read>(schema: &Variant, cxt: &Registry, reader: &mut R) -> Result<(), AvrowErr> {
    match schema {
        Variant::Null => {}
        Variant::Boolean => {
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf).map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Int | Variant::Long => {
            let _: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Float => {
            reader
                .read_f32::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Double => {
            reader
                .read_f64::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Bytes | Variant::Str => {
            let _ = decode_bytes(reader)?;
        }
        Variant::Fixed { size, .. } => {
            let mut buf = vec![0u8; *size];
            reader.read_exact(&mut buf).map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Enum { .. } => {
            let _: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
        }
        Variant::Array { items } => loop {
            let count: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            if count == 0 {
                break;
            }
            let (count, _skip_bytes) = if count < 0 {
                let byte_size: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
                (-count, Some(byte_size))
            } else {
                (count, None)
            };
            for _ in 0..count {
                skip_value(items, cxt, reader)?;
            }
        },
        Variant::Map { values } => loop {
            let count: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            if count == 0 {
                break;
            }
            let count = if count < 0 {
                let _byte_size: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
                -count
            } else {
                count
            };
            for _ in 0..count {
                let _key = decode_string(reader)?;
                skip_value(values, cxt, reader)?;
            }
        },
        Variant::Record { fields, .. } => {
            for field in fields.values() {
                skip_value(&field.ty, cxt, reader)?;
            }
        }
        Variant::Union { variants } => {
            let idx: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            let variant = variants
                .get(idx as usize)
                .ok_or(AvrowErr::UnionSchemaMismatch)?;
            skip_value(variant, cxt, reader)?;
        }
        Variant::Named(name) => {
            let resolved = cxt
                .get(name)
                .ok_or_else(|| AvrowErr::SkipUnknownNamedSchema(name.clone()))?;
            skip_value(resolved, cxt, reader)?;
        }
        Variant::Logical { backing, .. } => {
            skip_value(backing, cxt, reader)?;
        }
    }
    Ok(())
}

pub(crate) fn decode<R: Read>(
    schema: &Variant,
    reader: &mut R,
    r_cxt: &Registry,
) -> Result<Value, AvrowErr> {
    let value = match schema {
        Variant::Logical { params, backing, .. } => {
            let raw = decode(backing, reader, r_cxt)?;
            let key = schema
                .logical_key()
                .expect("Variant::Logical always has a key");
            crate::logical::interpret(&key, &raw, params)?
        }
        Variant::Null => Value::Null,
        Variant::Boolean => {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf)
                .map_err(AvrowErr::DecodeFailed)?;
            match buf {
                [0x00] => Value::Boolean(false),
                [0x01] => Value::Boolean(true),
                _ => {
                    return Err(AvrowErr::DecodeFailed(Error::new(
                        ErrorKind::InvalidData,
                        "Invalid boolean value, expected a 0x00 or a 0x01",
                    )))
                }
            }
        }
        Variant::Int => Value::Int(reader.read_varint().map_err(AvrowErr::DecodeFailed)?),
        Variant::Double => Value::Double(
            reader
                .read_f64::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?,
        ),
        Variant::Long => Value::Long(reader.read_varint().map_err(AvrowErr::DecodeFailed)?),
        Variant::Float => Value::Float(
            reader
                .read_f32::<LittleEndian>()
                .map_err(AvrowErr::DecodeFailed)?,
        ),
        Variant::Str => {
            let buf = decode_bytes(reader)?;
            let s = str::from_utf8(&buf).map_err(|_e| {
                let err = Error::new(
                    ErrorKind::InvalidData,
                    "failed converting from bytes to string",
                );
                AvrowErr::DecodeFailed(err)
            })?;
            Value::Str(s.to_string())
        }
        Variant::Array { items } => {
            let mut it = Vec::new();
            loop {
                let block_count = read_block_count(reader)?;
                if block_count == 0 {
                    break;
                }
                for _ in 0..block_count {
                    let decoded = decode(&**items, reader, r_cxt)?;
                    it.push(decoded);
                }
            }

            Value::Array(it)
        }
        Variant::Bytes => Value::Bytes(decode_bytes(reader)?),
        Variant::Map { values } => {
            let mut hm = HashMap::new();
            loop {
                let block_count = read_block_count(reader)?;
                if block_count == 0 {
                    break;
                }
                for _ in 0..block_count {
                    let key = decode_string(reader)?;
                    let value = decode(values, reader, r_cxt)?;
                    hm.insert(key, value);
                }
            }

            Value::Map(hm)
        }
        Variant::Record { name, fields, .. } => {
            let mut v = IndexMap::with_capacity(fields.len());
            for (field_name, field) in fields {
                let field_name = field_name.to_string();
                let field_value = decode(&field.ty, reader, r_cxt)?;
                let field_value = FieldValue::new(field_value);
                v.insert(field_name, field_value);
            }

            let rec = Record {
                name: name.fullname(),
                fields: v,
            };
            Value::Record(rec)
        }
        Variant::Union { variants } => {
            let variant_idx: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            decode(&variants[variant_idx as usize], reader, r_cxt)?
        }
        Variant::Named(schema_name) => {
            let schema_variant = r_cxt
                .get(schema_name)
                .ok_or(AvrowErr::NamedSchemaNotFound)?;
            decode(schema_variant, reader, r_cxt)?
        }
        Variant::Fixed { size, .. } => {
            let mut buf = vec![0u8; *size];
            reader.read_exact(&mut buf).map_err(AvrowErr::DecodeFailed)?;
            Value::Fixed(buf)
        }
        Variant::Enum { symbols, .. } => {
            let idx: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
            let idx = idx as usize;
            let symbol = symbols.get(idx).ok_or_else(|| {
                AvrowErr::InvalidEnumSymbolIdx(idx, format!("{:?}", symbols))
            })?;
            Value::Enum(symbol.to_string())
        }
        a => {
            return Err(AvrowErr::DecodeFailed(Error::new(
                ErrorKind::InvalidData,
                format!("Read failed for schema {:?}", a),
            )))
        }
    };

    Ok(value)
}

/// Header represents the avro datafile header.
#[derive(Debug)]
pub struct Header {
    /// Writer's schema
    pub(crate) schema: Schema,
    /// A Map which stores avro metadata, like `avro.codec` and `avro.schema`.
    /// Additional key values can be added through the
    /// [WriterBuilder](struct.WriterBuilder.html)'s `set_metadata` method.
    pub(crate) metadata: HashMap<String, Vec<u8>>,
    /// A unique 16 byte sequence for file integrity when writing avro data to file.
    pub(crate) sync_marker: [u8; 16],
    /// codec parsed from the datafile
    pub(crate) codec: Codec,
}

fn decode_header_map<R>(reader: &mut R) -> Result<HashMap<String, Vec<u8>>, AvrowErr>
where
    R: Read,
{
    let count: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;
    let count = count as usize;
    let mut map = HashMap::with_capacity(count);

    for _ in 0..count {
        let key = decode_string(reader)?;
        let val = decode_bytes(reader)?;
        map.insert(key, val);
    }

    let _map_end: i64 = reader.read_varint().map_err(AvrowErr::DecodeFailed)?;

    Ok(map)
}

impl Header {
    /// Reads the header from an avro datafile
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, AvrowErr> {
        let mut magic_buf = [0u8; 4];
        reader
            .read_exact(&mut magic_buf[..])
            .map_err(|_| AvrowErr::HeaderDecodeFailed)?;

        if &magic_buf != b"Obj\x01" {
            return Err(AvrowErr::InvalidDataFile);
        }

        let map = decode_header_map(reader)?;

        let mut sync_marker = [0u8; 16];
        let _ = reader
            .read_exact(&mut sync_marker)
            .map_err(|_| AvrowErr::HeaderDecodeFailed)?;

        let schema_bytes = map.get("avro.schema").ok_or(AvrowErr::HeaderDecodeFailed)?;

        let schema = str::from_utf8(schema_bytes)
            .map(Schema::from_str)
            .map_err(|_| AvrowErr::HeaderDecodeFailed)??;

        let codec = if let Some(c) = map.get("avro.codec") {
            match std::str::from_utf8(c) {
                Ok(s) => Codec::try_from(s)?,
                Err(s) => return Err(AvrowErr::UnsupportedCodec(s.to_string())),
            }
        } else {
            Codec::Null
        };

        let header = Header {
            schema,
            metadata: map,
            sync_marker,
            codec,
        };

        Ok(header)
    }

    /// Returns a reference to metadata from avro datafile header
    pub fn metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.metadata
    }

    /// Returns a reference to the writer's schema in this header
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// A single block read from an avro datafile by a [`BlockReader`].
///
/// Unlike [`Reader`], which hands back one decoded record at a time,
/// `Block` exposes the block's metadata and still-compressed payload so it
/// can be relayed to another file untouched via
/// [`Writer::append_raw_block`](crate::Writer::append_raw_block).
#[derive(Debug)]
pub struct Block {
    /// Number of records encoded in this block.
    pub num_records: usize,
    /// Codec this block's payload is compressed with.
    pub codec: Codec,
    /// Byte offset of this block's `long(record_count)` prefix in the stream.
    pub offset: u64,
    /// Total size in bytes of this block as framed on disk, record count
    /// prefix through sync marker inclusive.
    pub size: u64,
    payload: Vec<u8>,
}

impl Block {
    /// Lazily decodes this block's records against `schema`.
    pub fn records<'b>(&'b self, schema: &'b Schema) -> BlockRecords<'b> {
        BlockRecords {
            cursor: Cursor::new(&self.payload),
            remaining: self.num_records as u64,
            schema,
        }
    }

    /// The still-compressed payload bytes for this block, suitable for
    /// passing straight to [`Writer::append_raw_block`](crate::Writer::append_raw_block).
    pub fn compressed_payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Lazy iterator over the records within a single [`Block`].
pub struct BlockRecords<'b> {
    cursor: Cursor<&'b [u8]>,
    remaining: u64,
    schema: &'b Schema,
}

impl<'b> Iterator for BlockRecords<'b> {
    type Item = Result<Value, AvrowErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(decode(self.schema.variant(), &mut self.cursor, &self.schema.cxt))
    }
}

/// Reads an avro datafile block-by-block rather than record-by-record.
///
/// This is the counterpart to [`Reader`] for callers that want to inspect
/// or relay whole blocks, for example to concatenate two datafiles sharing
/// a schema without re-encoding every record.
pub struct BlockReader<R> {
    source: CountingReader<R>,
    header: Header,
}

impl<R: Read> BlockReader<R> {
    /// Creates a block reader over an avro datafile.
    pub fn new(avro_source: R) -> Result<Self, AvrowErr> {
        let mut source = CountingReader {
            inner: avro_source,
            count: 0,
        };
        let header = Header::from_reader(&mut source)?;
        Ok(BlockReader { source, header })
    }

    /// The writer schema recovered from this file's header.
    pub fn writer_schema(&self) -> &Schema {
        self.header.schema()
    }

    /// Retrieves a reference to the header metadata map.
    pub fn meta(&self) -> &HashMap<String, Vec<u8>> {
        self.header.metadata()
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<Block, AvrowErr>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.source.count;

        let num_records: i64 = match self.source.read_varint() {
            Ok(n) => n,
            Err(e) => {
                return if e.kind() == ErrorKind::UnexpectedEof {
                    None
                } else {
                    Some(Err(AvrowErr::DecodeFailed(e)))
                }
            }
        };

        let block_len: i64 = match self.source.read_varint() {
            Ok(n) => n,
            Err(e) => return Some(Err(AvrowErr::DecodeFailed(e))),
        };

        let mut payload = vec![0u8; block_len as usize];
        if let Err(e) = self.source.read_exact(&mut payload) {
            return Some(Err(AvrowErr::DecodeFailed(e)));
        }

        let mut sync = [0u8; 16];
        if let Err(e) = self.source.read_exact(&mut sync) {
            return Some(Err(AvrowErr::DecodeFailed(e)));
        }
        if sync != self.header.sync_marker {
            return Some(Err(AvrowErr::SyncMarkerMismatch));
        }

        let size = self.source.count - offset;
        Some(Ok(Block {
            num_records: num_records as usize,
            codec: self.header.codec,
            offset,
            size,
            payload,
        }))
    }
}
