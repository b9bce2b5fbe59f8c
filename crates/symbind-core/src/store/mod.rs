//! # Symbol Store
//!
//! Decoder for the compressed symbol dump produced by the clang indexer.
//!
//! ## File Layout
//!
//! ```text
//! u32 uncompressed_size
//! zlib stream
//!   u64 count, count * filename   (u16 len + UTF-8)
//!   u64 count, count * token      (u64 key, string)
//!   u64 count, count * type node  (i64 key, i64 hash, u64 n + n * i64 child,
//!                                  i64 token, i32 kind, u8 is_const)
//!   u64 count, count * declaration (i64 key, i64 compiling_file, i64 parent,
//!                                  i64 referenced, i32 kind, i32 flags,
//!                                  i64 type, i64 token, u32 line, u32 column,
//!                                  u32 start, u32 end, i64 source_file)
//! ```
//!
//! All integers are little-endian. Index fields use `-1` for null.
//!
//! The encoder half exists so tools and tests can produce dumps that the
//! decoder reads back field for field.

mod reader;
mod writer;

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use self::reader::ByteReader;
use self::writer::ByteWriter;
use crate::error::{LoadError, LoadResult};
use crate::types::records::{DeclarationRecord, SymbolTables, Token, TypeRecord};

const MIN_FILENAME_SIZE: usize = 2;
const MIN_TOKEN_SIZE: usize = 8 + 2;
const MIN_TYPE_SIZE: usize = 8 + 8 + 8 + 8 + 4 + 1;
const MIN_DECLARATION_SIZE: usize = 8 * 6 + 4 * 6;

/// Read and decode a dump from disk
///
/// A missing file is reported as [`LoadError::NotFound`] so callers can
/// treat it as "no symbol data" rather than corruption.
pub fn load(path: &Path) -> LoadResult<SymbolTables>
{
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    debug!("Read {} bytes of symbol data from {}", bytes.len(), path.display());
    decode(&bytes)
}

/// Decode a complete dump: size prefix, zlib stream and the four tables
pub fn decode(bytes: &[u8]) -> LoadResult<SymbolTables>
{
    let mut header = ByteReader::new(bytes);
    let expected = header.read_u32()?;
    let payload = decompress(&bytes[4..], expected)?;
    decode_payload(&payload)
}

fn decompress(stream: &[u8], expected: u32) -> LoadResult<Vec<u8>>
{
    let expected = u64::from(expected);
    let mut payload = Vec::with_capacity(usize::try_from(expected.min(1 << 26)).unwrap_or(0));
    // Read one byte past the announced size so an oversized stream is noticed
    ZlibDecoder::new(stream)
        .take(expected + 1)
        .read_to_end(&mut payload)
        .map_err(LoadError::Decompress)?;
    let actual = payload.len() as u64;
    if actual != expected {
        return Err(LoadError::SizeMismatch { expected, actual });
    }
    Ok(payload)
}

/// Decode the four tables from an already decompressed payload
pub fn decode_payload(payload: &[u8]) -> LoadResult<SymbolTables>
{
    let mut reader = ByteReader::new(payload);

    reader.enter("filenames");
    let count = reader.read_count(MIN_FILENAME_SIZE)?;
    let mut filenames = Vec::with_capacity(count);
    for _ in 0..count {
        filenames.push(reader.read_string()?);
    }

    reader.enter("tokens");
    let count = reader.read_count(MIN_TOKEN_SIZE)?;
    let mut tokens = Vec::with_capacity(count);
    for _ in 0..count {
        let key = reader.read_u64()?;
        let text = reader.read_string()?;
        tokens.push(Token { key, text });
    }

    reader.enter("types");
    let count = reader.read_count(MIN_TYPE_SIZE)?;
    let mut types = Vec::with_capacity(count);
    for _ in 0..count {
        types.push(read_type(&mut reader)?);
    }

    reader.enter("declarations");
    let count = reader.read_count(MIN_DECLARATION_SIZE)?;
    let mut declarations = Vec::with_capacity(count);
    for _ in 0..count {
        declarations.push(read_declaration(&mut reader)?);
    }

    if reader.remaining() > 0 {
        warn!(
            "Ignoring {} trailing bytes after declaration table at offset {}",
            reader.remaining(),
            reader.position()
        );
    }

    debug!(
        "Decoded {} files, {} tokens, {} types, {} declarations",
        filenames.len(),
        tokens.len(),
        types.len(),
        declarations.len()
    );

    Ok(SymbolTables {
        filenames,
        tokens,
        types,
        declarations,
    })
}

fn read_type(reader: &mut ByteReader<'_>) -> LoadResult<TypeRecord>
{
    let key = reader.read_i64()?;
    let hash = reader.read_i64()?;
    let child_count = reader.read_count(8)?;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(reader.read_i64()?);
    }
    let token = reader.read_i64()?;
    let kind = reader.read_i32()?;
    let is_const = reader.read_u8()? != 0;
    Ok(TypeRecord {
        key,
        hash,
        children,
        token,
        kind,
        is_const,
    })
}

fn read_declaration(reader: &mut ByteReader<'_>) -> LoadResult<DeclarationRecord>
{
    Ok(DeclarationRecord {
        key: reader.read_i64()?,
        compiling_file: reader.read_i64()?,
        parent: reader.read_i64()?,
        referenced: reader.read_i64()?,
        kind: reader.read_i32()?,
        flags: reader.read_i32()?,
        type_index: reader.read_i64()?,
        token: reader.read_i64()?,
        line: reader.read_u32()?,
        column: reader.read_u32()?,
        start_offset: reader.read_u32()?,
        end_offset: reader.read_u32()?,
        source_file: reader.read_i64()?,
    })
}

/// Serialize the four tables without the size prefix or compression
pub fn encode_payload(tables: &SymbolTables) -> LoadResult<Vec<u8>>
{
    let mut out = ByteWriter::default();

    out.write_count(tables.filenames.len());
    for name in &tables.filenames {
        out.write_string(name)?;
    }

    out.write_count(tables.tokens.len());
    for token in &tables.tokens {
        out.write_u64(token.key);
        out.write_string(&token.text)?;
    }

    out.write_count(tables.types.len());
    for ty in &tables.types {
        out.write_i64(ty.key);
        out.write_i64(ty.hash);
        out.write_count(ty.children.len());
        for child in &ty.children {
            out.write_i64(*child);
        }
        out.write_i64(ty.token);
        out.write_i32(ty.kind);
        out.write_u8(u8::from(ty.is_const));
    }

    out.write_count(tables.declarations.len());
    for decl in &tables.declarations {
        out.write_i64(decl.key);
        out.write_i64(decl.compiling_file);
        out.write_i64(decl.parent);
        out.write_i64(decl.referenced);
        out.write_i32(decl.kind);
        out.write_i32(decl.flags);
        out.write_i64(decl.type_index);
        out.write_i64(decl.token);
        out.write_u32(decl.line);
        out.write_u32(decl.column);
        out.write_u32(decl.start_offset);
        out.write_u32(decl.end_offset);
        out.write_i64(decl.source_file);
    }

    Ok(out.into_inner())
}

/// Serialize and compress into the on-disk dump format
pub fn encode(tables: &SymbolTables) -> LoadResult<Vec<u8>>
{
    let payload = encode_payload(tables)?;
    let size = u32::try_from(payload.len()).map_err(|_| LoadError::PayloadTooLarge { len: payload.len() })?;

    let mut out = Vec::with_capacity(payload.len() / 2 + 4);
    out.extend_from_slice(&size.to_le_bytes());
    let mut encoder = ZlibEncoder::new(out, Compression::default());
    encoder.write_all(&payload).map_err(LoadError::Compress)?;
    encoder.finish().map_err(LoadError::Compress)
}

/// Encode and write a dump to disk
pub fn write(path: &Path, tables: &SymbolTables) -> LoadResult<()>
{
    let bytes = encode(tables)?;
    fs::write(path, bytes).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_empty_tables_decode()
    {
        let bytes = encode(&SymbolTables::default()).unwrap();
        let tables = decode(&bytes).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_size_prefix_must_match()
    {
        let mut bytes = encode(&SymbolTables::default()).unwrap();
        bytes[0] = bytes[0].wrapping_add(1);
        assert!(matches!(decode(&bytes), Err(LoadError::SizeMismatch { .. })));
    }

    #[test]
    fn test_short_header_is_truncated()
    {
        assert!(matches!(decode(&[0x01, 0x00]), Err(LoadError::Truncated { .. })));
    }

    #[test]
    fn test_corrupt_stream_fails_to_decompress()
    {
        let bytes = [0x10, 0x00, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef];
        assert!(matches!(decode(&bytes), Err(LoadError::Decompress(_))));
    }

    #[test]
    fn test_overlong_string_is_rejected_on_encode()
    {
        let tables = SymbolTables {
            filenames: vec!["x".repeat(70_000)],
            ..SymbolTables::default()
        };
        assert!(matches!(encode(&tables), Err(LoadError::StringTooLong { len: 70_000 })));
    }
}
