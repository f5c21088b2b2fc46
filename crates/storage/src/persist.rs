//! On-disk snapshot format (`SPEC_FULL.md` §6, "Persistence layout").
//!
//! A single file: a human-readable header (entry count, collection table),
//! a blank line, then a flat binary sequence of
//! `(collection, key, length, bytes)` records. Modeled on the teacher's
//! `format::manifest` convention of a small text/binary hybrid rather than
//! a single all-binary layout, which keeps the collection table diffable
//! in a text editor while the bulk records stay compact.

use std::io::{self, BufRead, BufReader, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ukv_core::{CollectionId, Error, Key, Result};

use crate::collections::CollectionTable;
use crate::engine::Engine;

/// Write the full committed state of `engine` to `writer` in the
/// persistence format.
pub fn save<W: Write>(engine: &Engine, writer: &mut W) -> Result<()> {
    let entries = engine.iter_live();
    let collections = engine.list_collections();

    writeln!(writer, "{}", entries.len()).map_err(io_err)?;
    writeln!(writer, "{}", collections.len()).map_err(io_err)?;
    for (name, id) in &collections {
        writeln!(writer, "-{}: {}", name, id.to_hex()).map_err(io_err)?;
    }
    writeln!(writer).map_err(io_err)?;

    for (collection, key, value) in &entries {
        writer.write_u64::<LittleEndian>(collection.0).map_err(io_err)?;
        writer.write_i64::<LittleEndian>(*key).map_err(io_err)?;
        writer.write_u32::<LittleEndian>(value.len() as u32).map_err(io_err)?;
        writer.write_all(value).map_err(io_err)?;
    }
    Ok(())
}

/// Parsed header, plus the byte offset at which the reader should resume
/// for the binary record sequence. Exposed so `load` can seed the
/// engine's [`CollectionTable`] before replaying any records.
struct Header {
    entry_count: usize,
    collections: Vec<(String, CollectionId)>,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut line = String::new();
    reader.read_line(&mut line).map_err(io_err)?;
    let entry_count: usize = line
        .trim()
        .parse()
        .map_err(|_| Error::ArgumentWrong("malformed persistence header: entry count".into()))?;

    line.clear();
    reader.read_line(&mut line).map_err(io_err)?;
    let collection_count: usize = line
        .trim()
        .parse()
        .map_err(|_| Error::ArgumentWrong("malformed persistence header: collection count".into()))?;

    let mut collections = Vec::with_capacity(collection_count);
    for _ in 0..collection_count {
        line.clear();
        reader.read_line(&mut line).map_err(io_err)?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        let body = trimmed
            .strip_prefix('-')
            .ok_or_else(|| Error::ArgumentWrong(format!("malformed collection header line: {trimmed:?}")))?;
        let (name, handle) = body
            .split_once(": ")
            .ok_or_else(|| Error::ArgumentWrong(format!("malformed collection header line: {trimmed:?}")))?;
        let handle = handle
            .strip_prefix("0x")
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .ok_or_else(|| Error::ArgumentWrong(format!("malformed collection handle: {handle:?}")))?;
        collections.push((name.to_string(), CollectionId(handle)));
    }

    line.clear();
    reader.read_line(&mut line).map_err(io_err)?;
    if !line.trim().is_empty() {
        return Err(Error::ArgumentWrong("persistence header missing blank-line terminator".into()));
    }

    Ok(Header { entry_count, collections })
}

/// Read a persistence file into a fresh [`Engine`].
pub fn load<R: Read>(reader: R, shard_count: usize) -> Result<Engine> {
    let mut reader = BufReader::new(reader);
    let header = parse_header(&mut reader)?;

    let engine = Engine::with_shard_count(shard_count);
    {
        let mut table = engine.collections_for_persistence();
        seed_collections(&mut table, &header.collections);
    }

    let mut batch = Vec::with_capacity(header.entry_count);
    for _ in 0..header.entry_count {
        let collection = CollectionId(reader.read_u64::<LittleEndian>().map_err(io_err)?);
        let key: Key = reader.read_i64::<LittleEndian>().map_err(io_err)?;
        let length = reader.read_u32::<LittleEndian>().map_err(io_err)? as usize;
        let mut bytes = vec![0u8; length];
        reader.read_exact(&mut bytes).map_err(io_err)?;
        batch.push((collection, key, ukv_core::WriteValue::Value(bytes)));
    }
    engine.write_batch(&batch);
    Ok(engine)
}

fn seed_collections(table: &mut CollectionTable, collections: &[(String, CollectionId)]) {
    for (name, id) in collections {
        table.seed(name.clone(), *id);
    }
}

fn io_err(e: io::Error) -> Error {
    Error::ArgumentWrong(format!("persistence I/O error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ukv_core::{WriteValue, MAIN_COLLECTION};

    #[test]
    fn round_trips_entries_and_collections() {
        let engine = Engine::new();
        let orders = engine.open_collection("orders").unwrap();
        engine.write_batch(&[
            (MAIN_COLLECTION, 42, WriteValue::Value(vec![0xDE, 0xAD, 0xBE, 0xEF])),
            (orders, 1, WriteValue::Value(vec![])),
        ]);

        let mut buffer = Vec::new();
        save(&engine, &mut buffer).unwrap();

        let reloaded = load(&buffer[..], 8).unwrap();
        assert_eq!(
            reloaded.read_one(MAIN_COLLECTION, 42, None).unwrap().as_blob().unwrap(),
            &[0xDE, 0xAD, 0xBE, 0xEF]
        );
        let reloaded_orders = reloaded.open_collection("orders").unwrap();
        assert_eq!(reloaded_orders, orders);
        assert_eq!(reloaded.read_one(orders, 1, None).unwrap().as_blob().unwrap(), &[] as &[u8]);
    }

    #[test]
    fn empty_database_round_trips() {
        let engine = Engine::new();
        let mut buffer = Vec::new();
        save(&engine, &mut buffer).unwrap();
        let reloaded = load(&buffer[..], 8).unwrap();
        assert!(reloaded.read_one(MAIN_COLLECTION, 1, None).is_none());
    }
}
