//! Parallel reader for plain text edge lists.
//!
//! ASCII, one edge per line, two whitespace-separated integer ids. Lines
//! starting with `%` are comments and precede the data. The file's byte
//! range is block-decomposed across ranks; a line is parsed by the rank
//! whose range contains its first byte, so ranks after the first skip
//! their leading partial line and every rank may read past its range end
//! to finish the line it started.

use crate::error::{input_format_error, io_error, GcError};
use crate::graph::Edge;
use gc_comm::distribute::BlockPartition;
use gc_comm::Comm;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

pub fn populate_edge_list(
    edge_list: &mut Vec<Edge>,
    file_path: &str,
    add_reverse: bool,
    comm: &Comm,
) -> Result<(), GcError> {
    let file_len = std::fs::metadata(file_path)
        .map_err(|e| io_error(format!("Could not stat '{}': {}", file_path, e)))?
        .len() as usize;
    let part = BlockPartition::new(file_len, comm.size());
    let range_begin = part.prefix(comm.rank());
    let range_end = range_begin + part.local_size(comm.rank());

    let file = File::open(file_path)
        .map_err(|e| io_error(format!("Could not open '{}' for reading: {}", file_path, e)))?;
    let mut reader = BufReader::new(file);

    let mut position = range_begin;
    if comm.rank() > 0 && range_begin > 0 {
        // Start one byte early: if that byte is a newline the skipped
        // "line" is empty and this range begins on a record boundary;
        // otherwise the partial record belongs to the previous rank.
        reader
            .seek(SeekFrom::Start(range_begin as u64 - 1))
            .map_err(|e| io_error(format!("Could not seek in '{}': {}", file_path, e)))?;
        let mut skipped = String::new();
        let read = reader
            .read_line(&mut skipped)
            .map_err(|e| io_error(format!("Could not read '{}': {}", file_path, e)))?;
        position = range_begin - 1 + read;
    }

    let mut line = String::new();
    while position < range_end {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| io_error(format!("Could not read '{}': {}", file_path, e)))?;
        if read == 0 {
            break;
        }
        position += read;
        parse_line_for_edge(&line, add_reverse, edge_list)?;
    }

    if comm.rank() == 0 {
        info!("Edge list file '{}' loaded", file_path);
    }
    Ok(())
}

fn parse_line_for_edge(
    line: &str,
    add_reverse: bool,
    edge_list: &mut Vec<Edge>,
) -> Result<(), GcError> {
    let record = line.trim();
    if record.is_empty() || record.starts_with('%') {
        return Ok(());
    }
    let mut fields = record.split_whitespace();
    let src = parse_vertex(fields.next(), record)?;
    let dst = parse_vertex(fields.next(), record)?;
    if fields.next().is_some() {
        return Err(input_format_error(format!("Edge line has extra fields: '{}'", record)));
    }
    edge_list.push((src, dst));
    if add_reverse {
        edge_list.push((dst, src));
    }
    Ok(())
}

fn parse_vertex(field: Option<&str>, record: &str) -> Result<i64, GcError> {
    field
        .ok_or_else(|| input_format_error(format!("Edge line has too few fields: '{}'", record)))?
        .parse::<i64>()
        .map_err(|e| input_format_error(format!("Bad vertex id in '{}': {}", record, e)))
}
