//! Edge-list exporters.
//!
//! Each rank writes its own `graph.<rank>.dot` / `graph.<rank>.bin` file
//! in block-decomposed order; concatenating the files in rank order gives
//! the full graph. Only the `src < dst` direction of every undirected
//! edge is written.

use crate::error::GcError;
use crate::graph::Edge;
use crate::util::io::GcWriter;
use gc_comm::distribute::distribute_inplace;
use gc_comm::Comm;

pub fn write_edge_list_dot_format(
    edge_list: &mut Vec<Edge>,
    output_path: &str,
    comm: &Comm,
) -> Result<(), GcError> {
    distribute_inplace(edge_list, comm);

    let file_name = format!("{}/graph.{}.dot", output_path, comm.rank());
    let mut writer = GcWriter::new(file_name)?;

    if comm.rank() == 0 {
        writer.write_file_line("graph G {")?;
    }
    writer.write_file_lines(
        edge_list
            .iter()
            .filter(|edge| edge.0 < edge.1)
            .map(|edge| format!("{} -- {};", edge.0, edge.1)),
    )?;
    if comm.is_last() {
        writer.write_file_line("}")?;
    }
    Ok(())
}

pub fn write_edge_list_binary_format(
    edge_list: &mut Vec<Edge>,
    output_path: &str,
    comm: &Comm,
) -> Result<(), GcError> {
    distribute_inplace(edge_list, comm);

    let file_name = format!("{}/graph.{}.bin", output_path, comm.rank());
    let mut writer = GcWriter::new(file_name)?;

    for edge in edge_list.iter().filter(|edge| edge.0 < edge.1) {
        writer.write_bytes(&(edge.0 as u64).to_le_bytes())?;
        writer.write_bytes(&(edge.1 as u64).to_le_bytes())?;
    }
    Ok(())
}

/// Gathers the complete edge list on rank 0 and writes it as a single
/// text file, one `src dst` pair per line. Slow since it serializes
/// through one rank; meant for small graphs and debugging.
pub fn write_edge_list_single_file(
    edge_list: &[Edge],
    out_file: &str,
    comm: &Comm,
) -> Result<(), GcError> {
    let gathered = comm.gatherv(edge_list, 0);
    if let Some(full_edge_list) = gathered {
        let mut writer = GcWriter::new(out_file.to_string())?;
        writer.write_file_lines(
            full_edge_list.iter().map(|edge| format!("{} {}", edge.0, edge.1)),
        )?;
    }
    Ok(())
}
