//! de Bruijn graph construction over FASTQ sequencing reads.
//!
//! Vertices are canonical 31-mers over the DNA alphabet `{A, C, G, T}`,
//! packed two bits per base into a `u64`; the canonical form of a kmer is
//! the lexicographically smaller of the kmer and its reverse complement.
//! Every pair of consecutive kmers in a read contributes one undirected
//! edge, emitted in both directions. Records are dealt round-robin to
//! ranks, which spreads the work without any cross-rank byte alignment.

use crate::error::{input_format_error, io_error, GcError};
use crate::graph::Edge;
use crate::util::io::get_buf_reader;
use gc_comm::Comm;
use log::info;
use std::io::BufRead;

pub const KMER_LENGTH: usize = 31;

pub fn populate_edge_list(
    edge_list: &mut Vec<Edge>,
    file_path: &str,
    comm: &Comm,
) -> Result<(), GcError> {
    let reader = get_buf_reader(file_path)?;
    let mut record_index = 0_usize;
    let mut line_in_record = 0_u8;

    for line in reader.lines() {
        let line =
            line.map_err(|e| io_error(format!("Could not read '{}': {}", file_path, e)))?;
        if line_in_record == 0 && !line.starts_with('@') {
            return Err(input_format_error(format!(
                "FASTQ record {} does not start with '@': '{}'",
                record_index, line
            )));
        }
        if line_in_record == 1 && record_index % comm.size() == comm.rank() {
            sequence_to_edges(&line, edge_list);
        }
        line_in_record += 1;
        if line_in_record == 4 {
            line_in_record = 0;
            record_index += 1;
        }
    }
    if line_in_record != 0 {
        return Err(input_format_error(format!(
            "FASTQ file '{}' ends mid-record",
            file_path
        )));
    }

    if comm.rank() == 0 {
        info!("de Bruijn graph built from '{}': {} reads", file_path, record_index);
    }
    Ok(())
}

/// Slides a 31-base window over the read, restarting after any base
/// outside `{A, C, G, T}`, and links consecutive canonical kmers.
fn sequence_to_edges(sequence: &str, edge_list: &mut Vec<Edge>) {
    const MASK: u64 = (1 << (2 * KMER_LENGTH)) - 1;

    let mut kmer = 0_u64;
    let mut bases_in_window = 0_usize;
    let mut previous: Option<i64> = None;

    for base in sequence.bytes() {
        let code = match base {
            b'A' | b'a' => 0_u64,
            b'C' | b'c' => 1,
            b'G' | b'g' => 2,
            b'T' | b't' => 3,
            _ => {
                bases_in_window = 0;
                previous = None;
                continue;
            }
        };
        kmer = ((kmer << 2) | code) & MASK;
        bases_in_window += 1;
        if bases_in_window < KMER_LENGTH {
            continue;
        }

        let node = canonical(kmer) as i64;
        if let Some(previous_node) = previous {
            edge_list.push((previous_node, node));
            edge_list.push((node, previous_node));
        }
        previous = Some(node);
    }
}

/// Lexicographically smaller of the kmer and its reverse complement.
pub fn canonical(kmer: u64) -> u64 {
    kmer.min(reverse_complement(kmer))
}

fn reverse_complement(kmer: u64) -> u64 {
    let mut forward = kmer;
    let mut reversed = 0_u64;
    for _ in 0..KMER_LENGTH {
        // Complement is the bitwise negation of the 2-bit code.
        reversed = (reversed << 2) | (!forward & 3);
        forward >>= 2;
    }
    reversed
}

#[cfg(test)]
mod tests {
    use super::{canonical, populate_edge_list, reverse_complement, KMER_LENGTH};
    use gc_comm::execute;
    use std::io::Write;

    fn pack(bases: &str) -> u64 {
        bases.bytes().fold(0, |acc, base| {
            (acc << 2)
                | match base {
                    b'A' => 0,
                    b'C' => 1,
                    b'G' => 2,
                    b'T' => 3,
                    _ => panic!("bad base"),
                }
        })
    }

    #[test]
    fn reverse_complement_involutes() {
        let kmer = pack(&"ACGTACGTACGTACGTACGTACGTACGTACG"[..KMER_LENGTH]);
        assert_eq!(reverse_complement(reverse_complement(kmer)), kmer);
        assert_eq!(canonical(kmer), canonical(reverse_complement(kmer)));
    }

    #[test]
    fn all_a_complements_to_all_t() {
        let all_a = pack(&"A".repeat(KMER_LENGTH));
        let all_t = pack(&"T".repeat(KMER_LENGTH));
        assert_eq!(reverse_complement(all_a), all_t);
        assert_eq!(canonical(all_t), all_a);
    }

    #[test]
    fn read_of_33_bases_gives_two_links() {
        let sequence = format!("{}GT", "A".repeat(KMER_LENGTH));
        let contents = format!("@read0\n{}\n+\n{}\n", sequence, "I".repeat(sequence.len()));
        let path = std::env::temp_dir().join("gc_debruijn_small.fastq");
        std::fs::File::create(&path)
            .expect("temp file")
            .write_all(contents.as_bytes())
            .expect("write");
        let path = path.to_str().expect("utf8").to_string();

        let results = execute(1, move |comm| {
            let mut edges = Vec::new();
            populate_edge_list(&mut edges, &path, comm).expect("parse");
            edges
        });
        // 3 kmers -> 2 undirected links -> 4 directed edges.
        assert_eq!(results[0].len(), 4);
        assert_eq!(results[0][0].0, results[0][1].1);
        assert_eq!(results[0][0].1, results[0][1].0);
    }

    #[test]
    fn records_are_dealt_across_ranks() {
        let read = |tag: char| {
            let sequence = format!("{}{}", tag, "ACGT".repeat(8));
            format!("@r{}\n{}\n+\n{}\n", tag, sequence, "I".repeat(sequence.len()))
        };
        let contents = format!("{}{}{}", read('A'), read('C'), read('G'));
        let path = std::env::temp_dir().join("gc_debruijn_deal.fastq");
        std::fs::File::create(&path)
            .expect("temp file")
            .write_all(contents.as_bytes())
            .expect("write");
        let path = path.to_str().expect("utf8").to_string();

        let per_rank = execute(3, {
            let path = path.clone();
            move |comm| {
                let mut edges = Vec::new();
                populate_edge_list(&mut edges, &path, comm).expect("parse");
                edges.len()
            }
        });
        let single = execute(1, move |comm| {
            let mut edges = Vec::new();
            populate_edge_list(&mut edges, &path, comm).expect("parse");
            edges.len()
        });
        // Every rank got exactly one read; nothing lost or duplicated.
        assert!(per_rank.iter().all(|&n| n > 0));
        assert_eq!(per_rank.iter().sum::<usize>(), single[0]);
    }
}
