use crate::error::{io_error, GcError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

pub fn get_buf_reader(file_path: &str) -> Result<BufReader<File>, GcError> {
    Ok(BufReader::new(File::open(file_path).map_err(|e| {
        io_error(format!("Could not open file '{}' for reading: {}", file_path, e))
    })?))
}

/// Buffered writer for the per-rank export files. Text exports go line
/// by line, the binary export as raw bytes.
pub struct GcWriter {
    buf_writer: BufWriter<File>,
    file_path: String,
}

impl GcWriter {
    pub fn new(file_path: String) -> Result<Self, GcError> {
        let buf_writer = BufWriter::new(File::create(&file_path).map_err(|e| {
            io_error(format!("Could not create file '{}' for writing: {}", file_path, e))
        })?);
        Ok(Self { buf_writer, file_path })
    }

    #[inline]
    pub fn write_file_lines(
        &mut self,
        lines: impl Iterator<Item = String>,
    ) -> Result<(), GcError> {
        for line in lines {
            self.write_file_line(&line)?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_file_line(&mut self, line: &str) -> Result<(), GcError> {
        self.write_bytes(line.as_bytes())?;
        self.write_bytes(b"\n")
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), GcError> {
        self.buf_writer
            .write_all(bytes)
            .map_err(|e| io_error(format!("Could not write to '{}': {}", self.file_path, e)))
    }
}
