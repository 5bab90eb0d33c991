use std::io::{self, BufWriter, Write};

use crate::Edge;

/// Buffered line-oriented sink for generated edges.
///
/// Each edge becomes one `src<TAB>dst` line with no header or trailer.
pub struct EdgeWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> EdgeWriter<W> {
    pub fn new(out: W) -> Self {
        EdgeWriter {
            out: BufWriter::new(out),
        }
    }

    /// Append a batch without forcing it to the underlying sink.
    pub fn write_batch(&mut self, edges: &[Edge]) -> io::Result<()> {
        for edge in edges {
            writeln!(self.out, "{edge}")?;
        }
        Ok(())
    }

    /// Append a batch and flush it through.
    pub fn write_batch_flushed(&mut self, edges: &[Edge]) -> io::Result<()> {
        self.write_batch(edges)?;
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Hand back the underlying sink, flushing buffered lines first.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_line_format() {
        let mut writer = EdgeWriter::new(Vec::new());
        writer
            .write_batch(&[Edge::new(0, 3), Edge::new(12, 7)])
            .unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes, b"0\t3\n12\t7\n");
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let mut writer = EdgeWriter::new(Vec::new());
        writer.write_batch(&[]).unwrap();
        assert!(writer.into_inner().unwrap().is_empty());
    }
}
