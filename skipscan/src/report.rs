use std::io::Write;

use crate::errors::ScanResult;
use crate::results::{Match, MatchSink};

/// Marker written after every preview, whether or not it was cut short
const TRUNCATION_MARKER: &[u8] = b"...\n";

/// Writes matches in the line-oriented report format: an `O:<offset>`
/// line, the raw preview bytes, then a truncation marker.
///
/// Preview bytes are written verbatim, so the output is only as
/// text-safe as the scanned data.
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_match(&mut self, matched: &Match) -> std::io::Result<()> {
        writeln!(self.out, "O:{}", matched.offset)?;
        self.out.write_all(&matched.preview)?;
        self.out.write_all(TRUNCATION_MARKER)?;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MatchSink for ReportWriter<W> {
    fn on_match(&mut self, matched: &Match) -> ScanResult<()> {
        self.write_match(matched)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format() {
        let mut writer = ReportWriter::new(Vec::new());
        writer
            .write_match(&Match::new(2, b"abcxx".to_vec()))
            .unwrap();
        assert_eq!(writer.into_inner(), b"O:2\nabcxx...\n");
    }

    #[test]
    fn test_marker_follows_even_full_previews() {
        let mut writer = ReportWriter::new(Vec::new());
        writer.write_match(&Match::new(0, b"ab".to_vec())).unwrap();
        writer
            .write_match(&Match::new(99, b"ab".to_vec()))
            .unwrap();
        assert_eq!(writer.into_inner(), b"O:0\nab...\nO:99\nab...\n");
    }

    #[test]
    fn test_binary_previews_written_verbatim() {
        let mut writer = ReportWriter::new(Vec::new());
        writer
            .write_match(&Match::new(7, vec![0x00, 0xff, 0x0a]))
            .unwrap();
        assert_eq!(
            writer.into_inner(),
            [b"O:7\n".as_slice(), &[0x00, 0xff, 0x0a], b"...\n"].concat()
        );
    }

    #[test]
    fn test_sink_reports_through_writer() {
        let mut writer = ReportWriter::new(Vec::new());
        writer.on_match(&Match::new(5, b"zz".to_vec())).unwrap();
        assert_eq!(writer.into_inner(), b"O:5\nzz...\n");
    }
}
