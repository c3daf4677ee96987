use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;
use crate::synth::CardRecord;

pub const FIELD_DELIMITER: u8 = b'|';

/// Write one `number|month|year|cvv` line per record, returning bytes written.
pub fn write_artifact(
    path: &Path,
    records: &[CardRecord],
    footer: Option<Duration>,
) -> Result<u64> {
    let writer = BufWriter::new(File::create(path)?);
    let counting = write_records(CountingWriter::new(writer), records, footer)?;
    Ok(counting.bytes_written())
}

/// Same text as [`write_artifact`], kept in memory.
pub fn render_artifact(records: &[CardRecord], footer: Option<Duration>) -> Result<String> {
    let buffer = write_records(Vec::new(), records, footer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_records<W: Write>(
    out: W,
    records: &[CardRecord],
    footer: Option<Duration>,
) -> Result<W> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(FIELD_DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    for record in records {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;

    let mut out = writer.into_inner().map_err(|err| err.into_error())?;
    if let Some(elapsed) = footer {
        writeln!(
            out,
            "# generated {} cards in {} ms",
            records.len(),
            elapsed.as_millis()
        )?;
    }
    out.flush()?;
    Ok(out)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str) -> CardRecord {
        CardRecord {
            number: number.to_string(),
            exp_month: "01".to_string(),
            exp_year: "30".to_string(),
            cvv: "007".to_string(),
        }
    }

    #[test]
    fn renders_one_line_per_record() {
        let text = render_artifact(&[card("4111111111111111"), card("4000000000000002")], None)
            .expect("render");
        assert_eq!(text, "4111111111111111|01|30|007\n4000000000000002|01|30|007\n");
    }

    #[test]
    fn footer_is_appended_only_when_requested() {
        let text =
            render_artifact(&[card("4111111111111111")], Some(Duration::from_millis(12)))
                .expect("render");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "# generated 1 cards in 12 ms");
    }
}
