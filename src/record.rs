//! The record model: splits input text into lines, lines into column spans,
//! and writes selected columns back out. A `Record` borrows its line from
//! the operand that loaded it, so record collections are cheap to copy and
//! never own text.

use anyhow::Result;
use bstr::ByteSlice;
use memchr::memchr;
use std::fmt;
use std::io::Write;

use crate::mask::{FieldMask, MAX_FIELDS};

/// The bytes trimmed from the ends of a column, and the default delimiter
/// set: space, tab, carriage return, line feed.
pub(crate) const BLANK: &[u8] = b" \t\r\n";

/// One column's position within its line, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    len: usize,
}

/// A borrowed view of one input line together with the column spans
/// extracted from it. Spans don't overlap and appear in line order.
#[derive(PartialEq, Eq)]
pub struct Record<'a> {
    line: &'a [u8],
    fields: Vec<Span>,
}

// Shows the line as text rather than a list of byte values.
impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("line", &self.line.as_bstr())
            .field("fields", &self.fields)
            .finish()
    }
}

impl<'a> Record<'a> {
    /// The number of columns the record has.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The bytes of column `index`, or `None` past the last column.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&'a [u8]> {
        let span = self.fields.get(index)?;
        Some(&self.line[span.start..span.start + span.len])
    }
}

/// Splits `text` into records, one per line. A line is zero or more
/// non-newline bytes followed by a newline (a trailing `\r` is stripped, so
/// CRLF files work); the last line needs no terminator. Lines that yield no
/// columns yield no record.
#[must_use]
pub fn records_of<'a>(
    mut text: &'a [u8],
    delimiters: &[u8],
    trim: bool,
    keep_empty: bool,
) -> Vec<Record<'a>> {
    let mut records = Vec::new();
    let mut take = |line| {
        if let Some(record) = extract(line, delimiters, trim, keep_empty) {
            records.push(record);
        }
    };
    while let Some(end) = memchr(b'\n', text) {
        let (mut line, rest) = text.split_at(end);
        text = &rest[1..];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        take(line);
    }
    if !text.is_empty() {
        take(text);
    }
    records
}

/// Splits one line into column spans: skip blanks (when trimming), take the
/// longest delimiter-free run, shrink trailing blanks off it, then consume
/// exactly one delimiter byte and repeat. The scan always yields at least
/// one span, so `a,b,` has a third, empty column.
///
/// By default zero-length spans are dropped, and a line with no spans left
/// yields no record. With `keep_empty`, spans are kept verbatim, except
/// that a line reducing to one empty span (a blank line) becomes a record
/// with no columns at all, which normalization then drops under any mask.
pub(crate) fn extract<'a>(
    line: &'a [u8],
    delimiters: &[u8],
    trim: bool,
    keep_empty: bool,
) -> Option<Record<'a>> {
    let mut fields = Vec::new();
    let mut at = 0;
    loop {
        if trim {
            while at < line.len() && BLANK.contains(&line[at]) {
                at += 1;
            }
        }
        let start = at;
        while at < line.len() && !delimiters.contains(&line[at]) {
            at += 1;
        }
        let mut end = at;
        if trim {
            while end > start && BLANK.contains(&line[end - 1]) {
                end -= 1;
            }
        }
        fields.push(Span { start, len: end - start });
        if fields.len() == MAX_FIELDS || at == line.len() {
            break;
        }
        at += 1; // the delimiter byte
    }
    if keep_empty {
        if fields.len() == 1 && fields[0].len == 0 {
            fields.clear();
        }
    } else {
        fields.retain(|span| span.len > 0);
        if fields.is_empty() {
            return None;
        }
    }
    Some(Record { line, fields })
}

/// Writes each record's selected columns in ascending column order, joined
/// by `separator`, one record per line.
pub fn write_records(
    out: &mut impl Write,
    records: &[&Record],
    mask: FieldMask,
    separator: &[u8],
) -> Result<()> {
    for record in records {
        let mut first = true;
        for index in mask.indices() {
            let Some(field) = record.field(index) else { break };
            if first {
                first = false;
            } else {
                out.write_all(separator)?;
            }
            out.write_all(field)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    fn fields_of<'a>(record: &'a Record) -> Vec<&'a [u8]> {
        (0..record.field_count()).map(|i| record.field(i).unwrap()).collect()
    }

    #[test]
    fn blanks_delimit_and_collapse_by_default() {
        let record = extract(b"  gamma\t42   7 ", BLANK, true, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"gamma".as_slice(), b"42", b"7"]);
    }

    #[test]
    fn explicit_delimiters_split_once_per_byte() {
        let record = extract(b"a,b,", b",", true, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"a".as_slice(), b"b"]);

        let record = extract(b"a,b,", b",", true, true).unwrap();
        assert_eq!(fields_of(&record), vec![b"a".as_slice(), b"b", b""]);

        let record = extract(b"a,,b", b",", true, true).unwrap();
        assert_eq!(fields_of(&record), vec![b"a".as_slice(), b"", b"b"]);
    }

    #[test]
    fn empty_columns_vanish_by_default_and_shift_later_columns_down() {
        let record = extract(b"a,,b", b",", true, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"a".as_slice(), b"b"]);
        assert_eq!(record.field(1), Some(b"b".as_slice()));
    }

    #[test]
    fn columns_are_trimmed_unless_asked_not_to() {
        let record = extract(b"  a  ,  b  ", b",", true, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"a".as_slice(), b"b"]);

        let record = extract(b"  a  ,  b  ", b",", false, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"  a  ".as_slice(), b"  b  "]);
    }

    #[test]
    fn a_blank_line_yields_no_record_or_a_record_with_no_columns() {
        assert_eq!(extract(b"", b",", true, false), None);
        assert_eq!(extract(b"   ", BLANK, true, false), None);

        let empty_key = extract(b"", b",", true, true).unwrap();
        assert_eq!(empty_key.field_count(), 0);
        let empty_key = extract(b"   ", BLANK, true, true).unwrap();
        assert_eq!(empty_key.field_count(), 0);
    }

    #[test]
    fn extraction_stops_at_the_column_limit() {
        let line = vec![b','; 50];
        let record = extract(&line, b",", true, true).unwrap();
        assert_eq!(record.field_count(), MAX_FIELDS);
        assert_eq!(extract(&line, b",", true, false), None);
    }

    #[test]
    fn field_is_none_past_the_last_column() {
        let record = extract(b"only", b",", true, false).unwrap();
        assert_eq!(record.field(0), Some(b"only".as_slice()));
        assert_eq!(record.field(1), None);
        assert_eq!(record.field(4000), None);
    }

    #[test]
    fn records_of_splits_lines_and_strips_carriage_returns() {
        let records = records_of(b"a,1\r\nb,2\nc,3", b",", true, false);
        assert_eq!(records.len(), 3);
        assert_eq!(fields_of(&records[0]), vec![b"a".as_slice(), b"1"]);
        assert_eq!(fields_of(&records[1]), vec![b"b".as_slice(), b"2"]);
        assert_eq!(fields_of(&records[2]), vec![b"c".as_slice(), b"3"]);
    }

    #[test]
    fn blank_lines_disappear_from_the_collection_by_default() {
        let records = records_of(b"a\n\n  \nb\n", BLANK, true, false);
        assert_eq!(records.len(), 2);

        let records = records_of(b"a\n\n  \nb\n", BLANK, true, true);
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].field_count(), 0);
        assert_eq!(records[2].field_count(), 0);
    }

    #[test]
    fn an_empty_delimiter_set_keeps_the_whole_line_as_one_column() {
        let record = extract(b"  a b c  ", b"", true, false).unwrap();
        assert_eq!(fields_of(&record), vec![b"a b c".as_slice()]);
    }

    #[test]
    fn writes_selected_columns_with_the_output_separator() {
        let records = records_of(b"a,b,c\nd,e,f\n", b",", true, false);
        let refs: Vec<&Record> = records.iter().collect();
        let mut out = Vec::new();
        let mask = FieldMask::single(0) | FieldMask::single(2);
        write_records(&mut out, &refs, mask, b";").unwrap();
        assert_eq!(out, b"a;c\nd;f\n");
    }

    #[test]
    fn writing_ignores_selected_columns_a_record_lacks() {
        let records = records_of(b"a,b\n", b",", true, false);
        let refs: Vec<&Record> = records.iter().collect();
        let mut out = Vec::new();
        write_records(&mut out, &refs, FieldMask::ALL, b",").unwrap();
        assert_eq!(out, b"a,b\n");
    }
}
