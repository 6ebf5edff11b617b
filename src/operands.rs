//! Loads the input files named on the command line into memory, decoding
//! UTF-16 and dropping byte order marks on the way in. Standard input
//! (named `-`) is read once and its bytes reused for every `-` operand, so
//! each occurrence can still be split under its own delimiter options.
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result};

use crate::args::Input;
use crate::expr::input_letter;
use crate::record::{records_of, Record};

/// One loaded input: its decoded bytes, plus the extraction options that
/// were in force at its position on the command line.
#[derive(Debug)]
pub struct Operand {
    text: Vec<u8>,
    delimiters: Vec<u8>,
    trim: bool,
    keep_empty: bool,
}

impl Operand {
    /// Splits the operand's lines into records under its own options.
    #[must_use]
    pub fn records(&self) -> Vec<Record<'_>> {
        records_of(&self.text, &self.delimiters, self.trim, self.keep_empty)
    }
}

/// Reads every input named in `inputs`, in command-line order.
pub fn load(inputs: &[Input]) -> Result<Vec<Operand>> {
    let mut cached_stdin: Option<Vec<u8>> = None;
    let mut operands = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let letter = input_letter(index);
        let raw = if input.path == Path::new("-") {
            stdin_bytes(&mut cached_stdin)
                .with_context(|| format!("Can't read stdin (input {letter})"))?
        } else {
            fs::read(&input.path).with_context(|| {
                format!("Can't read file: {} (input {letter})", input.path.display())
            })?
        };
        operands.push(Operand {
            text: without_bom(decode_if_utf16(raw)),
            delimiters: input.delimiters.clone(),
            trim: input.trim,
            keep_empty: input.keep_empty,
        });
    }
    Ok(operands)
}

// Standard input can appear as an operand more than once, but can only be
// read once, so the first read caches its bytes.
fn stdin_bytes(cache: &mut Option<Vec<u8>>) -> Result<Vec<u8>> {
    if cache.is_none() {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        *cache = Some(bytes);
    }
    Ok(cache.clone().unwrap_or_default())
}

// Transcodes to UTF-8 when `raw` opens with a UTF-16 byte order mark, and
// returns anything else unchanged. `decode_without_bom_handling` turns
// malformed sequences into the Unicode replacement character, and decodes
// the BOM itself to a UTF-8 BOM, which `without_bom` removes next.
fn decode_if_utf16(raw: Vec<u8>) -> Vec<u8> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(&raw) {
        if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
            let (text, _) = encoding.decode_without_bom_handling(&raw);
            return text.into_owned().into_bytes();
        }
    }
    raw
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn without_bom(mut text: Vec<u8>) -> Vec<u8> {
    if text.starts_with(UTF8_BOM) {
        text.drain(..UTF8_BOM.len());
    }
    text
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    const BOM: &str = "\u{FEFF}";

    // Encodes `source` as UTF-16 with a leading byte order mark.
    fn utf_16(source: &str, little_endian: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        for unit in std::iter::once(0xFEFF_u16).chain(source.encode_utf16()) {
            let pair = if little_endian { unit.to_le_bytes() } else { unit.to_be_bytes() };
            bytes.extend_from_slice(&pair);
        }
        bytes
    }

    #[test]
    fn utf_16le_is_translated_to_utf8() {
        let text = "crab,claw,2\n gopher,paw, 4\n";
        assert_eq!(decode_if_utf16(utf_16(text, true)), (BOM.to_string() + text).into_bytes());
    }

    #[test]
    fn utf_16be_is_translated_to_utf8() {
        let text = "crab,claw,2\n gopher,paw, 4\n";
        assert_eq!(decode_if_utf16(utf_16(text, false)), (BOM.to_string() + text).into_bytes());
    }

    #[test]
    fn byte_order_marks_are_stripped_after_decoding() {
        let text = "crab,claw,2\n";
        assert_eq!(without_bom(decode_if_utf16(utf_16(text, true))), text.as_bytes());
        assert_eq!(without_bom(decode_if_utf16(utf_16(text, false))), text.as_bytes());
        assert_eq!(without_bom((BOM.to_string() + text).into_bytes()), text.as_bytes());
        assert_eq!(without_bom(text.as_bytes().to_vec()), text.as_bytes());
    }

    #[test]
    fn an_operand_splits_its_lines_under_its_own_options() {
        let operand = Operand {
            text: b"a, b ,c\nd,e\n".to_vec(),
            delimiters: b",".to_vec(),
            trim: true,
            keep_empty: false,
        };
        let records = operand.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field(1), Some(&b"b"[..]));
        assert_eq!(records[1].field(1), Some(&b"e"[..]));
    }
}
