//! Listing files.
//!
//! A listing is plain text:
//! - one 30-bit word per line, as `0`/`1` characters
//! - anything after `;` is a comment
//! - blank lines are ignored

use crate::asm::disasm::disassemble_word;
use crate::binary::Word30;
use crate::cpu::memory::VariableTable;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Render words as listing text, each annotated with its instruction.
pub fn format_listing(words: &[Word30], vars: Option<&VariableTable>) -> String {
    let mut output = String::new();
    output.push_str("; asm-sim listing\n");
    output.push_str(&format!("; {} instructions\n\n", words.len()));

    for word in words {
        output.push_str(&format!("{} ; {}\n", word, disassemble_word(*word, vars)));
    }

    output
}

/// Parse listing text back into words.
pub fn parse_listing(text: &str) -> Result<Vec<Word30>, ListingError> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let code = line.split(';').next().unwrap_or("").trim();
            (!code.is_empty()).then_some((i + 1, code))
        })
        .map(|(line, code)| {
            Word30::parse(code).map_err(|e| ListingError::ParseError {
                line,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Save words to a listing file.
pub fn save_listing<P: AsRef<Path>>(
    path: P,
    words: &[Word30],
    vars: Option<&VariableTable>,
) -> Result<(), ListingError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ListingError::IoError(e.to_string()))?;

    file.write_all(format_listing(words, vars).as_bytes())
        .map_err(|e| ListingError::IoError(e.to_string()))
}

/// Load words from a listing file.
pub fn load_listing<P: AsRef<Path>>(path: P) -> Result<Vec<Word30>, ListingError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ListingError::IoError(e.to_string()))?;

    let mut text = String::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| ListingError::IoError(e.to_string()))?;
        text.push_str(&line);
        text.push('\n');
    }

    let words = parse_listing(&text)?;
    log::debug!("loaded {} words from {}", words.len(), path.as_ref().display());
    Ok(words)
}

/// Errors that can occur reading or writing listings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_format_then_parse() {
        let program = assemble("li $r1, 7\nsw $r1, x\nvariables:\nx: 0").unwrap();
        let text = format_listing(&program.words(), Some(&program.variables));

        assert!(text.contains("; li($r1, 7)"));
        assert!(text.contains("; sw($r1, x)"));
        assert_eq!(parse_listing(&text).unwrap(), program.words());
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "; header\n\n   \n000001000100100011000000000000   ; add\n";
        let words = parse_listing(text).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].to_string(), "000001000100100011000000000000");
    }

    #[test]
    fn test_parse_error_has_line_number() {
        let text = "; header\n0101\n";
        let err = parse_listing(text).unwrap_err();
        assert_eq!(
            err,
            ListingError::ParseError { line: 2, message: "expected 30 bits, found 4".into() }
        );
    }

    #[test]
    fn test_file_roundtrip() {
        let program = assemble("push $r1\npop $r2").unwrap();
        let path = std::env::temp_dir().join(format!("asm-sim-listing-{}.lst", std::process::id()));

        save_listing(&path, &program.words(), None).unwrap();
        let loaded = load_listing(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, program.words());
    }

    #[test]
    fn test_missing_file() {
        let err = load_listing("/nonexistent/asm-sim/listing.lst").unwrap_err();
        assert!(matches!(err, ListingError::IoError(_)));
    }
}
