//! Log sanitizer for raw serial captures.
//!
//! Live captures carry NUL padding, terminal control codes and CRLF line
//! endings. Everything downstream is line-oriented ASCII, so the capture is
//! reduced to tab, newline and printable ASCII before any scanning happens.

use crate::result::{CovlogError, CovlogResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the stem of a sanitized capture
pub const SANITIZED_SUFFIX: &str = "_nonulls.txt";

/// Whether a byte survives sanitizing
#[must_use]
pub const fn is_allowed(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r' | 0x20..=0x7E)
}

/// Strip disallowed bytes and normalize line endings to `\n`
///
/// `\r\n` and a lone `\r` both become a single `\n`.
#[must_use]
pub fn sanitize_bytes(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_cr = false;

    for &byte in raw.iter().filter(|b| is_allowed(**b)) {
        if pending_cr {
            pending_cr = false;
            out.push('\n');
            if byte == b'\n' {
                continue;
            }
        }
        if byte == b'\r' {
            pending_cr = true;
        } else {
            out.push(char::from(byte));
        }
    }
    if pending_cr {
        out.push('\n');
    }

    out
}

/// Path of the sanitized copy of `input` inside `output_dir`
#[must_use]
pub fn sanitized_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "capture".into(), |s| s.to_string_lossy());
    output_dir.join(format!("{stem}{SANITIZED_SUFFIX}"))
}

/// Sanitize a capture file into `output_dir`, returning the new path
pub fn sanitize_file(input: &Path, output_dir: &Path) -> CovlogResult<PathBuf> {
    let raw = std::fs::read(input).map_err(|e| CovlogError::file_io(input, e))?;
    let clean = sanitize_bytes(&raw);
    let output = sanitized_path(input, output_dir);
    std::fs::write(&output, &clean).map_err(|e| CovlogError::file_io(&output, e))?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        dropped = raw.len().saturating_sub(clean.len()),
        "sanitized capture"
    );
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_keeps_printable_ascii() {
        assert_eq!(sanitize_bytes(b"hello world\n"), "hello world\n");
        assert_eq!(sanitize_bytes(b"a\tb~"), "a\tb~");
    }

    #[test]
    fn test_strips_control_and_high_bytes() {
        let raw = b"ab\x00c\x1b[0m\x07d\xff\xfe\n";
        assert_eq!(sanitize_bytes(raw), "abc[0md\n");
    }

    #[test]
    fn test_crlf_becomes_lf() {
        assert_eq!(sanitize_bytes(b"one\r\ntwo\r\n"), "one\ntwo\n");
    }

    #[test]
    fn test_lone_cr_becomes_lf() {
        assert_eq!(sanitize_bytes(b"one\rtwo\r"), "one\ntwo\n");
    }

    #[test]
    fn test_cr_nul_lf_collapses() {
        // NUL between CR and LF is removed before line endings are normalized
        assert_eq!(sanitize_bytes(b"x\r\x00\ny"), "x\ny");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_bytes(b""), "");
    }

    #[test]
    fn test_sanitized_path_naming() {
        let path = sanitized_path(Path::new("/logs/serial.txt"), Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/serial_nonulls.txt"));
    }

    #[test]
    fn test_sanitize_file_writes_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("capture.txt");
        std::fs::write(&input, b"line\x00 one\r\nline two\r\n").unwrap();

        let output = sanitize_file(&input, temp.path()).unwrap();
        assert_eq!(output, temp.path().join("capture_nonulls.txt"));
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "line one\nline two\n"
        );
    }

    #[test]
    fn test_sanitize_file_missing_input() {
        let temp = TempDir::new().unwrap();
        let result = sanitize_file(&temp.path().join("absent.txt"), temp.path());
        assert!(matches!(result, Err(CovlogError::FileIo { .. })));
    }

    proptest! {
        #[test]
        fn prop_output_only_allowed_chars(raw in proptest::collection::vec(any::<u8>(), 0..512)) {
            let clean = sanitize_bytes(&raw);
            prop_assert!(clean.bytes().all(|b| b == b'\t' || b == b'\n' || (0x20..=0x7E).contains(&b)));
        }

        #[test]
        fn prop_idempotent(raw in proptest::collection::vec(any::<u8>(), 0..512)) {
            let once = sanitize_bytes(&raw);
            prop_assert_eq!(sanitize_bytes(once.as_bytes()), once.clone());
        }
    }
}
