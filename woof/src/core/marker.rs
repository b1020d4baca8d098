//! In-band completion signal emitted by agents on stdout.

/// Literal an agent prints when every task it was given is finished.
pub const COMPLETION_MARKER: &str = "<woof>COMPLETE</woof>";

/// Whether `buf` contains the full completion marker anywhere.
///
/// Exact byte matching only; partial tags do not count.
pub fn contains_marker(buf: &[u8]) -> bool {
    let marker = COMPLETION_MARKER.as_bytes();
    buf.len() >= marker.len() && buf.windows(marker.len()).any(|window| window == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_anywhere() {
        assert!(contains_marker(b"<woof>COMPLETE</woof>"));
        assert!(contains_marker(b"all done\n<woof>COMPLETE</woof>\n"));
        assert!(contains_marker(b"prefix<woof>COMPLETE</woof>suffix"));
    }

    #[test]
    fn partial_markers_do_not_match() {
        assert!(!contains_marker(b"<woof>COMPLETE"));
        assert!(!contains_marker(b"COMPLETE</woof>"));
        assert!(!contains_marker(b"<woof>complete</woof>"));
        assert!(!contains_marker(b""));
    }
}
