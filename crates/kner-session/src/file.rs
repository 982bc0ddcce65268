//! Text-file input
//!
//! A file is accepted when its name ends in `.txt` or its declared media
//! type is `text/plain`. Accepted files are read whole and decoded as
//! UTF-8, replacing invalid sequences.

use std::path::Path;

use kner_core::{KnerError, Result};

use crate::event::TextFile;

/// Whether a file may be used as prediction input
pub fn is_accepted(name: &str, media_type: Option<&str>) -> bool {
    let plain = media_type
        .and_then(|m| m.split(';').next())
        .map(|m| m.trim().eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false);

    plain || name.ends_with(".txt")
}

/// Reject files outside the input contract
pub fn check_file_type(name: &str, media_type: Option<&str>) -> Result<()> {
    if is_accepted(name, media_type) {
        Ok(())
    } else {
        Err(KnerError::UnsupportedFileType(name.to_string()))
    }
}

/// Load a file from disk
///
/// Contents of files outside the input contract are never read; the
/// returned [`TextFile`] is empty and the session rejects it.
pub async fn read_text_file(path: impl AsRef<Path>) -> Result<TextFile> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let contents = if is_accepted(&name, None) {
        let bytes = tokio::fs::read(path).await?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        String::new()
    };

    Ok(TextFile {
        name,
        media_type: None,
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_txt_extension() {
        assert!(is_accepted("notes.txt", None));
        assert!(!is_accepted("NOTES.TXT", None));
        assert!(is_accepted("NOTES.TXT", Some("text/plain")));
        assert!(!is_accepted("notes.pdf", None));
        assert!(!is_accepted("txt", None));
    }

    #[test]
    fn test_accepts_plain_media_type() {
        assert!(is_accepted("clipboard", Some("text/plain")));
        assert!(is_accepted("clipboard", Some("text/plain; charset=utf-8")));
        assert!(!is_accepted("page.html", Some("text/html")));
    }

    #[test]
    fn test_check_file_type() {
        assert!(check_file_type("a.txt", None).is_ok());
        assert!(matches!(
            check_file_type("a.docx", None),
            Err(KnerError::UnsupportedFileType(name)) if name == "a.docx"
        ));
    }
}
