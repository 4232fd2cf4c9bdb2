//! Persist a [`MessageRecord`] as a directory: index page, HTML body and
//! attachments side by side.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::error::{RenderError, Result};
use crate::model::message::MessageRecord;

use super::html::{render_index, INDEX_FILENAME};

/// Longest filename (in characters) kept by [`sanitize_filename`].
const MAX_FILENAME_LEN: usize = 200;

/// Write `record` into `output_dir` and return the paths written, in order.
///
/// Attachment names are used verbatim unless `config.sanitize_filenames` is
/// set. Names that collide (including with `email-content.html`) are not
/// deduplicated: the later file wins.
pub fn write_output(
    record: &MessageRecord,
    output_dir: &Path,
    config: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    prepare_dir(output_dir, config.clean)?;

    let names: Vec<String> = record
        .attachments
        .iter()
        .map(|a| {
            if config.sanitize_filenames {
                sanitize_filename(a.filename(), MAX_FILENAME_LEN)
            } else {
                a.filename().to_string()
            }
        })
        .collect();

    let mut written = Vec::with_capacity(record.attachments.len() + 2);

    let index = render_index(record, &names);
    written.push(write_file(output_dir, INDEX_FILENAME, index.as_bytes())?);

    if let Some(html) = &record.html {
        written.push(write_file(output_dir, html.filename(), html.data())?);
    }

    for (attachment, name) in record.attachments.iter().zip(&names) {
        written.push(write_file(output_dir, name, attachment.data())?);
    }

    info!(
        dir = %output_dir.display(),
        files = written.len(),
        "Wrote rendered message"
    );
    Ok(written)
}

/// Make sure `dir` exists (0755 on Unix), removing any previous contents
/// first when `clean` is set.
fn prepare_dir(dir: &Path, clean: bool) -> Result<()> {
    if clean && dir.exists() {
        debug!(dir = %dir.display(), "Removing previous output");
        std::fs::remove_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;
    }

    std::fs::create_dir_all(dir).map_err(|e| RenderError::io(dir, e))?;
    set_mode(dir, 0o755)
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, data).map_err(|e| RenderError::io(&path, e))?;
    set_mode(&path, 0o660)?;
    debug!(path = %path.display(), size = data.len(), "Wrote file");
    Ok(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| RenderError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Reduce a filename to one safe path component.
///
/// Path separators, control characters and characters Windows forbids are
/// replaced with `_`; `.`/`..` and empty names become `attachment`. The
/// result is truncated to `max_len` characters.
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*')
            {
                '_'
            } else {
                c
            }
        })
        .take(max_len)
        .collect();

    match sanitized.trim() {
        "" | "." | ".." => "attachment".to_string(),
        _ => sanitized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::Attachment;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf", 200), "report.pdf");
        assert_eq!(sanitize_filename("my report.pdf", 200), "my report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd", 200), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a\\b:c*d?.txt", 200), "a_b_c_d_.txt");
        assert_eq!(sanitize_filename("..", 200), "attachment");
        assert_eq!(sanitize_filename("", 200), "attachment");
        assert_eq!(sanitize_filename("abcdef", 3), "abc");
    }

    #[test]
    fn test_write_output_sanitizes_names() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let record = MessageRecord {
            attachments: vec![Attachment::new(b"secret".to_vec(), "../escape.txt")],
            ..MessageRecord::default()
        };

        let written = write_output(&record, &out, &OutputConfig::default()).unwrap();
        assert_eq!(written, vec![out.join("email.html"), out.join(".._escape.txt")]);
        assert!(!tmp.path().join("escape.txt").exists());

        let index = std::fs::read_to_string(out.join("email.html")).unwrap();
        assert!(index.contains("href=\".._escape.txt\""));
    }

    #[test]
    fn test_clean_removes_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.txt"), b"old").unwrap();

        write_output(&MessageRecord::default(), &out, &OutputConfig::default()).unwrap();
        assert!(!out.join("stale.txt").exists());
        assert!(out.join("email.html").exists());

        std::fs::write(out.join("stale.txt"), b"old").unwrap();
        let keep = OutputConfig {
            clean: false,
            ..OutputConfig::default()
        };
        write_output(&MessageRecord::default(), &out, &keep).unwrap();
        assert!(out.join("stale.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        write_output(&MessageRecord::default(), &out, &OutputConfig::default()).unwrap();

        let dir_mode = std::fs::metadata(&out).unwrap().permissions().mode();
        let file_mode = std::fs::metadata(out.join("email.html"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o755);
        assert_eq!(file_mode & 0o777, 0o660);
    }
}
