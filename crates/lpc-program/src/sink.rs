//! Output sinks.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Destination for a program's framed packet stream.
pub trait Sink: Write {
    /// Make everything written so far durable under the final name.
    fn commit(self: Box<Self>) -> io::Result<()>;

    /// Final location, when the sink is backed by a file.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A file written under `<name>.tmp` and renamed onto `<name>` on commit.
///
/// Dropping an uncommitted `StagedFile` deletes the temporary file.
pub struct StagedFile {
    writer: Option<BufWriter<File>>,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl StagedFile {
    /// Create the temporary file next to `final_path`.
    pub fn create(final_path: impl Into<PathBuf>) -> io::Result<Self> {
        let final_path = final_path.into();
        let file_name = final_path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output has no file name"))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = final_path.with_file_name(tmp_name);

        let file = File::create(&tmp_path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            tmp_path,
            final_path,
        })
    }

    /// Path of the staging file.
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already committed"))
    }

    fn persist(&mut self) -> io::Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("staged file already committed"))?;
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.tmp_path, &self.final_path)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Sink for StagedFile {
    fn commit(mut self: Box<Self>) -> io::Result<()> {
        let result = self.persist();
        if result.is_err() {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
        result
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.final_path)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}

/// An in-memory sink whose contents stay readable through any clone.
#[derive(Clone, Default)]
pub struct MemorySink {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.borrow().clone()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for MemorySink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lpc-sink-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn staged_file_renames_on_commit() {
        let dir = unique_temp_dir("commit");
        let final_path = dir.join("MARK.PKT");

        let mut staged = StagedFile::create(&final_path).unwrap();
        let tmp_path = staged.tmp_path().to_path_buf();
        assert_eq!(tmp_path, dir.join("MARK.PKT.tmp"));
        staged.write_all(&[0xC0, 0x00, 0xFF, 0xFF, 0xC0]).unwrap();
        assert!(tmp_path.exists());
        assert!(!final_path.exists());

        Box::new(staged).commit().unwrap();

        assert!(!tmp_path.exists());
        assert_eq!(
            std::fs::read(&final_path).unwrap(),
            vec![0xC0, 0x00, 0xFF, 0xFF, 0xC0]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn staged_file_discarded_on_drop() {
        let dir = unique_temp_dir("drop");
        let final_path = dir.join("XRAIN.PKT");

        let mut staged = StagedFile::create(&final_path).unwrap();
        let tmp_path = staged.tmp_path().to_path_buf();
        staged.write_all(b"partial").unwrap();
        drop(staged);

        assert!(!tmp_path.exists());
        assert!(!final_path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn staged_file_replaces_previous_artifact() {
        let dir = unique_temp_dir("replace");
        let final_path = dir.join("OLD.PKT");
        std::fs::write(&final_path, b"stale").unwrap();

        let mut staged = StagedFile::create(&final_path).unwrap();
        staged.write_all(b"fresh").unwrap();
        Box::new(staged).commit().unwrap();

        assert_eq!(std::fs::read(&final_path).unwrap(), b"fresh");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_commit_removes_staging_file() {
        let dir = unique_temp_dir("failed-commit");
        let final_path = dir.join("BUSY.PKT");
        std::fs::create_dir_all(final_path.join("occupied")).unwrap();

        let mut staged = StagedFile::create(&final_path).unwrap();
        let tmp_path = staged.tmp_path().to_path_buf();
        staged.write_all(b"frames").unwrap();
        assert!(Box::new(staged).commit().is_err());

        assert!(!tmp_path.exists());
        assert!(final_path.join("occupied").is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_sink_shares_buffer_between_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_all(b"abc").unwrap();
        assert_eq!(sink.contents(), b"abc");
        assert!(Sink::path(&sink).is_none());
    }
}
