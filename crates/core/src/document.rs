use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};

use encoding_rs::UTF_8;
use thiserror::Error;

use crate::editor::{EditorBuffer, EditorError};
use crate::listeners::{ListenerId, ListenerRegistry};

/// 文件在集合中的唯一識別碼。 / Identity of a document within a document set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// 文件載入或儲存時可能發生的錯誤。 / Errors that can occur while loading or saving a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document has no associated path")]
    MissingPath,
}

/// 單一文件狀態變更的通知介面。 / Receives notifications about one document's state.
pub trait SingleDocumentListener {
    /// 修改狀態改變時呼叫。 / Called after the modified flag changed.
    fn modify_status_updated(&mut self, document: &SingleDocument) {
        let _ = document;
    }

    /// 檔案路徑改變時呼叫。 / Called after the file path changed.
    fn file_path_updated(&mut self, document: &SingleDocument) {
        let _ = document;
    }
}

/// 一個開啟中的文字文件：內容、路徑與修改狀態。 / One open text document: buffer, path and modified flag.
pub struct SingleDocument {
    id: DocumentId,
    path: Option<PathBuf>,
    buffer: EditorBuffer,
    modified: bool,
    listeners: ListenerRegistry<Box<dyn SingleDocumentListener>>,
}

impl SingleDocument {
    pub(crate) fn new(id: DocumentId, path: Option<PathBuf>, text: String) -> Self {
        Self {
            id,
            path,
            buffer: EditorBuffer::new(text),
            modified: false,
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// 取得文件所屬的檔案路徑（若存在）。 / Retrieves the associated path if the document is linked to one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 更新檔案路徑並通知監聽器。 / Updates the path, notifying listeners when it changes.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.path.as_deref() == Some(path.as_path()) {
            return;
        }
        self.path = Some(path);
        self.notify(|listener, document| listener.file_path_updated(document));
    }

    /// 顯示於分頁上的名稱。 / Name shown on the tab, `untitled` when there is no path.
    pub fn title(&self, untitled: &str) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| untitled.to_string())
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// 設定修改狀態並通知監聽器。 / Sets the modified flag, notifying listeners when it changes.
    pub fn set_modified(&mut self, modified: bool) {
        if self.modified == modified {
            return;
        }
        self.modified = modified;
        self.notify(|listener, document| listener.modify_status_updated(document));
    }

    pub fn text(&self) -> &str {
        self.buffer.contents()
    }

    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    /// 直接存取緩衝區；經由此處的編輯需自行呼叫 [`SingleDocument::set_modified`]。 / Raw buffer access; callers report edits via [`SingleDocument::set_modified`].
    pub fn buffer_mut(&mut self) -> &mut EditorBuffer {
        &mut self.buffer
    }

    /// 取代全部內容並標記為已修改。 / Replaces the whole text, marking the document modified.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.buffer.contents() {
            return;
        }
        self.buffer = EditorBuffer::new(text);
        self.set_modified(true);
    }

    /// 對緩衝區執行編輯操作；回傳 `true` 時標記為已修改。 / Runs an edit on the buffer; a `true` result marks the document modified.
    pub fn apply<F>(&mut self, edit: F) -> Result<bool, EditorError>
    where
        F: FnOnce(&mut EditorBuffer) -> Result<bool, EditorError>,
    {
        let changed = edit(&mut self.buffer)?;
        if changed {
            self.set_modified(true);
        }
        Ok(changed)
    }

    pub fn add_listener(&mut self, listener: Box<dyn SingleDocumentListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// 以 UTF-8 寫入指定路徑，成功後清除修改狀態並更新路徑。 / Writes the text as UTF-8, then clears the modified flag and adopts the path.
    pub(crate) fn save_to(&mut self, path: &Path) -> Result<(), DocumentError> {
        write_text(path, self.buffer.contents())?;
        self.set_modified(false);
        self.set_path(path);
        Ok(())
    }

    fn notify<F>(&mut self, mut callback: F)
    where
        F: FnMut(&mut dyn SingleDocumentListener, &SingleDocument),
    {
        // 通知期間暫時取出監聽器，以便傳入 `&self`。 / Listeners are detached while they receive `&self`.
        let mut listeners = mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            callback(listener.as_mut(), self);
        }
        self.listeners = listeners;
    }
}

impl fmt::Debug for SingleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleDocument")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("modified", &self.modified)
            .field("len", &self.buffer.len())
            .finish()
    }
}

/// 以 UTF-8 讀取整個檔案；移除 BOM，無效序列以 U+FFFD 取代。 / Reads a whole file as UTF-8, dropping a BOM and replacing malformed sequences.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, DocumentError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, had_errors) = UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        tracing::warn!(
            "{} is not valid UTF-8; malformed sequences were replaced",
            path.display()
        );
    }
    Ok(text.into_owned())
}

/// 以 UTF-8 寫入整個檔案。 / Writes a whole file as UTF-8.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<(), DocumentError> {
    let path = path.as_ref();
    let write_err = |source: io::Error| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    };

    // 先寫入暫存檔再重新命名，避免出現部分寫入的情況。 / Use a temporary file plus rename to guard against partial writes.
    let tmp_path = path.with_extension("tmp_quillpad");
    {
        let mut tmp_file = File::create(&tmp_path).map_err(write_err)?;
        tmp_file.write_all(text.as_bytes()).map_err(write_err)?;
        tmp_file.sync_all().map_err(write_err)?;
    }
    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl SingleDocumentListener for Recorder {
        fn modify_status_updated(&mut self, document: &SingleDocument) {
            self.events
                .borrow_mut()
                .push(format!("modified={}", document.is_modified()));
        }

        fn file_path_updated(&mut self, document: &SingleDocument) {
            self.events
                .borrow_mut()
                .push(format!("path={}", document.title("?")));
        }
    }

    #[test]
    fn listeners_fire_only_on_changes() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut doc = SingleDocument::new(DocumentId::new(1), None, String::new());
        doc.add_listener(Box::new(Recorder {
            events: events.clone(),
        }));

        doc.set_modified(true);
        doc.set_modified(true);
        doc.set_path("/tmp/notes.txt");
        doc.set_path("/tmp/notes.txt");
        doc.set_modified(false);

        assert_eq!(
            *events.borrow(),
            vec!["modified=true", "path=notes.txt", "modified=false"]
        );
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut doc = SingleDocument::new(DocumentId::new(1), None, String::new());
        let id = doc.add_listener(Box::new(Recorder {
            events: events.clone(),
        }));
        assert!(doc.remove_listener(id));
        doc.set_modified(true);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn apply_marks_modified_only_when_text_changed() {
        let mut doc = SingleDocument::new(DocumentId::new(1), None, "abc".into());
        doc.apply(|_| Ok(false)).unwrap();
        assert!(!doc.is_modified());
        doc.apply(|buffer| buffer.replace_range(0, 1, "A").map(|_| true))
            .unwrap();
        assert!(doc.is_modified());
        assert_eq!(doc.text(), "Abc");
    }

    #[test]
    fn title_falls_back_to_untitled() {
        let doc = SingleDocument::new(DocumentId::new(1), None, String::new());
        assert_eq!(doc.title("Untitled"), "Untitled");
    }

    #[test]
    fn read_text_strips_bom_and_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let bom = dir.path().join("bom.txt");
        fs::write(&bom, b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(read_text(&bom).unwrap(), "hello");

        let broken = dir.path().join("broken.txt");
        fs::write(&broken, b"a\xFFb").unwrap();
        assert_eq!(read_text(&broken).unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn read_text_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
    }

    #[test]
    fn save_to_writes_utf8_and_updates_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut doc = SingleDocument::new(DocumentId::new(3), None, String::new());
        doc.set_text("žuta ruža\n");
        assert!(doc.is_modified());

        doc.save_to(&path).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.path(), Some(path.as_path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "žuta ruža\n");
        assert!(!path.with_extension("tmp_quillpad").exists());
    }

    #[test]
    fn write_text_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_text(dir.path().join("nope").join("out.txt"), "x").unwrap_err();
        assert!(matches!(err, DocumentError::Write { .. }));
    }
}
