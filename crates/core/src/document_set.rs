use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::{read_text, DocumentError, DocumentId, SingleDocument};
use crate::listeners::{ListenerId, ListenerRegistry};

/// 文件集合變更的通知介面。 / Receives notifications about changes to a document set.
pub trait MultipleDocumentListener {
    /// 目前文件改變時呼叫。 / Called after the current document changed.
    fn current_document_changed(
        &mut self,
        previous: Option<DocumentId>,
        current: Option<DocumentId>,
    ) {
        let _ = (previous, current);
    }

    /// 新文件加入集合後呼叫。 / Called after a document was appended.
    fn document_added(&mut self, document: DocumentId) {
        let _ = document;
    }

    /// 文件自集合移除後呼叫。 / Called after a document was removed.
    fn document_removed(&mut self, document: DocumentId) {
        let _ = document;
    }
}

/// 文件集合操作錯誤。 / Errors produced by document set operations.
#[derive(Debug, Error)]
pub enum DocumentSetError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("{path} is already open in another tab")]
    PathAlreadyOpen { path: PathBuf },
    #[error("document {0} is not open")]
    UnknownDocument(DocumentId),
}

/// 以分頁呈現的文件集合，並追蹤目前文件。 / Ordered set of open documents (one per tab) with a current document.
pub struct DocumentSet {
    documents: Vec<SingleDocument>,
    current: Option<usize>,
    next_id: u64,
    listeners: ListenerRegistry<Box<dyn MultipleDocumentListener>>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            current: None,
            next_id: 1,
            listeners: ListenerRegistry::new(),
        }
    }

    /// 新增空白文件並設為目前文件。 / Appends an empty untitled document and makes it current.
    pub fn create_document(&mut self) -> DocumentId {
        let id = self.allocate_id();
        self.push_and_select(SingleDocument::new(id, None, String::new()));
        tracing::debug!("created {id}");
        id
    }

    /// 載入檔案；若已開啟則切換至既有文件。 / Loads a file, or switches to it when it is already open.
    pub fn load_document(&mut self, path: impl AsRef<Path>) -> Result<DocumentId, DocumentSetError> {
        let path = path.as_ref();
        if let Some(existing) = self.find_by_path(path) {
            tracing::debug!("{} already open as {existing}", path.display());
            self.select_document(existing)?;
            return Ok(existing);
        }

        let text = read_text(path)?;
        let id = self.allocate_id();
        self.push_and_select(SingleDocument::new(id, Some(path.to_path_buf()), text));
        tracing::info!("opened {} as {id}", path.display());
        Ok(id)
    }

    /// 儲存文件；`path` 為 `None` 時使用文件目前的路徑。 / Saves a document to `path`, or to its own path when `None`.
    ///
    /// Fails with [`DocumentSetError::PathAlreadyOpen`] when another open
    /// document already holds the target path.
    pub fn save_document(
        &mut self,
        id: DocumentId,
        path: Option<&Path>,
    ) -> Result<(), DocumentSetError> {
        let index = self.index_of(id)?;
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.documents[index]
                .path()
                .map(Path::to_path_buf)
                .ok_or(DocumentError::MissingPath)?,
        };

        let conflict = self
            .documents
            .iter()
            .enumerate()
            .any(|(other, document)| {
                other != index && document.path().is_some_and(|held| same_path(held, &target))
            });
        if conflict {
            return Err(DocumentSetError::PathAlreadyOpen { path: target });
        }

        self.documents[index].save_to(&target)?;
        tracing::info!("saved {id} to {}", target.display());
        Ok(())
    }

    /// 關閉文件並選取相鄰的分頁。 / Closes a document and selects its neighbour, if any.
    pub fn close_document(&mut self, id: DocumentId) -> Result<(), DocumentSetError> {
        let index = self.index_of(id)?;
        let previous = self.current_id();
        self.documents.remove(index);

        self.current = match self.current {
            _ if self.documents.is_empty() => None,
            Some(current) if current > index => Some(current - 1),
            Some(current) if current == index => Some(index.min(self.documents.len() - 1)),
            other => other,
        };

        for listener in self.listeners.iter_mut() {
            listener.document_removed(id);
        }
        let current = self.current_id();
        if current != previous {
            self.fire_current_changed(previous, current);
        }
        tracing::debug!("closed {id}");
        Ok(())
    }

    /// 切換目前文件。 / Makes an open document current.
    pub fn select_document(&mut self, id: DocumentId) -> Result<(), DocumentSetError> {
        let index = self.index_of(id)?;
        let previous = self.current_id();
        if self.current == Some(index) {
            return Ok(());
        }
        self.current = Some(index);
        self.fire_current_changed(previous, Some(id));
        Ok(())
    }

    pub fn current_id(&self) -> Option<DocumentId> {
        self.current.map(|index| self.documents[index].id())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_document(&self) -> Option<&SingleDocument> {
        self.current.map(|index| &self.documents[index])
    }

    pub fn current_document_mut(&mut self) -> Option<&mut SingleDocument> {
        self.current.map(|index| &mut self.documents[index])
    }

    pub fn document(&self, id: DocumentId) -> Option<&SingleDocument> {
        self.documents.iter().find(|document| document.id() == id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut SingleDocument> {
        self.documents.iter_mut().find(|document| document.id() == id)
    }

    pub fn position(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|document| document.id() == id)
    }

    /// 依路徑尋找已開啟的文件。 / Finds the open document holding `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|document| document.path().is_some_and(|held| same_path(held, path)))
            .map(SingleDocument::id)
    }

    /// 仍有未儲存變更的文件（依分頁順序）。 / Documents with unsaved changes, in tab order.
    pub fn unsaved_documents(&self) -> Vec<DocumentId> {
        self.documents
            .iter()
            .filter(|document| document.is_modified())
            .map(SingleDocument::id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SingleDocument> {
        self.documents.iter()
    }

    pub fn add_listener(&mut self, listener: Box<dyn MultipleDocumentListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    fn allocate_id(&mut self) -> DocumentId {
        let id = DocumentId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_and_select(&mut self, document: SingleDocument) {
        let id = document.id();
        let previous = self.current_id();
        self.documents.push(document);
        self.current = Some(self.documents.len() - 1);
        for listener in self.listeners.iter_mut() {
            listener.document_added(id);
        }
        self.fire_current_changed(previous, Some(id));
    }

    fn fire_current_changed(&mut self, previous: Option<DocumentId>, current: Option<DocumentId>) {
        for listener in self.listeners.iter_mut() {
            listener.current_document_changed(previous, current);
        }
    }

    fn index_of(&self, id: DocumentId) -> Result<usize, DocumentSetError> {
        self.position(id)
            .ok_or(DocumentSetError::UnknownDocument(id))
    }
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSet")
            .field("documents", &self.documents)
            .field("current", &self.current)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a SingleDocument;
    type IntoIter = std::slice::Iter<'a, SingleDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// 比較兩個路徑；兩者皆存在時以正規化路徑比較。 / Compares paths, resolving both when they exist on disk.
fn same_path(left: &Path, right: &Path) -> bool {
    if left == right {
        return true;
    }
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
