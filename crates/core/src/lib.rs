pub mod collation;
pub mod document;
pub mod document_set;
pub mod editor;
pub mod line_ops;
pub mod listeners;
pub mod metrics;

pub use collation::{
    collator_for, CodepointCollator, CollationError, LineCollator, LocaleCollator,
};
pub use document::{
    read_text, write_text, DocumentError, DocumentId, SingleDocument, SingleDocumentListener,
};
pub use document_set::{DocumentSet, DocumentSetError, MultipleDocumentListener};
pub use editor::{EditOperation, EditorBuffer, EditorError, Selection};
pub use line_ops::{
    convert_case, convert_selection_case, dedup_lines, dedup_selected_lines, invert_case,
    sort_lines, sort_selected_lines, CaseTransform, SortOrder,
};
pub use listeners::{ListenerId, ListenerRegistry};
pub use metrics::{caret_status, collect_statistics, CaretStatus, DocumentStatistics};
