use std::cmp::Ordering;

use thiserror::Error;

/// 以錨點與游標端點描述的選取範圍（位元組偏移）。 / Selection described by an anchor and a head, as byte offsets.
///
/// The head is where the caret sits; the anchor is where the selection started.
/// An empty selection (`anchor == head`) is a plain caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    anchor: usize,
    head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// 建立沒有選取文字的游標。 / Creates an empty selection (a bare caret).
    pub fn caret(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// 範圍起點。 / Returns the lower bound of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// 範圍終點。 / Returns the upper bound of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    fn clamp(&mut self, text: &str) {
        self.anchor = floor_char_boundary(text, self.anchor);
        self.head = floor_char_boundary(text, self.head);
    }
}

/// 編輯器緩衝區錯誤。 / Error conditions exposed by the editing buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("offset {index} is out of bounds for buffer of length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("offset {index} does not fall on a character boundary")]
    NotCharBoundary { index: usize },
    #[error("edit operations overlap and cannot be applied safely")]
    OverlappingEdits,
    #[error("line {line} is out of range for a buffer with {count} lines")]
    LineOutOfRange { line: usize, count: usize },
}

/// 描述一段待取代的編輯操作。 / Represents a replacement operation within the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOperation {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// 帶有單一選取範圍的文字緩衝。 / Text buffer with a single selection.
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    contents: String,
    selection: Selection,
}

impl Default for Selection {
    fn default() -> Self {
        Self::caret(0)
    }
}

impl EditorBuffer {
    /// 從給定文字建立緩衝區，游標位於開頭。 / Creates a buffer with the caret at the start.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            contents: text.into(),
            selection: Selection::caret(0),
        }
    }

    /// 以指定選取範圍建立緩衝區。 / Creates a buffer with an explicit selection.
    pub fn with_selection(
        text: impl Into<String>,
        selection: Selection,
    ) -> Result<Self, EditorError> {
        let mut buffer = Self::new(text);
        buffer.set_selection(selection)?;
        Ok(buffer)
    }

    /// 取得目前的內容。 / Returns the current buffer contents.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// 提供給 GUI 文字元件直接編輯的字串。 / Mutable access for toolkit text widgets.
    ///
    /// Edits made through this reference do not move the selection; callers
    /// report the widget's cursor back with [`EditorBuffer::set_selection_chars`].
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// 選取範圍，已修正至有效的字元邊界。 / Selection clamped onto valid character boundaries.
    pub fn clamped_selection(&self) -> Selection {
        let mut selection = self.selection.clone();
        selection.clamp(&self.contents);
        selection
    }

    /// 設定選取範圍；偏移必須落在字元邊界。 / Sets the selection; both offsets must be character boundaries.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditorError> {
        self.validate_offset(selection.anchor)?;
        self.validate_offset(selection.head)?;
        self.selection = selection;
        Ok(())
    }

    /// 以字元索引設定選取範圍（超出範圍會被截斷）。 / Sets the selection from char indices, clamping past-the-end values.
    pub fn set_selection_chars(&mut self, anchor: usize, head: usize) {
        let anchor = char_to_byte(&self.contents, anchor);
        let head = char_to_byte(&self.contents, head);
        self.selection = Selection::new(anchor, head);
    }

    /// 以字元索引回傳 `(anchor, head)`。 / Returns `(anchor, head)` as char indices.
    pub fn selection_chars(&self) -> (usize, usize) {
        let selection = self.clamped_selection();
        let to_chars = |offset: usize| self.contents[..offset].chars().count();
        (to_chars(selection.anchor), to_chars(selection.head))
    }

    /// 選取第 `first` 到 `last` 行（從 0 起算，不含最後一行的換行）。 / Selects lines `first..=last` (zero-based), stopping before the last line's terminator.
    pub fn select_lines(&mut self, first: usize, last: usize) -> Result<(), EditorError> {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        let count = self.line_count();
        if last >= count {
            return Err(EditorError::LineOutOfRange { line: last, count });
        }
        let start = line_start_offset(&self.contents, first);
        let end = if last + 1 < count {
            let terminator = line_start_offset(&self.contents, last + 1) - 1;
            if self.contents[..terminator].ends_with('\r') {
                terminator - 1
            } else {
                terminator
            }
        } else {
            self.contents.len()
        };
        self.selection = Selection::new(start, end);
        Ok(())
    }

    /// 取得選取的文字。 / Returns the selected text.
    pub fn selected_text(&self) -> &str {
        let selection = self.clamped_selection();
        &self.contents[selection.start()..selection.end()]
    }

    /// 行數；空文件視為一行。 / Number of lines; an empty buffer has one line.
    pub fn line_count(&self) -> usize {
        self.contents.matches('\n').count() + 1
    }

    /// 以新文字取代指定範圍。 / Replaces `start..end` with `text`.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) -> Result<(), EditorError> {
        self.apply_edit_plan(vec![EditOperation {
            start,
            end,
            text: text.to_string(),
        }])
    }

    /// 以文字取代選取範圍，游標移到插入文字之後。 / Replaces the selection with `text` and leaves the caret after it.
    ///
    /// Returns `false` when nothing changed (empty selection and empty text).
    pub fn replace_selection(&mut self, text: &str) -> Result<bool, EditorError> {
        let selection = self.clamped_selection();
        if selection.is_empty() && text.is_empty() {
            return Ok(false);
        }
        let start = selection.start();
        self.replace_range(start, selection.end(), text)?;
        self.selection = Selection::caret(start + text.len());
        Ok(true)
    }

    /// 直接套用一組互不重疊的編輯操作。 / Applies a list of non-overlapping edit operations.
    pub fn apply_edit_plan(&mut self, operations: Vec<EditOperation>) -> Result<(), EditorError> {
        if operations.is_empty() {
            return Ok(());
        }
        for op in &operations {
            self.validate_offset(op.start)?;
            self.validate_offset(op.end)?;
        }

        let mut order: Vec<usize> = (0..operations.len()).collect();
        order.sort_by(|&a, &b| {
            let left = &operations[a];
            let right = &operations[b];
            match left.start.min(left.end).cmp(&right.start.min(right.end)) {
                Ordering::Equal => left.end.cmp(&right.end),
                other => other,
            }
        });
        // 確保取代區段不重疊。 / Ensure edits do not overlap.
        for window in order.windows(2) {
            let left = &operations[window[0]];
            let right = &operations[window[1]];
            if left.start.max(left.end) > right.start.min(right.end) {
                return Err(EditorError::OverlappingEdits);
            }
        }

        let mut offset: isize = 0;
        for &index in &order {
            let op = &operations[index];
            let (start, end) = (op.start.min(op.end), op.start.max(op.end));
            let adjusted_start = (start as isize + offset) as usize;
            let adjusted_end = (end as isize + offset) as usize;
            self.contents
                .replace_range(adjusted_start..adjusted_end, &op.text);
            offset += op.text.len() as isize - (end - start) as isize;
        }

        self.selection.clamp(&self.contents);
        Ok(())
    }

    fn validate_offset(&self, index: usize) -> Result<(), EditorError> {
        let len = self.contents.len();
        if index > len {
            return Err(EditorError::OutOfBounds { index, len });
        }
        if !self.contents.is_char_boundary(index) {
            return Err(EditorError::NotCharBoundary { index });
        }
        Ok(())
    }
}

/// 將字元索引轉為位元組偏移；超出範圍時回傳文字長度。 / Converts a char index into a byte offset, saturating at the end.
pub(crate) fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn line_start_offset(text: &str, line: usize) -> usize {
    if line == 0 {
        return 0;
    }
    text.match_indices('\n')
        .nth(line - 1)
        .map(|(offset, _)| offset + 1)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_orders_bounds_but_keeps_direction() {
        let selection = Selection::new(7, 2);
        assert_eq!(selection.start(), 2);
        assert_eq!(selection.end(), 7);
        assert_eq!(selection.head(), 2);
        assert_eq!(selection.len(), 5);
    }

    #[test]
    fn set_selection_rejects_offsets_inside_a_character() {
        let mut buffer = EditorBuffer::new("ščž");
        let err = buffer.set_selection(Selection::new(0, 1)).unwrap_err();
        assert_eq!(err, EditorError::NotCharBoundary { index: 1 });
        let err = buffer.set_selection(Selection::caret(99)).unwrap_err();
        assert!(matches!(err, EditorError::OutOfBounds { index: 99, .. }));
    }

    #[test]
    fn char_selection_maps_to_bytes() {
        let mut buffer = EditorBuffer::new("čaša vode");
        buffer.set_selection_chars(0, 4);
        assert_eq!(buffer.selected_text(), "čaša");
        buffer.set_selection_chars(5, 100);
        assert_eq!(buffer.selected_text(), "vode");
        assert_eq!(buffer.selection_chars(), (5, 9));
    }

    #[test]
    fn replace_selection_moves_caret_after_inserted_text() {
        let mut buffer = EditorBuffer::with_selection("hello world", Selection::new(6, 11)).unwrap();
        assert!(buffer.replace_selection("čaj").unwrap());
        assert_eq!(buffer.contents(), "hello čaj");
        assert_eq!(buffer.selection(), &Selection::caret(10));

        let mut caret = EditorBuffer::with_selection("ab", Selection::caret(1)).unwrap();
        assert!(!caret.replace_selection("").unwrap());
        assert!(caret.replace_selection("-").unwrap());
        assert_eq!(caret.contents(), "a-b");
    }

    #[test]
    fn select_lines_stops_before_last_terminator() {
        let mut buffer = EditorBuffer::new("one\ntwo\nthree");
        buffer.select_lines(1, 2).unwrap();
        assert_eq!(buffer.selected_text(), "two\nthree");
        buffer.select_lines(0, 0).unwrap();
        assert_eq!(buffer.selected_text(), "one");
        let mut crlf = EditorBuffer::new("a\r\nb\r\n");
        crlf.select_lines(0, 1).unwrap();
        assert_eq!(crlf.selected_text(), "a\r\nb");
        let err = buffer.select_lines(0, 3).unwrap_err();
        assert_eq!(err, EditorError::LineOutOfRange { line: 3, count: 3 });
    }

    #[test]
    fn apply_edit_plan_replaces_segments() {
        let mut buffer = EditorBuffer::new("line1\nline2\nline3");
        buffer
            .apply_edit_plan(vec![
                EditOperation {
                    start: 6,
                    end: 11,
                    text: "LINE2".into(),
                },
                EditOperation {
                    start: 0,
                    end: 5,
                    text: "L1".into(),
                },
            ])
            .unwrap();
        assert_eq!(buffer.contents(), "L1\nLINE2\nline3");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let mut buffer = EditorBuffer::new("abcdef");
        let result = buffer.apply_edit_plan(vec![
            EditOperation {
                start: 0,
                end: 4,
                text: String::new(),
            },
            EditOperation {
                start: 3,
                end: 6,
                text: String::new(),
            },
        ]);
        assert_eq!(result, Err(EditorError::OverlappingEdits));
        assert_eq!(buffer.contents(), "abcdef");
    }

    #[test]
    fn selection_is_clamped_after_shrinking_edit() {
        let mut buffer = EditorBuffer::with_selection("hello world", Selection::new(6, 11)).unwrap();
        buffer.replace_range(0, 11, "hi").unwrap();
        assert_eq!(buffer.selection().end(), 2);
    }
}
