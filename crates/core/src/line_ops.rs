use std::collections::HashSet;

use crate::collation::LineCollator;
use crate::editor::{EditOperation, EditorBuffer, EditorError, Selection};

/// 指定要進行大小寫轉換的模式。 / Enumerates supported case conversion transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseTransform {
    Upper,
    Lower,
    Invert,
}

/// 指定行排序的方向。 / Direction used when sorting lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// 依排序器排序各行；相等的行維持原順序。 / Sorts lines with `collator`; equal lines keep their relative order.
pub fn sort_lines<'a>(
    lines: &[&'a str],
    order: SortOrder,
    collator: &dyn LineCollator,
) -> Vec<&'a str> {
    let mut sorted = lines.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = collator.compare(a, b);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    sorted
}

/// 移除重複行，僅保留首次出現。 / Deduplicates lines while preserving first occurrence order.
pub fn dedup_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .copied()
        .filter(|line| seen.insert(*line))
        .collect()
}

/// 逐字元轉換大小寫。 / Converts the case of every character.
pub fn convert_case(input: &str, transform: CaseTransform) -> String {
    match transform {
        CaseTransform::Upper => input.to_uppercase(),
        CaseTransform::Lower => input.to_lowercase(),
        CaseTransform::Invert => invert_case(input),
    }
}

/// 反轉每個字母的大小寫，其他字元不變。 / Swaps the case of each letter; other characters are unchanged.
pub fn invert_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_lowercase() {
            result.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// 排序選取範圍涵蓋的各行。 / Sorts the lines touched by the selection.
///
/// Returns `true` when the text changed.
pub fn sort_selected_lines(
    buffer: &mut EditorBuffer,
    order: SortOrder,
    collator: &dyn LineCollator,
) -> Result<bool, EditorError> {
    rewrite_selected_lines(buffer, |lines| sort_lines(lines, order, collator))
}

/// 移除選取範圍內的重複行。 / Removes duplicate lines within the selection.
pub fn dedup_selected_lines(buffer: &mut EditorBuffer) -> Result<bool, EditorError> {
    rewrite_selected_lines(buffer, dedup_lines)
}

/// 轉換選取文字的大小寫；沒有選取時不做任何事。 / Converts the case of the selected text; no-op without a selection.
pub fn convert_selection_case(
    buffer: &mut EditorBuffer,
    transform: CaseTransform,
) -> Result<bool, EditorError> {
    let selection = buffer.clamped_selection();
    if selection.is_empty() {
        return Ok(false);
    }

    let (start, end) = (selection.start(), selection.end());
    let original = &buffer.contents()[start..end];
    let converted = convert_case(original, transform);
    if converted == original {
        return Ok(false);
    }

    let converted_len = converted.len();
    buffer.apply_edit_plan(vec![EditOperation {
        start,
        end,
        text: converted,
    }])?;
    buffer.set_selection(Selection::new(start, start + converted_len))?;
    Ok(true)
}

fn rewrite_selected_lines<F>(buffer: &mut EditorBuffer, transform: F) -> Result<bool, EditorError>
where
    F: for<'a> FnOnce(&[&'a str]) -> Vec<&'a str>,
{
    let text = buffer.contents();
    let line_indices = target_lines(buffer.clamped_selection(), text);
    let range_start = line_indices[0].start;
    let range_end = line_indices[line_indices.len() - 1].end();

    let lines: Vec<&str> = line_indices.iter().map(|line| line.content(text)).collect();
    let rewritten = transform(&lines);

    // 每一行位置保留原本的換行符號。 / Each slot keeps the terminator that was there before.
    let mut joined = String::with_capacity(range_end - range_start);
    for (slot, line) in line_indices.iter().enumerate() {
        if let Some(content) = rewritten.get(slot) {
            joined.push_str(content);
            joined.push_str(line.terminator(text));
        }
    }
    if rewritten.len() < line_indices.len() {
        // 刪除行後，最後一行沿用原範圍結尾的換行。 / After removals the range ends like the original range did.
        let last_terminator = line_indices[line_indices.len() - 1].terminator(text);
        let kept_terminator = line_indices[rewritten.len().saturating_sub(1)].terminator(text);
        joined.truncate(joined.len() - kept_terminator.len());
        joined.push_str(last_terminator);
    }

    if joined == text[range_start..range_end] {
        return Ok(false);
    }

    // 新選取停在最後一行的換行之前。 / The new selection ends before the last line's terminator.
    let last_terminator_len = line_indices[line_indices.len() - 1].terminator(text).len();
    let new_end = range_start + joined.len() - last_terminator_len;
    buffer.apply_edit_plan(vec![EditOperation {
        start: range_start,
        end: range_end,
        text: joined,
    }])?;
    buffer.set_selection(Selection::new(range_start, new_end))?;
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    start: usize,
    content_len: usize,
    newline_len: usize,
}

impl LineSpan {
    fn end(&self) -> usize {
        self.start + self.content_len + self.newline_len
    }

    fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.start + self.content_len]
    }

    fn terminator<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start + self.content_len..self.end()]
    }
}

fn target_lines(selection: Selection, text: &str) -> Vec<LineSpan> {
    let line_meta = compute_line_boundaries(text);
    let start_line = find_line_for_index(selection.start(), &line_meta);
    let end_line = if selection.is_empty() {
        start_line
    } else {
        find_line_for_index(selection.end(), &line_meta)
    };
    line_meta[start_line..=end_line].to_vec()
}

fn compute_line_boundaries(text: &str) -> Vec<LineSpan> {
    let mut results = Vec::new();
    let mut cursor = 0usize;
    for segment in text.split_inclusive('\n') {
        let content = segment
            .strip_suffix('\n')
            .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
            .unwrap_or(segment);
        results.push(LineSpan {
            start: cursor,
            content_len: content.len(),
            newline_len: segment.len() - content.len(),
        });
        cursor += segment.len();
    }

    if text.is_empty() || text.ends_with('\n') {
        results.push(LineSpan {
            start: text.len(),
            content_len: 0,
            newline_len: 0,
        });
    }

    results
}

fn find_line_for_index(index: usize, lines: &[LineSpan]) -> usize {
    lines
        .iter()
        .position(|line| index < line.end())
        .unwrap_or(lines.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{CodepointCollator, LocaleCollator};

    fn buffer_with_selection(text: &str, start: usize, end: usize) -> EditorBuffer {
        EditorBuffer::with_selection(text, Selection::new(start, end)).unwrap()
    }

    #[test]
    fn sort_lines_in_both_directions() {
        let lines = ["b", "a", "c"];
        assert_eq!(
            sort_lines(&lines, SortOrder::Ascending, &CodepointCollator),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            sort_lines(&lines, SortOrder::Descending, &CodepointCollator),
            vec!["c", "b", "a"]
        );
    }

    #[test]
    fn sort_lines_uses_language_rules() {
        let collator = LocaleCollator::new("hr").unwrap();
        let lines = ["dan", "čaj", "cvijet"];
        assert_eq!(
            sort_lines(&lines, SortOrder::Ascending, &collator),
            vec!["cvijet", "čaj", "dan"]
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_lines(&["x", "y", "x", "z"]), vec!["x", "y", "z"]);
        assert_eq!(dedup_lines(&["A", "a"]), vec!["A", "a"]);
    }

    #[test]
    fn invert_case_leaves_non_letters_alone() {
        assert_eq!(invert_case("AbC1"), "aBc1");
        assert_eq!(convert_case("Šuma 7", CaseTransform::Upper), "ŠUMA 7");
        assert_eq!(convert_case("Šuma 7", CaseTransform::Lower), "šuma 7");
    }

    #[test]
    fn sort_selected_lines_keeps_terminators_in_place() {
        let mut buffer = buffer_with_selection("b\na\nc", 0, 5);
        let changed =
            sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert!(changed);
        assert_eq!(buffer.contents(), "a\nb\nc");
        assert_eq!(buffer.selected_text(), "a\nb\nc");
    }

    #[test]
    fn selection_touching_part_of_a_line_covers_the_whole_line() {
        // Selection starts inside "zeta" and ends inside "alpha".
        let mut buffer = buffer_with_selection("head\nzeta\nalpha\ntail\n", 7, 12);
        sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert_eq!(buffer.contents(), "head\nalpha\nzeta\ntail\n");
        assert_eq!(buffer.selected_text(), "alpha\nzeta");

        // Repeating the sort touches the same lines.
        let changed =
            sort_selected_lines(&mut buffer, SortOrder::Descending, &CodepointCollator).unwrap();
        assert!(changed);
        assert_eq!(buffer.contents(), "head\nzeta\nalpha\ntail\n");
    }

    #[test]
    fn selection_ending_at_line_start_includes_that_line() {
        let mut buffer = buffer_with_selection("c\nb\na\n", 0, 4);
        sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert_eq!(buffer.contents(), "a\nb\nc\n");
        assert_eq!(buffer.selected_text(), "a\nb\nc");
    }

    #[test]
    fn selection_reaching_the_end_includes_the_empty_last_line() {
        let mut buffer = buffer_with_selection("b\na\n", 0, 4);
        sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert_eq!(buffer.contents(), "\na\nb");
    }

    #[test]
    fn sorting_already_sorted_lines_reports_no_change() {
        let mut buffer = buffer_with_selection("a\nb\n", 0, 3);
        let changed =
            sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert!(!changed);
    }

    #[test]
    fn dedup_selected_lines_preserves_trailing_shape() {
        let mut buffer = buffer_with_selection("x\ny\nx\nz", 0, 7);
        assert!(dedup_selected_lines(&mut buffer).unwrap());
        assert_eq!(buffer.contents(), "x\ny\nz");

        let mut buffer = buffer_with_selection("x\nx\nkeep", 0, 3);
        assert!(dedup_selected_lines(&mut buffer).unwrap());
        assert_eq!(buffer.contents(), "x\nkeep");
        assert_eq!(buffer.selected_text(), "x");
    }

    #[test]
    fn crlf_terminators_survive_sorting() {
        let mut buffer = buffer_with_selection("b\r\na\r\n", 0, 4);
        sort_selected_lines(&mut buffer, SortOrder::Ascending, &CodepointCollator).unwrap();
        assert_eq!(buffer.contents(), "a\r\nb\r\n");
    }

    #[test]
    fn case_conversion_applies_to_selected_text_only() {
        let mut buffer = buffer_with_selection("hello world", 6, 11);
        assert!(convert_selection_case(&mut buffer, CaseTransform::Upper).unwrap());
        assert_eq!(buffer.contents(), "hello WORLD");
        assert_eq!(buffer.selected_text(), "WORLD");

        let mut caret_only = buffer_with_selection("hello", 2, 2);
        assert!(!convert_selection_case(&mut caret_only, CaseTransform::Upper).unwrap());
        assert_eq!(caret_only.contents(), "hello");
    }

    #[test]
    fn case_conversion_tracks_length_changes() {
        let mut buffer = buffer_with_selection("straße!", 0, 8);
        convert_selection_case(&mut buffer, CaseTransform::Upper).unwrap();
        assert_eq!(buffer.contents(), "STRASSE!");
        assert_eq!(buffer.selected_text(), "STRASSE!");
    }
}
