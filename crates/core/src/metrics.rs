use crate::editor::EditorBuffer;

/// 文件統計資訊。 / Summary counts for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentStatistics {
    pub characters: usize,
    pub non_blank_characters: usize,
    pub lines: usize,
}

/// 狀態列顯示的游標資訊（行列從 1 起算）。 / Caret information for the status bar; line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretStatus {
    pub length: usize,
    pub line: usize,
    pub column: usize,
    pub selection: usize,
}

/// 計算字元數、非空白字元數與行數。 / Counts characters, non-whitespace characters and lines.
///
/// Lines are terminators plus one; `\r\n` counts as a single terminator.
pub fn collect_statistics(text: &str) -> DocumentStatistics {
    let mut stats = DocumentStatistics {
        lines: 1,
        ..DocumentStatistics::default()
    };
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        stats.characters += 1;
        if !ch.is_whitespace() {
            stats.non_blank_characters += 1;
        }
        match ch {
            '\n' => stats.lines += 1,
            '\r' if chars.peek() != Some(&'\n') => stats.lines += 1,
            _ => {}
        }
    }
    stats
}

/// 取得游標所在行列及選取長度。 / Caret line, column and selection length, all in characters.
pub fn caret_status(buffer: &EditorBuffer) -> CaretStatus {
    let text = buffer.contents();
    let selection = buffer.clamped_selection();
    let before_caret = &text[..selection.head()];
    let line_start = before_caret.rfind('\n').map_or(0, |offset| offset + 1);

    CaretStatus {
        length: text.chars().count(),
        line: before_caret.matches('\n').count() + 1,
        column: before_caret[line_start..].chars().count() + 1,
        selection: text[selection.start()..selection.end()].chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Selection;

    #[test]
    fn statistics_count_characters_and_lines() {
        let stats = collect_statistics("ab c\nčd\n");
        assert_eq!(stats.characters, 8);
        assert_eq!(stats.non_blank_characters, 5);
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn empty_text_has_one_line() {
        assert_eq!(
            collect_statistics(""),
            DocumentStatistics {
                characters: 0,
                non_blank_characters: 0,
                lines: 1,
            }
        );
    }

    #[test]
    fn crlf_counts_as_one_terminator() {
        assert_eq!(collect_statistics("a\r\nb\r\n").lines, 3);
        assert_eq!(collect_statistics("a\rb").lines, 2);
        assert_eq!(collect_statistics("a\r").lines, 2);
    }

    #[test]
    fn caret_status_reports_one_based_position() {
        let buffer =
            EditorBuffer::with_selection("první\nřádek", Selection::new(7, 11)).unwrap();
        let status = caret_status(&buffer);
        assert_eq!(status.length, 11);
        assert_eq!(status.line, 2);
        // "ř" is two bytes; the head sits after "řá".
        assert_eq!(status.column, 3);
        assert_eq!(status.selection, 2);
    }

    #[test]
    fn caret_status_at_start() {
        let status = caret_status(&EditorBuffer::new("abc"));
        assert_eq!(
            status,
            CaretStatus {
                length: 3,
                line: 1,
                column: 1,
                selection: 0,
            }
        );
    }
}
