//! Byte offset and line helpers shared by the parser and the edit builders.
//!
//! Tree-sitter positions are zero-based. For user-facing messages, we prefer
//! one-based line and column numbers.

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}

/// Returns the byte offset at which the line containing `offset` starts.
pub(crate) fn line_start(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |newline| newline.saturating_add(1))
}

/// Returns the leading whitespace of the line containing `offset`.
pub(crate) fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = source.get(start..).unwrap_or_default();
    let width = line
        .char_indices()
        .find(|(_, ch)| *ch != ' ' && *ch != '\t')
        .map_or(line.len(), |(index, _)| index);
    line.get(..width).unwrap_or_default()
}

/// Re-indents every line after the first by `indent`.
///
/// Item text is rendered relative to column zero; once its insertion column
/// is known, continuation lines are shifted so nested literals line up.
pub(crate) fn reindent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_owned();
    }
    text.replace('\n', &format!("\n{indent}"))
}
