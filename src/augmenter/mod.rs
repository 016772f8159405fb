//! Turns significant indentation into explicit scope markers.
//!
//! Every non-blank line gets a trailing `;`. A deeper indentation level opens
//! one `{` per level and a shallower one closes one `}` per level, both placed
//! in front of the line's content. Line breaks are kept, so a position in the
//! augmented text is on the same line as in the original source.


pub const INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AugmentError {
    #[error("line {line}: tabs are not allowed")]
    Tab { line: usize },
    #[error("line {line}: indentation of {spaces} spaces is not a multiple of {INDENT_WIDTH}")]
    Indentation { line: usize, spaces: usize },
}

pub fn augment(source: &str) -> Result<String, AugmentError> {
    let mut lines = Vec::new();
    let mut level = 0;

    for (index, line) in source.split('\n').enumerate() {
        let line_number = index + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.contains('\t') {
            return Err(AugmentError::Tab { line: line_number });
        }

        let code = strip_comment(line);
        let content = code.trim_start_matches(' ');
        if content.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let spaces = code.len() - content.len();
        if spaces % INDENT_WIDTH != 0 {
            return Err(AugmentError::Indentation {
                line: line_number,
                spaces,
            });
        }
        let new_level = spaces / INDENT_WIDTH;

        let mut augmented = String::new();
        if new_level > level {
            augmented.push_str(&"{".repeat(new_level - level));
        } else if new_level < level {
            augmented.push_str(&"}".repeat(level - new_level));
        }
        augmented.push_str(content.trim_end());
        augmented.push(';');
        lines.push(augmented);
        level = new_level;
    }

    let mut augmented = lines.join("\n");
    augmented.push_str(&"}".repeat(level));
    Ok(augmented)
}

/// Cuts the line at the first `#` that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}
