//! Escaping and quoting rules shared by the lexer and the builder

/// Characters that end an unquoted word
pub(crate) fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | ';')
}

/// Whitespace as the lexer sees it
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Resolve the character following a backslash.
///
/// Only the active quote delimiter and the backslash itself collapse; every other
/// pair keeps its backslash so nginx can interpret it at runtime.
pub(crate) fn push_escaped(value: &mut String, next: char, quote: Option<char>) {
    if next == '\\' || Some(next) == quote {
        value.push(next);
    } else {
        value.push('\\');
        value.push(next);
    }
}

/// Whether a value must be wrapped in double quotes to survive a re-lex unchanged
pub fn needs_quotes(value: &str) -> bool {
    if value.is_empty() || value.ends_with('\\') || value.contains("\\\\") {
        return true;
    }

    value
        .chars()
        .any(|c| is_space(c) || is_structural(c) || matches!(c, '#' | '"' | '\''))
}

/// Wrap a value in double quotes, escaping `"` and `\`
pub fn enquote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
