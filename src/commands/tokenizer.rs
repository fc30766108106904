//! Argument splitting for slash commands.
//!
//! Arguments are whitespace separated. Single or double quotes group words
//! so that file paths with spaces survive: `/import "Q1 sales.xlsx"`.

/// Splits a command argument string into words.
///
/// Quotes may appear anywhere inside a word (`dir/"my file".csv`); escape
/// sequences are honoured only inside quotes. An unterminated quote runs to
/// the end of the input.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            if c == '"' || c == '\'' {
                quoted = true;
                word.push_str(&collect_quoted(&mut chars, c));
            } else {
                word.push(c);
            }
        }

        // `""` is a deliberate empty argument; anything else empty is noise
        if !word.is_empty() || quoted {
            tokens.push(word);
        }
    }

    tokens
}

/// Collects characters up to the closing quote, handling escapes.
fn collect_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> String {
    let mut result = String::new();
    let mut escaped = false;

    for c in chars.by_ref() {
        if escaped {
            match c {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                '\\' | '"' | '\'' => result.push(c),
                _ => {
                    result.push('\\');
                    result.push(c);
                }
            }
            escaped = false;
            continue;
        }

        if c == '\\' {
            escaped = true;
        } else if c == quote {
            break;
        } else {
            result.push(c);
        }
    }

    result
}
