//! Redis-style glob matching used by the in-memory store and scan patterns.

/// Characters with a special meaning in a Redis glob.
const GLOB_META: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Escapes glob metacharacters so `literal` only matches itself.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if GLOB_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Checks whether `text` matches a Redis-style glob `pattern`.
///
/// Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\x` escapes.
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches_from(&pattern, &text)
}

fn matches_from(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Backtrack point for the most recent `*`: (pattern index after star, text index)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        let step = if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    star = Some((p + 1, t));
                    p += 1;
                    continue;
                }
                '?' => Some(p + 1),
                '[' => match_class(pattern, p, text[t]),
                '\\' if p + 1 < pattern.len() => (pattern[p + 1] == text[t]).then_some(p + 2),
                c => (c == text[t]).then_some(p + 1),
            }
        } else {
            None
        };

        match step {
            Some(next) => {
                p = next;
                t += 1;
            }
            None => match star {
                Some((after_star, from)) => {
                    p = after_star;
                    t = from + 1;
                    star = Some((after_star, from + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Matches `c` against the class opening at `pattern[open]`.
///
/// Returns the index just past the closing `]` on a match.
fn match_class(pattern: &[char], open: usize, c: char) -> Option<usize> {
    let mut i = open + 1;
    let negated = pattern.get(i) == Some(&'^');
    if negated {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != ']' {
        if pattern[i] == '\\' && i + 1 < pattern.len() {
            matched |= pattern[i + 1] == c;
            i += 2;
        } else if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' {
            let (lo, hi) = ordered(pattern[i], pattern[i + 2]);
            matched |= (lo..=hi).contains(&c);
            i += 3;
        } else {
            matched |= pattern[i] == c;
            i += 1;
        }
    }

    // Unterminated class: Redis treats the end of pattern as the close
    if matched != negated {
        Some((i + 1).min(pattern.len()))
    } else {
        None
    }
}

fn ordered(a: char, b: char) -> (char, char) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
