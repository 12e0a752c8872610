use deunicode::deunicode_char;

/// Turns a display name into the token used for comparisons.
///
/// Non-ASCII characters are transliterated to their closest ASCII spelling
/// (characters without a known spelling are kept as they are), then all the
/// ASCII punctuation is removed. The case is preserved.
///
/// ```
/// use precinct_results::normalize;
///
/// assert_eq!(normalize("José A. Núñez-Smith, Jr."), "Jose A NunezSmith Jr");
/// ```
pub fn normalize(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii() {
            push_unpunctuated(&mut res, c);
            continue;
        }
        match deunicode_char(c) {
            Some(ascii) => {
                for t in ascii.chars() {
                    push_unpunctuated(&mut res, t);
                }
            }
            None => res.push(c),
        }
    }
    res
}

fn push_unpunctuated(res: &mut String, c: char) {
    if !c.is_ascii_punctuation() {
        res.push(c);
    }
}
