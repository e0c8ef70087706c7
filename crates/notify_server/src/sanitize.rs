/// Flatten a notification body into something that fits on one line.
///
/// Most clients send markup regardless of the capabilities we advertise, so this does a single
/// forward pass that
/// - turns newlines and tabs into spaces (even inside a tag or entity),
/// - drops everything from `<` up to and including the next `>`,
/// - replaces everything from `&` up to and including the next `;` with a single space,
/// - copies everything else.
///
/// This is not an HTML parser: nested tags are not understood, and an unmatched `<` or `&`
/// swallows the rest of the text. A `>` or `;` outside of a tag or entity is kept as-is.
pub fn strip_body(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_entity = false;

    for c in text.chars() {
        match c {
            '\n' | '\t' => out.push(' '),
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            '&' => in_entity = true,
            ';' if in_entity => {
                in_entity = false;
                out.push(' ');
            }
            c if !in_tag && !in_entity => out.push(c),
            _ => {}
        }
    }
    out
}
