use std::borrow::Cow;

/// Expand `$1` .. `$9` in a property template from the rule's captures.
/// Groups that did not participate expand to nothing. An expanded value is
/// trimmed of trailing whitespace and dots so `"$1.$2"` with a missing minor
/// collapses to the major version.
///
/// Templates without placeholders are returned as-is.
pub(crate) fn expand<'a>(template: &'a str, captures: &fancy_regex::Captures) -> Cow<'a, str> {
    let Some(first) = template.find('$') else {
        return Cow::Borrowed(template);
    };

    let mut out = String::with_capacity(template.len());
    out.push_str(&template[..first]);

    let mut rest = &template[first..];
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match after.as_bytes().first().copied() {
            Some(d @ b'1'..=b'9') => {
                if let Some(m) = captures.get((d - b'0') as usize) {
                    out.push_str(m.as_str());
                }
                rest = &after[1..];
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    let keep = out
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .len();
    out.truncate(keep);
    Cow::Owned(out)
}

/// Version properties are reported with `_` separators by some platforms
/// (`CPU iPhone OS 17_1 like Mac OS X`).
pub(crate) fn normalise_version(name: &str, value: Cow<'_, str>) -> String {
    if name.ends_with("Version") && value.contains('_') {
        value.replace('_', ".")
    } else {
        value.into_owned()
    }
}
