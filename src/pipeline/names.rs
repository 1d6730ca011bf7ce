// names.rs
// Short display names. Members carry a free-text full name, leaders carry
// structured name fields, and the two keep separate templates.

/// Structured leader name fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub last: Option<&'a str>,
    pub first: Option<&'a str>,
    pub middle: Option<&'a str>,
}

/// `"Ivan Petrovich Sidorov"` -> `"Ivan P.S."`, `"Ivan Sidorov"` -> `"Ivan S."`,
/// `"Ivan"` -> `"Ivan"`. Parts past the third are ignored.
pub fn short_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{} {}.", first, initial(second)),
        [first, second, third, ..] => {
            format!("{} {}.{}.", first, initial(second), initial(third))
        }
    }
}

/// `"<last> <F>.<M>."`, `"<last> <F>."` without a middle name, or just the last name.
pub fn leader_short_name(parts: NameParts<'_>) -> String {
    let last = clean(parts.last).unwrap_or_default();

    match (clean(parts.first), clean(parts.middle)) {
        (Some(first), Some(middle)) => {
            format!("{} {}.{}.", last, initial(first), initial(middle))
        }
        (Some(first), None) => format!("{} {}.", last, initial(first)),
        _ => last.to_string(),
    }
}

fn clean(part: Option<&str>) -> Option<&str> {
    part.map(str::trim).filter(|s| !s.is_empty())
}

fn initial(part: &str) -> char {
    part.chars().next().unwrap_or(' ')
}
