//! Display names for settings keys. Purely cosmetic; the raw keys stay the
//! identifiers everywhere else.

const FIELD_LABEL_OVERRIDES: [(&str, &str); 6] = [
    ("Cache dir", "Cache directory"),
    ("Results dir", "Results directory"),
    ("Executor dir", "Executor directory"),
    ("Log stdout", "Log standard out"),
    ("Log dir", "Log directory"),
    ("Base dir", "Base directory"),
];

/// Menu entries and section headings: `cache_dir` -> `Cache Dir`, `sdk` -> `SDK`.
pub fn section_label(key: &str) -> String {
    match split_words(key, true) {
        Some(label) => label,
        None if matches!(key, "sdk" | "dask") => key.to_uppercase(),
        None => capitalize(key),
    }
}

/// Form input labels: `cache_dir` -> `Cache directory`, `log_level` -> `Log level`.
pub fn field_label(key: &str) -> String {
    let label = match split_words(key, false) {
        Some(label) => label,
        None if key == "sdk" => key.to_uppercase(),
        None => capitalize(key),
    };
    FIELD_LABEL_OVERRIDES
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(label)
}

/// Shortcuts to nested sections: `slurm` -> `SLURM`.
pub fn submenu_label(key: &str) -> String {
    match split_words(key, true) {
        Some(label) => label,
        None if matches!(key, "slurm" | "dask") => key.to_uppercase(),
        None => capitalize(key),
    }
}

/// Title for a partition heading: `client` -> `Client`.
pub fn partition_title(name: &str) -> String {
    capitalize(name)
}

/// Splits on the first underscore only; later underscores stay in the
/// second word.
fn split_words(key: &str, capitalize_second: bool) -> Option<String> {
    let (first, rest) = key.split_once('_')?;
    let second = if capitalize_second {
        capitalize(rest)
    } else {
        rest.to_string()
    };
    Some(format!("{} {}", capitalize(first), second))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
