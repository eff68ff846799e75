//! English singularization for collection item names.
//!
//! `users` gives `addUser`/`removeUser`. Only the last word of a lowerCamelCase name is
//! inflected, so `userGroups` becomes `userGroup`.

use once_cell::sync::Lazy;
use regex::Regex;

const UNINFLECTED: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "media",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("leaves", "leaf"),
    ("men", "man"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("people", "person"),
    ("teeth", "tooth"),
    ("women", "woman"),
];

static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(quiz)zes$", "${1}"),
        (r"(?i)(matr)ices$", "${1}ix"),
        (r"(?i)(vert|ind)ices$", "${1}ex"),
        (r"(?i)(alias|status|campus)(es)?$", "${1}"),
        (r"(?i)(octop|vir)(i|uses)$", "${1}us"),
        (r"(?i)^(a)x[ie]s$", "${1}xis"),
        (r"(?i)(cris|test)(is|es)$", "${1}is"),
        (r"(?i)(analy|diagno|parenthe|progno|synop|the)ses$", "${1}sis"),
        (r"(?i)(shoe|toe)s$", "${1}"),
        (r"(?i)(o)es$", "${1}"),
        (r"(?i)(bus)(es)?$", "${1}"),
        (r"(?i)(x|ch|ss|sh|zz)es$", "${1}"),
        (r"(?i)(m)ovies$", "${1}ovie"),
        (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
        (r"(?i)([lr])ves$", "${1}f"),
        (r"(?i)(tive|hive)s$", "${1}"),
        (r"(?i)([^f])ves$", "${1}fe"),
        (r"(?i)([ti])a$", "${1}um"),
        (r"(?i)(ss|us|is)$", "${1}"),
        (r"(?i)s$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = Regex::new(pattern).expect("inflection rule is valid");
        (regex, replacement)
    })
    .collect()
});

/// Returns the singular form of a (possibly lowerCamelCase) plural name.
pub fn singularize(name: &str) -> String {
    let split = name
        .char_indices()
        .filter(|(_, c)| c.is_ascii_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, word) = name.split_at(split);
    format!("{}{}", head, singularize_word(word))
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNINFLECTED.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return match_case(word, singular);
    }

    for (regex, replacement) in RULES.iter() {
        if regex.is_match(word) {
            return regex.replace(word, *replacement).into_owned();
        }
    }

    word.to_string()
}

/// Applies the case of `template`'s first letter to `word`.
fn match_case(template: &str, word: &str) -> String {
    let capitalized = template.chars().next().is_some_and(|c| c.is_uppercase());
    if !capitalized {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
