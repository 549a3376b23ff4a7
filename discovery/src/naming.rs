//! Conversions between flag spellings and schema property names.

/// Converts a flag or placeholder to a camelCase property name.
///
/// Leading dashes are stripped and hyphen-separated words are joined with
/// the first letter of each later word upper-cased. An all-caps first word
/// (a placeholder like `FILE`) is lower-cased.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("--resource-group"), "resourceGroup");
/// assert_eq!(to_camel_case("-h"), "h");
/// assert_eq!(to_camel_case("FILE"), "file");
/// ```
pub fn to_camel_case(flag: &str) -> String {
    let bare = flag.trim_start_matches('-');
    let mut out = String::with_capacity(bare.len());

    for (index, word) in bare.split('-').filter(|word| !word.is_empty()).enumerate() {
        if index == 0 {
            if is_all_uppercase(word) {
                out.push_str(&word.to_lowercase());
            } else {
                out.push_str(word);
            }
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}

/// Converts a camelCase parameter key back to its kebab-case flag body.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::naming::to_kebab_case;
///
/// assert_eq!(to_kebab_case("resourceGroup"), "resource-group");
/// assert_eq!(to_kebab_case("generateSshKeys"), "generate-ssh-keys");
/// assert_eq!(to_kebab_case("name"), "name");
/// ```
pub fn to_kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;

    for ch in key.chars() {
        if ch.is_uppercase()
            && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
        {
            out.push('-');
        }
        out.extend(ch.to_lowercase());
        prev = Some(ch);
    }

    out
}

/// Returns `true` when the word has letters and none of them is lowercase.
pub fn is_all_uppercase(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}
