use crate::engine::ModuleExports;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Class names exported by a CSS module: JS binding name -> scoped class name.
///
/// Sorted so that the generated module is stable across runs.
pub type ClassNameMap = BTreeMap<String, String>;

fn hyphen_letter_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"-([a-z])").unwrap())
}

/// Rewrite every `-x` (lowercase ASCII letter) into `X`.
///
/// All other characters pass through unchanged, and the result is not
/// checked to be a legal JavaScript identifier:
///
/// ```
/// use css_inject::naming::camel_case;
///
/// assert_eq!(camel_case("button-primary"), "buttonPrimary");
/// assert_eq!(camel_case("a--b"), "a-B");
/// assert_eq!(camel_case("foo-Bar"), "foo-Bar");
/// ```
pub fn camel_case(name: &str) -> Cow<'_, str> {
    hyphen_letter_regex().replace_all(name, |caps: &Captures| caps[1].to_ascii_uppercase())
}

/// Build the exported class-name map from the engine's CSS Modules exports.
///
/// When several class names camel-case to the same key, a class spelled
/// exactly like the key wins; otherwise the lexicographically first
/// original name does. The result never depends on hash order.
pub fn class_name_map(exports: &ModuleExports) -> ClassNameMap {
    let mut originals: Vec<_> = exports.iter().collect();
    originals.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut map = ClassNameMap::new();
    for (original, export) in originals {
        let key = camel_case(original);
        if key == original.as_str() {
            map.insert(key.into_owned(), export.name.clone());
        } else {
            map.entry(key.into_owned()).or_insert_with(|| export.name.clone());
        }
    }
    map
}
