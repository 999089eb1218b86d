use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Score that takes an image out of the running.
pub const EXCLUDED_SCORE: f64 = -1000.0;

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    // [[File:Name.jpg]], [[:File:Name.jpg|label]], [[image:Name.jpg]]
    LINK.get_or_init(|| {
        Regex::new(r"(?i)\[\[:?\s*(?:file|image)\s*:([^|\]\[]+)").expect("static link regex")
    })
}

/// File names that must never become a page image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Denylist {
    names: HashSet<String>,
}

impl Denylist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        list.extend(names);
        list
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let key = db_key(name.as_ref());
            if !key.is_empty() {
                self.names.insert(key);
            }
        }
    }

    /// Adds every file link found in denylist wikitext, one list item per line:
    ///
    /// ```text
    /// * [[File:Placeholder.svg]]
    /// * [[:File:Flag of Nowhere.png|flag]]
    /// ```
    pub fn extend_from_wikitext(&mut self, text: &str) {
        let names: Vec<&str> = link_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        self.extend(names);
    }

    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read denylist file {}", path.display()))?;
        let before = self.names.len();
        self.extend_from_wikitext(&text);
        log::debug!(
            "Loaded {} denylist entries from {}",
            self.names.len() - before,
            path.display()
        );
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        !self.is_empty() && self.names.contains(&db_key(file_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Normalises a file name the way titles are stored: trimmed, spaces as
/// underscores, first letter upper-cased.
#[must_use]
pub fn db_key(name: &str) -> String {
    let underscored = name.trim().replace(' ', "_");
    let trimmed = underscored.trim_matches('_');
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_names_to_db_keys() {
        assert_eq!(db_key(" flag of nowhere.png "), "Flag_of_nowhere.png");
        assert_eq!(db_key("A.jpg"), "A.jpg");
        assert_eq!(db_key("   "), "");
    }

    #[test]
    fn matches_regardless_of_spacing_and_first_letter_case() {
        let list = Denylist::new(["Flag of Nowhere.png"]);
        assert!(list.contains("flag_of_Nowhere.png"));
        assert!(!list.contains("flag_of_nowhere.png"));
    }

    #[test]
    fn parses_links_from_wikitext() {
        let mut list = Denylist::default();
        list.extend_from_wikitext(
            "Images listed here are never used as page images.\n\
             * [[File:Placeholder.svg]]\n\
             * [[:File:Flag of Nowhere.png|flag]]\n\
             * [[Image:Old name.gif]] (legacy namespace)\n\
             * [[Not a file link]]\n\
             * [[Category:Maps]] [[:Template:Infobox]]\n\
             * [[file:lowercase prefix.png]]\n",
        );
        assert_eq!(list.len(), 4);
        assert!(list.contains("Placeholder.svg"));
        assert!(list.contains("Flag_of_Nowhere.png"));
        assert!(list.contains("Old name.gif"));
        assert!(list.contains("Lowercase prefix.png"));
        assert!(!list.contains("Maps"));
        assert!(!list.contains("Infobox"));
    }

    #[test]
    fn reads_denylist_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("denylist.txt");
        std::fs::write(&path, "* [[File:Blank.png]]\n").unwrap();

        let mut list = Denylist::default();
        list.extend_from_file(&path).unwrap();
        assert!(list.contains("Blank.png"));

        let err = list
            .extend_from_file(&dir.path().join("missing.txt"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing.txt"));
    }
}
