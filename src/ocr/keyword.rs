//! Localized keywords and their registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{KeywordError, Lang};

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[ ,.'"“”，。:：!！?？·•\-—/\\\n\t()\[\]（）「」『』【】《》［］]"#)
        .expect("punctuation pattern is valid")
});

/// Strip punctuation and whitespace and lowercase, so OCR noise like a stray
/// full stop or different quote style does not break a comparison
pub fn parse_name(text: &str) -> String {
    PUNCTUATION.replace_all(text, "").to_lowercase()
}

/// Canonical identifier plus its localized texts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    /// Unique identifier
    pub name: String,
    #[serde(default)]
    pub cn: String,
    #[serde(default)]
    pub cht: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub jp: String,
}

impl Keyword {
    /// Create a keyword with no localized text
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cn: String::new(),
            cht: String::new(),
            en: String::new(),
            jp: String::new(),
        }
    }

    /// Set the text for one language
    pub fn with(mut self, lang: Lang, text: impl Into<String>) -> Self {
        *self.text_mut(lang) = text.into();
        self
    }

    /// Text for one language, empty if not localized
    pub fn text(&self, lang: Lang) -> &str {
        match lang {
            Lang::Cn => &self.cn,
            Lang::Cht => &self.cht,
            Lang::En => &self.en,
            Lang::Jp => &self.jp,
        }
    }

    fn text_mut(&mut self, lang: Lang) -> &mut String {
        match lang {
            Lang::Cn => &mut self.cn,
            Lang::Cht => &mut self.cht,
            Lang::En => &mut self.en,
            Lang::Jp => &mut self.jp,
        }
    }

    /// Texts to compare OCR output against. `None` searches every language.
    /// Languages without a text are skipped.
    pub fn keywords_to_find(&self, lang: Option<Lang>, ignore_punctuation: bool) -> Vec<String> {
        let langs: &[Lang] = match &lang {
            Some(lang) => std::slice::from_ref(lang),
            None => &Lang::ALL,
        };
        langs
            .iter()
            .map(|&lang| self.text(lang))
            .filter(|text| !text.is_empty())
            .map(|text| {
                if ignore_punctuation {
                    parse_name(text)
                } else {
                    text.to_string()
                }
            })
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts: Vec<&str> = [&self.cn, &self.cht, &self.en, &self.jp]
            .into_iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();
        write!(f, "Keyword({})->{}", self.name, texts.join("/"))
    }
}

/// Registry of every keyword a script defines, for reverse lookup from
/// recognised text. Identifiers are unique: registering a name twice is an
/// error instead of silently replacing the first definition.
#[derive(Debug, Default)]
pub struct KeywordRegistry {
    keywords: Vec<Arc<Keyword>>,
    by_name: HashMap<String, usize>,
    lang: Option<Lang>,
}

impl KeywordRegistry {
    /// Create an empty registry searching every language
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict default lookups to one language
    pub fn with_lang(mut self, lang: Option<Lang>) -> Self {
        self.lang = lang;
        self
    }

    /// Language default lookups are restricted to
    pub fn lang(&self) -> Option<Lang> {
        self.lang
    }

    /// Register a keyword
    pub fn register(&mut self, keyword: Keyword) -> Result<Arc<Keyword>, KeywordError> {
        if keyword.name.is_empty() || self.by_name.contains_key(&keyword.name) {
            return Err(KeywordError::Duplicate(keyword.name));
        }
        let keyword = Arc::new(keyword);
        self.by_name.insert(keyword.name.clone(), self.keywords.len());
        self.keywords.push(keyword.clone());
        Ok(keyword)
    }

    /// Look up by identifier
    pub fn get(&self, name: &str) -> Option<Arc<Keyword>> {
        self.by_name.get(name).map(|&i| self.keywords[i].clone())
    }

    /// Find the keyword for a piece of text.
    ///
    /// Texts containing `_` are first tried as identifiers. Otherwise the text
    /// is compared with every keyword's localized texts in `lang` (the
    /// registry default when `None`).
    pub fn find(
        &self,
        text: &str,
        lang: Option<Lang>,
        ignore_punctuation: bool,
    ) -> Result<Arc<Keyword>, KeywordError> {
        if text.contains('_') {
            if let Some(keyword) = self.get(text) {
                return Ok(keyword);
            }
        }

        let needle = if ignore_punctuation {
            parse_name(text)
        } else {
            text.to_string()
        };
        let lang = lang.or(self.lang);

        self.keywords
            .iter()
            .find(|keyword| {
                keyword
                    .keywords_to_find(lang, ignore_punctuation)
                    .iter()
                    .any(|candidate| *candidate == needle)
            })
            .cloned()
            .ok_or(KeywordError::NotFound(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Keyword>> {
        self.keywords.iter()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
