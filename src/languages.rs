use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Model family served by the backend. Each family names languages with its own locale tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// NLLB-200, FLORES-200 tags such as `eng_Latn`
    Nllb,
    /// M2M-100, ISO-639-1 tags such as `en`
    M2m100,
}

impl ModelFamily {
    /// Guess the family from a model hub name, e.g. `facebook/m2m100_418M`
    pub fn from_model_name(model_name: &str) -> Self {
        if model_name.to_lowercase().contains("m2m") {
            ModelFamily::M2m100
        } else {
            ModelFamily::Nllb
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Nllb => "nllb",
            ModelFamily::M2m100 => "m2m100",
        }
    }
}

struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    nllb: &'static str,
    m2m100: Option<&'static str>,
}

const fn lang(
    code: &'static str,
    name: &'static str,
    nllb: &'static str,
    m2m100: Option<&'static str>,
) -> LanguageEntry {
    LanguageEntry { code, name, nllb, m2m100 }
}

const LANGUAGES: &[LanguageEntry] = &[
    lang("af", "afrikaans", "afr_Latn", Some("af")),
    lang("am", "amharic", "amh_Ethi", Some("am")),
    lang("ar", "arabic", "arb_Arab", Some("ar")),
    lang("bg", "bulgarian", "bul_Cyrl", Some("bg")),
    lang("bn", "bengali", "ben_Beng", Some("bn")),
    lang("cs", "czech", "ces_Latn", Some("cs")),
    lang("da", "danish", "dan_Latn", Some("da")),
    lang("de", "german", "deu_Latn", Some("de")),
    lang("el", "greek", "ell_Grek", Some("el")),
    lang("en", "english", "eng_Latn", Some("en")),
    lang("es", "spanish", "spa_Latn", Some("es")),
    lang("fa", "persian", "pes_Arab", Some("fa")),
    lang("fi", "finnish", "fin_Latn", Some("fi")),
    lang("fr", "french", "fra_Latn", Some("fr")),
    lang("ha", "hausa", "hau_Latn", Some("ha")),
    lang("he", "hebrew", "heb_Hebr", Some("he")),
    lang("hi", "hindi", "hin_Deva", Some("hi")),
    lang("hu", "hungarian", "hun_Latn", Some("hu")),
    lang("id", "indonesian", "ind_Latn", Some("id")),
    lang("ig", "igbo", "ibo_Latn", Some("ig")),
    lang("it", "italian", "ita_Latn", Some("it")),
    lang("ja", "japanese", "jpn_Jpan", Some("ja")),
    lang("ko", "korean", "kor_Hang", Some("ko")),
    lang("lg", "ganda", "lug_Latn", Some("lg")),
    lang("ms", "malay", "zsm_Latn", Some("ms")),
    lang("nl", "dutch", "nld_Latn", Some("nl")),
    lang("no", "norwegian", "nob_Latn", Some("no")),
    lang("pl", "polish", "pol_Latn", Some("pl")),
    lang("pt", "portuguese", "por_Latn", Some("pt")),
    lang("ro", "romanian", "ron_Latn", Some("ro")),
    lang("ru", "russian", "rus_Cyrl", Some("ru")),
    lang("rw", "kinyarwanda", "kin_Latn", None),
    lang("so", "somali", "som_Latn", Some("so")),
    lang("sv", "swedish", "swe_Latn", Some("sv")),
    lang("sw", "swahili", "swh_Latn", Some("sw")),
    lang("ta", "tamil", "tam_Taml", Some("ta")),
    lang("th", "thai", "tha_Thai", Some("th")),
    lang("tl", "tagalog", "tgl_Latn", Some("tl")),
    lang("tr", "turkish", "tur_Latn", Some("tr")),
    lang("uk", "ukrainian", "ukr_Cyrl", Some("uk")),
    lang("ur", "urdu", "urd_Arab", Some("ur")),
    lang("vi", "vietnamese", "vie_Latn", Some("vi")),
    lang("xh", "xhosa", "xho_Latn", Some("xh")),
    lang("yo", "yoruba", "yor_Latn", Some("yo")),
    lang("zh", "chinese", "zho_Hans", Some("zh")),
    lang("zu", "zulu", "zul_Latn", Some("zu")),
];

/// Read-only alias table mapping short codes and English names to the
/// model's locale tags. Built once at startup, then shared without locking.
#[derive(Debug, Clone)]
pub struct LanguageCodeTable {
    family: ModelFamily,
    /// lower-cased alias -> locale tag
    aliases: HashMap<String, String>,
    /// short code -> locale tag, for the `/languages` snapshot
    short_codes: BTreeMap<String, String>,
}

impl LanguageCodeTable {
    /// Built-in table for `family`
    pub fn new(family: ModelFamily) -> Self {
        let mut aliases = HashMap::new();
        let mut short_codes = BTreeMap::new();

        for entry in LANGUAGES {
            let tag = match family {
                ModelFamily::Nllb => entry.nllb,
                ModelFamily::M2m100 => match entry.m2m100 {
                    Some(tag) => tag,
                    None => continue,
                },
            };
            aliases.insert(entry.code.to_string(), tag.to_string());
            aliases.insert(entry.name.to_string(), tag.to_string());
            short_codes.insert(entry.code.to_string(), tag.to_string());
        }

        Self {
            family,
            aliases,
            short_codes,
        }
    }

    /// Built-in table plus configured aliases. Configured entries win over built-in ones.
    pub fn with_aliases(family: ModelFamily, extra: &HashMap<String, String>) -> Self {
        let mut table = Self::new(family);
        for (alias, tag) in extra {
            let key = alias.to_lowercase();
            debug!("Language alias {} -> {}", key, tag);
            // ISO-style codes (up to three letters) also show up in the snapshot
            if key.len() <= 3 && key.chars().all(|c| c.is_ascii_alphabetic()) {
                table.short_codes.insert(key.clone(), tag.clone());
            }
            table.aliases.insert(key, tag.clone());
        }
        table
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Map `code` to a locale tag.
    ///
    /// The lookup is case-insensitive. A code with no alias is returned unchanged,
    /// case included, since locale tags like `eng_Latn` are case-sensitive and the
    /// backend is the one to reject tags it does not know.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        match self.aliases.get(&code.to_lowercase()) {
            Some(tag) => tag.as_str(),
            None => code,
        }
    }

    /// Sorted short codes
    pub fn supported_languages(&self) -> Vec<String> {
        self.short_codes.keys().cloned().collect()
    }

    /// Sorted short code -> locale tag
    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.short_codes
    }
}
