//! ISO 639 language table and lookups.
//!
//! Track languages arrive as ISO 639-2 codes from `mdhd` boxes (terminology or
//! bibliographic variants) or embedded in file names. Manifests want the
//! ISO 639-2/T code plus an English display name.

/// One language entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-2/T (terminology) code.
    pub alpha_3: &'static str,
    /// ISO 639-2/B (bibliographic) code, where it differs from `alpha_3`.
    pub bibliographic: Option<&'static str>,
    /// ISO 639-1 code.
    pub alpha_2: Option<&'static str>,
    /// English name.
    pub name: &'static str,
}

/// Code used by MP4 files for an undetermined language.
pub const UNDETERMINED: &str = "und";

/// Codes that were withdrawn from ISO 639 but still appear in older files.
const OBSOLETE_CODES: &[(&str, &str)] = &[("scr", "hrv"), ("scc", "srp"), ("mol", "ron")];

macro_rules! lang {
    ($t:literal, $b:expr, $a2:expr, $name:literal) => {
        Language {
            alpha_3: $t,
            bibliographic: $b,
            alpha_2: $a2,
            name: $name,
        }
    };
}

static LANGUAGES: &[Language] = &[
    lang!("afr", None, Some("af"), "Afrikaans"),
    lang!("amh", None, Some("am"), "Amharic"),
    lang!("ara", None, Some("ar"), "Arabic"),
    lang!("asm", None, Some("as"), "Assamese"),
    lang!("aze", None, Some("az"), "Azerbaijani"),
    lang!("bel", None, Some("be"), "Belarusian"),
    lang!("ben", None, Some("bn"), "Bengali"),
    lang!("bod", Some("tib"), Some("bo"), "Tibetan"),
    lang!("bos", None, Some("bs"), "Bosnian"),
    lang!("bul", None, Some("bg"), "Bulgarian"),
    lang!("cat", None, Some("ca"), "Catalan"),
    lang!("ces", Some("cze"), Some("cs"), "Czech"),
    lang!("cmn", None, None, "Mandarin Chinese"),
    lang!("cym", Some("wel"), Some("cy"), "Welsh"),
    lang!("dan", None, Some("da"), "Danish"),
    lang!("deu", Some("ger"), Some("de"), "German"),
    lang!("ell", Some("gre"), Some("el"), "Modern Greek (1453-)"),
    lang!("eng", None, Some("en"), "English"),
    lang!("est", None, Some("et"), "Estonian"),
    lang!("eus", Some("baq"), Some("eu"), "Basque"),
    lang!("fas", Some("per"), Some("fa"), "Persian"),
    lang!("fil", None, None, "Filipino"),
    lang!("fin", None, Some("fi"), "Finnish"),
    lang!("fra", Some("fre"), Some("fr"), "French"),
    lang!("gle", None, Some("ga"), "Irish"),
    lang!("glg", None, Some("gl"), "Galician"),
    lang!("guj", None, Some("gu"), "Gujarati"),
    lang!("hau", None, Some("ha"), "Hausa"),
    lang!("heb", None, Some("he"), "Hebrew"),
    lang!("hin", None, Some("hi"), "Hindi"),
    lang!("hrv", None, Some("hr"), "Croatian"),
    lang!("hun", None, Some("hu"), "Hungarian"),
    lang!("hye", Some("arm"), Some("hy"), "Armenian"),
    lang!("ind", None, Some("id"), "Indonesian"),
    lang!("isl", Some("ice"), Some("is"), "Icelandic"),
    lang!("ita", None, Some("it"), "Italian"),
    lang!("jpn", None, Some("ja"), "Japanese"),
    lang!("kan", None, Some("kn"), "Kannada"),
    lang!("kat", Some("geo"), Some("ka"), "Georgian"),
    lang!("kaz", None, Some("kk"), "Kazakh"),
    lang!("khm", None, Some("km"), "Central Khmer"),
    lang!("kir", None, Some("ky"), "Kirghiz"),
    lang!("kor", None, Some("ko"), "Korean"),
    lang!("lao", None, Some("lo"), "Lao"),
    lang!("lav", None, Some("lv"), "Latvian"),
    lang!("lit", None, Some("lt"), "Lithuanian"),
    lang!("ltz", None, Some("lb"), "Luxembourgish"),
    lang!("mal", None, Some("ml"), "Malayalam"),
    lang!("mar", None, Some("mr"), "Marathi"),
    lang!("mkd", Some("mac"), Some("mk"), "Macedonian"),
    lang!("mlt", None, Some("mt"), "Maltese"),
    lang!("mon", None, Some("mn"), "Mongolian"),
    lang!("mri", Some("mao"), Some("mi"), "Maori"),
    lang!("msa", Some("may"), Some("ms"), "Malay (macrolanguage)"),
    lang!("mya", Some("bur"), Some("my"), "Burmese"),
    lang!("nep", None, Some("ne"), "Nepali (macrolanguage)"),
    lang!("nld", Some("dut"), Some("nl"), "Dutch"),
    lang!("nno", None, Some("nn"), "Norwegian Nynorsk"),
    lang!("nob", None, Some("nb"), "Norwegian Bokmål"),
    lang!("nor", None, Some("no"), "Norwegian"),
    lang!("pan", None, Some("pa"), "Panjabi"),
    lang!("pol", None, Some("pl"), "Polish"),
    lang!("por", None, Some("pt"), "Portuguese"),
    lang!("pus", None, Some("ps"), "Pushto"),
    lang!("ron", Some("rum"), Some("ro"), "Romanian"),
    lang!("rus", None, Some("ru"), "Russian"),
    lang!("sin", None, Some("si"), "Sinhala"),
    lang!("slk", Some("slo"), Some("sk"), "Slovak"),
    lang!("slv", None, Some("sl"), "Slovenian"),
    lang!("som", None, Some("so"), "Somali"),
    lang!("spa", None, Some("es"), "Spanish"),
    lang!("sqi", Some("alb"), Some("sq"), "Albanian"),
    lang!("srp", None, Some("sr"), "Serbian"),
    lang!("swa", None, Some("sw"), "Swahili (macrolanguage)"),
    lang!("swe", None, Some("sv"), "Swedish"),
    lang!("tam", None, Some("ta"), "Tamil"),
    lang!("tel", None, Some("te"), "Telugu"),
    lang!("tgk", None, Some("tg"), "Tajik"),
    lang!("tha", None, Some("th"), "Thai"),
    lang!("tur", None, Some("tr"), "Turkish"),
    lang!("ukr", None, Some("uk"), "Ukrainian"),
    lang!("urd", None, Some("ur"), "Urdu"),
    lang!("uzb", None, Some("uz"), "Uzbek"),
    lang!("vie", None, Some("vi"), "Vietnamese"),
    lang!("yid", None, Some("yi"), "Yiddish"),
    lang!("yor", None, Some("yo"), "Yoruba"),
    lang!("yue", None, None, "Yue Chinese"),
    lang!("zho", Some("chi"), Some("zh"), "Chinese"),
    lang!("zul", None, Some("zu"), "Zulu"),
    lang!("mis", None, None, "Uncoded languages"),
    lang!("mul", None, None, "Multiple languages"),
    lang!("und", None, None, "Undetermined"),
    lang!("zxx", None, None, "No linguistic content"),
];

/// Look up a language by ISO 639-1, ISO 639-2/T, ISO 639-2/B code or English
/// name. Matching is case-insensitive.
///
/// # Examples
///
/// ```
/// use ismforge_common::language::lookup;
///
/// assert_eq!(lookup("ger").map(|l| l.alpha_3), Some("deu"));
/// assert_eq!(lookup("de").map(|l| l.name), Some("German"));
/// assert!(lookup("xyz").is_none());
/// ```
pub fn lookup(code: &str) -> Option<&'static Language> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    LANGUAGES.iter().find(|lang| {
        lang.alpha_3.eq_ignore_ascii_case(code)
            || lang
                .bibliographic
                .is_some_and(|b| b.eq_ignore_ascii_case(code))
            || lang.alpha_2.is_some_and(|a| a.eq_ignore_ascii_case(code))
            || lang.name.eq_ignore_ascii_case(code)
    })
}

/// Resolve a track language into its ISO 639-2/T code and display name.
///
/// Withdrawn codes are mapped to their replacement first. Unknown codes are
/// returned as-is, with the code doubling as the name.
pub fn resolve(code: &str) -> (String, String) {
    let code = OBSOLETE_CODES
        .iter()
        .find(|(old, _)| old.eq_ignore_ascii_case(code))
        .map(|(_, new)| *new)
        .unwrap_or(code);

    match lookup(code) {
        Some(lang) => (lang.alpha_3.to_string(), lang.name.to_string()),
        None => (code.to_string(), code.to_string()),
    }
}

/// Scan a file name for an embedded three-letter language code.
///
/// The name is split on `_`, `-` and `.`; the first token that is a known
/// ISO 639-2 code wins and is returned in its terminology form. Returns
/// [`UNDETERMINED`] when no token matches.
///
/// # Examples
///
/// ```
/// use ismforge_common::language::language_from_filename;
///
/// assert_eq!(language_from_filename("movie_ger_subs.cmft"), "deu");
/// assert_eq!(language_from_filename("movie-eng.vtt"), "eng");
/// assert_eq!(language_from_filename("movie.cmft"), "und");
/// ```
pub fn language_from_filename(name: &str) -> &'static str {
    name.split(['_', '-', '.'])
        .filter(|token| token.len() == 3 && token.chars().all(|c| c.is_ascii_alphabetic()))
        .find_map(|token| {
            LANGUAGES.iter().find(|lang| {
                lang.alpha_3.eq_ignore_ascii_case(token)
                    || lang
                        .bibliographic
                        .is_some_and(|b| b.eq_ignore_ascii_case(token))
            })
        })
        .map(|lang| lang.alpha_3)
        .unwrap_or(UNDETERMINED)
}
