use icu_locid::{Locale, ParserError as LocaleParserError};
use icu_plurals::{PluralCategory as IcuPluralCategory, PluralOperands, PluralRules};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_LOCALE_CODE: &str = "en";
const DEFAULT_DISPLAY_NAME: &str = "English";

const BUNDLED_LOCALES: &[(&str, &str)] = &[
    ("hr.json", include_str!("../assets/langs/hr.json")),
    ("de.json", include_str!("../assets/langs/de.json")),
];

const DEFAULT_STRINGS: &[(&str, &str)] = &[
    ("app.name", "Quillpad"),
    ("window.title", "{0} - Quillpad"),
    ("document.untitled", "Untitled"),
    ("menu.file", "File"),
    ("menu.file.new", "New"),
    ("menu.file.new.desc", "Create a new empty document"),
    ("menu.file.open", "Open..."),
    ("menu.file.open.desc", "Open a file from disk"),
    ("menu.file.save", "Save"),
    ("menu.file.save.desc", "Save the current document"),
    ("menu.file.save_as", "Save As..."),
    ("menu.file.save_as.desc", "Save the current document under a new name"),
    ("menu.file.close", "Close"),
    ("menu.file.close.desc", "Close the current document"),
    ("menu.file.statistics", "Statistics"),
    ("menu.file.statistics.desc", "Show statistics for the current document"),
    ("menu.file.exit", "Exit"),
    ("menu.file.exit.desc", "Close all documents and quit"),
    ("menu.edit", "Edit"),
    ("menu.edit.copy", "Copy"),
    ("menu.edit.copy.desc", "Copy the selected text"),
    ("menu.edit.cut", "Cut"),
    ("menu.edit.cut.desc", "Cut the selected text"),
    ("menu.edit.paste", "Paste"),
    ("menu.edit.paste.desc", "Paste text from the clipboard"),
    ("menu.edit.remove_duplicates", "Remove duplicate lines"),
    (
        "menu.edit.remove_duplicates.desc",
        "Keep only the first occurrence of each selected line",
    ),
    ("menu.languages", "Languages"),
    ("menu.languages.en.desc", "Switch the interface to English"),
    ("menu.languages.hr.desc", "Switch the interface to Croatian"),
    ("menu.languages.de.desc", "Switch the interface to German"),
    ("menu.tools", "Tools"),
    ("menu.tools.upper", "To upper case"),
    ("menu.tools.upper.desc", "Convert the selected text to upper case"),
    ("menu.tools.lower", "To lower case"),
    ("menu.tools.lower.desc", "Convert the selected text to lower case"),
    ("menu.tools.invert", "Invert case"),
    ("menu.tools.invert.desc", "Swap the case of every selected letter"),
    ("menu.sort", "Sort"),
    ("menu.sort.ascending", "Ascending"),
    ("menu.sort.ascending.desc", "Sort the selected lines in ascending order"),
    ("menu.sort.descending", "Descending"),
    ("menu.sort.descending.desc", "Sort the selected lines in descending order"),
    ("tabs.close_hover", "Close tab"),
    ("status.length", "Length: {0}"),
    ("status.position", "Ln: {0}  Col: {1}  Sel: {2}"),
    ("dialog.ok", "OK"),
    ("dialog.save", "Save"),
    ("dialog.dont_save", "Don't save"),
    ("dialog.cancel", "Cancel"),
    ("dialog.unsaved.title", "Unsaved changes"),
    (
        "dialog.unsaved.message",
        "{0} has unsaved changes. Do you want to save them?",
    ),
    ("notice.error", "Error"),
    ("notice.information", "Information"),
    ("notice.warning", "Warning"),
    ("notice.open_failed", "Could not open {0}: {1}"),
    ("notice.save_failed", "Could not save {0}: {1}"),
    ("notice.path_open", "{0} is already open in another tab."),
    ("notice.saved", "The file was saved."),
    ("notice.nothing_saved", "Nothing was saved."),
    ("stats.title", "Statistics"),
];

const DEFAULT_PLURAL_STRINGS: &[(&str, &str, &str)] = &[
    (
        "stats.characters",
        "The document has {count} character.",
        "The document has {count} characters.",
    ),
    (
        "stats.non_blank",
        "{count} of them is not whitespace.",
        "{count} of them are not whitespace.",
    ),
    (
        "stats.lines",
        "It spans {count} line.",
        "It spans {count} lines.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "zero" => Some(Self::Zero),
            "one" => Some(Self::One),
            "two" => Some(Self::Two),
            "few" => Some(Self::Few),
            "many" => Some(Self::Many),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl From<IcuPluralCategory> for PluralCategory {
    fn from(value: IcuPluralCategory) -> Self {
        match value {
            IcuPluralCategory::Zero => PluralCategory::Zero,
            IcuPluralCategory::One => PluralCategory::One,
            IcuPluralCategory::Two => PluralCategory::Two,
            IcuPluralCategory::Few => PluralCategory::Few,
            IcuPluralCategory::Many => PluralCategory::Many,
            IcuPluralCategory::Other => PluralCategory::Other,
        }
    }
}

#[derive(Debug, Clone)]
struct PluralMessage {
    forms: BTreeMap<PluralCategory, String>,
}

impl PluralMessage {
    fn template_for<'a>(
        &'a self,
        plural_rules: Option<&PluralRules>,
        count: Option<u64>,
    ) -> &'a str {
        let category = count
            .map(|value| select_plural_category(plural_rules, value))
            .unwrap_or(PluralCategory::Other);
        self.forms
            .get(&category)
            .or_else(|| self.forms.get(&PluralCategory::Other))
            .map(|value| value.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone)]
enum Message {
    Simple(String),
    Plural(PluralMessage),
}

impl Message {
    fn render<'a>(
        &'a self,
        plural_rules: Option<&PluralRules>,
        params: &LocalizationParams<'_>,
    ) -> Cow<'a, str> {
        match self {
            Message::Simple(text) => render_template(text, params),
            Message::Plural(plural) => {
                render_template(plural.template_for(plural_rules, params.count), params)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocalizationParams<'a> {
    count: Option<u64>,
    positional: &'a [&'a str],
}

impl<'a> LocalizationParams<'a> {
    pub fn new(positional: &'a [&'a str]) -> Self {
        Self {
            count: None,
            positional,
        }
    }
}

impl LocalizationParams<'static> {
    pub fn empty() -> Self {
        LocalizationParams {
            count: None,
            positional: &[],
        }
    }

    pub fn count_only(count: u64) -> Self {
        LocalizationParams {
            count: Some(count),
            positional: &[],
        }
    }
}

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("failed to enumerate locale directory {0}: {1}")]
    ReadDir(PathBuf, io::Error),
    #[error("failed to read locale file {0}: {1}")]
    ReadFile(PathBuf, io::Error),
    #[error("failed to parse locale file {0}: {1}")]
    ParseFile(PathBuf, serde_json::Error),
    #[error("duplicate locale code {0}")]
    DuplicateLocale(String),
    #[error("locale {locale} message '{key}' is missing plural 'other' form")]
    PluralMissingOther { locale: String, key: String },
    #[error("locale {locale} message '{key}' contains invalid plural category '{category}'")]
    InvalidPluralCategory {
        locale: String,
        key: String,
        category: String,
    },
    #[error("locale {locale} message '{key}' uses unsupported type '{kind}'")]
    UnsupportedMessageType {
        locale: String,
        key: String,
        kind: String,
    },
    #[error("unknown locale '{0}'")]
    UnknownLocale(String),
    #[error("locale identifier '{locale}' is invalid: {error}")]
    InvalidLocaleIdentifier {
        locale: String,
        error: LocaleParserError,
    },
}

#[derive(Debug, Clone)]
pub struct LocaleSummary {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct LocaleCatalogStats {
    pub code: String,
    pub display_name: String,
    pub total_entries: usize,
    pub plural_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogOrigin {
    Builtin,
    Bundled,
    Directory,
}

#[derive(Debug, Clone)]
struct LocaleCatalog {
    summary: LocaleSummary,
    origin: CatalogOrigin,
    plural_rules: Option<Arc<PluralRules>>,
    messages: HashMap<String, Message>,
}

#[derive(Debug, Clone)]
pub struct LocalizationManager {
    catalogs: Vec<LocaleCatalog>,
    active: usize,
    fallback: usize,
}

#[derive(Debug, Deserialize)]
struct LocaleFile {
    locale: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    strings: HashMap<String, LocaleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocaleEntry {
    Simple(String),
    Typed(LocaleEntryTyped),
}

#[derive(Debug, Deserialize)]
struct LocaleEntryTyped {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    forms: HashMap<String, String>,
}

impl LocalizationManager {
    /// Constructs a manager seeded with the built-in English resources.
    /// （以內建英文資源建立語系管理器。）
    pub fn fallback() -> Self {
        let catalog = default_catalog();
        Self {
            catalogs: vec![catalog],
            active: 0,
            fallback: 0,
        }
    }

    /// Constructs a manager with English plus the bundled Croatian and German catalogs.
    /// （建立包含英文與內附克羅埃西亞文、德文的語系管理器。）
    ///
    /// A bundled catalog that fails to parse is skipped with a warning.
    pub fn builtin() -> Self {
        let mut manager = Self::fallback();
        for (name, contents) in BUNDLED_LOCALES {
            let source = Path::new("bundled").join(name);
            if let Err(err) = manager.add_catalog(&source, contents, CatalogOrigin::Bundled) {
                tracing::warn!("skipping bundled locale {}: {err}", source.display());
            }
        }
        manager
    }

    /// Loads locale definitions from the provided directory on top of the built-in catalogs.
    /// （從指定目錄載入語系定義，並保留內建語系。）
    pub fn load_from_dir(
        path: impl AsRef<Path>,
        default_locale: &str,
    ) -> Result<Self, LocalizationError> {
        Self::load_from_dirs(std::iter::once(path), default_locale)
    }

    /// Loads locale definitions from multiple directories in order.
    /// （依序從多個目錄載入語系定義。）
    pub fn load_from_dirs<I, P>(paths: I, default_locale: &str) -> Result<Self, LocalizationError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut manager = Self::builtin();
        for path in paths {
            manager.load_directory(path.as_ref())?;
        }
        manager.apply_default_locale(default_locale);
        Ok(manager)
    }

    /// Returns the locale code of the active language.
    /// （回傳目前啟用語系的代碼字串。）
    pub fn active_code(&self) -> &str {
        self.catalogs[self.active].summary.code.as_str()
    }

    /// Exposes available locales (code + display name).
    /// （提供可用語系的代碼與顯示名稱。）
    pub fn locale_summaries(&self) -> Vec<LocaleSummary> {
        self.catalogs
            .iter()
            .map(|catalog| catalog.summary.clone())
            .collect()
    }

    /// Provides per-locale statistics useful for tooling.
    /// （回傳語系統計資訊，供工具使用。）
    pub fn catalog_stats(&self) -> Vec<LocaleCatalogStats> {
        self.catalogs
            .iter()
            .map(|catalog| LocaleCatalogStats {
                code: catalog.summary.code.clone(),
                display_name: catalog.summary.display_name.clone(),
                total_entries: catalog.messages.len(),
                plural_entries: catalog
                    .messages
                    .values()
                    .filter(|message| matches!(message, Message::Plural(_)))
                    .count(),
            })
            .collect()
    }

    /// Returns missing keys for the provided locale relative to the fallback locale.
    /// （比對預設語系，回傳指定語系缺少的鍵。）
    pub fn missing_keys(&self, code: &str) -> Option<Vec<String>> {
        let catalog = &self.catalogs[self.catalog_index(code)?];
        let mut missing: Vec<String> = self.catalogs[self.fallback]
            .messages
            .keys()
            .filter(|key| !catalog.messages.contains_key(*key))
            .cloned()
            .collect();
        missing.sort();
        Some(missing)
    }

    /// Switches the active locale by locale code.
    /// （依語系代碼切換目前啟用的語系。）
    pub fn set_active_by_code(&mut self, code: &str) -> bool {
        match self.catalog_index(code) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    /// Retrieves a localized string, falling back to English when missing.
    /// （取得指定鍵的在地化字串，若缺少則回退至英文。）
    pub fn text<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        self.text_with_params(key, &LocalizationParams::empty())
    }

    /// Retrieves a localized string, applying parameters when provided.
    /// （取得在地化字串，必要時套用參數。）
    pub fn text_with_params<'a>(
        &'a self,
        key: &'a str,
        params: &LocalizationParams<'_>,
    ) -> Cow<'a, str> {
        if let Some(message) = self.catalogs[self.active].messages.get(key) {
            let rules = self.catalogs[self.active].plural_rules.as_deref();
            message.render(rules, params)
        } else if let Some(message) = self.catalogs[self.fallback].messages.get(key) {
            let rules = self.catalogs[self.fallback].plural_rules.as_deref();
            message.render(rules, params)
        } else {
            Cow::Borrowed(key)
        }
    }

    fn catalog_index(&self, code: &str) -> Option<usize> {
        self.catalogs
            .iter()
            .position(|catalog| catalog.summary.code == code)
    }

    fn load_directory(&mut self, dir: &Path) -> Result<(), LocalizationError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("locale directory {} does not exist", dir.display());
                return Ok(());
            }
            Err(err) => return Err(LocalizationError::ReadDir(dir.to_path_buf(), err)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| LocalizationError::ReadDir(dir.to_path_buf(), err))?;
            let path = entry.path();
            let metadata = entry
                .metadata()
                .map_err(|err| LocalizationError::ReadFile(path.clone(), err))?;
            if metadata.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json")
            {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let contents = fs::read_to_string(&path)
                .map_err(|err| LocalizationError::ReadFile(path.clone(), err))?;
            self.add_catalog(&path, &contents, CatalogOrigin::Directory)?;
            tracing::debug!("loaded locale file {}", path.display());
        }
        Ok(())
    }

    fn add_catalog(
        &mut self,
        source: &Path,
        contents: &str,
        origin: CatalogOrigin,
    ) -> Result<(), LocalizationError> {
        let file: LocaleFile = serde_json::from_str(contents)
            .map_err(|err| LocalizationError::ParseFile(source.to_path_buf(), err))?;
        let display_name = file
            .display_name
            .clone()
            .unwrap_or_else(|| file.locale.clone());

        let messages = build_messages(&file.locale, file.strings)?;
        let plural_rules = plural_rules_for(&file.locale)?;
        let summary = LocaleSummary {
            code: file.locale,
            display_name,
        };

        if summary.code == self.catalogs[self.fallback].summary.code {
            let mut merged = default_strings_map();
            merged.extend(messages);
            self.catalogs[self.fallback] = LocaleCatalog {
                summary,
                origin,
                plural_rules,
                messages: merged,
            };
            return Ok(());
        }

        let catalog = LocaleCatalog {
            summary,
            origin,
            plural_rules,
            messages,
        };
        match self.catalog_index(&catalog.summary.code) {
            // 使用者目錄中的語系檔可覆寫內附語系。 / Directory files may replace bundled catalogs.
            Some(index) if self.catalogs[index].origin == CatalogOrigin::Bundled => {
                self.catalogs[index] = catalog;
            }
            Some(_) => return Err(LocalizationError::DuplicateLocale(catalog.summary.code)),
            None => self.catalogs.push(catalog),
        }
        Ok(())
    }

    fn apply_default_locale(&mut self, default_locale: &str) {
        if let Some(idx) = self.catalog_index(default_locale) {
            self.fallback = idx;
        }
        self.active = self.fallback;
    }
}

fn default_catalog() -> LocaleCatalog {
    let plural_rules = plural_rules_for(DEFAULT_LOCALE_CODE).ok().flatten();
    LocaleCatalog {
        summary: LocaleSummary {
            code: DEFAULT_LOCALE_CODE.to_string(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        },
        origin: CatalogOrigin::Builtin,
        plural_rules,
        messages: default_strings_map(),
    }
}

fn default_strings_map() -> HashMap<String, Message> {
    let mut map = HashMap::new();
    for (key, value) in DEFAULT_STRINGS {
        map.insert((*key).to_string(), Message::Simple((*value).to_string()));
    }
    for (key, one, other) in DEFAULT_PLURAL_STRINGS {
        let forms = BTreeMap::from([
            (PluralCategory::One, (*one).to_string()),
            (PluralCategory::Other, (*other).to_string()),
        ]);
        map.insert((*key).to_string(), Message::Plural(PluralMessage { forms }));
    }
    map
}

fn plural_rules_for(locale: &str) -> Result<Option<Arc<PluralRules>>, LocalizationError> {
    let parsed =
        Locale::from_str(locale).map_err(|error| LocalizationError::InvalidLocaleIdentifier {
            locale: locale.to_string(),
            error,
        })?;
    match PluralRules::try_new_cardinal(&parsed.into()) {
        Ok(rules) => Ok(Some(Arc::new(rules))),
        Err(_) => Ok(None),
    }
}

fn build_messages(
    locale: &str,
    entries: HashMap<String, LocaleEntry>,
) -> Result<HashMap<String, Message>, LocalizationError> {
    let mut messages = HashMap::new();
    for (key, entry) in entries {
        let message = match entry {
            LocaleEntry::Simple(value) => Message::Simple(value),
            LocaleEntry::Typed(typed) => {
                if typed.kind != "plural" {
                    return Err(LocalizationError::UnsupportedMessageType {
                        locale: locale.to_string(),
                        key: key.clone(),
                        kind: typed.kind,
                    });
                }
                let mut forms = BTreeMap::new();
                for (category, template) in typed.forms {
                    let parsed = PluralCategory::parse(&category).ok_or(
                        LocalizationError::InvalidPluralCategory {
                            locale: locale.to_string(),
                            key: key.clone(),
                            category,
                        },
                    )?;
                    forms.insert(parsed, template);
                }
                if !forms.contains_key(&PluralCategory::Other) {
                    return Err(LocalizationError::PluralMissingOther {
                        locale: locale.to_string(),
                        key: key.clone(),
                    });
                }
                Message::Plural(PluralMessage { forms })
            }
        };
        messages.insert(key, message);
    }
    Ok(messages)
}

fn render_template<'a>(template: &'a str, params: &LocalizationParams<'_>) -> Cow<'a, str> {
    if params.count.is_none() && (params.positional.is_empty() || !template.contains('{')) {
        return Cow::Borrowed(template);
    }

    let mut current: Cow<'a, str> = Cow::Borrowed(template);
    if let Some(count) = params.count {
        let placeholder = "{count}";
        if current.contains(placeholder) {
            let replacement = count.to_string();
            current = Cow::Owned(current.replace(placeholder, &replacement));
        }
    }

    for (idx, value) in params.positional.iter().enumerate() {
        let placeholder = format!("{{{idx}}}");
        if current.contains(&placeholder) {
            current = Cow::Owned(current.replace(&placeholder, value));
        }
    }

    current
}

fn select_plural_category(rules: Option<&PluralRules>, count: u64) -> PluralCategory {
    if let Some(rules) = rules {
        if let Ok(operands) = PluralOperands::from_str(&count.to_string()) {
            return PluralCategory::from(rules.category_for(operands));
        }
    }
    if count == 1 {
        PluralCategory::One
    } else {
        PluralCategory::Other
    }
}
