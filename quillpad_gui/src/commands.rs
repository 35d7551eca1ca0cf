use std::collections::HashMap;
use std::rc::Rc;

use egui::{Key, KeyboardShortcut, Modifiers};
use once_cell::sync::Lazy;
use quillpad_core::{CaseTransform, SortOrder};
use quillpad_settings::{LocaleSummary, LocalizableAction, LocalizationProvider, LocalizedText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    New,
    Open,
    Save,
    SaveAs,
    Close,
    Statistics,
    Exit,
    Copy,
    Cut,
    Paste,
    RemoveDuplicates,
    Language(&'static str),
    Case(CaseTransform),
    Sort(SortOrder),
}

/// When a command may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Always,
    WithDocument,
    WithSelection,
}

#[derive(Clone, Copy)]
pub struct MenuItem {
    pub key: &'static str,
    pub command: Command,
    pub shortcut: Option<KeyboardShortcut>,
    pub availability: Availability,
}

impl MenuItem {
    fn new(key: &'static str, command: Command, availability: Availability) -> Self {
        Self {
            key,
            command,
            shortcut: None,
            availability,
        }
    }

    fn with_shortcut(mut self, modifiers: Modifiers, key: Key) -> Self {
        self.shortcut = Some(KeyboardShortcut::new(modifiers, key));
        self
    }
}

#[derive(Clone)]
pub struct MenuSection {
    pub title_key: &'static str,
    pub items: Vec<MenuItem>,
}

const COMMAND_SHIFT: Modifiers = Modifiers {
    alt: false,
    ctrl: false,
    shift: true,
    mac_cmd: false,
    command: true,
};

pub static MENU_STRUCTURE: Lazy<Vec<MenuSection>> = Lazy::new(|| {
    use Availability::*;
    vec![
        MenuSection {
            title_key: "menu.file",
            items: vec![
                MenuItem::new("menu.file.new", Command::New, Always)
                    .with_shortcut(Modifiers::COMMAND, Key::N),
                MenuItem::new("menu.file.open", Command::Open, Always)
                    .with_shortcut(Modifiers::COMMAND, Key::O),
                MenuItem::new("menu.file.save", Command::Save, WithDocument)
                    .with_shortcut(Modifiers::COMMAND, Key::S),
                MenuItem::new("menu.file.save_as", Command::SaveAs, WithDocument)
                    .with_shortcut(COMMAND_SHIFT, Key::S),
                MenuItem::new("menu.file.close", Command::Close, WithDocument)
                    .with_shortcut(Modifiers::COMMAND, Key::W),
                MenuItem::new("menu.file.statistics", Command::Statistics, WithDocument)
                    .with_shortcut(Modifiers::COMMAND, Key::I),
                MenuItem::new("menu.file.exit", Command::Exit, Always)
                    .with_shortcut(Modifiers::COMMAND, Key::Q),
            ],
        },
        MenuSection {
            title_key: "menu.edit",
            items: vec![
                MenuItem::new("menu.edit.copy", Command::Copy, WithSelection),
                MenuItem::new("menu.edit.cut", Command::Cut, WithSelection),
                MenuItem::new("menu.edit.paste", Command::Paste, WithDocument),
                MenuItem::new(
                    "menu.edit.remove_duplicates",
                    Command::RemoveDuplicates,
                    WithSelection,
                ),
            ],
        },
        MenuSection {
            title_key: "menu.languages",
            items: vec![
                MenuItem::new("menu.languages.en", Command::Language("en"), Always),
                MenuItem::new("menu.languages.hr", Command::Language("hr"), Always),
                MenuItem::new("menu.languages.de", Command::Language("de"), Always),
            ],
        },
        MenuSection {
            title_key: "menu.tools",
            items: vec![
                MenuItem::new(
                    "menu.tools.upper",
                    Command::Case(CaseTransform::Upper),
                    WithSelection,
                ),
                MenuItem::new(
                    "menu.tools.lower",
                    Command::Case(CaseTransform::Lower),
                    WithSelection,
                ),
                MenuItem::new(
                    "menu.tools.invert",
                    Command::Case(CaseTransform::Invert),
                    WithSelection,
                ),
            ],
        },
        MenuSection {
            title_key: "menu.sort",
            items: vec![
                MenuItem::new(
                    "menu.sort.ascending",
                    Command::Sort(SortOrder::Ascending),
                    WithSelection,
                ),
                MenuItem::new(
                    "menu.sort.descending",
                    Command::Sort(SortOrder::Descending),
                    WithSelection,
                ),
            ],
        },
    ]
});

/// Commands shown on the toolbar, in order.
pub const TOOLBAR: &[&str] = &[
    "menu.file.new",
    "menu.file.open",
    "menu.file.save",
    "menu.file.save_as",
    "menu.file.close",
    "menu.file.statistics",
    "menu.edit.copy",
    "menu.edit.cut",
    "menu.edit.paste",
];

/// Localized actions and menu titles for the whole window.
///
/// Language entries are labelled with each catalog's own display name, so they
/// read the same whatever language is active.
pub struct ActionSet {
    titles: HashMap<&'static str, Rc<LocalizedText>>,
    actions: HashMap<&'static str, (MenuItem, Rc<LocalizableAction>)>,
    language_names: HashMap<String, String>,
}

impl ActionSet {
    pub fn new(provider: Rc<dyn LocalizationProvider>, languages: &[LocaleSummary]) -> Self {
        let mut titles = HashMap::new();
        let mut actions = HashMap::new();
        for section in MENU_STRUCTURE.iter() {
            titles.insert(
                section.title_key,
                LocalizedText::new(section.title_key, provider.clone()),
            );
            for item in &section.items {
                actions.insert(
                    item.key,
                    (*item, LocalizableAction::new(item.key, provider.clone())),
                );
            }
        }
        let language_names = languages
            .iter()
            .map(|summary| (summary.code.clone(), summary.display_name.clone()))
            .collect();
        Self {
            titles,
            actions,
            language_names,
        }
    }

    /// Menu label for `item`.
    pub fn label(&self, item: &MenuItem) -> String {
        if let Command::Language(code) = item.command {
            return self
                .language_names
                .get(code)
                .cloned()
                .unwrap_or_else(|| code.to_string());
        }
        self.actions
            .get(item.key)
            .map(|(_, action)| action.name())
            .unwrap_or_else(|| item.key.to_string())
    }

    pub fn title(&self, key: &str) -> String {
        self.titles
            .get(key)
            .map(|text| text.get())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&(MenuItem, Rc<LocalizableAction>)> {
        self.actions.get(key)
    }

    /// Enables each action according to whether a document and a selection exist.
    pub fn refresh_enabled(&self, has_document: bool, has_selection: bool) {
        for (item, action) in self.actions.values() {
            let enabled = match item.availability {
                Availability::Always => true,
                Availability::WithDocument => has_document,
                Availability::WithSelection => has_document && has_selection,
            };
            action.set_enabled(enabled);
        }
    }

    /// Shortcut-bearing items, with Shift variants first so they win over plain ones.
    pub fn shortcuts(&self) -> Vec<(KeyboardShortcut, Command, &'static str)> {
        let mut bound: Vec<_> = MENU_STRUCTURE
            .iter()
            .flat_map(|section| section.items.iter())
            .filter_map(|item| item.shortcut.map(|shortcut| (shortcut, item.command, item.key)))
            .collect();
        bound.sort_by_key(|(shortcut, _, _)| !shortcut.modifiers.shift);
        bound
    }
}
