pub mod localization;
pub mod preferences;
pub mod provider;

pub use localization::{
    LocaleCatalogStats, LocaleSummary, LocalizationError, LocalizationManager, LocalizationParams,
};
pub use preferences::{
    EditorPreferences, Preferences, PreferencesError, PreferencesStore, UiPreferences,
};
pub use provider::{
    FormLocalizationProvider, LanguageProvider, LocalizableAction, LocalizationBridge,
    LocalizationListener, LocalizationListeners, LocalizationProvider, LocalizedText,
    WeakListener,
};
