use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use quillpad_core::{ListenerId, ListenerRegistry};

use crate::localization::{LocaleSummary, LocalizationError, LocalizationManager, LocalizationParams};

/// Receives a notification whenever the active language changes.
/// （語系變更時收到通知。）
pub trait LocalizationListener {
    fn localization_changed(&self);
}

/// Source of display strings that can be observed for language changes.
/// （可觀察語系變更的顯示字串來源。）
pub trait LocalizationProvider {
    fn add_listener(&self, listener: Rc<dyn LocalizationListener>) -> ListenerId;
    fn remove_listener(&self, id: ListenerId) -> bool;
    fn text(&self, key: &str) -> String;
    fn text_with_params(&self, key: &str, params: &LocalizationParams<'_>) -> String;
    fn language(&self) -> String;
}

/// Listener set shared by every provider implementation.
/// （各提供者共用的監聽器集合。）
#[derive(Default)]
pub struct LocalizationListeners {
    registry: RefCell<ListenerRegistry<Rc<dyn LocalizationListener>>>,
}

impl LocalizationListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Rc<dyn LocalizationListener>) -> ListenerId {
        self.registry.borrow_mut().add(listener)
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.registry.borrow_mut().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Notifies every listener registered at the time of the call.
    /// （通知呼叫當下已註冊的所有監聽器。）
    pub fn fire(&self) {
        // Listeners may register or remove others while being notified.
        let snapshot = self.registry.borrow().snapshot();
        for listener in snapshot {
            listener.localization_changed();
        }
    }
}

impl LocalizationListener for LocalizationListeners {
    fn localization_changed(&self) {
        self.fire();
    }
}

impl fmt::Debug for LocalizationListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationListeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Forwards notifications to a target only while it is still alive.
/// （僅在目標仍存在時轉送通知。）
pub struct WeakListener<T: ?Sized> {
    target: Weak<T>,
}

impl<T: LocalizationListener + 'static> WeakListener<T> {
    pub fn new(target: &Rc<T>) -> Rc<dyn LocalizationListener> {
        Rc::new(Self {
            target: Rc::downgrade(target),
        })
    }
}

impl<T: LocalizationListener + ?Sized> LocalizationListener for WeakListener<T> {
    fn localization_changed(&self) {
        if let Some(target) = self.target.upgrade() {
            target.localization_changed();
        }
    }
}

/// Owns the locale catalogs and the active language.
/// （持有語系目錄與目前語系。）
pub struct LanguageProvider {
    manager: RefCell<LocalizationManager>,
    listeners: LocalizationListeners,
}

impl LanguageProvider {
    pub fn new(manager: LocalizationManager) -> Self {
        Self {
            manager: RefCell::new(manager),
            listeners: LocalizationListeners::new(),
        }
    }

    /// Switches the active language; listeners fire only when it actually changes.
    /// （切換語系；只有實際改變時才通知監聽器。）
    pub fn set_language(&self, code: &str) -> Result<bool, LocalizationError> {
        {
            let mut manager = self.manager.borrow_mut();
            if manager.active_code() == code {
                return Ok(false);
            }
            if !manager.set_active_by_code(code) {
                return Err(LocalizationError::UnknownLocale(code.to_string()));
            }
        }
        tracing::info!("interface language switched to {code}");
        self.listeners.fire();
        Ok(true)
    }

    pub fn languages(&self) -> Vec<LocaleSummary> {
        self.manager.borrow().locale_summaries()
    }
}

impl LocalizationProvider for LanguageProvider {
    fn add_listener(&self, listener: Rc<dyn LocalizationListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn text(&self, key: &str) -> String {
        self.manager.borrow().text(key).into_owned()
    }

    fn text_with_params(&self, key: &str, params: &LocalizationParams<'_>) -> String {
        self.manager
            .borrow()
            .text_with_params(key, params)
            .into_owned()
    }

    fn language(&self) -> String {
        self.manager.borrow().active_code().to_string()
    }
}

impl fmt::Debug for LanguageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProvider")
            .field("language", &self.language())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Provider that relays another provider's notifications and can detach from it.
/// （轉送上層提供者通知的橋接器，可隨時中斷連線。）
///
/// Registered listeners stay attached to the bridge across reconnects. When the
/// language changed while disconnected, `connect` notifies them once.
pub struct LocalizationBridge {
    parent: Rc<dyn LocalizationProvider>,
    listeners: Rc<LocalizationListeners>,
    connection: Cell<Option<ListenerId>>,
    language_at_disconnect: RefCell<Option<String>>,
}

impl LocalizationBridge {
    pub fn new(parent: Rc<dyn LocalizationProvider>) -> Self {
        Self {
            parent,
            listeners: Rc::new(LocalizationListeners::new()),
            connection: Cell::new(None),
            language_at_disconnect: RefCell::new(None),
        }
    }

    /// Attaches to the parent provider; a no-op when already connected.
    /// （連接至上層提供者；已連線時不做任何事。）
    pub fn connect(&self) {
        if self.connection.get().is_some() {
            return;
        }
        let id = self
            .parent
            .add_listener(WeakListener::new(&self.listeners));
        self.connection.set(Some(id));

        let stale = self
            .language_at_disconnect
            .borrow_mut()
            .take()
            .is_some_and(|previous| previous != self.parent.language());
        if stale {
            self.listeners.fire();
        }
    }

    /// Detaches from the parent provider; a no-op when not connected.
    /// （中斷與上層提供者的連線；未連線時不做任何事。）
    pub fn disconnect(&self) {
        if let Some(id) = self.connection.take() {
            self.parent.remove_listener(id);
            *self.language_at_disconnect.borrow_mut() = Some(self.parent.language());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.get().is_some()
    }
}

impl LocalizationProvider for LocalizationBridge {
    fn add_listener(&self, listener: Rc<dyn LocalizationListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn text(&self, key: &str) -> String {
        self.parent.text(key)
    }

    fn text_with_params(&self, key: &str, params: &LocalizationParams<'_>) -> String {
        self.parent.text_with_params(key, params)
    }

    fn language(&self) -> String {
        self.parent.language()
    }
}

impl Drop for LocalizationBridge {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for LocalizationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationBridge")
            .field("connected", &self.is_connected())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Bridge tied to one window's lifetime.
/// （與視窗生命週期綁定的橋接器。）
#[derive(Debug)]
pub struct FormLocalizationProvider {
    bridge: LocalizationBridge,
}

impl FormLocalizationProvider {
    pub fn new(parent: Rc<dyn LocalizationProvider>) -> Self {
        Self {
            bridge: LocalizationBridge::new(parent),
        }
    }

    pub fn window_opened(&self) {
        tracing::debug!("window opened; attaching localization bridge");
        self.bridge.connect();
    }

    pub fn window_closed(&self) {
        tracing::debug!("window closed; detaching localization bridge");
        self.bridge.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.bridge.is_connected()
    }
}

impl LocalizationProvider for FormLocalizationProvider {
    fn add_listener(&self, listener: Rc<dyn LocalizationListener>) -> ListenerId {
        self.bridge.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.bridge.remove_listener(id)
    }

    fn text(&self, key: &str) -> String {
        self.bridge.text(key)
    }

    fn text_with_params(&self, key: &str, params: &LocalizationParams<'_>) -> String {
        self.bridge.text_with_params(key, params)
    }

    fn language(&self) -> String {
        self.bridge.language()
    }
}

/// Display string that re-reads itself on every language change.
/// （語系變更時自動重新讀取的顯示字串。）
pub struct LocalizedText {
    key: String,
    provider: Rc<dyn LocalizationProvider>,
    value: RefCell<String>,
    registration: Cell<Option<ListenerId>>,
}

impl LocalizedText {
    pub fn new(key: impl Into<String>, provider: Rc<dyn LocalizationProvider>) -> Rc<Self> {
        let key = key.into();
        let value = provider.text(&key);
        let text = Rc::new(Self {
            key,
            provider,
            value: RefCell::new(value),
            registration: Cell::new(None),
        });
        let id = text.provider.add_listener(WeakListener::new(&text));
        text.registration.set(Some(id));
        text
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> String {
        self.value.borrow().clone()
    }
}

impl LocalizationListener for LocalizedText {
    fn localization_changed(&self) {
        *self.value.borrow_mut() = self.provider.text(&self.key);
    }
}

impl Drop for LocalizedText {
    fn drop(&mut self) {
        if let Some(id) = self.registration.take() {
            self.provider.remove_listener(id);
        }
    }
}

impl fmt::Debug for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizedText")
            .field("key", &self.key)
            .field("value", &self.value.borrow())
            .finish()
    }
}

/// Menu or toolbar action whose name and tooltip follow the active language.
/// （名稱與提示文字隨語系更新的選單／工具列動作。）
///
/// The tooltip is read from `<key>.desc`.
pub struct LocalizableAction {
    key: String,
    description_key: String,
    provider: Rc<dyn LocalizationProvider>,
    name: RefCell<String>,
    description: RefCell<String>,
    enabled: Cell<bool>,
    registration: Cell<Option<ListenerId>>,
}

impl LocalizableAction {
    pub fn new(key: impl Into<String>, provider: Rc<dyn LocalizationProvider>) -> Rc<Self> {
        let key = key.into();
        let description_key = format!("{key}.desc");
        let action = Rc::new(Self {
            name: RefCell::new(provider.text(&key)),
            description: RefCell::new(provider.text(&description_key)),
            key,
            description_key,
            provider,
            enabled: Cell::new(true),
            registration: Cell::new(None),
        });
        let id = action.provider.add_listener(WeakListener::new(&action));
        action.registration.set(Some(id));
        action
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn description(&self) -> String {
        self.description.borrow().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

impl LocalizationListener for LocalizableAction {
    fn localization_changed(&self) {
        *self.name.borrow_mut() = self.provider.text(&self.key);
        *self.description.borrow_mut() = self.provider.text(&self.description_key);
    }
}

impl Drop for LocalizableAction {
    fn drop(&mut self) {
        if let Some(id) = self.registration.take() {
            self.provider.remove_listener(id);
        }
    }
}

impl fmt::Debug for LocalizableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizableAction")
            .field("key", &self.key)
            .field("name", &self.name.borrow())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
