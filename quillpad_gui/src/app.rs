use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use eframe::{egui, App, Frame};
use egui::{Align, Align2, Color32, FontId, Layout, RichText, ViewportCommand};
use quillpad_core::{
    caret_status, collator_for, collect_statistics, convert_selection_case, dedup_selected_lines,
    sort_selected_lines, DocumentId, DocumentSet, DocumentSetError, EditorBuffer, EditorError,
    MultipleDocumentListener, SingleDocument, SingleDocumentListener,
};
use quillpad_settings::{
    FormLocalizationProvider, LanguageProvider, LocalizationListener, LocalizationParams,
    LocalizationProvider, PreferencesStore,
};

use crate::closing::{CloseDecision, ClosePlan};
use crate::commands::{ActionSet, Command, MENU_STRUCTURE, TOOLBAR};

const CLOCK_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const CLOCK_TICK: Duration = Duration::from_millis(500);
const SAVED_COLOR: Color32 = Color32::from_rgb(34, 160, 70);
const MODIFIED_COLOR: Color32 = Color32::from_rgb(210, 48, 48);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Error,
    Information,
    Warning,
}

impl NoticeKind {
    fn title_key(self) -> &'static str {
        match self {
            NoticeKind::Error => "notice.error",
            NoticeKind::Information => "notice.information",
            NoticeKind::Warning => "notice.warning",
        }
    }
}

#[derive(Debug, Clone)]
struct Notice {
    kind: NoticeKind,
    title_key: &'static str,
    message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: String) -> Self {
        Self {
            kind,
            title_key: kind.title_key(),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveOutcome {
    Saved,
    Cancelled,
    Failed,
}

/// Shared flags raised by model listeners and consumed once per frame.
#[derive(Default)]
struct ShellEvents {
    title_dirty: Cell<bool>,
    added: RefCell<Vec<DocumentId>>,
}

struct DocumentSetEvents(Rc<ShellEvents>);

impl MultipleDocumentListener for DocumentSetEvents {
    fn current_document_changed(&mut self, _: Option<DocumentId>, _: Option<DocumentId>) {
        self.0.title_dirty.set(true);
    }

    fn document_added(&mut self, document: DocumentId) {
        self.0.added.borrow_mut().push(document);
    }
}

struct DocumentEvents(Rc<ShellEvents>);

impl SingleDocumentListener for DocumentEvents {
    fn file_path_updated(&mut self, _: &SingleDocument) {
        self.0.title_dirty.set(true);
    }
}

impl LocalizationListener for ShellEvents {
    fn localization_changed(&self) {
        self.title_dirty.set(true);
    }
}

pub struct QuillpadApp {
    documents: DocumentSet,
    language: Rc<LanguageProvider>,
    form: Rc<FormLocalizationProvider>,
    actions: ActionSet,
    events: Rc<ShellEvents>,
    preferences: Option<PreferencesStore>,
    notice: Option<Notice>,
    closing: Option<ClosePlan>,
    clipboard: Option<arboard::Clipboard>,
    sync_selection: bool,
    allow_close: bool,
}

impl QuillpadApp {
    pub fn new(
        language: Rc<LanguageProvider>,
        preferences: Option<PreferencesStore>,
        files: Vec<PathBuf>,
    ) -> Self {
        let form = Rc::new(FormLocalizationProvider::new(language.clone()));
        let actions = ActionSet::new(form.clone(), &language.languages());
        let events = Rc::new(ShellEvents::default());
        events.title_dirty.set(true);
        form.add_listener(events.clone());
        form.window_opened();

        let mut documents = DocumentSet::new();
        documents.add_listener(Box::new(DocumentSetEvents(events.clone())));

        let mut app = Self {
            documents,
            language,
            form,
            actions,
            events,
            preferences,
            notice: None,
            closing: None,
            clipboard: arboard::Clipboard::new()
                .map_err(|err| tracing::warn!("clipboard unavailable: {err}"))
                .ok(),
            sync_selection: false,
            allow_close: false,
        };
        for path in files {
            app.open_path(&path);
        }
        app.attach_new_documents();
        app
    }

    fn text(&self, key: &str) -> String {
        self.form.text(key)
    }

    fn format_indexed(&self, key: &str, values: &[String]) -> String {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        self.form
            .text_with_params(key, &LocalizationParams::new(&values))
    }

    fn font_size(&self) -> f32 {
        self.preferences
            .as_ref()
            .map(|store| store.preferences().editor.font_size)
            .unwrap_or(14.0)
    }

    fn document_label(&self, document: &SingleDocument) -> String {
        match document.path() {
            Some(path) => path.display().to_string(),
            None => self.text("document.untitled"),
        }
    }

    fn attach_new_documents(&mut self) {
        let added: Vec<DocumentId> = self.events.added.borrow_mut().drain(..).collect();
        for id in added {
            if let Some(document) = self.documents.document_mut(id) {
                document.add_listener(Box::new(DocumentEvents(self.events.clone())));
            }
        }
    }

    fn refresh_window_title(&mut self, ctx: &egui::Context) {
        if !self.events.title_dirty.replace(false) {
            return;
        }
        let title = match self.documents.current_document() {
            Some(document) => {
                self.format_indexed("window.title", &[self.document_label(document)])
            }
            None => self.text("app.name"),
        };
        ctx.send_viewport_cmd(ViewportCommand::Title(title));
    }

    fn show_notice(&mut self, kind: NoticeKind, message: String) {
        match kind {
            NoticeKind::Error => tracing::error!("{message}"),
            NoticeKind::Warning => tracing::warn!("{message}"),
            NoticeKind::Information => tracing::debug!("{message}"),
        }
        self.notice = Some(Notice::new(kind, message));
    }

    fn open_path(&mut self, path: &Path) {
        if let Err(err) = self.documents.load_document(path) {
            let message = self.format_indexed(
                "notice.open_failed",
                &[path.display().to_string(), err.to_string()],
            );
            self.show_notice(NoticeKind::Error, message);
        }
    }

    fn open_with_picker(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .set_title(self.text("menu.file.open"))
            .pick_files()
        else {
            return;
        };
        for path in paths {
            self.open_path(&path);
        }
    }

    /// Saves `id`, asking for a path when it has none or when `choose_path` is set.
    fn save(&mut self, id: DocumentId, choose_path: bool, announce: bool) -> SaveOutcome {
        let Some(document) = self.documents.document(id) else {
            return SaveOutcome::Failed;
        };
        let target = if choose_path || document.path().is_none() {
            let picked = rfd::FileDialog::new()
                .set_title(self.text("menu.file.save_as"))
                .set_file_name(document.title(&self.text("document.untitled")))
                .save_file();
            match picked {
                Some(path) => Some(path),
                None => {
                    self.show_notice(NoticeKind::Warning, self.text("notice.nothing_saved"));
                    return SaveOutcome::Cancelled;
                }
            }
        } else {
            None
        };

        let label = target
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| self.document_label(document));
        match self.documents.save_document(id, target.as_deref()) {
            Ok(()) => {
                if announce {
                    self.show_notice(NoticeKind::Information, self.text("notice.saved"));
                }
                SaveOutcome::Saved
            }
            Err(DocumentSetError::PathAlreadyOpen { .. }) => {
                let message = self.format_indexed("notice.path_open", &[label]);
                self.show_notice(NoticeKind::Error, message);
                SaveOutcome::Failed
            }
            Err(err) => {
                let message = self.format_indexed("notice.save_failed", &[label, err.to_string()]);
                self.show_notice(NoticeKind::Error, message);
                SaveOutcome::Failed
            }
        }
    }

    fn apply_to_current<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut EditorBuffer) -> Result<bool, EditorError>,
    {
        let Some(document) = self.documents.current_document_mut() else {
            return;
        };
        match document.apply(edit) {
            Ok(changed) => self.sync_selection = changed,
            Err(err) => self.show_notice(NoticeKind::Error, err.to_string()),
        }
    }

    fn copy_selection(&self, ctx: &egui::Context) {
        if let Some(document) = self.documents.current_document() {
            let selected = document.buffer().selected_text().to_string();
            if !selected.is_empty() {
                ctx.output_mut(|output| output.copied_text = selected);
            }
        }
    }

    fn clipboard_text(&mut self) -> Option<String> {
        let clipboard = self.clipboard.as_mut()?;
        match clipboard.get_text() {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("could not read clipboard: {err}");
                None
            }
        }
    }

    fn show_statistics(&mut self) {
        let Some(document) = self.documents.current_document() else {
            return;
        };
        let stats = collect_statistics(document.text());
        let message = [
            ("stats.characters", stats.characters),
            ("stats.non_blank", stats.non_blank_characters),
            ("stats.lines", stats.lines),
        ]
        .iter()
        .map(|(key, count)| {
            self.form
                .text_with_params(key, &LocalizationParams::count_only(*count as u64))
        })
        .collect::<Vec<_>>()
        .join("\n");
        self.notice = Some(Notice {
            kind: NoticeKind::Information,
            title_key: "stats.title",
            message,
        });
    }

    fn switch_language(&mut self, code: &str) {
        match self.language.set_language(code) {
            Ok(false) => {}
            Ok(true) => {
                if let Some(store) = self.preferences.as_mut() {
                    if let Err(err) = store.update(|prefs| prefs.ui.language = code.to_string()) {
                        tracing::warn!("could not store language preference: {err}");
                    }
                }
            }
            Err(err) => self.show_notice(NoticeKind::Error, err.to_string()),
        }
    }

    fn begin_close(&mut self, targets: Vec<DocumentId>) {
        if self.closing.is_none() {
            self.closing = Some(ClosePlan::for_documents(&self.documents, targets));
        }
    }

    fn begin_exit(&mut self) {
        let confirm = self
            .preferences
            .as_ref()
            .map(|store| store.preferences().editor.confirm_on_exit)
            .unwrap_or(true);
        match self.closing.as_mut() {
            // A tab close in progress keeps its questions and then quits.
            Some(plan) => plan.extend_to_exit(&self.documents, confirm),
            None => self.closing = Some(ClosePlan::for_exit(&self.documents, confirm)),
        }
    }

    fn execute(&mut self, ctx: &egui::Context, command: Command) {
        tracing::debug!("executing {command:?}");
        match command {
            Command::New => {
                self.documents.create_document();
            }
            Command::Open => self.open_with_picker(),
            Command::Save | Command::SaveAs => {
                if let Some(id) = self.documents.current_id() {
                    self.save(id, command == Command::SaveAs, true);
                }
            }
            Command::Close => {
                if let Some(id) = self.documents.current_id() {
                    self.begin_close(vec![id]);
                }
            }
            Command::Statistics => self.show_statistics(),
            Command::Exit => self.begin_exit(),
            Command::Copy => self.copy_selection(ctx),
            Command::Cut => {
                self.copy_selection(ctx);
                self.apply_to_current(|buffer| {
                    if buffer.clamped_selection().is_empty() {
                        return Ok(false);
                    }
                    buffer.replace_selection("")
                });
            }
            Command::Paste => {
                if let Some(text) = self.clipboard_text() {
                    self.apply_to_current(|buffer| buffer.replace_selection(&text));
                }
            }
            Command::RemoveDuplicates => self.apply_to_current(dedup_selected_lines),
            Command::Language(code) => self.switch_language(code),
            Command::Case(transform) => {
                self.apply_to_current(|buffer| convert_selection_case(buffer, transform))
            }
            Command::Sort(order) => {
                let collator = collator_for(&self.language.language());
                self.apply_to_current(|buffer| sort_selected_lines(buffer, order, collator.as_ref()))
            }
        }
        self.attach_new_documents();
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if self.closing.is_some() || self.notice.is_some() {
            return;
        }
        for (shortcut, command, key) in self.actions.shortcuts() {
            let enabled = self
                .actions
                .get(key)
                .map(|(_, action)| action.is_enabled())
                .unwrap_or(false);
            if enabled && ctx.input_mut(|input| input.consume_shortcut(&shortcut)) {
                self.execute(ctx, command);
                return;
            }
        }
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if ctx.input(|input| input.viewport().close_requested()) && !self.allow_close {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            self.begin_exit();
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        let mut clicked = None;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                for section in MENU_STRUCTURE.iter() {
                    ui.menu_button(self.actions.title(section.title_key), |ui| {
                        for item in &section.items {
                            let Some((_, action)) = self.actions.get(item.key) else {
                                continue;
                            };
                            let label = self.actions.label(item);
                            let response = if let Command::Language(code) = item.command {
                                let active = self.language.language() == code;
                                ui.add_enabled(
                                    action.is_enabled(),
                                    egui::SelectableLabel::new(active, label),
                                )
                            } else {
                                let mut button = egui::Button::new(label);
                                if let Some(shortcut) = &item.shortcut {
                                    button = button.shortcut_text(ctx.format_shortcut(shortcut));
                                }
                                ui.add_enabled(action.is_enabled(), button)
                            };
                            if response.on_hover_text(action.description()).clicked() {
                                clicked = Some(item.command);
                                ui.close_menu();
                            }
                        }
                    });
                }
            });
        });
        if let Some(command) = clicked {
            self.execute(ctx, command);
        }
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        let mut clicked = None;
        egui::TopBottomPanel::top("toolbar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    for key in TOOLBAR {
                        let Some((item, action)) = self.actions.get(key) else {
                            continue;
                        };
                        if ui
                            .add_enabled(action.is_enabled(), egui::Button::new(action.name()))
                            .on_hover_text(action.description())
                            .clicked()
                        {
                            clicked = Some(item.command);
                        }
                    }
                });
            });
        if let Some(command) = clicked {
            self.execute(ctx, command);
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    ui.spacing_mut().item_spacing.x = 10.0;
                    if let Some(document) = self.documents.current_document() {
                        let status = caret_status(document.buffer());
                        ui.label(
                            self.format_indexed("status.length", &[status.length.to_string()]),
                        );
                        ui.separator();
                        ui.label(self.format_indexed(
                            "status.position",
                            &[
                                status.line.to_string(),
                                status.column.to_string(),
                                status.selection.to_string(),
                            ],
                        ));
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(chrono::Local::now().format(CLOCK_FORMAT).to_string());
                    });
                });
            });
        ctx.request_repaint_after(CLOCK_TICK);
    }

    fn show_tab_strip(&mut self, ui: &mut egui::Ui) {
        let untitled = self.text("document.untitled");
        let close_hover = self.text("tabs.close_hover");
        let current = self.documents.current_id();
        let mut selected = None;
        let mut closed = None;

        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for document in &self.documents {
                    let marker = if document.is_modified() {
                        MODIFIED_COLOR
                    } else {
                        SAVED_COLOR
                    };
                    ui.label(RichText::new("●").color(marker));
                    let tooltip = document
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| untitled.clone());
                    let is_active = current == Some(document.id());
                    if ui
                        .selectable_label(is_active, document.title(&untitled))
                        .on_hover_text(tooltip)
                        .clicked()
                    {
                        selected = Some(document.id());
                    }
                    let close = egui::Button::new(RichText::new("✕").small()).frame(false);
                    if ui.add(close).on_hover_text(close_hover.as_str()).clicked() {
                        closed = Some(document.id());
                    }
                    ui.add_space(6.0);
                }
            });
        });

        if let Some(id) = selected {
            if let Err(err) = self.documents.select_document(id) {
                tracing::warn!("tab selection failed: {err}");
            }
        }
        if let Some(id) = closed {
            self.begin_close(vec![id]);
        }
    }

    fn show_editor_area(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_tab_strip(ui);
            ui.separator();

            let font = FontId::monospace(self.font_size());
            let sync_selection = std::mem::take(&mut self.sync_selection);
            let Some(document) = self.documents.current_document_mut() else {
                return;
            };
            let id = egui::Id::new(("editor", document.id().raw()));
            if sync_selection {
                if let Some(mut state) = egui::TextEdit::load_state(ui.ctx(), id) {
                    let (anchor, head) = document.buffer().selection_chars();
                    state.set_ccursor_range(Some(egui::text::CCursorRange::two(
                        egui::text::CCursor::new(anchor),
                        egui::text::CCursor::new(head),
                    )));
                    state.store(ui.ctx(), id);
                }
            }

            let output = egui::ScrollArea::both()
                .id_source(("editor_scroll", document.id().raw()))
                .show(ui, |ui| {
                    egui::TextEdit::multiline(document.buffer_mut().text_mut())
                        .id(id)
                        .font(font)
                        .frame(false)
                        .desired_width(f32::INFINITY)
                        .desired_rows(30)
                        .show(ui)
                })
                .inner;

            if output.response.changed() {
                document.set_modified(true);
            }
            if let Some(range) = output.cursor_range {
                document
                    .buffer_mut()
                    .set_selection_chars(range.secondary.ccursor.index, range.primary.ccursor.index);
            }
        });
    }

    fn show_notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        let title = self.text(notice.title_key);
        let ok = self.text("dialog.ok");
        let color = match notice.kind {
            NoticeKind::Error => Color32::from_rgb(239, 68, 68),
            NoticeKind::Warning => Color32::from_rgb(234, 179, 8),
            NoticeKind::Information => ctx.style().visuals.text_color(),
        };
        let mut dismissed = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&notice.message).color(color));
                ui.add_space(8.0);
                if ui.button(ok).clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.notice = None;
        }
    }

    fn show_close_dialog(&mut self, ctx: &egui::Context) {
        let Some(plan) = &self.closing else {
            return;
        };
        // A notice raised while saving is shown before the next question.
        if self.notice.is_some() {
            return;
        }

        if plan.is_ready() {
            self.finish_close(ctx);
            return;
        }
        let Some(id) = plan.next_question() else {
            return;
        };
        let label = self
            .documents
            .document(id)
            .map(|document| self.document_label(document))
            .unwrap_or_default();
        let message = self.format_indexed("dialog.unsaved.message", &[label]);
        let mut decision = None;
        egui::Window::new(self.text("dialog.unsaved.title"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(self.text("dialog.save")).clicked() {
                        decision = Some(CloseDecision::Save);
                    }
                    if ui.button(self.text("dialog.dont_save")).clicked() {
                        decision = Some(CloseDecision::Discard);
                    }
                    if ui.button(self.text("dialog.cancel")).clicked() {
                        decision = Some(CloseDecision::Cancel);
                    }
                });
            });

        let Some(decision) = decision else {
            return;
        };
        let decision = match decision {
            CloseDecision::Save if self.save(id, false, false) != SaveOutcome::Saved => {
                CloseDecision::Cancel
            }
            other => other,
        };
        if let Some(plan) = self.closing.as_mut() {
            plan.resolve(decision);
            if plan.is_cancelled() {
                tracing::debug!("close cancelled");
                self.closing = None;
            }
        }
    }

    fn finish_close(&mut self, ctx: &egui::Context) {
        let Some(plan) = self.closing.take() else {
            return;
        };
        for id in plan.targets() {
            if let Err(err) = self.documents.close_document(*id) {
                tracing::warn!("closing {id} failed: {err}");
            }
        }
        if plan.exits() {
            tracing::info!("exiting");
            self.allow_close = true;
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }
    }
}

impl App for QuillpadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_close_request(ctx);

        let (has_document, has_selection) = match self.documents.current_document() {
            Some(document) => (true, !document.buffer().clamped_selection().is_empty()),
            None => (false, false),
        };
        self.actions.refresh_enabled(has_document, has_selection);
        self.handle_shortcuts(ctx);

        self.show_menu_bar(ctx);
        self.show_toolbar(ctx);
        self.show_status_bar(ctx);
        self.show_editor_area(ctx);
        self.show_notice_window(ctx);
        self.show_close_dialog(ctx);

        self.attach_new_documents();
        self.refresh_window_title(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.form.window_closed();
    }
}
