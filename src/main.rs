use iced::widget::{
    button, canvas, column, container, horizontal_space, row, scrollable, text, text_editor,
    Column,
};
use iced::{window, Alignment, Element, Length, Size, Task, Theme};
use rfd::AsyncFileDialog;
use std::path::PathBuf;

mod dataset;
mod error;
mod state;
mod ui;

use dataset::caption::Reload;
use dataset::preview::{self, LoadedImage};
use error::Error;
use state::data::{Pair, PairId};
use state::preferences::{FolderBookmarks, Preferences};
use state::session::Session;
use ui::viewport;

/// Image of the selected pair, as far as it has been loaded
#[derive(Debug, Clone)]
enum Preview {
    Loading(PairId),
    Ready(PairId, LoadedImage),
    Failed(PairId),
}

/// Main application state
struct LoraDataset {
    /// The open folder, if any
    session: Option<Session>,
    /// Remembers the last folder between launches
    bookmarks: Box<dyn FolderBookmarks>,
    /// Zoom/pan of the selected image
    viewport: viewport::Viewport,
    preview: Option<Preview>,
    /// Editor buffer for the selected caption
    editor: text_editor::Content,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Choose Folder"
    ChooseFolder,
    /// Folder dialog closed (None when cancelled)
    FolderChosen(Option<PathBuf>),
    Rescan,
    Select(PairId),
    CaptionEdited(text_editor::Action),
    SaveCaption,
    ReloadCaption,
    /// Background image decode completed
    ImageLoaded(PairId, Result<LoadedImage, Error>),
    /// Canvas input, applied in order
    Viewport(Vec<viewport::Event>),
}

impl LoraDataset {
    /// Create the application and reopen the last folder
    fn new() -> (Self, Task<Message>) {
        let bookmarks = Preferences::load();
        log::info!("Preferences at {}", bookmarks.path().display());

        let mut app = LoraDataset {
            session: None,
            bookmarks: Box::new(bookmarks),
            viewport: viewport::Viewport::new(),
            preview: None,
            editor: text_editor::Content::new(),
            status: "Choose a folder to start.".to_string(),
        };

        let task = match app.bookmarks.resolve() {
            Some(handle) => {
                if app.bookmarks.is_stale(&handle) {
                    log::warn!(
                        "Remembered folder {} looks stale, trying anyway",
                        handle.path.display()
                    );
                }
                app.open_folder(handle.path, false)
            }
            None => Task::none(),
        };

        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ChooseFolder => Task::perform(pick_folder(), Message::FolderChosen),
            Message::FolderChosen(Some(folder)) => self.open_folder(folder, true),
            Message::FolderChosen(None) => Task::none(),
            Message::Rescan => {
                let Some(session) = self.session.as_mut() else {
                    return Task::none();
                };
                match session.rescan() {
                    Ok(()) => {
                        self.status = scan_summary(session);
                        self.selection_changed()
                    }
                    Err(e) => {
                        log::error!("Rescan failed: {}", e);
                        self.status = format!("⚠️ Rescan failed: {}", e);
                        Task::none()
                    }
                }
            }
            Message::Select(id) => {
                let Some(session) = self.session.as_mut() else {
                    return Task::none();
                };
                if session.selected_id() == Some(id) || !session.select(id) {
                    return Task::none();
                }
                self.selection_changed()
            }
            Message::CaptionEdited(action) => {
                let is_edit = action.is_edit();
                self.editor.perform(action);
                if is_edit {
                    let caption = editor_text(&self.editor);
                    if let Some(session) = self.session.as_mut() {
                        session.set_selected_caption(caption);
                    }
                }
                Task::none()
            }
            Message::SaveCaption => {
                let Some(session) = self.session.as_mut() else {
                    return Task::none();
                };
                self.status = match session.save_selected() {
                    Ok(Some(pair)) => format!("✅ Saved {}", caption_name(pair)),
                    Ok(None) => return Task::none(),
                    Err(e) => {
                        log::error!("Failed to save caption: {}", e);
                        format!("⚠️ Save failed: {}", e)
                    }
                };
                let unsaved = session.unsaved_count();
                if unsaved > 0 {
                    self.status.push_str(&format!(" {} captions still have unsaved edits.", unsaved));
                }
                Task::none()
            }
            Message::ReloadCaption => {
                let Some(session) = self.session.as_mut() else {
                    return Task::none();
                };
                self.status = match session.reload_selected() {
                    Ok(Some(Reload::Updated)) => {
                        let pair = session.selected();
                        self.editor = text_editor::Content::with_text(
                            pair.map_or("", |p| p.caption_text.as_str()),
                        );
                        format!("Reloaded {}", pair.map(caption_name).unwrap_or_default())
                    }
                    Ok(Some(Reload::Missing)) => {
                        "Caption file does not exist yet; kept the current text.".to_string()
                    }
                    Ok(None) => return Task::none(),
                    Err(e) => {
                        log::warn!("Failed to reload caption: {}", e);
                        format!("⚠️ Reload failed: {}", e)
                    }
                };
                Task::none()
            }
            Message::ImageLoaded(id, result) => {
                // Drop results for a pair that is no longer displayed
                if !matches!(self.preview, Some(Preview::Loading(loading)) if loading == id) {
                    return Task::none();
                }
                match result {
                    Ok(image) => {
                        self.viewport.set_image(Some(image.size));
                        self.preview = Some(Preview::Ready(id, image));
                    }
                    Err(e) => {
                        log::warn!("Could not load image: {}", e);
                        self.viewport.set_image(None);
                        self.preview = Some(Preview::Failed(id));
                    }
                }
                Task::none()
            }
            Message::Viewport(events) => {
                for event in events {
                    self.viewport.apply(event);
                }
                Task::none()
            }
        }
    }

    /// Scan `folder` and make it the open folder
    ///
    /// When `remember` is set the folder is also stored for the next launch.
    fn open_folder(&mut self, folder: PathBuf, remember: bool) -> Task<Message> {
        match Session::open(folder.clone()) {
            Ok(session) => {
                if remember {
                    if let Err(e) = self.bookmarks.save(&folder) {
                        log::warn!("Could not remember folder: {}", e);
                    }
                }
                self.status = scan_summary(&session);
                self.session = Some(session);
                self.selection_changed()
            }
            Err(e) => {
                log::error!("Could not open folder: {}", e);
                self.status = format!("⚠️ Could not open folder: {}", e);
                Task::none()
            }
        }
    }

    /// Sync the editor, viewport and image with the selected pair
    fn selection_changed(&mut self) -> Task<Message> {
        let selected = self.session.as_ref().and_then(|s| s.selected());

        self.editor =
            text_editor::Content::with_text(selected.map_or("", |p| p.caption_text.as_str()));
        self.viewport.set_image(None);

        match selected {
            Some(pair) => {
                let id = pair.id;
                self.preview = Some(Preview::Loading(id));
                Task::perform(preview::load_image(pair.image_path().to_path_buf()), move |result| {
                    Message::ImageLoaded(id, result)
                })
            }
            None => {
                self.preview = None;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let content = row![self.view_sidebar(), self.view_detail()]
            .spacing(12)
            .height(Length::Fill);

        column![content, text(&self.status).size(14)]
            .spacing(8)
            .padding(12)
            .into()
    }

    fn view_sidebar(&self) -> Element<Message> {
        let mut header = row![button("Choose Folder").on_press(Message::ChooseFolder)]
            .spacing(8)
            .align_y(Alignment::Center);
        if let Some(session) = &self.session {
            header = header
                .push(text(session.directory_name()).size(12))
                .push(horizontal_space())
                .push(button("Rescan").on_press(Message::Rescan).style(button::secondary));
        }

        let selected = self.session.as_ref().and_then(|s| s.selected_id());
        let items = self
            .session
            .iter()
            .flat_map(|s| s.pairs())
            .map(|pair| view_pair_row(pair, selected == Some(pair.id)));
        let list = scrollable(Column::with_children(items).spacing(2)).height(Length::Fill);

        column![header, list]
            .spacing(8)
            .width(Length::Fixed(280.0))
            .into()
    }

    fn view_detail(&self) -> Element<Message> {
        let Some(pair) = self.session.as_ref().and_then(|s| s.selected()) else {
            return centered(text("Select an image on the left.").style(text::secondary));
        };

        let title = row![
            text(pair.file_name()).size(20),
            horizontal_space(),
            button("Reload Caption").on_press(Message::ReloadCaption),
        ]
        .align_y(Alignment::Center);

        let image: Element<Message> = match &self.preview {
            Some(Preview::Ready(id, image)) if *id == pair.id => canvas(ui::ImageCanvas {
                image,
                viewport: &self.viewport,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            Some(Preview::Failed(id)) if *id == pair.id => centered(
                text("Could not load the image.").style(text::danger),
            ),
            _ => centered(text("Loading image…").style(text::secondary)),
        };

        let editor = column![
            text("Caption").size(14),
            text_editor(&self.editor)
                .on_action(Message::CaptionEdited)
                .height(Length::Fill),
            row![
                text(pair.caption_path.display().to_string())
                    .size(11)
                    .style(text::secondary),
                horizontal_space(),
                button("Save").on_press(Message::SaveCaption),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        ]
        .spacing(8)
        .width(Length::FillPortion(2));

        let body = row![
            container(image)
                .width(Length::FillPortion(3))
                .height(Length::Fill),
            editor
        ]
        .spacing(12)
        .height(Length::Fill);

        column![title, body].spacing(12).width(Length::Fill).into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// One entry of the image list
fn view_pair_row(pair: &Pair, selected: bool) -> Element<'_, Message> {
    let mut label = row![text(pair.file_name()).size(14), horizontal_space()]
        .spacing(6)
        .align_y(Alignment::Center);
    if pair.is_dirty() {
        label = label.push(text("●").size(12));
    }
    if !pair.has_caption() {
        label = label.push(text("no caption").size(12).style(text::secondary));
    }

    button(label)
        .width(Length::Fill)
        .style(if selected { button::primary } else { button::text })
        .on_press(Message::Select(pair.id))
        .into()
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Caption text held by the editor
///
/// `Content::text` ends every line with a break, so a caption with and
/// without a final newline would read the same. Joining the lines keeps
/// them apart.
fn editor_text(content: &text_editor::Content) -> String {
    content
        .lines()
        .map(|line| String::from(&*line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn caption_name(pair: &Pair) -> String {
    pair.caption_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn scan_summary(session: &Session) -> String {
    let total = session.pairs().len();
    let missing = session.pairs().iter().filter(|p| !p.has_caption()).count();
    let mut summary = format!(
        "{} images in {}, {} without caption.",
        total,
        session.directory().display(),
        missing
    );
    let unreadable = session.unreadable_count();
    if unreadable > 0 {
        summary.push_str(&format!(" ⚠️ {} captions could not be read.", unreadable));
    }
    let edited = session.pairs().iter().filter(|p| p.has_edits()).count();
    if edited > 0 {
        summary.push_str(&format!(" {} unsaved edits kept.", edited));
    }
    summary
}

/// Show the native folder picker
async fn pick_folder() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select the dataset folder")
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("LoRA Dataset", LoraDataset::update, LoraDataset::view)
        .theme(LoraDataset::theme)
        .window(window::Settings {
            size: Size::new(1100.0, 700.0),
            min_size: Some(Size::new(900.0, 500.0)),
            ..window::Settings::default()
        })
        .centered()
        .run_with(LoraDataset::new)
}
