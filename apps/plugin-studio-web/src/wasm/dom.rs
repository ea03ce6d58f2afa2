use plugin_studio_core::view::StudioView;
use plugin_studio_core::{EditorSurface, Screen, TextBuffer};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
};

use super::*;
use crate::presentation::{self, UiAction};

/// Textarea the active tab is displayed in. The surface only ever writes to
/// the widget; edits flow back through the input listener.
pub(super) struct DomSurface {
    editor: HtmlTextAreaElement,
}

impl DomSurface {
    pub(super) fn new(editor: HtmlTextAreaElement) -> Self {
        Self { editor }
    }
}

impl EditorSurface for DomSurface {
    fn show(&mut self, filename: &str, buffer: &TextBuffer) {
        self.editor.set_value(buffer.text());
        self.editor.set_disabled(false);
        let _ = self.editor.set_attribute(NAME_ATTR, filename);
    }

    fn clear(&mut self) {
        self.editor.set_value("");
        self.editor.set_disabled(true);
        let _ = self.editor.remove_attribute(NAME_ATTR);
    }
}

fn document() -> Result<Document, String> {
    web_sys::window()
        .ok_or_else(|| "window is unavailable".to_string())?
        .document()
        .ok_or_else(|| "document is unavailable".to_string())
}

fn element(document: &Document, id: &str) -> Result<Element, String> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| format!("missing element #{id}"))
}

/// Builds the shell under `<body>` once and returns the editor widget.
pub(super) fn ensure_studio_dom() -> Result<HtmlTextAreaElement, String> {
    let document = document()?;
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;

    if document.get_element_by_id(STUDIO_ROOT_ID).is_none() {
        let root = document
            .create_element("main")
            .map_err(|_| "failed to create studio root".to_string())?;
        root.set_id(STUDIO_ROOT_ID);
        root.set_inner_html(&presentation::shell_layout_html());
        body.append_child(&root)
            .map_err(|_| "failed to attach studio root".to_string())?;
    }

    element(&document, EDITOR_ID)?
        .dyn_into::<HtmlTextAreaElement>()
        .map_err(|_| "studio editor is not a textarea".to_string())
}

/// Installs the delegated listeners on the root. Safe to call repeatedly.
pub(super) fn install_handlers() -> Result<(), String> {
    let document = document()?;
    let root = element(&document, STUDIO_ROOT_ID)?;

    ROOT_CLICK_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            move |event: web_sys::Event| {
                if let Some(action) = clicked_action(&event) {
                    dispatch(action);
                }
            },
        ));
        let _ = root.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });

    ROOT_KEYDOWN_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::wrap(Box::new(
            move |event: web_sys::KeyboardEvent| {
                if event.key() != "Enter" || event.shift_key() {
                    return;
                }
                let Some(action) = target_id(&event).and_then(|id| UiAction::for_submit(&id))
                else {
                    return;
                };
                event.prevent_default();
                dispatch(action);
            },
        ));
        let _ =
            root.add_event_listener_with_callback("keydown", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });

    EDITOR_INPUT_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            move |event: web_sys::Event| {
                let Some(editor) = event
                    .target()
                    .and_then(|target| target.dyn_into::<HtmlTextAreaElement>().ok())
                else {
                    return;
                };
                if editor.id() == EDITOR_ID {
                    edit_active_buffer(editor.value());
                }
            },
        ));
        let _ = root.add_event_listener_with_callback("input", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });

    Ok(())
}

fn target_id(event: &web_sys::Event) -> Option<String> {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .map(|element| element.id())
}

fn clicked_action(event: &web_sys::Event) -> Option<UiAction> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let source = target
        .closest(&format!("[{ACTION_ATTR}]"))
        .ok()
        .flatten()?;
    let action = source.get_attribute(ACTION_ATTR)?;
    UiAction::parse(&action, source.get_attribute(NAME_ATTR))
}

/// Reads and clears a composer input.
pub(super) fn take_input(id: &str) -> String {
    let Some(input) = document()
        .ok()
        .and_then(|document| document.get_element_by_id(id))
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
    else {
        return String::new();
    };
    let value = input.value();
    if !value.trim().is_empty() {
        input.set_value("");
    }
    value
}

pub(super) fn selected_target() -> String {
    document()
        .ok()
        .and_then(|document| document.get_element_by_id(AZDO_TARGET_SELECT_ID))
        .and_then(|element| element.dyn_into::<HtmlSelectElement>().ok())
        .map(|select| select.value())
        .unwrap_or_default()
}

/// Assigns `html` unless the region already shows it.
fn paint_html(document: &Document, id: &'static str, html: String) -> Result<bool, String> {
    let unchanged = PAINTED.with(|painted| painted.borrow().get(id) == Some(&html));
    if unchanged {
        return Ok(false);
    }
    element(document, id)?.set_inner_html(&html);
    PAINTED.with(|painted| painted.borrow_mut().insert(id, html));
    Ok(true)
}

fn paint_messages(document: &Document, id: &'static str, html: String) -> Result<(), String> {
    if paint_html(document, id, html)? {
        let messages = element(document, id)?;
        messages.set_scroll_top(messages.scroll_height());
    }
    Ok(())
}

fn set_hidden(document: &Document, id: &str, hidden: bool) -> Result<(), String> {
    element(document, id)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("#{id} is not an HtmlElement"))?
        .set_hidden(hidden);
    Ok(())
}

fn set_disabled(document: &Document, id: &str, disabled: bool) -> Result<(), String> {
    let element = element(document, id)?;
    let result = if disabled {
        element.set_attribute("disabled", "")
    } else {
        element.remove_attribute("disabled")
    };
    result.map_err(|_| format!("failed to toggle #{id}"))
}

pub(super) fn paint(view: &StudioView) -> Result<(), String> {
    let document = document()?;
    let on_picker = matches!(view.screen, Screen::Picker);
    set_hidden(&document, PICKER_SCREEN_ID, !on_picker)?;
    set_hidden(&document, WORKSPACE_SCREEN_ID, on_picker)?;

    paint_html(
        &document,
        WORKSPACE_LIST_ID,
        presentation::workspace_list_html(&view.picker),
    )?;
    paint_messages(
        &document,
        CREATION_MESSAGES_ID,
        presentation::bubbles_html(&view.creation_chat),
    )?;
    if on_picker {
        return Ok(());
    }

    element(&document, WORKSPACE_TITLE_ID)?
        .set_text_content(Some(presentation::workspace_title(&view.screen)));
    paint_messages(
        &document,
        CONVERSATION_MESSAGES_ID,
        presentation::bubbles_html(&view.conversation),
    )?;
    paint_messages(
        &document,
        EDITOR_CHAT_MESSAGES_ID,
        presentation::bubbles_html(&view.editor_chat),
    )?;
    paint_html(&document, FILE_LIST_ID, presentation::file_list_html(&view.files))?;
    paint_html(&document, TAB_STRIP_ID, presentation::tab_strip_html(&view.tabs))?;
    set_disabled(&document, SAVE_BUTTON_ID, !view.can_save || view.saving)?;

    element(&document, AZDO_STATUS_ID)?
        .set_text_content(Some(presentation::azdo_status_text(&view.azdo)));
    let select = element(&document, AZDO_TARGET_SELECT_ID)?
        .dyn_into::<HtmlSelectElement>()
        .map_err(|_| "azdo target picker is not a select".to_string())?;
    let previous = select.value();
    if paint_html(
        &document,
        AZDO_TARGET_SELECT_ID,
        presentation::azdo_options_html(&view.azdo),
    )? && view.azdo.targets.contains(&previous)
    {
        select.set_value(&previous);
    }
    set_disabled(
        &document,
        AZDO_PUSH_BUTTON_ID,
        !presentation::can_push(&view.azdo),
    )?;
    Ok(())
}
