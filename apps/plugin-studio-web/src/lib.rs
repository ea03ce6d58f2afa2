#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

#[cfg(any(target_arch = "wasm32", test))]
mod presentation;
#[cfg(any(target_arch = "wasm32", test))]
mod response;
#[cfg(any(target_arch = "wasm32", test))]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use plugin_studio_core::{InputError, StudioController};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    use crate::presentation::UiAction;
    use crate::wasm_constants::*;

    mod dom;
    mod network;

    use dom::DomSurface;
    use network::FetchBackend;

    type Controller = StudioController<FetchBackend, DomSurface>;

    thread_local! {
        static CONTROLLER: RefCell<Option<Rc<Controller>>> = const { RefCell::new(None) };
        static PAINTED: RefCell<HashMap<&'static str, String>> = RefCell::new(HashMap::new());
        static ROOT_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static ROOT_KEYDOWN_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::KeyboardEvent)>>> = const { RefCell::new(None) };
        static EDITOR_INPUT_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        if let Err(error) = boot() {
            log_error(&format!("plugin studio boot failed: {error}"));
        }
    }

    /// Serialized view snapshot, for debugging from the browser console.
    #[wasm_bindgen]
    pub fn studio_view_json() -> String {
        controller()
            .and_then(|controller| serde_json::to_string(&controller.view()).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    fn boot() -> Result<(), String> {
        let editor = dom::ensure_studio_dom()?;
        let controller = Rc::new(StudioController::new(
            FetchBackend::same_origin(),
            DomSurface::new(editor),
        ));
        controller.set_change_listener(repaint);
        CONTROLLER.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&controller)));
        dom::install_handlers()?;
        repaint();

        spawn_local(async move {
            controller.refresh_workspaces().await;
        });
        Ok(())
    }

    fn controller() -> Option<Rc<Controller>> {
        CONTROLLER.with(|slot| slot.borrow().clone())
    }

    fn repaint() {
        let Some(controller) = controller() else {
            return;
        };
        if let Err(error) = dom::paint(&controller.view()) {
            log_error(&format!("plugin studio paint failed: {error}"));
        }
    }

    pub(super) fn log_error(message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }

    fn report(result: Result<(), InputError>) {
        match result {
            Ok(()) | Err(InputError::EmptyMessage) => {}
            Err(error) => web_sys::console::warn_1(&JsValue::from_str(&error.to_string())),
        }
    }

    pub(super) fn dispatch(action: UiAction) {
        let Some(controller) = controller() else {
            return;
        };
        match action {
            UiAction::RefreshWorkspaces => {
                spawn_local(async move { controller.refresh_workspaces().await });
            }
            UiAction::SelectWorkspace(name) => {
                spawn_local(async move { report(controller.select_workspace(&name).await) });
            }
            UiAction::ReturnToPicker => controller.return_to_picker(),
            UiAction::SendCreationMessage => {
                let text = dom::take_input(CREATION_INPUT_ID);
                spawn_local(async move { report(controller.send_creation_message(&text).await) });
            }
            UiAction::SendMessage => {
                let text = dom::take_input(CONVERSATION_INPUT_ID);
                spawn_local(async move { report(controller.send_message(&text).await) });
            }
            UiAction::SendEditorMessage => {
                let text = dom::take_input(EDITOR_CHAT_INPUT_ID);
                spawn_local(async move { report(controller.send_editor_message(&text).await) });
            }
            UiAction::OpenFile(name) => {
                spawn_local(async move { report(controller.open_file(&name).await) });
            }
            UiAction::ActivateTab(name) => {
                controller.activate_tab(&name);
            }
            UiAction::CloseTab(name) => {
                controller.close_tab(&name);
            }
            UiAction::Save => {
                spawn_local(async move {
                    controller.save_active_tab().await;
                });
            }
            UiAction::LoadAzdoTargets => {
                spawn_local(async move { controller.load_azdo_targets().await });
            }
            UiAction::PushToAzdo => {
                let target = dom::selected_target();
                spawn_local(async move { report(controller.push_to_azdo(&target).await) });
            }
        }
    }

    pub(super) fn edit_active_buffer(text: String) {
        if let Some(controller) = controller() {
            controller.edit_active_buffer(text);
        }
    }
}
