use crossterm::event::KeyEvent;

use crate::app::{App, ModalState};
use crate::ui::modal::ModalKeyResult;

/// Forward a key event to the currently open modal
pub(crate) fn forward_key_to_modal(app: &mut App, key: KeyEvent) {
    let result = match app.modal_state.as_modal_mut() {
        Some(modal) => modal.handle_key_modal(key),
        None => return,
    };

    match result {
        ModalKeyResult::Continue => {}
        ModalKeyResult::Close => app.close_modal(),
        ModalKeyResult::FolderNamed(name) => app.submit_new_folder(&name),
        ModalKeyResult::FolderChosen(choice) => {
            if let ModalState::FolderPicker(state) =
                std::mem::replace(&mut app.modal_state, ModalState::None)
            {
                app.resolve_assignment(state.into_pending(), choice.as_deref());
            }
        }
    }
}
