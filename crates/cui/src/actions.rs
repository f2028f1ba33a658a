use crate::app::App;
use crate::input::InputAction;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::ToggleHistory => app.history_open = !app.history_open,
        InputAction::Dismiss => app.show_help = false,
        InputAction::Draw => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.draw();
            }
        }
        InputAction::Reset => app.reset(),
        InputAction::Upload => app.open_upload_prompt(),
    }
}
