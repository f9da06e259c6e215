use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.search_address`(...)
    SearchAddresses,
    /// Resolve the highlighted candidate, then run `service.search_florists`(...)
    OpenCandidate,
    /// Re-run `service.search_florists`(...) for the resolved address
    RefreshFlorists,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::AddressSearch => match key.code {
            Up => {
                if app.candidate_index > 0 {
                    app.candidate_index -= 1;
                }
            }
            Down => {
                if app.candidate_index + 1 < app.candidates.len() {
                    app.candidate_index += 1;
                }
            }
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.address_input.push(character);
                }
            }
            Backspace => {
                app.address_input.pop();
            }
            Enter => {
                action = Action::SearchAddresses;
            }
            Right | Tab => {
                action = Action::OpenCandidate;
            }
            Esc => {
                app.address_input.clear();
                app.candidates.clear();
                app.candidate_index = 0;
            }
            _ => {}
        },

        Screen::FloristView => match key.code {
            Char('q') => {
                action = Action::Quit;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::AddressSearch;
            }
            Char('[') => {
                if app.shift_date(false) {
                    action = Action::RefreshFlorists;
                }
            }
            Char(']') => {
                if app.shift_date(true) {
                    action = Action::RefreshFlorists;
                }
            }
            _ => {}
        },
    }
    action
}
