use crate::app::{App, MenuItem};
use crate::state::messages::LoaderRequest;
use bracket_engine::Slot;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    loader_requests: &mpsc::Sender<LoaderRequest>,
) {
    if key_event.kind == KeyEventKind::Release {
        return;
    }

    let mut guard = app.lock().await;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char(key @ ('1' | '2' | '3' | '?')), _) => {
            let tab = match key {
                '1' => MenuItem::Standings,
                '2' => MenuItem::Stakes,
                '3' => MenuItem::PickWizard,
                _ => MenuItem::Help,
            };
            if let Some(request) = guard.update_tab(tab) {
                drop(guard);
                let _ = loader_requests.send(request).await;
            }
        }
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Standings / stakes
        (MenuItem::Standings | MenuItem::Stakes, Char('j') | KeyCode::Down, _) => guard.select_next(),
        (MenuItem::Standings | MenuItem::Stakes, Char('k') | KeyCode::Up, _) => guard.select_prev(),

        // Pick wizard
        (MenuItem::PickWizard, Char('h') | KeyCode::Left, _) => guard.pick_wizard_pick(Slot::Team1),
        (MenuItem::PickWizard, Char('l') | KeyCode::Right, _) => guard.pick_wizard_pick(Slot::Team2),
        (MenuItem::PickWizard, Char('b') | KeyCode::Backspace, _) => guard.pick_wizard_back(),
        (MenuItem::PickWizard, Char('s'), _) => {
            if let Some((path, record)) = guard.export_picks() {
                drop(guard);
                let _ = loader_requests.send(LoaderRequest::SavePicks { path, record }).await;
            }
        }

        // Global
        (_, Char('R'), _) => {
            drop(guard);
            let _ = loader_requests.send(LoaderRequest::LoadPool).await;
        }
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }
}
