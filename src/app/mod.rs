use crate::pages::{FolderViewPage, LoginPage, NoteEditorPage, RootAuthed, RootPage, SettingsPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // CSR build; router hooks need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("folders") view=move || view! {
                    <RootAuthed>
                        <FolderViewPage />
                    </RootAuthed>
                } />
                <Route path=path!("note/:note_id") view=move || view! {
                    <RootAuthed>
                        <NoteEditorPage />
                    </RootAuthed>
                } />
                <Route path=path!("settings") view=move || view! {
                    <RootAuthed>
                        <SettingsPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
