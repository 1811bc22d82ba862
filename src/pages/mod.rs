use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardHeader, CardTitle,
    Input, Label, Spinner,
};
use crate::editor::CardEditor;
use crate::models::{CreateNoteDto, Folder, Note};
use crate::search::{SearchController, SearchResults};
use crate::state::{report_api_error, AppContext};
use crate::storage::save_user_to_storage;
use crate::sync::CardSyncController;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.sign_in(&email_val, &password_val).await {
                Ok(response) => {
                    api_client.set_session(response.access_token, response.user.id.clone());
                    api_client.save_to_storage();
                    save_user_to_storage(&response.user);
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(Some(response.user));
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Cardnote"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Sign in"</CardTitle>
                    </CardHeader>

                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="email" class="text-xs">"Email"</Label>
                            <Input
                                id="email"
                                r#type="email"
                                placeholder="you@example.com"
                                bind_value=email
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>

                        <div class="flex flex-col gap-1.5">
                            <Label html_for="password" class="text-xs">"Password"</Label>
                            <Input
                                id="password"
                                r#type="password"
                                placeholder="••••••••"
                                bind_value=password
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>

                        <ErrorAlert error=error />

                        <Button
                            class="w-full"
                            size=ButtonSize::Sm
                            attr:disabled=move || loading.get()
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || loading.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if loading.get() { "Signing in..." } else { "Continue" }}
                            </span>
                        </Button>
                    </form>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn ErrorAlert(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            {move || {
                error
                    .get()
                    .map(|e| {
                        view! {
                            <Alert>
                                <AlertDescription class="text-xs">{e}</AlertDescription>
                            </Alert>
                        }
                    })
            }}
        </Show>
    }
}

/// Fetch folders + notes into the shared state. A request counter drops
/// stale responses when reloads overlap.
fn reload_lists(app_state: AppContext) {
    let rid = app_state.0.lists_request_id.get_untracked() + 1;
    app_state.0.lists_request_id.set(rid);
    app_state.0.folders_loading.set(true);
    app_state.0.notes_loading.set(true);

    let api = app_state.0.api_client.get_untracked();
    spawn_local(async move {
        let folders = api.list_folders().await;
        let notes = api.list_notes().await;

        if app_state.0.lists_request_id.get_untracked() != rid {
            return;
        }

        match folders {
            Ok(xs) => {
                app_state.0.folders.set(xs);
                app_state.0.folders_error.set(None);
            }
            Err(e) => report_api_error(&app_state, app_state.0.folders_error, &e),
        }
        match notes {
            Ok(xs) => {
                app_state.0.notes.set(xs);
                app_state.0.notes_error.set(None);
            }
            Err(e) => report_api_error(&app_state, app_state.0.notes_error, &e),
        }
        app_state.0.folders_loading.set(false);
        app_state.0.notes_loading.set(false);
    });
}

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let children = StoredValue::new(children);

    // Initial load + reload whenever the editor pokes the tree.
    Effect::new({
        let app_state = app_state.clone();
        move |_| {
            app_state.0.tree_refresh_tick.get();
            reload_lists(app_state.clone());
        }
    });

    let theme_class = {
        let app_state = app_state.clone();
        move || {
            if app_state.0.settings.get().dark_mode {
                "dark min-h-screen bg-background text-foreground"
            } else {
                "min-h-screen bg-background text-foreground"
            }
        }
    };

    let logout = {
        let app_state = app_state.clone();
        move |_| {
            crate::state::force_login(&app_state);
        }
    };

    view! {
        <div class=theme_class>
            <div class="flex min-h-screen">
                <aside class="flex w-64 shrink-0 flex-col gap-4 border-r px-3 py-4">
                    <a href="/" class="px-1 text-sm font-semibold">"Cardnote"</a>
                    <nav class="flex flex-col gap-1 text-sm">
                        <a class="rounded px-2 py-1 hover:bg-accent" href="/">"Dashboard"</a>
                        <a class="rounded px-2 py-1 hover:bg-accent" href="/folders">"Folders"</a>
                        <a class="rounded px-2 py-1 hover:bg-accent" href="/settings">"Settings"</a>
                    </nav>
                    <NotesTree />
                    <div class="mt-auto flex flex-col gap-1 px-1">
                        <span class="truncate text-xs text-muted-foreground">
                            {
                                let current_user = app_state.0.current_user;
                                move || {
                                    current_user
                                        .get()
                                        .and_then(|u| u.email)
                                        .unwrap_or_default()
                                }
                            }
                        </span>
                        <Button size=ButtonSize::Sm variant=ButtonVariant::Ghost on:click=logout>
                            "Log out"
                        </Button>
                    </div>
                </aside>
                <main class="min-w-0 flex-1 px-6 py-5">
                    {move || children.with_value(|c| c())}
                </main>
            </div>
        </div>
    }
}

/// Sidebar navigator: folders with their notes nested underneath.
#[component]
fn NotesTree() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let tree = {
        let app_state = app_state.clone();
        move || {
            let notes = app_state.0.notes.get();
            app_state
                .0
                .folders
                .get()
                .into_iter()
                .map(|folder| {
                    let in_folder: Vec<Note> = notes
                        .iter()
                        .filter(|n| n.folder_id == folder.id)
                        .cloned()
                        .collect();
                    let app_state = app_state.clone();
                    view! {
                        <li>
                            <div class="px-1 py-0.5 text-xs font-medium text-muted-foreground">
                                {folder.name.clone()}
                            </div>
                            <ul class="flex flex-col">
                                {in_folder
                                    .into_iter()
                                    .map(|note| {
                                        let app_state = app_state.clone();
                                        let label = note.name.clone();
                                        let selected = move || {
                                            app_state.0.selected_note.get().map(|n| n.id)
                                                == Some(note.id)
                                        };
                                        let open = {
                                            let app_state = app_state.clone();
                                            let note = note.clone();
                                            move |_| {
                                                app_state.0.selected_note.set(Some(note.clone()));
                                                navigate.with_value(|nav| {
                                                    nav(
                                                        &format!("/note/{}", note.id),
                                                        Default::default(),
                                                    )
                                                });
                                            }
                                        };
                                        view! {
                                            <li>
                                                <button
                                                    class=move || {
                                                        if selected() {
                                                            "w-full truncate rounded bg-accent px-2 py-0.5 text-left text-sm"
                                                        } else {
                                                            "w-full truncate rounded px-2 py-0.5 text-left text-sm hover:bg-accent"
                                                        }
                                                    }
                                                    on:click=open
                                                >
                                                    {label}
                                                </button>
                                            </li>
                                        }
                                    })
                                    .collect_view()}
                            </ul>
                        </li>
                    }
                })
                .collect_view()
        }
    };

    view! {
        <div class="min-h-0 flex-1 overflow-y-auto">
            <div class="px-1 pb-1 text-xs font-semibold uppercase tracking-wide text-muted-foreground">
                "Notes"
            </div>
            <Show
                when=move || !app_state.0.folders_loading.get()
                fallback=|| view! { <div class="px-2 py-1"><Spinner /></div> }
            >
                <ul class="flex flex-col gap-1">{tree.clone()}</ul>
            </Show>
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    view! {
        <RootAuthed>
            <DashboardPage />
        </RootAuthed>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let search = SearchController::new(app_state.clone());

    let recent_notes: RwSignal<Vec<Note>> = RwSignal::new(vec![]);
    let recent_blocks: RwSignal<Vec<crate::models::ItemNote>> = RwSignal::new(vec![]);
    let recents_error: RwSignal<Option<String>> = RwSignal::new(None);

    {
        let app_state = app_state.clone();
        Effect::new(move |_| {
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                match api.recently_read_notes(4).await {
                    Ok(xs) => recent_notes.set(xs),
                    Err(e) => report_api_error(&app_state, recents_error, &e),
                }
                match api.recent_items(4).await {
                    Ok(xs) => recent_blocks.set(xs),
                    Err(e) => report_api_error(&app_state, recents_error, &e),
                }
            });
        });
    }

    let query: RwSignal<String> = RwSignal::new(String::new());
    {
        // Keystrokes are debounced inside the controller; the aggregator
        // drops stale responses on top of that.
        let search = search.clone();
        Effect::new(move |_| {
            let q = query.get();
            search.schedule(q);
        });
    }

    let navigate = StoredValue::new(use_navigate());
    let open_note = {
        let app_state = app_state.clone();
        move |note: Note| {
            app_state.0.selected_note.set(Some(note.clone()));
            navigate.with_value(|nav| nav(&format!("/note/{}", note.id), Default::default()));
        }
    };
    let open_note = StoredValue::new(open_note);

    // "/" jumps to the search box, unless the user is already typing.
    let search_ref: NodeRef<html::Input> = NodeRef::new();
    let key_handle = window_event_listener(ev::keydown, move |ev| {
        if ev.key() != "/" {
            return;
        }
        let in_field = ev
            .target()
            .map(|t| {
                t.dyn_ref::<web_sys::HtmlInputElement>().is_some()
                    || t.dyn_ref::<web_sys::HtmlTextAreaElement>().is_some()
            })
            .unwrap_or(false);
        if in_field {
            return;
        }
        ev.prevent_default();
        if let Some(input) = search_ref.get_untracked() {
            let _ = input.focus();
        }
    });
    on_cleanup(move || key_handle.remove());

    view! {
        <div class="flex flex-col gap-6">
            <div class="flex flex-col gap-2">
                <h1 class="text-xl font-semibold">"Dashboard"</h1>
                <div class="max-w-md">
                    <Input placeholder="Search everywhere" bind_value=query node_ref=search_ref />
                </div>
            </div>

            <ErrorAlert error=recents_error />

            <Show
                when=move || query.get().trim().is_empty()
                fallback={
                    let search = search.clone();
                    move || {
                        view! { <SearchResultsView search=search.clone() /> }
                    }
                }
            >
                <section class="flex flex-col gap-2">
                    <h2 class="text-sm font-medium text-muted-foreground">"Recently read"</h2>
                    <div class="grid grid-cols-1 gap-3 sm:grid-cols-2 lg:grid-cols-4">
                        {move || {
                            recent_notes
                                .get()
                                .into_iter()
                                .map(|note| {
                                    let label = note.name.clone();
                                    view! {
                                        <Card>
                                            <button
                                                class="text-left text-sm font-medium hover:underline"
                                                on:click=move |_| {
                                                    open_note.with_value(|f| f(note.clone()))
                                                }
                                            >
                                                {label}
                                            </button>
                                        </Card>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </section>

                <section class="flex flex-col gap-2">
                    <h2 class="text-sm font-medium text-muted-foreground">"Recently edited cards"</h2>
                    <div class="grid grid-cols-1 gap-3 sm:grid-cols-2 lg:grid-cols-4">
                        {move || {
                            recent_blocks
                                .get()
                                .into_iter()
                                .map(|item| {
                                    view! {
                                        <Card>
                                            <div class="text-sm font-medium">{item.title.clone()}</div>
                                            <div class="truncate text-xs text-muted-foreground">
                                                {item.content.clone().unwrap_or_default()}
                                            </div>
                                        </Card>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </section>
            </Show>
        </div>
    }
}

#[component]
fn SearchResultsView(search: SearchController) -> impl IntoView {
    let navigate = StoredValue::new(use_navigate());
    let app_state = expect_context::<AppContext>();
    let app_state = StoredValue::new(app_state);
    let searching = search.searching;
    let results = search.results;

    let section = move |title: &'static str, body: AnyView| {
        view! {
            <section class="flex flex-col gap-2">
                <h2 class="text-sm font-medium text-muted-foreground">{title}</h2>
                {body}
            </section>
        }
    };

    view! {
        <div class="flex flex-col gap-5">
            <Show when=move || searching.get() fallback=|| ().into_view()>
                <Spinner />
            </Show>

            {move || {
                let SearchResults { folders, notes, items } = results.get();
                let empty = folders.is_empty() && notes.is_empty() && items.is_empty();
                if empty && !searching.get() {
                    return view! {
                        <div class="text-sm text-muted-foreground">"No matches."</div>
                    }
                    .into_any();
                }

                let folders_view = section(
                    "Folders",
                    view! {
                        <ul class="flex flex-col gap-1 text-sm">
                            {folders
                                .into_iter()
                                .map(|f| view! { <li>{f.name}</li> })
                                .collect_view()}
                        </ul>
                    }
                    .into_any(),
                );

                let notes_view = section(
                    "Notes",
                    view! {
                        <ul class="flex flex-col gap-1 text-sm">
                            {notes
                                .into_iter()
                                .map(|note| {
                                    let label = note.name.clone();
                                    let open = move |_| {
                                        app_state
                                            .with_value(|a| a.0.selected_note.set(Some(note.clone())));
                                        navigate.with_value(|nav| {
                                            nav(&format!("/note/{}", note.id), Default::default())
                                        });
                                    };
                                    view! {
                                        <li>
                                            <button class="hover:underline" on:click=open>{label}</button>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                    }
                    .into_any(),
                );

                let items_view = section(
                    "Cards",
                    view! {
                        <ul class="flex flex-col gap-1 text-sm">
                            {items
                                .into_iter()
                                .map(|i| {
                                    view! {
                                        <li>
                                            <span class="font-medium">{i.title.clone()}</span>
                                            <span class="text-muted-foreground">
                                                {i.content
                                                    .clone()
                                                    .map(|c| format!(" — {c}"))
                                                    .unwrap_or_default()}
                                            </span>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                    }
                    .into_any(),
                );

                view! {
                    <div class="flex flex-col gap-5">
                        {folders_view}
                        {notes_view}
                        {items_view}
                    </div>
                }
                .into_any()
            }}
        </div>
    }
}

#[component]
pub fn FolderViewPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let new_folder_name: RwSignal<String> = RwSignal::new(String::new());
    let new_note_name: RwSignal<String> = RwSignal::new(String::new());
    let rename_id: RwSignal<Option<i64>> = RwSignal::new(None);
    let rename_value: RwSignal<String> = RwSignal::new(String::new());

    let create_folder = {
        let app_state = app_state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let name = new_folder_name.get_untracked().trim().to_string();
            if name.is_empty() {
                return;
            }
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                match api.create_folder(&name).await {
                    Ok(_) => {
                        new_folder_name.set(String::new());
                        app_state.0.notify_tree_changed();
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        }
    };

    let submit_rename = {
        let app_state = app_state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let Some(id) = rename_id.get_untracked() else {
                return;
            };
            let name = rename_value.get_untracked().trim().to_string();
            if name.is_empty() {
                rename_id.set(None);
                return;
            }
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                match api.update_folder(id, &name).await {
                    Ok(_) => {
                        rename_id.set(None);
                        app_state.0.notify_tree_changed();
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        }
    };

    let delete_folder = {
        let app_state = app_state.clone();
        move |id: i64| {
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                // Notes and blocks cascade server-side.
                match api.delete_folder(id).await {
                    Ok(()) => {
                        if app_state.0.selected_folder.get_untracked().map(|f| f.id)
                            == Some(id)
                        {
                            app_state.0.selected_folder.set(None);
                        }
                        app_state.0.notify_tree_changed();
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        }
    };
    let delete_folder = StoredValue::new(delete_folder);

    let create_note = {
        let app_state = app_state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let Some(folder) = app_state.0.selected_folder.get_untracked() else {
                return;
            };
            let name = new_note_name.get_untracked().trim().to_string();
            if name.is_empty() {
                return;
            }
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                let dto = CreateNoteDto {
                    name,
                    folder_id: folder.id,
                };
                match api.create_note(&dto).await {
                    Ok(note) => {
                        new_note_name.set(String::new());
                        app_state.0.selected_note.set(Some(note));
                        app_state.0.notify_tree_changed();
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        }
    };

    let delete_note = {
        let app_state = app_state.clone();
        move |id: i64| {
            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            spawn_local(async move {
                match api.delete_note(id).await {
                    Ok(()) => {
                        if app_state.0.selected_note.get_untracked().map(|n| n.id) == Some(id) {
                            app_state.0.selected_note.set(None);
                        }
                        app_state.0.notify_tree_changed();
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        }
    };
    let delete_note = StoredValue::new(delete_note);

    let folder_list = {
        let app_state = app_state.clone();
        move || {
            let app_state = app_state.clone();
            app_state
                .0
                .folders
                .get()
                .into_iter()
                .map(|folder: Folder| {
                    let app_state = app_state.clone();
                    let submit_rename = submit_rename.clone();
                    let fid = folder.id;
                    let selected = {
                        let app_state = app_state.clone();
                        move || {
                            app_state.0.selected_folder.get().map(|f| f.id) == Some(fid)
                        }
                    };
                    let select = {
                        let app_state = app_state.clone();
                        let folder = folder.clone();
                        move |_| {
                            app_state.0.selected_folder.set(Some(folder.clone()));
                        }
                    };
                    let start_rename = {
                        let name = folder.name.clone();
                        move |_| {
                            rename_id.set(Some(fid));
                            rename_value.set(name.clone());
                        }
                    };
                    view! {
                        <li class="flex items-center gap-1">
                            <Show
                                when=move || rename_id.get() == Some(fid)
                                fallback={
                                    let folder = folder.clone();
                                    let select = select.clone();
                                    let start_rename = start_rename.clone();
                                    move || {
                                        let selected = selected.clone();
                                        view! {
                                            <button
                                                class=move || {
                                                    if selected() {
                                                        "flex-1 rounded bg-accent px-2 py-1 text-left text-sm"
                                                    } else {
                                                        "flex-1 rounded px-2 py-1 text-left text-sm hover:bg-accent"
                                                    }
                                                }
                                                on:click=select.clone()
                                            >
                                                {folder.name.clone()}
                                            </button>
                                            <Button
                                                size=ButtonSize::Sm
                                                variant=ButtonVariant::Ghost
                                                on:click=start_rename.clone()
                                            >
                                                "Rename"
                                            </Button>
                                            <Button
                                                size=ButtonSize::Sm
                                                variant=ButtonVariant::Ghost
                                                on:click=move |_| delete_folder.with_value(|f| f(fid))
                                            >
                                                "Delete"
                                            </Button>
                                        }
                                    }
                                }
                            >
                                <form class="flex flex-1 gap-1" on:submit=submit_rename.clone()>
                                    <Input bind_value=rename_value class="h-8 text-sm" />
                                    <Button size=ButtonSize::Sm>"Save"</Button>
                                </form>
                            </Show>
                        </li>
                    }
                })
                .collect_view()
        }
    };

    let notes_panel = {
        let app_state = app_state.clone();
        move || {
            let app_state = app_state.clone();
            let Some(folder) = app_state.0.selected_folder.get() else {
                return view! {
                    <div class="text-sm text-muted-foreground">"Select a folder."</div>
                }
                .into_any();
            };
            let fid = folder.id;
            let notes: Vec<Note> = app_state
                .0
                .notes
                .get()
                .into_iter()
                .filter(|n| n.folder_id == fid)
                .collect();
            view! {
                <div class="flex flex-col gap-3">
                    <h2 class="text-sm font-semibold">{folder.name.clone()}</h2>
                    <ul class="flex flex-col gap-1">
                        {notes
                            .into_iter()
                            .map(|note| {
                                let app_state = app_state.clone();
                                let label = note.name.clone();
                                let nid = note.id;
                                let open = move |_| {
                                    app_state.0.selected_note.set(Some(note.clone()));
                                    navigate.with_value(|nav| {
                                        nav(&format!("/note/{nid}"), Default::default())
                                    });
                                };
                                view! {
                                    <li class="flex items-center gap-1">
                                        <button
                                            class="flex-1 rounded px-2 py-1 text-left text-sm hover:bg-accent"
                                            on:click=open
                                        >
                                            {label}
                                        </button>
                                        <Button
                                            size=ButtonSize::Sm
                                            variant=ButtonVariant::Ghost
                                            on:click=move |_| delete_note.with_value(|f| f(nid))
                                        >
                                            "Delete"
                                        </Button>
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                    <form class="flex max-w-sm gap-2" on:submit=create_note.clone()>
                        <Input placeholder="New note name" bind_value=new_note_name class="h-8 text-sm" />
                        <Button size=ButtonSize::Sm>"Add note"</Button>
                    </form>
                </div>
            }
            .into_any()
        }
    };

    view! {
        <div class="flex flex-col gap-5">
            <h1 class="text-xl font-semibold">"Folders"</h1>

            <ErrorAlert error=error />

            <div class="grid grid-cols-1 gap-6 md:grid-cols-2">
                <div class="flex flex-col gap-3">
                    <ul class="flex flex-col gap-1">{folder_list}</ul>
                    <form class="flex max-w-sm gap-2" on:submit=create_folder>
                        <Input placeholder="New folder name" bind_value=new_folder_name class="h-8 text-sm" />
                        <Button size=ButtonSize::Sm>"Add folder"</Button>
                    </form>
                </div>
                <div>{notes_panel}</div>
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub note_id: Option<i64>,
}

#[component]
pub fn NoteEditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<NoteRouteParams>();
    let controller = CardSyncController::new(app_state.clone());

    let error: RwSignal<Option<String>> = RwSignal::new(None);

    // Reload whenever the route's note id changes. The selected-note signal
    // usually already holds the note; otherwise it is fetched by id.
    {
        let app_state = app_state.clone();
        let controller = controller.clone();
        Effect::new(move |_| {
            let Some(note_id) = params.get().ok().and_then(|p| p.note_id) else {
                controller.clear();
                return;
            };
            if controller.note_id() == Some(note_id) {
                return;
            }

            let known = app_state
                .0
                .selected_note
                .get_untracked()
                .filter(|n| n.id == note_id)
                .or_else(|| {
                    app_state
                        .0
                        .notes
                        .get_untracked()
                        .into_iter()
                        .find(|n| n.id == note_id)
                });

            if let Some(note) = known {
                controller.load_note(note);
                return;
            }

            let api = app_state.0.api_client.get_untracked();
            let app_state = app_state.clone();
            let controller = controller.clone();
            spawn_local(async move {
                match api.get_note(note_id).await {
                    Ok(note) => {
                        app_state.0.selected_note.set(Some(note.clone()));
                        controller.load_note(note);
                    }
                    Err(e) => report_api_error(&app_state, error, &e),
                }
            });
        });
    }

    // Pending debounce timelines die with the page.
    {
        let controller = controller.clone();
        on_cleanup(move || {
            controller.dispose();
        });
    }

    let sync_error = controller.error;

    view! {
        <div class="flex flex-col gap-4">
            <ErrorAlert error=error />
            <ErrorAlert error=sync_error />
            <CardEditor controller=controller.clone() />
        </div>
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let toggle_dark = {
        let app_state = app_state.clone();
        move |_| {
            app_state.0.update_settings(|s| s.dark_mode = !s.dark_mode);
        }
    };

    let set_columns = {
        let app_state = app_state.clone();
        move |n: u8| {
            app_state.0.update_settings(|s| s.grid_columns = n);
        }
    };
    let set_columns = StoredValue::new(set_columns);

    let dark = {
        let app_state = app_state.clone();
        move || app_state.0.settings.get().dark_mode
    };
    let columns = move || app_state.0.settings.get().grid_columns;

    view! {
        <div class="flex max-w-md flex-col gap-5">
            <h1 class="text-xl font-semibold">"Settings"</h1>

            <div class="flex items-center justify-between">
                <Label>"Dark theme"</Label>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=toggle_dark>
                    {move || if dark() { "On" } else { "Off" }}
                </Button>
            </div>

            <div class="flex flex-col gap-2">
                <Label>"Editor columns"</Label>
                <div class="flex gap-2">
                    {[1u8, 2, 3, 4]
                        .into_iter()
                        .map(|n| {
                            let columns = columns.clone();
                            view! {
                                {move || {
                                    let active = columns() == n;
                                    view! {
                                        <Button
                                            size=ButtonSize::Sm
                                            variant=ButtonVariant::Outline
                                            class=if active { "bg-accent" } else { "" }
                                            on:click=move |_| set_columns.with_value(|f| f(n))
                                        >
                                            {n.to_string()}
                                        </Button>
                                    }
                                }}
                            }
                        })
                        .collect_view()}
                </div>
            </div>
        </div>
    }
}
