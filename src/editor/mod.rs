use crate::components::ui::{Button, ButtonSize, ButtonVariant, Textarea};
use crate::models::{CardType, ChecklistItem, ItemNote};
use crate::state::AppContext;
use crate::sync::CardSyncController;
use crate::util::new_uuid;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Card-based block editor for one note. All persistence goes through the
/// controller; this component only renders state and forwards edits.
///
/// Rows are keyed by block id so keystrokes never rebuild the input that
/// produced them. The id swap after a create recreates that one row.
#[component]
pub fn CardEditor(controller: CardSyncController) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let ctl = controller.clone();
    let on_title = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            ctl.on_title_input(input.value());
        }
    };

    let grid_class = move || {
        match app_state.0.settings.get().grid_columns {
            1 => "grid-cols-1",
            2 => "grid-cols-1 sm:grid-cols-2",
            4 => "grid-cols-1 sm:grid-cols-2 lg:grid-cols-4",
            _ => "grid-cols-1 sm:grid-cols-2 lg:grid-cols-3",
        }
    };

    let add = {
        let ctl = controller.clone();
        move |ty: CardType| {
            ctl.add_card(ty);
        }
    };
    let add = StoredValue::new(add);

    let cards = controller.cards;
    let row_ctl = controller.clone();

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center gap-2">
                <input
                    class="w-full bg-transparent text-xl font-semibold outline-none placeholder:text-muted-foreground"
                    placeholder="Note title"
                    prop:value=move || controller.title_value.get()
                    on:input=on_title
                />
            </div>

            <div class="flex flex-wrap items-center gap-2">
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline
                    on:click=move |_| add.with_value(|f| f(CardType::Paragraph))>
                    "+ Paragraph"
                </Button>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline
                    on:click=move |_| add.with_value(|f| f(CardType::Checklist))>
                    "+ Checklist"
                </Button>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline
                    on:click=move |_| add.with_value(|f| f(CardType::Highlight))>
                    "+ Highlight"
                </Button>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline
                    on:click=move |_| add.with_value(|f| f(CardType::Link))>
                    "+ Link"
                </Button>
            </div>

            <div class=move || format!("grid gap-4 items-start {}", grid_class())>
                <For
                    each=move || cards.get()
                    key=|c| c.id.clone()
                    children=move |card: ItemNote| {
                        view! { <CardBlock card=card controller=row_ctl.clone() /> }
                    }
                />
            </div>
        </div>
    }
}

/// One card. Receives a snapshot of the block at row creation; after that
/// the DOM inputs hold the live text and every keystroke flows to the
/// controller, which owns the canonical copy.
#[component]
fn CardBlock(card: ItemNote, controller: CardSyncController) -> impl IntoView {
    let id = StoredValue::new(card.id.clone());

    let remove = {
        let ctl = controller.clone();
        move |_| {
            ctl.remove_card(&id.get_value());
        }
    };

    let on_card_title = {
        let ctl = controller.clone();
        move |ev: web_sys::Event| {
            if let Some(input) = ev
                .target()
                .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            {
                ctl.update_card_title(&id.get_value(), input.value());
            }
        }
    };

    let accent = match card.card_type {
        CardType::Highlight => "border-l-4 border-l-amber-400",
        CardType::Link => "border-l-4 border-l-sky-400",
        CardType::Checklist => "border-l-4 border-l-emerald-400",
        _ => "",
    };
    let card_class = tw_merge::tw_merge!(
        "bg-card text-card-foreground flex flex-col gap-2 rounded-lg border p-3 shadow-sm",
        accent
    );

    let body = if card.card_type == CardType::Checklist {
        view! {
            <ChecklistBody
                card_id=card.id.clone()
                entries=card.items.clone().unwrap_or_default()
                controller=controller.clone()
            />
        }
        .into_any()
    } else {
        let ctl = controller.clone();
        let on_change = Callback::new(move |value: String| {
            ctl.update_card_content(&id.get_value(), value);
        });
        view! {
            <Textarea
                value=card.content.clone().unwrap_or_default()
                placeholder=content_placeholder(card.card_type)
                on_change=on_change
            />
        }
        .into_any()
    };

    view! {
        <div class=card_class>
            <div class="flex items-start gap-2">
                <input
                    class="w-full bg-transparent text-sm font-medium outline-none placeholder:text-muted-foreground"
                    placeholder="Card title"
                    prop:value=card.title.clone()
                    on:input=on_card_title
                />
                <Button size=ButtonSize::Icon variant=ButtonVariant::Ghost on:click=remove>
                    "×"
                </Button>
            </div>
            {body}
        </div>
    }
}

fn content_placeholder(ty: CardType) -> &'static str {
    match ty {
        CardType::Link => "https://…",
        CardType::Highlight => "Something worth remembering",
        _ => "Write something",
    }
}

#[component]
fn ChecklistBody(
    card_id: String,
    entries: Vec<ChecklistItem>,
    controller: CardSyncController,
) -> impl IntoView {
    let card_id = StoredValue::new(card_id);

    // Local working copy; every mutation pushes the full array to the
    // controller, which persists it as one JSON column.
    let rows: RwSignal<Vec<ChecklistItem>> = RwSignal::new(entries);

    let push = {
        let ctl = controller.clone();
        move || {
            ctl.update_card_items(&card_id.get_value(), rows.get_untracked());
        }
    };
    let push = StoredValue::new(push);

    let add_row = move |_| {
        rows.update(|xs| {
            xs.push(ChecklistItem {
                id: new_uuid(),
                text: String::new(),
                checked: false,
            })
        });
        push.with_value(|f| f());
    };

    view! {
        <div class="flex flex-col gap-1.5">
            <For
                each=move || rows.get()
                key=|e| e.id.clone()
                children=move |entry: ChecklistItem| {
                    let entry_id = StoredValue::new(entry.id.clone());

                    let toggle = move |_| {
                        rows.update(|xs| {
                            if let Some(e) = xs.iter_mut().find(|e| e.id == entry_id.get_value()) {
                                e.checked = !e.checked;
                            }
                        });
                        push.with_value(|f| f());
                    };

                    let on_text = move |ev: web_sys::Event| {
                        if let Some(input) = ev
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                        {
                            rows.update(|xs| {
                                if let Some(e) =
                                    xs.iter_mut().find(|e| e.id == entry_id.get_value())
                                {
                                    e.text = input.value();
                                }
                            });
                            push.with_value(|f| f());
                        }
                    };

                    let drop_row = move |_| {
                        rows.update(|xs| xs.retain(|e| e.id != entry_id.get_value()));
                        push.with_value(|f| f());
                    };

                    view! {
                        <div class="flex items-center gap-2">
                            <input
                                type="checkbox"
                                class="size-4 accent-primary"
                                prop:checked=entry.checked
                                on:change=toggle
                            />
                            <input
                                class="w-full bg-transparent text-sm outline-none"
                                placeholder="List item"
                                prop:value=entry.text.clone()
                                on:input=on_text
                            />
                            <button
                                class="text-muted-foreground hover:text-destructive text-xs"
                                on:click=drop_row
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
            <button
                class="self-start text-xs text-muted-foreground hover:text-foreground"
                on:click=add_row
            >
                "+ add item"
            </button>
        </div>
    }
}
