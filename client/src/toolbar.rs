use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use clanboard_shared::columns::Preset;
use clanboard_shared::export::{clipboard_summary, export_csv, export_filename};
use clanboard_shared::filter::is_new_joiner;
use clanboard_shared::model::Role;
use clanboard_shared::preferences::{Density, ViewMode};
use clanboard_shared::{Action, RosterScope};

use crate::app::{
    Access, AllRows, IngestionRunning, RosterData, Snapshot, ViewState, ViewerRole, VisibleRows,
};
use crate::download::{copy_to_clipboard, download_text};
use crate::ingestion;
use crate::toast::Toasts;

pub const SEARCH_DEBOUNCE_MS: u32 = 200;

const VIEWER_ROLES: [Role; 4] = [Role::Leader, Role::CoLeader, Role::Admin, Role::Member];

fn segment_style(active: bool) -> String {
    format!(
        "font-family: 'JetBrains Mono', monospace; font-size: 0.7rem; padding: 4px 10px; border: none; border-radius: 3px; cursor: pointer; transition: color 0.15s, background 0.15s; {}",
        if active {
            "color: #f5c542; background: rgba(245,197,66,0.1);"
        } else {
            "color: #5a5860; background: transparent;"
        }
    )
}

const GROUP_STYLE: &str = "display: flex; gap: 2px; padding: 2px; background: #13161f; border: 1px solid #282c3e; border-radius: 5px;";
const BUTTON_STYLE: &str = "padding: 5px 12px; background: #13161f; border: 1px solid #282c3e; border-radius: 5px; color: #e2e0d8; font-size: 0.75rem; cursor: pointer;";
const SELECT_STYLE: &str = "padding: 5px 8px; background: #13161f; border: 1px solid #282c3e; border-radius: 5px; color: #e2e0d8; font-size: 0.75rem;";

fn select_value(e: &leptos::ev::Event) -> Option<String> {
    let target = e.target()?;
    let select = target.dyn_into::<web_sys::HtmlSelectElement>().ok()?;
    Some(select.value())
}

#[component]
pub fn Toolbar() -> impl IntoView {
    let state: ViewState = expect_context();
    let view_state = state.0;

    let view = move || view_state.with(|s| s.preference.view);
    let density = move || view_state.with(|s| s.preference.density);
    let preset = move || view_state.with(|s| s.preference.preset);
    let scope = move || view_state.with(|s| s.scope);
    let new_joiners_only = move || view_state.with(|s| s.new_joiners_only);

    view! {
        <div style="display: flex; flex-wrap: wrap; align-items: center; gap: 10px; padding: 8px 24px 16px; border-bottom: 1px solid #282c3e; margin-bottom: 16px;">
            <div style=GROUP_STYLE>
                <button
                    style=move || segment_style(scope() == RosterScope::Current)
                    on:click=move |_| state.dispatch(Action::SetScope(RosterScope::Current))
                >"Current"</button>
                <button
                    style=move || segment_style(scope() == RosterScope::Former)
                    on:click=move |_| state.dispatch(Action::SetScope(RosterScope::Former))
                >"Former"</button>
            </div>
            <div style=GROUP_STYLE>
                <button
                    style=move || segment_style(view() == ViewMode::Table)
                    on:click=move |_| state.dispatch(Action::SetView(ViewMode::Table))
                >"Table"</button>
                <button
                    style=move || segment_style(view() == ViewMode::Cards)
                    on:click=move |_| state.dispatch(Action::SetView(ViewMode::Cards))
                >"Cards"</button>
            </div>
            {move || {
                if view() == ViewMode::Table {
                    view! {
                        <div style=GROUP_STYLE>
                            <button
                                style=move || segment_style(density() == Density::Cozy)
                                on:click=move |_| state.dispatch(Action::SetDensity(Density::Cozy))
                            >"Cozy"</button>
                            <button
                                style=move || segment_style(density() == Density::Compact)
                                on:click=move |_| state.dispatch(Action::SetDensity(Density::Compact))
                            >"Compact"</button>
                        </div>
                        <select
                            style=SELECT_STYLE
                            aria-label="Column preset"
                            on:change=move |e| {
                                if let Some(preset) = select_value(&e).as_deref().and_then(Preset::parse) {
                                    state.dispatch(Action::SetPreset(preset));
                                }
                            }
                        >
                            {Preset::ALL
                                .into_iter()
                                .map(|option| {
                                    view! {
                                        <option value=option.as_str() selected=move || preset() == option>
                                            {option.label()}
                                        </option>
                                    }
                                })
                                .collect_view()}
                        </select>
                    }
                    .into_any()
                } else {
                    ().into_any()
                }
            }}
            <NewJoinersToggle active=Signal::derive(new_joiners_only) />
            <SearchBox />
            <div style="flex: 1;" />
            <ActionButtons />
        </div>
    }
}

#[component]
fn NewJoinersToggle(active: Signal<bool>) -> impl IntoView {
    let state: ViewState = expect_context();
    let AllRows(all_rows) = expect_context();
    let count = move || all_rows.with(|rows| rows.iter().filter(|r| is_new_joiner(r)).count());

    view! {
        <button
            style=move || format!("{} {}", BUTTON_STYLE, if active.get() { "border-color: #f5c542; color: #f5c542;" } else { "" })
            title="Members who joined in the last 7 days (n)"
            on:click=move |_| state.dispatch(Action::ToggleNewJoiners)
        >
            {move || format!("New joiners ({})", count())}
        </button>
    }
}

/// Text search; the filter only re-runs once typing pauses.
#[component]
fn SearchBox() -> impl IntoView {
    let state: ViewState = expect_context();
    let committed = Memo::new(move |_| state.0.with(|s| s.preference.search.clone()));
    let draft = RwSignal::new(state.0.with_untracked(|s| s.preference.search.clone()));

    // Follow external changes such as a reset.
    Effect::new(move || {
        let committed = committed.get();
        if draft.get_untracked() != committed {
            draft.set(committed);
        }
    });

    let debounce_timeout = Rc::new(RefCell::new(None::<Timeout>));
    let on_input = {
        let debounce_timeout = Rc::clone(&debounce_timeout);
        move |e: leptos::ev::Event| {
            let Some(target) = e.target() else {
                return;
            };
            let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
                return;
            };
            let value = input.value();
            draft.set(value.clone());

            if let Some(timeout) = debounce_timeout.borrow_mut().take() {
                timeout.cancel();
            }
            let timeout = Timeout::new(SEARCH_DEBOUNCE_MS, move || {
                state.dispatch(Action::SetSearch(value));
            });
            *debounce_timeout.borrow_mut() = Some(timeout);
        }
    };

    view! {
        <input
            data-search-input=""
            style="width: 240px; padding: 6px 12px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 5px; color: #e2e0d8; font-size: 0.8rem; outline: none;"
            type="search"
            placeholder="Search name or tag  ( / )"
            prop:value=move || draft.get()
            on:input=on_input
        />
    }
}

#[component]
fn ActionButtons() -> impl IntoView {
    let state: ViewState = expect_context();
    let toasts: Toasts = expect_context();
    let data: RosterData = expect_context();
    let Access(access) = expect_context();
    let ViewerRole(viewer_role) = expect_context();
    let IngestionRunning(running) = expect_context();
    let VisibleRows(visible_rows) = expect_context();
    let Snapshot(snapshot) = expect_context();

    let scope = move || state.0.with_untracked(|s| s.scope);

    let on_export = move |_| {
        let columns = state.0.with_untracked(|s| s.columns());
        let csv = visible_rows
            .with_untracked(|rows| export_csv(access.get_untracked(), rows, &columns));
        match csv {
            Ok(csv) => {
                let filename = snapshot.with_untracked(|s| {
                    let clan = s
                        .as_ref()
                        .and_then(|s| s.clan_tag.clone())
                        .or_else(|| data.clan_tag.get_untracked())
                        .unwrap_or_else(|| "clan".to_string());
                    export_filename(&clan, s.as_ref().and_then(|s| s.date.as_deref()))
                });
                match download_text(&filename, "text/csv;charset=utf-8", &csv) {
                    Ok(()) => toasts.success(format!("Exported {filename}")),
                    Err(e) => toasts.error(format!("Export failed: {e}")),
                }
            }
            Err(e) => toasts.error(e.to_string()),
        }
    };

    let on_copy = move |_| {
        let columns = state.0.with_untracked(|s| s.columns());
        let summary = visible_rows
            .with_untracked(|rows| clipboard_summary(access.get_untracked(), rows, &columns));
        match summary {
            Ok(text) => spawn_local(async move {
                match copy_to_clipboard(&text).await {
                    Ok(()) => toasts.success("Roster summary copied"),
                    Err(e) => toasts.error(format!("Couldn't copy to clipboard: {e}")),
                }
            }),
            Err(e) => toasts.error(e.to_string()),
        }
    };

    let on_sync = move |_| {
        ingestion::trigger(access.get_untracked(), data, running, toasts, scope());
    };

    let on_role_change = move |e: leptos::ev::Event| {
        if let Some(raw) = select_value(&e) {
            viewer_role.set(Role::parse(&raw));
        }
    };

    view! {
        <div style="display: flex; align-items: center; gap: 6px;">
            <button style=BUTTON_STYLE on:click=move |_| data.refresh(scope())>"Refresh"</button>
            <button
                style=BUTTON_STYLE
                prop:disabled=move || running.get()
                on:click=on_sync
            >
                {move || if running.get() { "Syncing\u{2026}" } else { "Sync from game" }}
            </button>
            <button style=BUTTON_STYLE on:click=on_export>"Export CSV"</button>
            <button style=BUTTON_STYLE on:click=on_copy>"Copy"</button>
            <button style=BUTTON_STYLE on:click=move |_| state.dispatch(Action::Reset)>"Reset view"</button>
            <select style=SELECT_STYLE aria-label="Viewing as" title="Viewing as" on:change=on_role_change>
                {VIEWER_ROLES
                    .into_iter()
                    .map(|role| {
                        view! {
                            <option value=role.as_key() selected=move || viewer_role.get() == role>
                                {role.label()}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
        </div>
    }
}
