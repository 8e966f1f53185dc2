use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use clanboard_shared::history::{PlayerHistoryMeta, PlayerHistoryPoint};
use clanboard_shared::insights::ClanInsights;
use clanboard_shared::model::Role;
use clanboard_shared::notes::NoteBook;
use clanboard_shared::permissions::AccessLevel;
use clanboard_shared::preferences::{self, ViewMode};
use clanboard_shared::resolver::resolve_all;
use clanboard_shared::roster_diff::{diff_roster, snapshot_tags};
use clanboard_shared::{
    Action, FormerMembersResponse, RosterRow, RosterScope, RosterSnapshot, RosterViewState,
    WarMetricsMap, derive_rows, reduce,
};

use crate::api;
use crate::former::FormerMembers;
use crate::insights::InsightsPanel;
use crate::player_panel::PlayerPanel;
use crate::roster_cards::RosterCards;
use crate::roster_table::RosterTable;
use crate::storage::{self, LocalStore};
use crate::swr::{ResourceState, Swr};
use crate::time_format::snapshot_caption;
use crate::toast::{ToastStack, Toasts};
use crate::toolbar::Toolbar;

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Page state. Every mutation goes through [`ViewState::dispatch`].
#[derive(Clone, Copy)]
pub(crate) struct ViewState(pub RwSignal<RosterViewState>);

impl ViewState {
    pub fn dispatch(&self, action: Action) {
        if matches!(action, Action::Reset) {
            preferences::reset(&LocalStore);
        }
        self.0
            .update(|state| *state = reduce(std::mem::take(state), action));
    }
}

/// Row key of the member whose drawer is open.
#[derive(Clone, Copy)]
pub(crate) struct Selected(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct ViewerRole(pub RwSignal<Role>);
#[derive(Clone, Copy)]
pub(crate) struct Access(pub Memo<AccessLevel>);
#[derive(Clone, Copy)]
pub(crate) struct Notes(pub RwSignal<NoteBook>);
#[derive(Clone, Copy)]
pub(crate) struct IngestionRunning(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct Snapshot(pub Memo<Option<RosterSnapshot>>);
/// Every current member, resolved but unfiltered.
#[derive(Clone, Copy)]
pub(crate) struct AllRows(pub Memo<Vec<RosterRow>>);
/// Rows after the new-joiner filter, search and sort.
#[derive(Clone, Copy)]
pub(crate) struct VisibleRows(pub Memo<Vec<RosterRow>>);

pub(crate) type HistoryPayload = (Vec<PlayerHistoryPoint>, PlayerHistoryMeta);

/// Request caches for every endpoint the page reads.
#[derive(Clone, Copy)]
pub(crate) struct RosterData {
    pub clan_tag: RwSignal<Option<String>>,
    pub roster: Swr<RosterSnapshot>,
    pub former: Swr<FormerMembersResponse>,
    pub war: Swr<WarMetricsMap>,
    pub history: Swr<HistoryPayload>,
    pub insights: Swr<Option<ClanInsights>>,
}

impl RosterData {
    fn new(clan_tag: Option<String>) -> Self {
        Self {
            clan_tag: RwSignal::new(clan_tag),
            roster: Swr::new(),
            former: Swr::new(),
            war: Swr::new(),
            history: Swr::new(),
            insights: Swr::new(),
        }
    }

    pub fn roster_state(&self) -> ResourceState<RosterSnapshot> {
        self.roster
            .state(&api::roster_url(self.clan_tag.get().as_deref()))
    }

    pub fn former_state(&self) -> ResourceState<FormerMembersResponse> {
        self.former
            .state(&api::former_url(self.clan_tag.get().as_deref()))
    }

    /// Explicit refresh of everything on screen.
    pub fn refresh(&self, scope: RosterScope) {
        let clan = self.clan_tag.get_untracked();
        self.roster
            .revalidate(api::roster_url(clan.as_deref()), api::fetch_roster);
        self.war
            .revalidate(api::war_metrics_url(clan.as_deref()), api::fetch_war_metrics);
        if scope == RosterScope::Former {
            self.former
                .revalidate(api::former_url(clan.as_deref()), api::fetch_former);
        }
        let insights = api::insights_url(clan.as_deref());
        if self.insights.is_requested(&insights) {
            self.insights.revalidate(insights, api::fetch_insights);
        }
    }
}

fn current_search() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

fn clan_from_query(search: &str) -> Option<String> {
    web_sys::UrlSearchParams::new_with_str(search)
        .ok()?
        .get("clan")
        .filter(|tag| !tag.trim().is_empty())
}

fn replace_url(query: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    let path = window.location().pathname().unwrap_or_else(|_| "/".into());
    let url = format!("{path}?{query}");
    if let Err(e) = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url)) {
        web_sys::console::warn_1(&format!("couldn't update the page URL: {e:?}").into());
    }
}

fn focus_search_input() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if let Ok(Some(el)) = document.query_selector("[data-search-input]")
        && let Ok(input) = el.dyn_into::<web_sys::HtmlElement>()
    {
        input.focus().ok();
    }
}

#[component]
pub fn App() -> impl IntoView {
    let toasts = Toasts::new();
    provide_context(toasts);

    let search = current_search();
    match preferences::migrate_store(&LocalStore) {
        Ok(true) => web_sys::console::info_1(&"roster preferences migrated".into()),
        Ok(false) => {}
        Err(e) => web_sys::console::warn_1(&format!("preference migration failed: {e}").into()),
    }
    let initial = RosterViewState::from_preference(preferences::load(&search, &LocalStore));

    let view_state = RwSignal::new(initial);
    let selected = RwSignal::new(None::<String>);
    let viewer_role = RwSignal::new(storage::load_viewer_role());
    let access = Memo::new(move |_| AccessLevel::from_role(viewer_role.get()));
    let notes = RwSignal::new(storage::load_notes());
    let ingestion_running = RwSignal::new(false);
    let data = RosterData::new(clan_from_query(&search));

    provide_context(ViewState(view_state));
    provide_context(Selected(selected));
    provide_context(ViewerRole(viewer_role));
    provide_context(Access(access));
    provide_context(Notes(notes));
    provide_context(IngestionRunning(ingestion_running));
    provide_context(data);

    let scope = Memo::new(move |_| view_state.with(|s| s.scope));

    // Roster and war metrics go out in parallel; merged at render time by tag.
    Effect::new(move || {
        let clan = data.clan_tag.get();
        data.roster
            .fetch(api::roster_url(clan.as_deref()), api::fetch_roster);
        data.war
            .fetch(api::war_metrics_url(clan.as_deref()), api::fetch_war_metrics);
    });

    // Former members are only requested once that scope is opened.
    Effect::new(move || {
        if scope.get() == RosterScope::Former {
            let url = api::former_url(data.clan_tag.get().as_deref());
            data.former.fetch(url, api::fetch_former);
        }
    });

    let snapshot = Memo::new(move |_| data.roster_state().data);
    let war_metrics = Memo::new(move |_| {
        data.war
            .state(&api::war_metrics_url(data.clan_tag.get().as_deref()))
            .data
            .unwrap_or_default()
    });
    let all_rows = Memo::new(move |_| {
        snapshot.with(|snapshot| match snapshot {
            Some(snapshot) => war_metrics.with(|war| resolve_all(&snapshot.members, war)),
            None => Vec::new(),
        })
    });
    let visible_rows = Memo::new(move |_| {
        snapshot.with(|snapshot| match snapshot {
            Some(snapshot) => war_metrics
                .with(|war| view_state.with(|state| derive_rows(&snapshot.members, war, state))),
            None => Vec::new(),
        })
    });
    provide_context(Snapshot(snapshot));
    provide_context(AllRows(all_rows));
    provide_context(VisibleRows(visible_rows));

    // Persist preferences and mirror them into the URL on every change.
    let storage_warned = StoredValue::new(false);
    Effect::new(move || {
        let pref = view_state.with(|s| s.preference.clone());
        if let Err(e) = preferences::save(&pref, &LocalStore) {
            web_sys::console::warn_1(&format!("{e}").into());
            if !storage_warned.get_value() {
                storage_warned.set_value(true);
                toasts.error("Preferences can't be saved in this browser; they will reset on reload");
            }
        }
        replace_url(&preferences::page_query(
            &pref,
            data.clan_tag.get_untracked().as_deref(),
        ));
    });

    Effect::new(move || {
        let role = viewer_role.get();
        if let Err(e) = storage::save_viewer_role(role) {
            web_sys::console::warn_1(&format!("{e}").into());
        }
    });

    // Toast joins and departures once per fresh snapshot.
    let last_diffed = StoredValue::new(None::<String>);
    Effect::new(move || {
        snapshot.with(|snapshot| {
            let Some(snapshot) = snapshot else {
                return;
            };
            let identity = snapshot
                .snapshot_metadata
                .as_ref()
                .and_then(|meta| meta.snapshot_id.clone())
                .or_else(|| snapshot.date.clone())
                .unwrap_or_default();
            if last_diffed.get_value().as_deref() == Some(identity.as_str()) {
                return;
            }
            last_diffed.set_value(Some(identity));

            let clan = snapshot
                .clan_tag
                .clone()
                .or_else(|| data.clan_tag.get_untracked());
            let previous = storage::load_last_seen_tags(clan.as_deref());
            if let Some(summary) = diff_roster(previous.as_ref(), &snapshot.members).summary() {
                toasts.info(summary);
            }
            let seen = snapshot_tags(&snapshot.members);
            if let Err(e) = storage::save_last_seen_tags(clan.as_deref(), &seen) {
                web_sys::console::warn_1(&format!("{e}").into());
            }
        });
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                if matches!(target_tag.as_str(), "INPUT" | "TEXTAREA" | "SELECT") {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                match key.as_str() {
                    "/" => {
                        e.prevent_default();
                        focus_search_input();
                    }
                    "Escape" => selected.set(None),
                    "v" => {
                        let next = match view_state.with_untracked(|s| s.preference.view) {
                            ViewMode::Table => ViewMode::Cards,
                            ViewMode::Cards => ViewMode::Table,
                        };
                        ViewState(view_state).dispatch(Action::SetView(next));
                    }
                    "n" => ViewState(view_state).dispatch(Action::ToggleNewJoiners),
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    let view_mode = Memo::new(move |_| view_state.with(|s| s.preference.view));

    view! {
        <div style="min-height: 100%; background: #0c0e17; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
            <RosterHeader />
            <Toolbar />
            <InsightsPanel />
            <main style="padding: 0 24px 32px;">
                {move || match (scope.get(), view_mode.get()) {
                    (RosterScope::Former, _) => view! { <FormerMembers /> }.into_any(),
                    (RosterScope::Current, ViewMode::Table) => view! {
                        <RosterPanel>
                            <RosterTable />
                        </RosterPanel>
                    }.into_any(),
                    (RosterScope::Current, ViewMode::Cards) => view! {
                        <RosterPanel>
                            <RosterCards />
                        </RosterPanel>
                    }.into_any(),
                }}
            </main>
            {move || {
                if selected.get().is_some() {
                    view! { <PlayerPanel /> }.into_any()
                } else {
                    ().into_any()
                }
            }}
            <ToastStack />
        </div>
    }
}

#[component]
fn RosterHeader() -> impl IntoView {
    let data: RosterData = expect_context();
    let Snapshot(snapshot) = expect_context();

    let title = move || {
        snapshot.with(|s| {
            s.as_ref()
                .and_then(|s| s.clan_name.clone())
                .unwrap_or_else(|| "Clan roster".to_string())
        })
    };
    let subtitle = move || {
        snapshot.with(|s| match s {
            Some(s) => {
                let tag = s
                    .clan_tag
                    .as_deref()
                    .map(clanboard_shared::tag::display_tag)
                    .unwrap_or_default();
                let caption = snapshot_caption(s.date.as_deref(), chrono::Utc::now());
                format!("{tag} \u{00B7} {} members \u{00B7} {caption}", s.members.len())
            }
            None => String::new(),
        })
    };
    let validating = move || data.roster_state().is_validating;

    view! {
        <header style="display: flex; align-items: baseline; gap: 16px; padding: 20px 24px 12px;">
            <h1 style="margin: 0; font-size: 1.35rem; font-weight: 700; color: #e2e0d8;">{title}</h1>
            <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.75rem; color: #5a5860;">{subtitle}</span>
            {move || {
                if validating() {
                    view! {
                        <span class="status-pulse" style="font-family: 'JetBrains Mono', monospace; font-size: 0.7rem; color: #f5c542;">"refreshing\u{2026}"</span>
                    }.into_any()
                } else {
                    ().into_any()
                }
            }}
        </header>
    }
}

/// Loading placeholder and inline fetch error around the current-member views.
#[component]
fn RosterPanel(children: ChildrenFn) -> impl IntoView {
    let data: RosterData = expect_context();
    let ViewState(view_state) = expect_context();

    move || {
        let ResourceState {
            data: roster,
            error,
            ..
        } = data.roster_state();
        if roster.is_none() && let Some(error) = error {
            let message = format!("Couldn't load the roster: {error}");
            view! {
                <div style="margin-top: 24px; padding: 20px; background: #13161f; border: 1px solid #4a2a2e; border-radius: 8px;">
                    <div style="color: #ff6b6b; font-size: 0.9rem;">{message}</div>
                    <button
                        style="margin-top: 12px; padding: 6px 14px; background: transparent; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; cursor: pointer;"
                        on:click=move |_| data.refresh(view_state.with_untracked(|s| s.scope))
                    >"Retry"</button>
                </div>
            }
            .into_any()
        } else if roster.is_none() {
            view! {
                <div style="padding: 48px; text-align: center;">
                    <div class="status-pulse" style="font-family: 'JetBrains Mono', monospace; font-size: 0.78rem; color: #3a3f5c; letter-spacing: 0.05em;">"Loading roster..."</div>
                </div>
            }
            .into_any()
        } else {
            let error_banner = error.map(|error| {
                view! {
                    <div style="margin: 8px 0; font-size: 0.75rem; color: #ff6b6b;">
                        {format!("Showing the last loaded roster; refresh failed: {error}")}
                    </div>
                }
            });
            view! {
                {error_banner}
                {children()}
            }
            .into_any()
        }
    }
}
