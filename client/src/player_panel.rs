use leptos::prelude::*;
use wasm_bindgen::JsCast;

use clanboard_shared::columns::{ColumnKey, format_thousands};
use clanboard_shared::comparison::{ComparisonMetric, MetricComparison, compare_row};
use clanboard_shared::history::{
    DEFAULT_HISTORY_DAYS, HISTORY_WINDOWS, clamp_history_days, window_change,
};
use clanboard_shared::notes::MAX_NOTE_LEN;
use clanboard_shared::tag::display_tag;
use clanboard_shared::RosterRow;

use crate::api;
use crate::app::{Access, AllRows, Notes, RosterData, Selected};
use crate::roster_table::{Avatar, cell_view};
use crate::storage;
use crate::toast::Toasts;

pub fn format_delta(delta: i64) -> String {
    match delta {
        0 => "0".to_string(),
        d if d > 0 => format!("+{}", format_thousands(d)),
        d => format_thousands(d),
    }
}

fn format_metric(metric: ComparisonMetric, value: f64) -> String {
    match metric {
        ComparisonMetric::DonationRatio => format!("{value:.2}"),
        _ => format_thousands(value.round() as i64),
    }
}

const SECTION_TITLE: &str = "margin: 18px 0 8px; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #5a5860; text-transform: uppercase; letter-spacing: 0.06em;";

/// Day window of the history section. Owned by the drawer so re-rendered
/// details keep the chosen window.
#[derive(Clone, Copy)]
struct HistoryWindow(RwSignal<u32>);

impl HistoryWindow {
    fn new() -> Self {
        Self(RwSignal::new(DEFAULT_HISTORY_DAYS))
    }

    fn days(self) -> u32 {
        self.0.get()
    }

    fn select(self, days: u32) {
        self.0.set(clamp_history_days(Some(days)));
    }
}

/// Right-hand drawer for the selected member.
#[component]
pub fn PlayerPanel() -> impl IntoView {
    let Selected(selected) = expect_context();
    let AllRows(all_rows) = expect_context();
    let window = HistoryWindow::new();

    let row = Memo::new(move |_| {
        let key = selected.get()?;
        all_rows.with(|rows| rows.iter().find(|r| r.key == key).cloned())
    });

    view! {
        <aside style="position: fixed; top: 0; right: 0; bottom: 0; width: min(440px, 100vw); overflow-y: auto; padding: 20px 22px; background: #0f1119; border-left: 1px solid #282c3e; box-shadow: -16px 0 40px rgba(0,0,0,0.4); z-index: 40;">
            {move || match row.get() {
                Some(row) => view! { <PlayerDetails row=row window=window /> }.into_any(),
                None => view! {
                    <div style="color: #5a5860; font-size: 0.85rem;">
                        "This member is no longer in the current snapshot."
                        <button
                            style="margin-left: 8px; background: transparent; border: none; color: #f5c542; cursor: pointer;"
                            on:click=move |_| selected.set(None)
                        >"Close"</button>
                    </div>
                }
                .into_any(),
            }}
        </aside>
    }
}

#[component]
fn PlayerDetails(row: RosterRow, window: HistoryWindow) -> impl IntoView {
    let Selected(selected) = expect_context();
    let AllRows(all_rows) = expect_context();

    let comparison = all_rows.with_untracked(|rows| compare_row(&row, rows));
    let stats = [
        ColumnKey::Th,
        ColumnKey::League,
        ColumnKey::Trophies,
        ColumnKey::Donations,
        ColumnKey::Received,
        ColumnKey::Ratio,
        ColumnKey::Tenure,
        ColumnKey::Srs,
        ColumnKey::Rush,
        ColumnKey::Vip,
    ];
    let war_columns = [
        ColumnKey::WarAvgStars,
        ColumnKey::WarTripleRate,
        ColumnKey::WarLowHitRate,
        ColumnKey::WarAvgDestruction,
        ColumnKey::WarAttacks,
    ];

    let stat_grid = stats
        .into_iter()
        .map(|column| {
            view! {
                <div style="padding: 8px 10px; background: #13161f; border: 1px solid #1f2230; border-radius: 6px;">
                    <div style="font-size: 0.66rem; color: #5a5860;">{column.label()}</div>
                    <div style="margin-top: 2px; font-size: 0.85rem;">{cell_view(column, &row)}</div>
                </div>
            }
        })
        .collect_view();

    let heroes = if row.heroes.is_empty() {
        view! { <div style="font-size: 0.78rem; color: #5a5860;">"No hero data for this town hall."</div> }.into_any()
    } else {
        row.heroes
            .iter()
            .map(|hero| {
                let level = hero.level.map_or_else(|| "\u{2014}".to_string(), |l| l.to_string());
                let color = if hero.is_maxed() { "#5bd68a" } else { "#e2e0d8" };
                view! {
                    <div style="display: flex; justify-content: space-between; font-size: 0.8rem; padding: 2px 0;">
                        <span style="color: #a09c94;">{hero.hero.short_label()}</span>
                        <span style=format!("color: {color};")>{format!("{level} / {}", hero.cap)}</span>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    let war = if row.war.is_some() {
        war_columns
            .into_iter()
            .map(|column| {
                view! {
                    <div style="display: flex; justify-content: space-between; font-size: 0.8rem; padding: 2px 0;">
                        <span style="color: #a09c94;">{column.label()}</span>
                        <span>{column.cell_text(&row)}</span>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    } else {
        view! { <div style="font-size: 0.78rem; color: #5a5860;">"No recent war data."</div> }.into_any()
    };

    let comparison_view = comparison.map(|comparison| {
        let groups = comparison
            .town_hall
            .iter()
            .chain(std::iter::once(&comparison.role))
            .map(|group| {
                format!(
                    "{} average: {} trophies ({} players)",
                    group.label,
                    format_thousands(group.average_trophies.round() as i64),
                    group.players
                )
            })
            .map(|line| view! { <div style="font-size: 0.75rem; color: #a09c94; margin-top: 4px;">{line}</div> })
            .collect_view();
        view! {
            <div>
                {comparison.metrics.into_iter().map(|m| view! { <MetricBar metric=m /> }).collect_view()}
                {groups}
            </div>
        }
    });

    let tag = row.member.tag.clone();

    view! {
        <div style="display: flex; align-items: center; gap: 12px;">
            <Avatar name=row.member.name.clone() tag=row.member.tag.clone() size=44 />
            <div style="flex: 1; min-width: 0;">
                <div style="font-size: 1.1rem; font-weight: 700;">{row.member.name.clone()}</div>
                <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #5a5860;">
                    {format!("{} \u{00B7} {}", display_tag(&row.member.tag), row.role.label())}
                </div>
            </div>
            <button
                style="background: transparent; border: 1px solid #282c3e; border-radius: 4px; color: #5a5860; padding: 4px 10px; cursor: pointer;"
                title="Close (Esc)"
                on:click=move |_| selected.set(None)
            >"\u{2715}"</button>
        </div>
        <div style="display: grid; grid-template-columns: repeat(2, 1fr); gap: 8px; margin-top: 16px;">{stat_grid}</div>
        <div style=SECTION_TITLE>"Heroes"</div>
        {heroes}
        <div style=SECTION_TITLE>"Recent wars"</div>
        {war}
        <div style=SECTION_TITLE>"Compared to the clan"</div>
        {comparison_view}
        <HistorySection tag=tag.clone() window=window />
        <NotesSection tag=tag />
    }
}

#[component]
fn MetricBar(metric: MetricComparison) -> impl IntoView {
    let width = metric.percentile.clamp(0.0, 100.0);
    let caption = format!(
        "#{} of {} \u{00B7} avg {} \u{00B7} median {}",
        metric.rank,
        metric.total_players,
        format_metric(metric.metric, metric.clan_average),
        format_metric(metric.metric, metric.clan_median)
    );
    view! {
        <div style="margin-bottom: 10px;">
            <div style="display: flex; justify-content: space-between; font-size: 0.78rem;">
                <span style="color: #a09c94;">{metric.metric.label()}</span>
                <span>{format_metric(metric.metric, metric.player_value)}</span>
            </div>
            <div style="height: 4px; margin-top: 4px; background: #1f2230; border-radius: 2px; overflow: hidden;">
                <div style=format!("width: {width:.0}%; height: 100%; background: #f5c542;") />
            </div>
            <div style="margin-top: 2px; font-size: 0.66rem; color: #5a5860;">{caption}</div>
        </div>
    }
}

#[component]
fn HistorySection(tag: String, window: HistoryWindow) -> impl IntoView {
    let data: RosterData = expect_context();
    let url = Memo::new(move |_| api::history_url(&tag, window.days()).ok());

    Effect::new(move || {
        if let Some(url) = url.get() {
            data.history.fetch(url, api::fetch_history);
        }
    });

    let window_button = move |days: u32| {
        view! {
            <button
                style=move || format!(
                    "font-family: 'JetBrains Mono', monospace; font-size: 0.66rem; padding: 2px 8px; border: none; border-radius: 3px; cursor: pointer; {}",
                    if window.days() == days { "color: #f5c542; background: rgba(245,197,66,0.1);" } else { "color: #5a5860; background: transparent;" }
                )
                on:click=move |_| window.select(days)
            >{format!("{days}d")}</button>
        }
    };

    let body = move || {
        let Some(url) = url.get() else {
            return view! { <div style="font-size: 0.78rem; color: #5a5860;">"History is unavailable for this tag."</div> }.into_any();
        };
        let resource = data.history.state(&url);
        match (resource.data, resource.error) {
            (Some((points, meta)), _) => {
                let summary = window_change(&points).map(|change| {
                    format!(
                        "{} trophies \u{00B7} {} donated \u{00B7} {} received over {} snapshots",
                        format_delta(change.trophies),
                        format_delta(change.donations),
                        format_delta(change.donations_received),
                        meta.snapshots_found.unwrap_or(points.len() as u32)
                    )
                });
                let rows = points
                    .iter()
                    .rev()
                    .map(|point| {
                        let deltas = point.deltas.unwrap_or_default();
                        view! {
                            <tr style="font-size: 0.74rem;">
                                <td style="padding: 3px 4px; color: #a09c94;">{point.date.get(..10).unwrap_or(&point.date).to_string()}</td>
                                <td style="padding: 3px 4px; text-align: right;">{point.trophies.map(format_thousands).unwrap_or_else(|| "\u{2014}".into())}</td>
                                <td style="padding: 3px 4px; text-align: right; color: #5a5860;">{format_delta(deltas.trophies)}</td>
                                <td style="padding: 3px 4px; text-align: right;">{point.donations.map(format_thousands).unwrap_or_else(|| "\u{2014}".into())}</td>
                                <td style="padding: 3px 4px; text-align: right; color: #5a5860;">{format_delta(deltas.donations)}</td>
                            </tr>
                        }
                    })
                    .collect_view();
                view! {
                    {summary.map(|s| view! { <div style="font-size: 0.75rem; color: #a09c94; margin-bottom: 6px;">{s}</div> })}
                    <table style="width: 100%; border-collapse: collapse;">
                        <thead>
                            <tr style="font-size: 0.64rem; color: #5a5860; text-align: right;">
                                <th style="text-align: left; padding: 3px 4px;">"Date"</th>
                                <th style="padding: 3px 4px;">"Trophies"</th>
                                <th style="padding: 3px 4px;">"\u{0394}"</th>
                                <th style="padding: 3px 4px;">"Donated"</th>
                                <th style="padding: 3px 4px;">"\u{0394}"</th>
                            </tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                }
                .into_any()
            }
            (None, Some(error)) => view! {
                <div style="font-size: 0.78rem; color: #ff6b6b;">{format!("Couldn't load history: {error}")}</div>
            }
            .into_any(),
            (None, None) => view! {
                <div class="status-pulse" style="font-size: 0.75rem; color: #3a3f5c;">"Loading history..."</div>
            }
            .into_any(),
        }
    };

    view! {
        <div style="display: flex; align-items: center; justify-content: space-between;">
            <div style=SECTION_TITLE>"History"</div>
            <div style="display: flex; gap: 2px;">
                {HISTORY_WINDOWS.into_iter().map(window_button).collect_view()}
            </div>
        </div>
        {body}
    }
}

#[component]
fn NotesSection(tag: String) -> impl IntoView {
    let Notes(notes) = expect_context();
    let Access(access) = expect_context();
    let toasts: Toasts = expect_context();
    let draft = RwSignal::new(String::new());

    let persist = move || {
        if let Err(e) = notes.with_untracked(storage::save_notes) {
            toasts.error(format!("Note not saved: {e}"));
        }
    };

    let tag_for_add = tag.clone();
    let on_add = move |_| {
        let body = draft.get_untracked();
        let result = notes
            .try_update(|book| {
                book.add(access.get_untracked(), &tag_for_add, &body, chrono::Utc::now())
            });
        match result {
            Some(Ok(_)) => {
                draft.set(String::new());
                persist();
            }
            Some(Err(e)) => toasts.error(e.to_string()),
            None => {}
        }
    };

    let on_input = move |e: leptos::ev::Event| {
        if let Some(area) = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        {
            draft.set(area.value());
        }
    };

    let tag_for_list = tag.clone();
    let list = move || {
        let tag = tag_for_list.clone();
        let entries: Vec<(String, String, String)> = notes.with(|book| {
            book.notes_for(&tag)
                .into_iter()
                .map(|note| {
                    (
                        note.id.clone(),
                        note.body.clone(),
                        note.created_at.format("%b %d, %Y").to_string(),
                    )
                })
                .collect()
        });
        if entries.is_empty() {
            return view! { <div style="font-size: 0.75rem; color: #5a5860;">"No notes yet."</div> }.into_any();
        }
        entries
            .into_iter()
            .map(|(id, body, date)| {
                let tag = tag.clone();
                let on_delete = move |_| {
                    let result = notes.try_update(|book| book.delete(access.get_untracked(), &tag, &id));
                    match result {
                        Some(Ok(true)) => persist(),
                        Some(Err(e)) => toasts.error(e.to_string()),
                        _ => {}
                    }
                };
                view! {
                    <div style="padding: 8px 10px; margin-bottom: 6px; background: #13161f; border: 1px solid #1f2230; border-radius: 6px;">
                        <div style="font-size: 0.8rem; white-space: pre-wrap;">{body}</div>
                        <div style="display: flex; justify-content: space-between; margin-top: 4px; font-size: 0.66rem; color: #5a5860;">
                            <span>{date}</span>
                            <button
                                style="background: transparent; border: none; color: #5a5860; cursor: pointer; font-size: 0.66rem;"
                                on:click=on_delete
                            >"Delete"</button>
                        </div>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div style=SECTION_TITLE>"Notes"</div>
        {list}
        <textarea
            style="width: 100%; min-height: 64px; margin-top: 6px; padding: 8px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-size: 0.8rem; resize: vertical; box-sizing: border-box;"
            placeholder="Add a note for leadership"
            maxlength=MAX_NOTE_LEN.to_string()
            prop:value=move || draft.get()
            on:input=on_input
        />
        <button
            style="margin-top: 6px; padding: 5px 12px; background: #13161f; border: 1px solid #282c3e; border-radius: 5px; color: #e2e0d8; font-size: 0.75rem; cursor: pointer;"
            on:click=on_add
        >"Add note"</button>
    }
}
