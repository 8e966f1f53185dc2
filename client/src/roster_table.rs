use leptos::prelude::*;

use clanboard_shared::columns::{ColumnKey, MoveDirection, Preset, column_widths};
use clanboard_shared::preferences::Density;
use clanboard_shared::sort::{SortDirection, SortKey, SortState};
use clanboard_shared::tag::display_tag;
use clanboard_shared::{Action, RosterRow};

use crate::app::{Notes, Selected, ViewState, VisibleRows};
use crate::colors::{avatar_background, band_css, rgba_css, rush_css};

fn sort_indicator(sort: SortState, key: SortKey) -> &'static str {
    if sort.key != key {
        return "";
    }
    match sort.direction {
        SortDirection::Asc => " \u{25B2}",
        SortDirection::Desc => " \u{25BC}",
    }
}

fn is_numeric(column: ColumnKey) -> bool {
    !matches!(
        column,
        ColumnKey::Role | ColumnKey::League | ColumnKey::Heroes | ColumnKey::Srs
    )
}

/// Initial-letter avatar tinted by tag.
#[component]
pub fn Avatar(name: String, tag: String, #[prop(default = 28)] size: u32) -> impl IntoView {
    let initial = name
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string());
    let style = format!(
        "width: {size}px; height: {size}px; border-radius: 50%; background: {}; color: #0c0e17; display: inline-flex; align-items: center; justify-content: center; font-weight: 700; font-size: {}px; flex-shrink: 0;",
        avatar_background(&tag),
        size / 2
    );
    view! { <span style=style>{initial}</span> }
}

/// One table/card value with the per-column emphasis.
pub fn cell_view(column: ColumnKey, row: &RosterRow) -> AnyView {
    let text = column.cell_text(row);
    match column {
        ColumnKey::Rush => {
            let style = format!("color: {};", rush_css(row.rush_percent));
            view! { <span style=style>{text}</span> }.into_any()
        }
        ColumnKey::Srs => {
            let (r, g, b) = row.activity.color;
            let style = format!(
                "display: inline-block; padding: 1px 8px; border-radius: 999px; font-size: 0.72rem; color: {}; background: {};",
                rgba_css(r, g, b, 1.0),
                band_css(row.activity.band, row.activity.color)
            );
            view! { <span style=style>{text}</span> }.into_any()
        }
        ColumnKey::Role if row.role.is_leadership() => {
            view! { <span style="color: #f5c542;">{text}</span> }.into_any()
        }
        _ => text.into_any(),
    }
}

#[component]
pub fn RosterTable() -> impl IntoView {
    let state: ViewState = expect_context();
    let VisibleRows(rows) = expect_context();
    let Selected(selected) = expect_context();
    let Notes(notes) = expect_context();
    let picker_open = RwSignal::new(false);

    let columns = Memo::new(move |_| state.0.with(|s| s.columns()));
    let sort = Memo::new(move |_| state.0.with(|s| s.preference.sort));
    let density = Memo::new(move |_| state.0.with(|s| s.preference.density));

    let cell_padding = move || match density.get() {
        Density::Cozy => "padding: 10px 8px;",
        Density::Compact => "padding: 4px 8px;",
    };

    let colgroup = move || {
        let widths = column_widths(&columns.get());
        view! {
            <colgroup>
                <col style=format!("width: {:.2}%;", widths.player) />
                {widths
                    .columns
                    .into_iter()
                    .map(|(_, pct)| view! { <col style=format!("width: {pct:.2}%;") /> })
                    .collect_view()}
                <col style=format!("width: {:.2}%;", widths.actions) />
            </colgroup>
        }
    };

    let header = move || {
        let sort = sort.get();
        let header_cell = "padding: 8px; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; font-weight: 500; color: #5a5860; text-transform: uppercase; letter-spacing: 0.04em; border-bottom: 1px solid #282c3e; white-space: nowrap;";
        view! {
            <tr>
                <th
                    style=format!("{header_cell} text-align: left; cursor: pointer;")
                    on:click=move |_| state.dispatch(Action::ClickSort(SortKey::Name))
                >
                    {format!("Player{}", sort_indicator(sort, SortKey::Name))}
                </th>
                {columns
                    .get()
                    .into_iter()
                    .map(|column| {
                        let align = if is_numeric(column) { "right" } else { "left" };
                        match column.sort_key() {
                            Some(key) => view! {
                                <th
                                    style=format!("{header_cell} text-align: {align}; cursor: pointer;")
                                    on:click=move |_| state.dispatch(Action::ClickSort(key))
                                >
                                    {format!("{}{}", column.label(), sort_indicator(sort, key))}
                                </th>
                            }
                            .into_any(),
                            None => view! {
                                <th style=format!("{header_cell} text-align: {align};")>{column.label()}</th>
                            }
                            .into_any(),
                        }
                    })
                    .collect_view()}
                <th style=format!("{header_cell} text-align: right;")>
                    <button
                        style="padding: 2px 8px; background: transparent; border: 1px solid #282c3e; border-radius: 4px; color: #5a5860; font-size: 0.68rem; cursor: pointer;"
                        on:click=move |_| picker_open.update(|open| *open = !*open)
                    >"Columns"</button>
                </th>
            </tr>
        }
    };

    let body = move || {
        let columns = columns.get();
        let padding = cell_padding();
        let rows = rows.get();
        if rows.is_empty() {
            let span = (columns.len() + 2).to_string();
            return view! {
                <tr>
                    <td colspan=span style="padding: 32px; text-align: center; color: #5a5860; font-size: 0.85rem;">
                        "No members match the current filters."
                    </td>
                </tr>
            }
            .into_any();
        }
        rows.into_iter()
            .map(|row| {
                let key = row.key.clone();
                let key_for_click = key.clone();
                let note_count = notes.with(|book| book.count_for(&row.member.tag));
                let cells = columns
                    .iter()
                    .map(|column| {
                        let align = if is_numeric(*column) { "right" } else { "left" };
                        let style = format!("{padding} text-align: {align}; border-bottom: 1px solid #1a1d2a; font-size: 0.82rem; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;");
                        view! { <td style=style>{cell_view(*column, &row)}</td> }
                    })
                    .collect_view();
                view! {
                    <tr
                        style="cursor: pointer; transition: background 0.15s;"
                        style:background=move || if selected.get().as_deref() == Some(key.as_str()) { "#232738" } else { "transparent" }
                        on:click=move |_| selected.set(Some(key_for_click.clone()))
                    >
                        <td style=format!("{padding} border-bottom: 1px solid #1a1d2a;")>
                            <div style="display: flex; align-items: center; gap: 10px; min-width: 0;">
                                <Avatar name=row.member.name.clone() tag=row.member.tag.clone() />
                                <div style="min-width: 0;">
                                    <div style="font-weight: 600; font-size: 0.85rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{row.member.name.clone()}</div>
                                    <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #5a5860;">{display_tag(&row.member.tag)}</div>
                                </div>
                            </div>
                        </td>
                        {cells}
                        <td style=format!("{padding} border-bottom: 1px solid #1a1d2a; text-align: right; font-size: 0.7rem; color: #5a5860;")>
                            {(note_count > 0).then(|| format!("\u{270E} {note_count}"))}
                        </td>
                    </tr>
                }
                .into_any()
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div style="position: relative;">
            {move || {
                if picker_open.get() {
                    view! { <ColumnPicker /> }.into_any()
                } else {
                    ().into_any()
                }
            }}
            <table style="width: 100%; table-layout: fixed; border-collapse: collapse;">
                {colgroup}
                <thead>{header}</thead>
                <tbody>{body}</tbody>
            </table>
        </div>
    }
}

/// Toggle and reorder columns; editing a named preset forks it into Custom.
#[component]
fn ColumnPicker() -> impl IntoView {
    let state: ViewState = expect_context();
    let columns = Memo::new(move |_| state.0.with(|s| s.columns()));
    let is_custom = Memo::new(move |_| state.0.with(|s| s.preference.preset == Preset::Custom));

    let arrow_style = "padding: 0 6px; background: transparent; border: none; color: #5a5860; cursor: pointer; font-size: 0.75rem;";

    view! {
        <div style="position: absolute; right: 0; top: 36px; z-index: 20; width: 260px; max-height: 420px; overflow-y: auto; padding: 8px; background: #13161f; border: 1px solid #282c3e; border-radius: 8px; box-shadow: 0 12px 32px rgba(0,0,0,0.45);">
            <div style="padding: 4px 6px 8px; font-size: 0.7rem; color: #5a5860;">
                {move || if is_custom.get() { "Custom columns" } else { "Editing starts a custom preset" }}
            </div>
            {ColumnKey::ALL
                .into_iter()
                .map(|column| {
                    let shown = move || columns.with(|cols| cols.contains(&column));
                    view! {
                        <div style="display: flex; align-items: center; gap: 8px; padding: 4px 6px; font-size: 0.8rem;">
                            <input
                                type="checkbox"
                                prop:checked=shown
                                on:change=move |_| state.dispatch(Action::ToggleColumn(column))
                            />
                            <span style="flex: 1;">{column.label()}</span>
                            {move || {
                                if is_custom.get() && shown() {
                                    view! {
                                        <button
                                            style=arrow_style
                                            title="Move up"
                                            on:click=move |_| state.dispatch(Action::MoveColumn(column, MoveDirection::Up))
                                        >"\u{2191}"</button>
                                        <button
                                            style=arrow_style
                                            title="Move down"
                                            on:click=move |_| state.dispatch(Action::MoveColumn(column, MoveDirection::Down))
                                        >"\u{2193}"</button>
                                    }
                                    .into_any()
                                } else {
                                    ().into_any()
                                }
                            }}
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use clanboard_shared::columns::ColumnKey;
    use clanboard_shared::sort::{SortDirection, SortKey, SortState};

    use super::{is_numeric, sort_indicator};

    #[test]
    fn indicator_only_on_active_column() {
        let sort = SortState {
            key: SortKey::Trophies,
            direction: SortDirection::Asc,
        };
        assert_eq!(sort_indicator(sort, SortKey::Trophies), " \u{25B2}");
        assert_eq!(sort_indicator(sort, SortKey::Th), "");
    }

    #[test]
    fn text_columns_align_left() {
        assert!(!is_numeric(ColumnKey::League));
        assert!(!is_numeric(ColumnKey::Heroes));
        assert!(is_numeric(ColumnKey::WarTripleRate));
    }
}
