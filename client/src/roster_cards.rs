use leptos::prelude::*;

use clanboard_shared::columns::ColumnKey;
use clanboard_shared::tag::display_tag;

use crate::app::{Selected, ViewState, VisibleRows};
use crate::roster_table::{Avatar, cell_view};
use crate::time_format::format_tenure;

/// Card grid; shows the same projected columns as the table as label/value pairs.
#[component]
pub fn RosterCards() -> impl IntoView {
    let state: ViewState = expect_context();
    let VisibleRows(rows) = expect_context();
    let Selected(selected) = expect_context();
    let columns = Memo::new(move |_| state.0.with(|s| s.columns()));

    move || {
        let rows = rows.get();
        if rows.is_empty() {
            return view! {
                <div style="padding: 32px; text-align: center; color: #5a5860; font-size: 0.85rem;">
                    "No members match the current filters."
                </div>
            }
            .into_any();
        }
        let columns = columns.get();
        view! {
            <div style="display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 12px;">
                {rows
                    .into_iter()
                    .map(|row| {
                        let key = row.key.clone();
                        let tenure = row.tenure_days().map(format_tenure);
                        let fields = columns
                            .iter()
                            .filter(|column| **column != ColumnKey::Tenure)
                            .map(|column| {
                                view! {
                                    <div style="display: flex; justify-content: space-between; gap: 8px; font-size: 0.78rem;">
                                        <span style="color: #5a5860;">{column.label()}</span>
                                        <span style="text-align: right; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{cell_view(*column, &row)}</span>
                                    </div>
                                }
                            })
                            .collect_view();
                        view! {
                            <div
                                style="padding: 14px; background: #13161f; border: 1px solid #282c3e; border-radius: 8px; cursor: pointer; transition: border-color 0.15s;"
                                on:click=move |_| selected.set(Some(key.clone()))
                            >
                                <div style="display: flex; align-items: center; gap: 10px; margin-bottom: 10px;">
                                    <Avatar name=row.member.name.clone() tag=row.member.tag.clone() size=36 />
                                    <div style="min-width: 0; flex: 1;">
                                        <div style="font-weight: 600; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{row.member.name.clone()}</div>
                                        <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #5a5860;">
                                            {display_tag(&row.member.tag)}
                                            {tenure.map(|t| format!(" \u{00B7} {t} in clan"))}
                                        </div>
                                    </div>
                                    <span style="font-size: 0.7rem; color: #f5c542;">{row.role.label()}</span>
                                </div>
                                <div style="display: flex; flex-direction: column; gap: 4px;">{fields}</div>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        }
        .into_any()
    }
}
