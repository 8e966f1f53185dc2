use leptos::prelude::*;

use clanboard_shared::FormerMember;
use clanboard_shared::filter::normalize_search_text;
use clanboard_shared::league::parse_league_name;
use clanboard_shared::model::Role;
use clanboard_shared::tag::display_tag;

use crate::app::{RosterData, ViewState};
use crate::roster_table::Avatar;
use crate::time_format::{days_since, format_days_ago, format_tenure};

/// Former members matching the search box, most recent departures first.
pub fn visible_former(members: &[FormerMember], query: &str) -> Vec<FormerMember> {
    let query = normalize_search_text(query);
    let mut out: Vec<FormerMember> = members
        .iter()
        .filter(|m| {
            query.is_empty()
                || normalize_search_text(&m.name).contains(&query)
                || normalize_search_text(&m.tag).contains(&query)
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.departed_at.cmp(&a.departed_at));
    out
}

fn details(member: &FormerMember) -> String {
    let mut parts = Vec::new();
    if let Some(role) = member.last_role.as_deref() {
        parts.push(Role::parse(role).label().to_string());
    }
    if let Some(th) = member.last_town_hall_level {
        parts.push(format!("TH{th}"));
    }
    if let Some(league) = member
        .last_ranked_league_name
        .as_deref()
        .and_then(parse_league_name)
    {
        parts.push(league.label());
    }
    if let Some(days) = member.tenure_days {
        parts.push(format!("{} tenure", format_tenure(days)));
    }
    parts.join(" \u{00B7} ")
}

#[component]
pub fn FormerMembers() -> impl IntoView {
    let data: RosterData = expect_context();
    let state: ViewState = expect_context();
    let search = Memo::new(move |_| state.0.with(|s| s.preference.search.clone()));

    move || {
        let resource = data.former_state();
        match (resource.data, resource.error) {
            (None, Some(error)) => view! {
                <div style="margin-top: 24px; padding: 20px; background: #13161f; border: 1px solid #4a2a2e; border-radius: 8px; color: #ff6b6b; font-size: 0.9rem;">
                    {format!("Couldn't load former members: {error}")}
                </div>
            }
            .into_any(),
            (None, None) => view! {
                <div style="padding: 48px; text-align: center;">
                    <div class="status-pulse" style="font-family: 'JetBrains Mono', monospace; font-size: 0.78rem; color: #3a3f5c;">"Loading former members..."</div>
                </div>
            }
            .into_any(),
            (Some(response), _) => {
                let now = chrono::Utc::now();
                let members = search.with(|q| visible_former(&response.members, q));
                if members.is_empty() {
                    return view! {
                        <div style="padding: 32px; text-align: center; color: #5a5860; font-size: 0.85rem;">"No former members."</div>
                    }
                    .into_any();
                }
                view! {
                    <ul style="list-style: none; margin: 0; padding: 0;">
                        {members
                            .into_iter()
                            .map(|member| {
                                let departed = member
                                    .departed_at
                                    .as_deref()
                                    .and_then(|at| days_since(at, now))
                                    .map(|days| format!("departed {}", format_days_ago(days)))
                                    .unwrap_or_else(|| "departure date unknown".to_string());
                                let details = details(&member);
                                view! {
                                    <li style="display: flex; align-items: center; gap: 12px; padding: 10px 8px; border-bottom: 1px solid #1a1d2a;">
                                        <Avatar name=member.name.clone() tag=member.tag.clone() />
                                        <div style="flex: 1; min-width: 0;">
                                            <div style="font-weight: 600; font-size: 0.85rem;">{member.name.clone()}</div>
                                            <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #5a5860;">
                                                {display_tag(&member.tag)}
                                            </div>
                                        </div>
                                        <div style="font-size: 0.75rem; color: #a09c94;">{details}</div>
                                        <div style="width: 160px; text-align: right; font-size: 0.72rem; color: #5a5860;">{departed}</div>
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                }
                .into_any()
            }
        }
    }
}
