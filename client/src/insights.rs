use leptos::prelude::*;

use clanboard_shared::insights::InsightItem;

use crate::api;
use crate::app::RosterData;

fn severity_color(severity: Option<&str>) -> &'static str {
    match severity.map(str::to_ascii_lowercase).as_deref() {
        Some("high" | "critical" | "urgent") => "#ff6b6b",
        Some("medium" | "warning") => "#f5c542",
        Some("low" | "info") => "#6ee7b7",
        _ => "#5a5860",
    }
}

#[component]
fn InsightRow(item: InsightItem) -> impl IntoView {
    let marker = format!(
        "flex: none; width: 6px; height: 6px; margin-top: 6px; border-radius: 50%; background: {};",
        severity_color(item.severity.as_deref())
    );
    view! {
        <li style="display: flex; gap: 8px; padding: 5px 0; border-bottom: 1px solid #1f2230;">
            <span style=marker />
            <div>
                <div style="font-size: 0.82rem; color: #e2e0d8;">{item.title}</div>
                {item.detail.map(|detail| view! {
                    <div style="font-size: 0.74rem; color: #a09c94;">{detail}</div>
                })}
            </div>
        </li>
    }
}

/// Collapsible clan insights; fetched the first time it is opened.
#[component]
pub fn InsightsPanel() -> impl IntoView {
    let data: RosterData = expect_context();
    let open = RwSignal::new(false);
    let url = Memo::new(move |_| api::insights_url(data.clan_tag.get().as_deref()));

    Effect::new(move || {
        if open.get() {
            data.insights.fetch(url.get(), api::fetch_insights);
        }
    });

    let body = move || {
        let resource = data.insights.state(&url.get());
        match (resource.data, resource.error) {
            (Some(Some(insights)), _) => {
                let caption = insights
                    .snapshot_label()
                    .map(|date| format!("Based on the {date} snapshot"));
                let items = insights.items().into_iter().cloned().collect::<Vec<_>>();
                if items.is_empty() {
                    return view! {
                        <div style="font-size: 0.78rem; color: #5a5860;">"Nothing stands out in the latest snapshot."</div>
                    }
                    .into_any();
                }
                view! {
                    {caption.map(|c| view! { <div style="font-size: 0.7rem; color: #5a5860; margin-bottom: 4px;">{c}</div> })}
                    <ul style="margin: 0; padding: 0; list-style: none;">
                        {items.into_iter().map(|item| view! { <InsightRow item=item /> }).collect_view()}
                    </ul>
                }
                .into_any()
            }
            (Some(None), _) => view! {
                <div style="font-size: 0.78rem; color: #5a5860;">"No insights yet. They appear after the next ingestion run."</div>
            }
            .into_any(),
            (None, Some(error)) => view! {
                <div style="font-size: 0.78rem; color: #ff6b6b;">{format!("Couldn't load insights: {error}")}</div>
            }
            .into_any(),
            (None, None) => view! {
                <div class="status-pulse" style="font-size: 0.75rem; color: #3a3f5c;">"Loading insights..."</div>
            }
            .into_any(),
        }
    };

    view! {
        <section style="margin: 0 24px 12px; padding: 10px 14px; background: #13161f; border: 1px solid #282c3e; border-radius: 8px;">
            <button
                style="width: 100%; display: flex; justify-content: space-between; padding: 0; background: transparent; border: none; cursor: pointer; font-family: 'JetBrains Mono', monospace; font-size: 0.7rem; color: #a09c94; text-transform: uppercase; letter-spacing: 0.06em;"
                on:click=move |_| open.update(|open| *open = !*open)
            >
                <span>"Insights"</span>
                <span>{move || if open.get() { "\u{25B4}" } else { "\u{25BE}" }}</span>
            </button>
            {move || open.get().then(|| view! { <div style="margin-top: 8px;">{body}</div> })}
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::severity_color;

    #[test]
    fn severity_maps_case_insensitively_with_neutral_fallback() {
        assert_eq!(severity_color(Some("HIGH")), "#ff6b6b");
        assert_eq!(severity_color(Some("warning")), "#f5c542");
        assert_eq!(severity_color(Some("info")), "#6ee7b7");
        assert_eq!(severity_color(Some("whatever")), "#5a5860");
        assert_eq!(severity_color(None), "#5a5860");
    }
}
