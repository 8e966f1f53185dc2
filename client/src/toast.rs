use gloo_timers::callback::Timeout;
use leptos::prelude::*;

const TOAST_LIFETIME_MS: u32 = 4_500;
const MAX_VISIBLE_TOASTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    fn accent(self) -> &'static str {
        match self {
            Self::Info => "#6ab6ff",
            Self::Success => "#5bd68a",
            Self::Error => "#ff6b6b",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Non-blocking notifications, provided once at the app root.
#[derive(Clone, Copy)]
pub(crate) struct Toasts {
    items: RwSignal<Vec<Toast>>,
    next_id: StoredValue<u64>,
}

impl Toasts {
    pub fn new() -> Self {
        Self {
            items: RwSignal::new(Vec::new()),
            next_id: StoredValue::new(0),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    fn push(&self, kind: ToastKind, message: String) {
        // Same message already on screen.
        if self
            .items
            .with_untracked(|items| items.iter().any(|t| t.message == message))
        {
            return;
        }

        let id = self.next_id.get_value();
        self.next_id.set_value(id + 1);
        self.items.update(|items| {
            items.push(Toast { id, kind, message });
            let overflow = items.len().saturating_sub(MAX_VISIBLE_TOASTS);
            items.drain(..overflow);
        });

        let items = self.items;
        Timeout::new(TOAST_LIFETIME_MS, move || {
            items.update(|items| items.retain(|t| t.id != id));
        })
        .forget();
    }

    fn dismiss(&self, id: u64) {
        self.items.update(|items| items.retain(|t| t.id != id));
    }
}

#[component]
pub fn ToastStack() -> impl IntoView {
    let toasts: Toasts = expect_context();

    view! {
        <div style="position: fixed; right: 16px; bottom: 16px; display: flex; flex-direction: column; gap: 8px; z-index: 50; pointer-events: none;">
            <For
                each=move || toasts.items.get()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    let style = format!(
                        "pointer-events: auto; min-width: 240px; max-width: 360px; padding: 10px 14px; background: #13161f; border: 1px solid #282c3e; border-left: 3px solid {}; border-radius: 6px; color: #e2e0d8; font-size: 0.82rem; box-shadow: 0 8px 24px rgba(0,0,0,0.35); cursor: pointer; animation: fade-in-up 0.2s ease-out both;",
                        toast.kind.accent()
                    );
                    view! {
                        <div role="status" style=style on:click=move |_| toasts.dismiss(id)>
                            {toast.message}
                        </div>
                    }
                }
            />
        </div>
    }
}
