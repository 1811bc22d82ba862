use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-3 rounded-lg border p-4 shadow-sm"}
    clx! {CardHeader, div, "flex items-start justify-between gap-2"}
    clx! {CardTitle, h3, "leading-snug font-semibold break-words"}
    clx! {CardBody, div, "text-sm whitespace-pre-wrap break-words"}
    clx! {CardFooter, footer, "flex items-center justify-end gap-2 text-xs text-muted-foreground"}
}

#[allow(unused_imports)]
pub use components::*;
