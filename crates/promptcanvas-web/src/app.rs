use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

use crate::pages::home::HomePage;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/promptcanvas-web.css"/>
        <Title text="PromptCanvas"/>
        <Meta name="description" content="Turn a text prompt into an image."/>
        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=path!("/") view=HomePage/>
            </Routes>
        </Router>
    }
}
