use leptos::prelude::*;

pub const PROFILE_URL: &str = "https://github.com/metinbicaksiz";

const GITHUB_ICON_PATH: &str = "M12 0C5.37 0 0 5.37 0 12c0 5.3 3.44 9.8 8.2 11.39.6.11.82-.26.82-.58v-2.03c-3.34.73-4.04-1.61-4.04-1.61-.55-1.39-1.33-1.76-1.33-1.76-1.09-.74.08-.73.08-.73 1.2.09 1.84 1.24 1.84 1.24 1.07 1.83 2.81 1.3 3.49 1 .11-.78.42-1.31.76-1.61-2.67-.3-5.47-1.33-5.47-5.93 0-1.31.47-2.38 1.24-3.22-.12-.3-.54-1.52.12-3.18 0 0 1.01-.32 3.3 1.23a11.5 11.5 0 0 1 6 0c2.29-1.55 3.3-1.23 3.3-1.23.66 1.66.24 2.88.12 3.18.77.84 1.24 1.91 1.24 3.22 0 4.61-2.81 5.63-5.48 5.92.43.37.82 1.1.82 2.22v3.29c0 .32.22.7.83.58C20.57 21.8 24 17.3 24 12c0-6.63-5.37-12-12-12z";

/// Static attribution with a link to the author's profile.
#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer class="footer">
            <a
                href=PROFILE_URL
                target="_blank"
                rel="noopener noreferrer"
                aria-label="GitHub profile"
            >
                <svg
                    xmlns="http://www.w3.org/2000/svg"
                    viewBox="0 0 24 24"
                    width="24"
                    height="24"
                    fill="currentColor"
                    aria-hidden="true"
                >
                    <path d=GITHUB_ICON_PATH></path>
                </svg>
            </a>
            <p>
                "Made by " <b>"Metin BICAKSIZ"</b>
                <br/>
                "and, built with " <b>"Next.js"</b>
            </p>
        </footer>
    }
}
