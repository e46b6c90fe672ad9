//! Heuristic classification of the final page state.
//!
//! There is no API to ask whether the login worked; the verdict comes from
//! looking at where the browser ended up and what the page shows.

/// Page text only rendered inside the authenticated console.
const PAGE_MARKERS: &[&str] = &["app launchpad", "devbox"];

/// URL fragments that indicate we landed back in the console.
const URL_MARKERS: &[&str] = &["private-team", "console"];

/// URL fragments that indicate we are still stuck on a login surface.
const LOGIN_SURFACES: &[&str] = &["signin", "github.com"];

/// Classification verdict for a finished login walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    LoggedIn,
    LoginFailed,
}

/// Decide whether the flow ended logged in.
///
/// Success if any of:
/// - the page text carries a console-only marker,
/// - the URL carries a console marker,
/// - the URL is off every known login surface.
pub fn classify(final_url: &str, page_text: &str) -> Verdict {
    let url = final_url.to_lowercase();
    let text = page_text.to_lowercase();

    if PAGE_MARKERS.iter().any(|m| text.contains(m)) {
        return Verdict::LoggedIn;
    }

    if URL_MARKERS.iter().any(|m| url.contains(m)) {
        return Verdict::LoggedIn;
    }

    if !LOGIN_SURFACES.iter().any(|m| url.contains(m)) {
        return Verdict::LoggedIn;
    }

    Verdict::LoginFailed
}
