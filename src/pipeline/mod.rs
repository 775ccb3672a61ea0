//! Pipeline stages for board-to-PDF export.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap collaborators (HTTP client, browser) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ fetch ──▶ artifact ──▶ (layout) ──▶ compose ──▶ render
//! (URL/file) (marker+regex) (1 fallback) (name+dims) (crate)  (maud)   (Chrome)
//! ```
//!
//! 1. [`input`]    — turn the user's board URL or saved page into markup
//! 2. [`extract`]  — cut at the gallery marker, collect preview URLs, dedupe,
//!    upgrade to the original tier
//! 3. [`fetch`]    — one GET, one preview-tier fallback, never an error
//! 4. [`artifact`] — file name from the URL, dimensions from the header
//! 5. layout lives in the `board2pdf-layout` crate; it is pure geometry
//! 6. [`compose`]  — absolutely positioned `<img>` grid
//! 7. [`render`]   — headless Chrome for board serialisation and PDF printing;
//!    runs in `spawn_blocking`

pub mod artifact;
pub mod compose;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod render;
