// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story of
//! how the engine operates: how deep includes may recurse, how long a
//! macro may run, how output is indented.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Recursion boundaries
// ---------------------------------------------------------------------------

/// Maximum depth when recursively expanding `include` macros.
///
/// Confluence pages can include pages that include further pages. This
/// bound guarantees a chain of includes terminates with a placeholder
/// instead of exhausting the stack. Ten levels is deeper than any sane
/// documentation tree.
pub const MAX_INCLUDE_DEPTH: u8 = 10;

/// Hard ceiling on the configurable include depth.
///
/// User configuration is clamped to this value so a misconfigured
/// `max_recursion_depth` can never translate into unbounded recursion.
pub const INCLUDE_DEPTH_CEILING: u8 = 50;

// ---------------------------------------------------------------------------
// Scheduling boundaries
// ---------------------------------------------------------------------------

/// Default wall-clock budget for a single macro's processing.
///
/// A macro that has not produced output within this window is converted
/// to a timeout fallback; siblings keep converting.
pub const DEFAULT_MACRO_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on concurrently processed sibling macros.
///
/// Macro processing is I/O-bound (include fetches), so the bound can
/// exceed the core count without harm; this cap merely keeps one huge
/// page from opening hundreds of simultaneous fetches.
pub const MAX_CONCURRENT_MACROS: usize = 16;

// ---------------------------------------------------------------------------
// Formatting boundaries
// ---------------------------------------------------------------------------

/// Number of spaces per indentation level in normalized Markdown output.
pub const INDENT_SPACES: usize = 2;

/// Bullet glyph used when list markers are flattened to inline form.
pub const INLINE_BULLET: &str = "\u{2022} ";

/// Runs of this many or more blank lines collapse to exactly two.
pub const MAX_BLANK_RUN: usize = 3;

/// Estimated characters per macro replacement, used to pre-allocate the
/// stitched output string. A hint, not a constraint.
pub const CHARS_PER_MACRO_ESTIMATE: usize = 256;

// ---------------------------------------------------------------------------
// Panel macros
// ---------------------------------------------------------------------------

/// Icon prefixes for the admonition panel family.
///
/// Keyed by macro name; the icon leads the first blockquoted line so the
/// admonition kind survives the trip to plain Markdown.
pub const PANEL_ICONS: &[(&str, &str)] = &[
    ("info", "\u{2139}\u{fe0f}"),
    ("note", "\u{1f4dd}"),
    ("tip", "\u{1f4a1}"),
    ("warning", "\u{26a0}\u{fe0f}"),
    ("error", "\u{274c}"),
];

// ---------------------------------------------------------------------------
// Page-fetch boundaries
// ---------------------------------------------------------------------------

/// How many fetched page bodies the include cache retains.
pub const PAGE_CACHE_CAPACITY: usize = 64;

/// How long a cached page body stays fresh.
pub const PAGE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Retry attempts for transient page-fetch failures.
pub const FETCH_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff delay between fetch retries.
pub const FETCH_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(250);

/// Ceiling on the exponential backoff delay.
pub const FETCH_RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
