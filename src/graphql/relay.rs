//! Relay plumbing: global object IDs, array-offset cursors and connection slicing.
//!
//! Cursors are opaque `base64("arrayconnection:<offset>")` strings where the
//! offset is the zero-based position in the id-ordered result set. Slicing
//! follows the graphql-relay algorithm so page-info flags match what Relay
//! clients expect.

use crate::error::{CookbookError, Result};
use crate::storage::Page;
use async_graphql::connection::{CursorType, Edge, EdgeNameType, EmptyFields};
use async_graphql::{OutputType, ID};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Encodes `TypeName:pk` as an opaque global ID.
pub fn to_global_id(type_name: &str, id: i64) -> ID {
    ID(STANDARD.encode(format!("{type_name}:{id}")))
}

/// Splits a global ID into its type name and raw id.
pub fn from_global_id(global_id: &str) -> Result<(String, String)> {
    let parse_error = |detail: String| {
        CookbookError::InvalidId(format!(
            "Unable to parse global ID \"{global_id}\". Make sure it is a base64 encoded string in the format: \"TypeName:id\". Exception message: {detail}"
        ))
    };

    let bytes = STANDARD
        .decode(global_id)
        .map_err(|e| parse_error(e.to_string()))?;
    let decoded = String::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
    match decoded.split_once(':') {
        Some((type_name, id)) if !type_name.is_empty() && !id.is_empty() => {
            Ok((type_name.to_string(), id.to_string()))
        }
        _ => Err(parse_error("missing type separator".to_string())),
    }
}

/// Decodes a global ID that must belong to `expected_type`.
pub fn decode_pk(expected_type: &str, global_id: &str) -> Result<i64> {
    let (type_name, id) = from_global_id(global_id)?;
    if type_name != expected_type {
        return Err(CookbookError::InvalidId(format!(
            "Must receive a {expected_type} id."
        )));
    }
    parse_pk(&id)
}

/// Accepts either a bare primary key or a global ID of `expected_type`.
///
/// Filter arguments take node IDs; plain integers are allowed too.
pub fn resolve_pk(expected_type: &str, raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(pk) => Ok(pk),
        Err(_) => decode_pk(expected_type, raw),
    }
}

fn parse_pk(id: &str) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|_| CookbookError::InvalidId(format!("Invalid primary key \"{id}\"")))
}

/// Zero-based position of an edge in its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCursor(pub usize);

impl CursorType for ArrayCursor {
    type Error = CookbookError;

    fn decode_cursor(s: &str) -> std::result::Result<Self, Self::Error> {
        decode_offset(s)
            .and_then(|offset| usize::try_from(offset).ok())
            .map(ArrayCursor)
            .ok_or_else(|| CookbookError::Pagination(format!("Invalid cursor \"{s}\"")))
    }

    fn encode_cursor(&self) -> String {
        encode_offset(self.0 as i64)
    }
}

fn encode_offset(offset: i64) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

fn decode_offset(cursor: &str) -> Option<i64> {
    let bytes = STANDARD.decode(cursor).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    decoded.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

/// Undecodable cursors fall back to `default`, as if they were never sent.
fn offset_with_default(cursor: Option<&str>, default: i64) -> i64 {
    cursor.and_then(decode_offset).unwrap_or(default)
}

/// The standard Relay connection arguments plus the optional `offset`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub after: Option<String>,
    pub before: Option<String>,
    pub first: Option<i32>,
    pub last: Option<i32>,
    pub offset: Option<i32>,
}

impl ConnectionArgs {
    pub fn new(
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Self {
        Self {
            after,
            before,
            first,
            last,
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: Option<i32>) -> Self {
        self.offset = offset;
        self
    }
}

/// How cursors pointing outside the result set are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRange {
    /// Cut the window at the cursor, so `after` past the end yields an empty page.
    Clamp,
    /// Drop the cursor, as plain graphql-relay array connections do.
    Ignore,
}

/// Limits applied to a particular connection field.
#[derive(Debug, Clone, Copy)]
pub struct SliceLimits<'a> {
    /// Field name used in error messages, e.g. `allIngredients`
    pub field_name: &'a str,
    pub max_limit: Option<usize>,
    pub out_of_range: OutOfRange,
}

/// The `[start, end)` range of the result set to return, with page info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceWindow {
    pub start: usize,
    pub end: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl SliceWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The storage page holding exactly this window's rows.
    pub fn page(&self) -> Page {
        Page::new(self.start, self.len())
    }
}

/// Works out which slice of a `total`-long result set the arguments select.
pub fn slice_window(args: &ConnectionArgs, total: usize, limits: SliceLimits<'_>) -> Result<SliceWindow> {
    let mut first = args.first.map(i64::from);
    let last = args.last.map(i64::from);
    let before = args.before.as_deref();
    let mut after_offset = offset_with_default(args.after.as_deref(), -1);
    let mut has_after = args.after.is_some();

    for (name, value) in [("first", first), ("last", last)] {
        if matches!(value, Some(v) if v < 0) {
            return Err(CookbookError::Pagination(format!(
                "Argument '{name}' must be a non-negative integer."
            )));
        }
    }

    if let Some(max_limit) = limits.max_limit {
        let max = max_limit as i64;
        for (name, value) in [("first", first), ("last", last)] {
            match value {
                Some(requested) if requested > max => {
                    return Err(CookbookError::Pagination(format!(
                        "Requesting {requested} records on the `{}` connection exceeds the `{name}` limit of {max_limit} records.",
                        limits.field_name
                    )));
                }
                _ => {}
            }
        }
        if first.is_none() && last.is_none() {
            first = Some(max);
        }
    }

    if let Some(offset) = args.offset {
        if before.is_some() {
            return Err(CookbookError::Pagination(format!(
                "You can't provide a `before` value at the same time as an `offset` value to properly paginate the `{}` connection.",
                limits.field_name
            )));
        }
        if offset < 0 {
            return Err(CookbookError::Pagination(
                "Argument 'offset' must be a non-negative integer.".to_string(),
            ));
        }
        after_offset = after_offset + i64::from(offset);
        has_after = true;
    }

    let total = total as i64;
    let before_offset = offset_with_default(before, total);

    let (mut start, mut end) = match limits.out_of_range {
        OutOfRange::Clamp => (after_offset.max(-1) + 1, before_offset.min(total)),
        OutOfRange::Ignore => {
            let in_range = |offset: i64| (0..total).contains(&offset);
            (
                if in_range(after_offset) { after_offset + 1 } else { 0 },
                if in_range(before_offset) { before_offset } else { total },
            )
        }
    };
    if let Some(first) = first {
        end = end.min(start + first);
    }
    if let Some(last) = last {
        start = start.max(end - last);
    }

    let lower_bound = if has_after { after_offset + 1 } else { 0 };
    let upper_bound = if before.is_some() { before_offset } else { total };
    let has_previous_page = last.is_some() && start > lower_bound;
    let has_next_page = first.is_some() && end < upper_bound;

    let start = start.clamp(0, total);
    let end = end.clamp(start, total);
    Ok(SliceWindow {
        start: start as usize,
        end: end as usize,
        has_previous_page,
        has_next_page,
    })
}

/// Turns the rows of a window into edges carrying their absolute cursors.
pub fn window_edges<T, N, E>(window: &SliceWindow, rows: Vec<T>) -> Vec<Edge<ArrayCursor, N, EmptyFields, E>>
where
    N: From<T> + OutputType,
    E: EdgeNameType,
{
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| Edge::new(ArrayCursor(window.start + i), N::from(row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: SliceLimits<'static> = SliceLimits {
        field_name: "allThings",
        max_limit: None,
        out_of_range: OutOfRange::Clamp,
    };

    fn cursor(offset: usize) -> Option<String> {
        Some(ArrayCursor(offset).encode_cursor())
    }

    fn window(args: ConnectionArgs, total: usize) -> SliceWindow {
        slice_window(&args, total, LIMITS).unwrap()
    }

    #[test]
    fn test_global_id_format() {
        let id = to_global_id("CategoryNode", 1);
        assert_eq!(id.0, "Q2F0ZWdvcnlOb2RlOjE=");
        assert_eq!(decode_pk("CategoryNode", &id).unwrap(), 1);
    }

    #[test]
    fn test_global_id_type_mismatch() {
        let id = to_global_id("IngredientNode", 3);
        let err = decode_pk("CategoryNode", &id).unwrap_err();
        assert_eq!(err.to_string(), "Must receive a CategoryNode id.");
    }

    #[test]
    fn test_global_id_garbage() {
        let err = from_global_id("not base64!").unwrap_err();
        assert!(err.to_string().starts_with("Unable to parse global ID \"not base64!\""));
        assert!(from_global_id(&STANDARD.encode("no-separator")).is_err());
    }

    #[test]
    fn test_resolve_pk_accepts_raw_and_global() {
        assert_eq!(resolve_pk("CategoryNode", "7").unwrap(), 7);
        let id = to_global_id("CategoryNode", 7);
        assert_eq!(resolve_pk("CategoryNode", &id).unwrap(), 7);
    }

    #[test]
    fn test_cursor_format() {
        assert_eq!(ArrayCursor(0).encode_cursor(), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(
            ArrayCursor::decode_cursor("YXJyYXljb25uZWN0aW9uOjA=").unwrap(),
            ArrayCursor(0)
        );
        assert!(ArrayCursor::decode_cursor("bogus").is_err());
    }

    #[test]
    fn test_no_arguments_returns_everything() {
        let w = window(ConnectionArgs::default(), 5);
        assert_eq!((w.start, w.end), (0, 5));
        assert!(!w.has_previous_page);
        assert!(!w.has_next_page);
    }

    #[test]
    fn test_first_and_after() {
        let w = window(ConnectionArgs::new(None, None, Some(2), None), 5);
        assert_eq!((w.start, w.end, w.has_next_page), (0, 2, true));

        let w = window(ConnectionArgs::new(cursor(1), None, Some(2), None), 5);
        assert_eq!((w.start, w.end, w.has_next_page), (2, 4, true));

        let w = window(ConnectionArgs::new(cursor(2), None, Some(10), None), 5);
        assert_eq!((w.start, w.end, w.has_next_page), (3, 5, false));
        // graphql-relay only reports previous pages when paging backwards
        assert!(!w.has_previous_page);
    }

    #[test]
    fn test_last_and_before() {
        let w = window(ConnectionArgs::new(None, None, None, Some(2)), 5);
        assert_eq!((w.start, w.end, w.has_previous_page), (3, 5, true));

        let w = window(ConnectionArgs::new(None, cursor(3), None, Some(2)), 5);
        assert_eq!((w.start, w.end, w.has_previous_page), (1, 3, true));

        let w = window(ConnectionArgs::new(None, cursor(2), None, Some(5)), 5);
        assert_eq!((w.start, w.end, w.has_previous_page), (0, 2, false));
    }

    #[test]
    fn test_after_past_the_end_is_empty() {
        let w = window(ConnectionArgs::new(cursor(9), None, Some(2), None), 3);
        assert!(w.is_empty());
        assert_eq!(w.start, 3);
    }

    #[test]
    fn test_invalid_cursor_is_ignored() {
        let args = ConnectionArgs::new(Some("garbage".to_string()), None, Some(1), None);
        let w = window(args, 3);
        assert_eq!((w.start, w.end), (0, 1));
    }

    #[test]
    fn test_negative_first_is_rejected() {
        let args = ConnectionArgs::new(None, None, Some(-1), None);
        let err = slice_window(&args, 3, LIMITS).unwrap_err();
        assert_eq!(err.to_string(), "Argument 'first' must be a non-negative integer.");
    }

    #[test]
    fn test_max_limit() {
        let limits = SliceLimits {
            field_name: "allCategories",
            max_limit: Some(2),
            ..LIMITS
        };
        let w = slice_window(&ConnectionArgs::default(), 5, limits).unwrap();
        assert_eq!((w.start, w.end, w.has_next_page), (0, 2, true));

        let args = ConnectionArgs::new(None, None, Some(3), None);
        let err = slice_window(&args, 5, limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requesting 3 records on the `allCategories` connection exceeds the `first` limit of 2 records."
        );

        // Each argument is checked on its own
        let args = ConnectionArgs::new(None, None, Some(1), Some(500));
        let err = slice_window(&args, 5, limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requesting 500 records on the `allCategories` connection exceeds the `last` limit of 2 records."
        );
    }

    #[test]
    fn test_offset() {
        let args = ConnectionArgs::new(None, None, Some(2), None).with_offset(Some(1));
        let w = window(args, 5);
        assert_eq!((w.start, w.end), (1, 3));

        let args = ConnectionArgs::new(cursor(0), None, Some(2), None).with_offset(Some(2));
        let w = window(args, 5);
        assert_eq!((w.start, w.end), (3, 5));

        let args = ConnectionArgs::new(None, cursor(3), None, None).with_offset(Some(1));
        assert!(slice_window(&args, 5, LIMITS).is_err());
    }

    #[test]
    fn test_ignored_out_of_range_cursors() {
        let limits = SliceLimits {
            out_of_range: OutOfRange::Ignore,
            ..LIMITS
        };

        let args = ConnectionArgs::new(cursor(9), None, Some(2), None);
        let w = slice_window(&args, 3, limits).unwrap();
        assert_eq!((w.start, w.end, w.has_next_page), (0, 2, true));

        let args = ConnectionArgs::new(None, cursor(9), None, Some(2));
        let w = slice_window(&args, 3, limits).unwrap();
        assert_eq!((w.start, w.end, w.has_previous_page), (1, 3, true));

        // In-range cursors behave as usual
        let args = ConnectionArgs::new(cursor(0), None, Some(1), None);
        let w = slice_window(&args, 3, limits).unwrap();
        assert_eq!((w.start, w.end), (1, 2));
    }
}
