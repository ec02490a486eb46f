//! Query filtering.
//!
//! Projects and actions are matched against the user's query with a
//! case-insensitive substring test over one or more keys per candidate.
//! An empty query matches everything.

/// Check whether `query` is a case-insensitive substring of any key.
#[must_use]
pub fn matches_query<S: AsRef<str>>(query: &str, keys: &[S]) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    keys.iter()
        .any(|key| key.as_ref().to_lowercase().contains(&query))
}

/// Keep the candidates for which any key matches `query`, preserving order.
///
/// # Examples
///
/// ```no_run
/// # use source_launcher::filtering::filter_by_query;
/// let names = vec!["web-app", "api"];
/// let hits = filter_by_query("web app", names, |n| vec![n.replace('-', " ")]);
/// assert_eq!(hits, vec!["web-app"]);
/// ```
pub fn filter_by_query<T, F>(query: &str, candidates: Vec<T>, keys: F) -> Vec<T>
where
    F: Fn(&T) -> Vec<String>,
{
    candidates
        .into_iter()
        .filter(|candidate| matches_query(query, &keys(candidate)))
        .collect()
}
