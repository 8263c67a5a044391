//! # Listing Pagination
//!
//! Turns a sorted key set into one S3-style listing page. Both backends
//! share this so their pagination contract is identical.
//!
//! Continuation tokens are opaque to callers. Internally a token records
//! the last entry handed out: either an object key (resume strictly after
//! it) or a common prefix (resume after everything under it).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::backend::{ListRequest, MAX_KEYS};
use super::errors::{StorageError, StorageResult};

/// Keys selected for one page, before the backend attaches object details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePlan {
    pub object_keys: Vec<String>,
    pub common_prefixes: Vec<String>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    After(String),
    SkipPrefix(String),
}

impl Cursor {
    fn encode(&self) -> String {
        let raw = match self {
            Cursor::After(key) => format!("k{}", key),
            Cursor::SkipPrefix(prefix) => format!("p{}", prefix),
        };
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    fn decode(token: &str) -> StorageResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StorageError::InvalidContinuationToken)?;
        let raw = String::from_utf8(bytes).map_err(|_| StorageError::InvalidContinuationToken)?;

        match raw.split_at_checked(1) {
            Some(("k", key)) => Ok(Cursor::After(key.to_string())),
            Some(("p", prefix)) if !prefix.is_empty() => Ok(Cursor::SkipPrefix(prefix.to_string())),
            _ => Err(StorageError::InvalidContinuationToken),
        }
    }

    /// Whether `key` was already handed out on an earlier page
    fn covers(&self, key: &str) -> bool {
        match self {
            Cursor::After(last) => key <= last.as_str(),
            Cursor::SkipPrefix(prefix) => key <= prefix.as_str() || key.starts_with(prefix.as_str()),
        }
    }
}

/// Build one page from `keys`, which must be sorted ascending.
///
/// `page_limit` is the backend's own cap; the effective page size is the
/// smallest of it, the request's `max_keys` and [`MAX_KEYS`].
pub fn paginate<'a, I>(keys: I, request: &ListRequest, page_limit: usize) -> StorageResult<PagePlan>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = request
        .max_keys
        .min(page_limit)
        .min(MAX_KEYS)
        .max(1);

    let resume = request
        .continuation_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(Cursor::decode)
        .transpose()?;

    let prefix = request.prefix.as_str();
    let mut plan = PagePlan::default();
    let mut last: Option<Cursor> = None;
    let mut emitted = 0usize;

    for key in keys {
        if !key.starts_with(prefix) {
            if key > prefix {
                break;
            }
            continue;
        }
        if resume.as_ref().is_some_and(|c| c.covers(key)) {
            continue;
        }

        let rest = &key[prefix.len()..];
        let entry = match request.delimiter.and_then(|d| rest.find(d).map(|i| i + d.len_utf8())) {
            Some(end) => Cursor::SkipPrefix(format!("{}{}", prefix, &rest[..end])),
            None => Cursor::After(key.to_string()),
        };

        // Keys under one common prefix are contiguous
        if let (Some(Cursor::SkipPrefix(open)), Cursor::SkipPrefix(next)) = (&last, &entry) {
            if open == next {
                continue;
            }
        }

        if emitted == limit {
            plan.next_continuation_token = last.as_ref().map(Cursor::encode);
            break;
        }

        match &entry {
            Cursor::After(k) => plan.object_keys.push(k.clone()),
            Cursor::SkipPrefix(p) => plan.common_prefixes.push(p.clone()),
        }
        emitted += 1;
        last = Some(entry);
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<&'static str> {
        vec![
            "a.txt",
            "docs/",
            "docs/a.pdf",
            "docs/b.pdf",
            "docs/sub/",
            "docs/sub/deep/x.json",
            "docs/sub/y.png",
            "docs/zeta/",
            "music/song.mp3",
        ]
    }

    fn walk(request: ListRequest, page_limit: usize) -> (Vec<PagePlan>, Vec<String>, Vec<String>) {
        let mut pages = Vec::new();
        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        let mut request = request;

        loop {
            let page = paginate(keys(), &request, page_limit).unwrap();
            objects.extend(page.object_keys.clone());
            prefixes.extend(page.common_prefixes.clone());
            let token = page.next_continuation_token.clone();
            pages.push(page);
            match token {
                Some(t) => request = request.with_token(Some(t)),
                None => break,
            }
        }

        (pages, objects, prefixes)
    }

    #[test]
    fn test_recursive_listing_single_page() {
        let page = paginate(keys(), &ListRequest::recursive("docs/"), 1000).unwrap();
        assert_eq!(page.object_keys.len(), 7);
        assert!(page.common_prefixes.is_empty());
        assert!(page.next_continuation_token.is_none());
        assert_eq!(page.object_keys[0], "docs/");
    }

    #[test]
    fn test_recursive_listing_paginates_without_gaps() {
        let (pages, objects, _) = walk(ListRequest::recursive("docs/"), 4);
        assert_eq!(pages.len(), 2);
        assert_eq!(objects, keys()[1..8].to_vec());
    }

    #[test]
    fn test_no_trailing_empty_page() {
        let (pages, objects, _) = walk(ListRequest::recursive("docs/"), 2);
        assert_eq!(pages.len(), 4);
        assert_eq!(objects.len(), 7);
        assert!(pages.iter().all(|p| !p.object_keys.is_empty()));
    }

    #[test]
    fn test_delimiter_groups_folders() {
        let page = paginate(keys(), &ListRequest::folder("docs/"), 1000).unwrap();
        assert_eq!(page.object_keys, vec!["docs/", "docs/a.pdf", "docs/b.pdf"]);
        assert_eq!(page.common_prefixes, vec!["docs/sub/", "docs/zeta/"]);
    }

    #[test]
    fn test_delimiter_paging_never_reenters_prefix() {
        let (_, objects, prefixes) = walk(ListRequest::folder("docs/"), 1);
        assert_eq!(objects, vec!["docs/", "docs/a.pdf", "docs/b.pdf"]);
        assert_eq!(prefixes, vec!["docs/sub/", "docs/zeta/"]);
    }

    #[test]
    fn test_root_listing() {
        let page = paginate(keys(), &ListRequest::folder(""), 1000).unwrap();
        assert_eq!(page.object_keys, vec!["a.txt"]);
        assert_eq!(page.common_prefixes, vec!["docs/", "music/"]);
    }

    #[test]
    fn test_unmatched_prefix_is_empty() {
        let page = paginate(keys(), &ListRequest::recursive("nothing/"), 1000).unwrap();
        assert_eq!(page, PagePlan::default());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let request = ListRequest::recursive("docs/").with_token(Some("!!!".into()));
        assert_eq!(
            paginate(keys(), &request, 1000),
            Err(StorageError::InvalidContinuationToken)
        );
    }
}
