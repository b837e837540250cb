//! Purpose: Model cursor-based pagination over list entries and persons.
//! Exports: `Page`, `PageState`, `Pager`.
//! Role: Normalized page envelope plus a sequential cursor over fetches.
//! Invariants: Termination is driven solely by token absence; there is no
//! server-side total count.
//! Invariants: An exhausted pager never fetches again; restarting means
//! constructing a new one.

use crate::api::ApiResult;

/// One page of results with the opaque continuation token, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageState {
    NotStarted,
    HasMore(String),
    Exhausted,
}

/// Sequential cursor over a paginated resource. Each page's token is only
/// known after the previous response arrives, so fetches never overlap.
pub struct Pager<T, F>
where
    F: FnMut(Option<&str>) -> ApiResult<Page<T>>,
{
    fetch: F,
    state: PageState,
}

impl<T, F> Pager<T, F>
where
    F: FnMut(Option<&str>) -> ApiResult<Page<T>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            state: PageState::NotStarted,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Fetches the next page, or `None` once the cursor is exhausted.
    pub fn next_page(&mut self) -> ApiResult<Option<Vec<T>>> {
        let token = match &self.state {
            PageState::NotStarted => None,
            PageState::HasMore(token) => Some(token.clone()),
            PageState::Exhausted => return Ok(None),
        };
        let page = (self.fetch)(token.as_deref())?;
        self.state = match page.next_page_token {
            Some(token) => PageState::HasMore(token),
            None => PageState::Exhausted,
        };
        Ok(Some(page.items))
    }

    /// Drains every remaining page into one sequence, in call order.
    pub fn collect_all(mut self) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page()? {
            items.extend(page);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageState, Pager};
    use crate::core::error::{Error, ErrorKind};

    fn three_page_fetch() -> impl FnMut(Option<&str>) -> crate::api::ApiResult<Page<u64>> {
        |token| match token {
            None => Ok(Page::new(vec![1, 2], Some("t1".to_string()))),
            Some("t1") => Ok(Page::new(vec![3, 4], Some("t2".to_string()))),
            Some("t2") => Ok(Page::new(vec![5], None)),
            Some(other) => Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("unexpected token {other}"))),
        }
    }

    #[test]
    fn pager_walks_tokens_until_absent() {
        let mut pager = Pager::new(three_page_fetch());
        assert_eq!(pager.state(), &PageState::NotStarted);

        assert_eq!(pager.next_page().expect("page"), Some(vec![1, 2]));
        assert_eq!(pager.state(), &PageState::HasMore("t1".to_string()));

        assert_eq!(pager.next_page().expect("page"), Some(vec![3, 4]));
        assert_eq!(pager.next_page().expect("page"), Some(vec![5]));
        assert_eq!(pager.state(), &PageState::Exhausted);

        assert_eq!(pager.next_page().expect("page"), None);
        assert_eq!(pager.next_page().expect("page"), None);
    }

    #[test]
    fn collect_all_concatenates_in_call_order() {
        let pager = Pager::new(three_page_fetch());
        let items = pager.collect_all().expect("items");
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn single_page_response_exhausts_immediately() {
        let mut pager = Pager::new(|_token: Option<&str>| Ok(Page::new(vec![42u64], None)));
        assert_eq!(pager.next_page().expect("page"), Some(vec![42]));
        assert_eq!(pager.state(), &PageState::Exhausted);
        assert_eq!(pager.next_page().expect("page"), None);
    }

    #[test]
    fn fetch_errors_propagate_without_state_change() {
        let mut pager = Pager::new(|_token: Option<&str>| -> crate::api::ApiResult<Page<u64>> {
            Err(Error::new(ErrorKind::Http).with_status(500))
        });
        let err = pager.next_page().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(pager.state(), &PageState::NotStarted);
    }
}
