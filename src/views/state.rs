//! Render state shared by every data-backed view.
//!
//! A view starts in `Loading` and settles exactly once when its fetch
//! resolves. Fetch failures are logged and settle like a missing document,
//! so the user sees an empty or not-found page rather than an error.

use crate::services::document_store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    /// Fetch settled with nothing to show.
    Empty,
    Ready(T),
    /// Fetch settled but the requested item does not exist.
    NotFound,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    #[cfg(test)]
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Settles a collection fetch: absent or empty data is `Empty`.
    pub fn settle_list(
        fetched: Result<Option<T>, StoreError>,
        is_empty: impl Fn(&T) -> bool,
        context: &str,
    ) -> Self {
        match fetched {
            Ok(Some(value)) if !is_empty(&value) => ViewState::Ready(value),
            Ok(_) => ViewState::Empty,
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", context, e);
                ViewState::Empty
            }
        }
    }

    /// Settles a single-item lookup: absent data is `NotFound`.
    pub fn settle_item(fetched: Result<Option<T>, StoreError>, context: &str) -> Self {
        match fetched {
            Ok(Some(value)) => ViewState::Ready(value),
            Ok(None) => ViewState::NotFound,
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", context, e);
                ViewState::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_list() {
        let ready = ViewState::settle_list(Ok(Some(vec![1])), |v: &Vec<i32>| v.is_empty(), "t");
        assert_eq!(ready, ViewState::Ready(vec![1]));

        let empty = ViewState::settle_list(Ok(Some(Vec::<i32>::new())), |v| v.is_empty(), "t");
        assert_eq!(empty, ViewState::Empty);

        let missing = ViewState::<Vec<i32>>::settle_list(Ok(None), |v| v.is_empty(), "t");
        assert_eq!(missing, ViewState::Empty);

        let failed = ViewState::<Vec<i32>>::settle_list(
            Err(StoreError::Backend("down".into())),
            |v| v.is_empty(),
            "t",
        );
        assert_eq!(failed, ViewState::Empty);
    }

    #[test]
    fn test_settle_item() {
        assert_eq!(ViewState::settle_item(Ok(Some(7)), "t"), ViewState::Ready(7));
        assert_eq!(ViewState::<i32>::settle_item(Ok(None), "t"), ViewState::NotFound);
        assert_eq!(
            ViewState::<i32>::settle_item(Err(StoreError::Backend("down".into())), "t"),
            ViewState::NotFound
        );
    }

    #[test]
    fn test_default_is_loading() {
        assert!(ViewState::<()>::default().is_loading());
        assert_eq!(ViewState::Ready(2).ready(), Some(&2));
    }
}
